// Hivetrap Engine — Message Deduplication Index
//
// Suppresses re-analysis of a message the watcher has already handed us.
// Scoped to the running process only: never persisted, never shared
// across restarts. An occasional false-positive dedupe is acceptable,
// so a cheap rolling hash is enough.

use parking_lot::Mutex;
use std::collections::HashSet;

/// Rolling integer hash over the text (the classic `h*31 + c` family),
/// wrapping at 32 bits. Deterministic and O(len).
fn fingerprint(text: &str) -> i32 {
    let mut hash: i32 = 0;
    for c in text.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(c as i32);
    }
    hash
}

#[derive(Debug, Default)]
pub struct DedupeIndex {
    seen: Mutex<HashSet<i32>>,
}

impl DedupeIndex {
    pub fn new() -> Self {
        DedupeIndex {
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Has this exact text already been marked?
    pub fn seen(&self, text: &str) -> bool {
        self.seen.lock().contains(&fingerprint(text))
    }

    /// Mark the text as processed. Idempotent.
    pub fn mark(&self, text: &str) {
        self.seen.lock().insert(fingerprint(text));
    }

    /// Drop every fingerprint (bulk reset).
    pub fn clear(&self) {
        self.seen.lock().clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }
}
