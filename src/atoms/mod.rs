// Hivetrap Atoms — foundational types with no engine dependencies.

pub mod error;
pub mod types;
