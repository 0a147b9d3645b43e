// file: src/models/mod.rs
// description: module declarations for data models

pub mod chunk;
pub mod document;

pub use chunk::{Chunk, SearchHit};
pub use document::{DocumentFormat, DocumentMeta};
