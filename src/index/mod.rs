// file: src/index/mod.rs
// description: module declarations for the vector index layer

pub mod client;
pub mod schema;
pub mod writer;

pub use client::LanceDbClient;
pub use schema::chunks_schema;
pub use writer::ChunkIndexer;
