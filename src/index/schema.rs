// file: src/index/schema.rs
// description: LanceDB schema for the chunk index
// reference: https://docs.rs/lancedb

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema for the chunks table. Every entry is one embedded chunk
/// tagged with its source document identity and ordinal; an entry must
/// never outlive its document, which the writer enforces by replacing and
/// removing entries per document.
pub fn chunks_schema(embedding_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("document", DataType::Utf8, false),
        Field::new("ordinal", DataType::UInt32, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("indexed_at", DataType::UInt64, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim as i32,
            ),
            false,
        ),
    ]))
}
