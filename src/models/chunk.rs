// file: src/models/chunk.rs
// description: chunk and search result models for the vector index
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A bounded span of extracted text, tied to its source document. Chunks
/// are derived state: they are regenerated whenever the document is
/// re-indexed and dropped when the document is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub document: String,
    pub ordinal: u32,
    pub text: String,
}

impl Chunk {
    pub fn new(document: String, ordinal: u32, text: String) -> Self {
        Self {
            document,
            ordinal,
            text,
        }
    }

    /// Stable content hash used as a diagnostic column in the index.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.document.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.ordinal.to_le_bytes());
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// One ranked retrieval result. `distance` is the raw metric from the
/// index; `score` is the derived similarity (higher is better).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: String,
    pub ordinal: u32,
    pub text: String,
    pub score: f32,
    pub distance: Option<f32>,
}

impl SearchHit {
    pub fn new(
        document: String,
        ordinal: u32,
        text: String,
        score: f32,
        distance: Option<f32>,
    ) -> Self {
        Self {
            document,
            ordinal,
            text,
            score,
            distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let a = Chunk::new("menu.pdf".to_string(), 0, "Tuesday special".to_string());
        let b = Chunk::new("menu.pdf".to_string(), 0, "Tuesday special".to_string());
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_content_hash_varies_by_ordinal() {
        let a = Chunk::new("menu.pdf".to_string(), 0, "text".to_string());
        let b = Chunk::new("menu.pdf".to_string(), 1, "text".to_string());
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
