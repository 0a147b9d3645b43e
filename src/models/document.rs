// file: src/models/document.rs
// description: document metadata model and format detection
// reference: internal data structures

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
    Markdown,
}

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            "md" => Ok(Self::Markdown),
            other => Err(PipelineError::UnsupportedFormat(format!(
                "unknown extension '{}' for {}",
                other, filename
            ))),
        }
    }
}

/// Metadata describing a stored upload. Identity is the filename; the raw
/// bytes live on disk and are read back through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub filename: String,
    pub format: DocumentFormat,
    pub size_bytes: u64,
    pub last_modified: u64,
}

impl DocumentMeta {
    pub fn new(filename: String, format: DocumentFormat, size_bytes: u64) -> Self {
        let last_modified = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            filename,
            format,
            size_bytes,
            last_modified,
        }
    }

    pub fn size_kb(&self) -> f64 {
        (self.size_bytes as f64 / 1024.0 * 100.0).round() / 100.0
    }

    pub fn last_modified_display(&self) -> String {
        DateTime::<Local>::from(UNIX_EPOCH + std::time::Duration::from_secs(self.last_modified))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_filename("menu.pdf").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_filename("hours.DOCX").unwrap(),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::from_filename("specials.md").unwrap(),
            DocumentFormat::Markdown
        );
        assert_eq!(
            DocumentFormat::from_filename("notes.txt").unwrap(),
            DocumentFormat::Txt
        );
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(DocumentFormat::from_filename("malware.exe").is_err());
        assert!(DocumentFormat::from_filename("no_extension").is_err());
    }

    #[test]
    fn test_size_kb_rounding() {
        let meta = DocumentMeta::new("menu.pdf".to_string(), DocumentFormat::Pdf, 1536);
        assert_eq!(meta.size_kb(), 1.5);
    }
}
