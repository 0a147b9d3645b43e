// file: src/utils/validation.rs
// description: upload validation helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};

pub struct Validator;

impl Validator {
    /// Reject filenames that could escape the uploads directory or collide
    /// with path separators. Uploads are stored flat, keyed by filename.
    pub fn validate_filename(filename: &str) -> Result<()> {
        if filename.trim().is_empty() {
            return Err(PipelineError::Validation("Filename is empty".to_string()));
        }

        if filename.contains('/') || filename.contains('\\') {
            return Err(PipelineError::Validation(format!(
                "Filename must not contain path separators: {}",
                filename
            )));
        }

        if filename == "." || filename == ".." || filename.contains("..") {
            return Err(PipelineError::Validation(format!(
                "Path traversal detected in filename: {}",
                filename
            )));
        }

        Ok(())
    }

    pub fn validate_extension(filename: &str, allowed: &[String]) -> Result<()> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
            Ok(())
        } else {
            Err(PipelineError::Validation(format!(
                "Unsupported file type '.{}' for {} (allowed: {})",
                extension,
                filename,
                allowed.join(", ")
            )))
        }
    }

    pub fn validate_size(filename: &str, size: u64, max_bytes: u64) -> Result<()> {
        if size > max_bytes {
            return Err(PipelineError::Validation(format!(
                "File {} exceeds max size of {} bytes ({} bytes)",
                filename, max_bytes, size
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            text.to_string()
        } else {
            let mut end = max_length;
            while end > 0 && !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        }
    }
}
