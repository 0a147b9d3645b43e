// file: src/extract/pdf.rs
// description: PDF page-text extraction via pdf-extract
// reference: https://docs.rs/pdf-extract

use crate::error::{PipelineError, Result};
use tracing::warn;

/// Pull page text out of a PDF. pdf-extract already skips glyphs it cannot
/// decode, so partially damaged files come back as partial text; only a
/// document that yields nothing at all is treated as unreadable.
pub fn extract(filename: &str, bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        warn!("PDF extraction failed for {}: {}", filename, e);
        PipelineError::Extraction {
            file: filename.to_string(),
            message: e.to_string(),
        }
    })?;

    let text = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(text)
}
