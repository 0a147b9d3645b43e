// file: src/extract/docx.rs
// description: DOCX paragraph extraction via docx-rs
// reference: https://docs.rs/docx-rs

use crate::error::{PipelineError, Result};

/// Walk the document body and collect run text paragraph by paragraph.
/// Tables are skipped.
pub fn extract(filename: &str, bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| PipelineError::Extraction {
        file: filename.to_string(),
        message: e.to_string(),
    })?;

    let mut content = String::new();

    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(text) = child {
                            content.push_str(&text.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }

    Ok(content)
}
