// file: src/extract/mod.rs
// description: per-format text extraction with defensive dispatch

mod docx;
mod pdf;
mod text;

use crate::error::Result;
use crate::models::DocumentFormat;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref EXCESS_BLANK_LINES: Regex = Regex::new(r"\n{3,}").expect("valid regex");
    static ref TRAILING_SPACES: Regex = Regex::new(r"[ \t]+\n").expect("valid regex");
}

pub struct Extractor;

impl Extractor {
    /// Convert raw document bytes to plain text. Empty input yields empty
    /// text for every format; corrupt bytes fail with an extraction error.
    pub fn extract(filename: &str, format: DocumentFormat, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            debug!("Empty document {}, extracting empty text", filename);
            return Ok(String::new());
        }

        let raw = match format {
            DocumentFormat::Pdf => pdf::extract(filename, bytes)?,
            DocumentFormat::Docx => docx::extract(filename, bytes)?,
            DocumentFormat::Txt => text::extract_plain(bytes),
            DocumentFormat::Markdown => text::extract_markdown(bytes),
        };

        Ok(Self::cleanup(&raw))
    }

    fn cleanup(text: &str) -> String {
        let text = text.replace('\0', "");
        let text = TRAILING_SPACES.replace_all(&text, "\n");
        let text = EXCESS_BLANK_LINES.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_yield_empty_text() {
        for format in [
            DocumentFormat::Pdf,
            DocumentFormat::Docx,
            DocumentFormat::Txt,
            DocumentFormat::Markdown,
        ] {
            let text = Extractor::extract("empty", format, b"").unwrap();
            assert!(text.is_empty());
        }
    }

    #[test]
    fn test_plain_text_extraction() {
        let text = Extractor::extract(
            "hours.txt",
            DocumentFormat::Txt,
            b"Open Tuesday through Sunday.\n",
        )
        .unwrap();
        assert_eq!(text, "Open Tuesday through Sunday.");
    }

    #[test]
    fn test_markdown_stripped_to_plain_text() {
        let md = b"# Specials\n\n- **Tuesday**: $5 burger\n- Wednesday: soup\n";
        let text = Extractor::extract("specials.md", DocumentFormat::Markdown, md).unwrap();

        assert!(text.contains("Specials"));
        assert!(text.contains("Tuesday"));
        assert!(text.contains("$5 burger"));
        assert!(!text.contains("**"));
        assert!(!text.contains('#'));
    }

    #[test]
    fn test_cleanup_collapses_blank_runs() {
        let cleaned = Extractor::cleanup("a   \n\n\n\n\nb");
        assert_eq!(cleaned, "a\n\nb");
    }

    #[test]
    fn test_corrupt_pdf_fails() {
        let result = Extractor::extract("broken.pdf", DocumentFormat::Pdf, b"not a pdf at all");
        assert!(result.is_err());
    }
}
