// file: src/extract/text.rs
// description: plain-text decode and markdown-to-text conversion
// reference: https://docs.rs/pulldown-cmark

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

pub fn extract_plain(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// Strip markdown structure down to readable plain text. Headings and
/// paragraphs become line-separated blocks; code blocks are kept verbatim.
pub fn extract_markdown(bytes: &[u8]) -> String {
    let source = String::from_utf8_lossy(bytes);
    let parser = Parser::new(&source);

    let mut plain_text = String::new();

    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => {
                plain_text.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => {
                plain_text.push('\n');
            }
            Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => {
                plain_text.push('\n');
            }
            Event::Start(Tag::Item) => {
                // keep list items from running together on one line
                if !plain_text.is_empty() && !plain_text.ends_with('\n') {
                    plain_text.push('\n');
                }
            }
            _ => {}
        }
    }

    plain_text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lossy_decode() {
        let text = extract_plain(b"hello \xF0\x9F\x8D\x94 burger");
        assert!(text.contains("burger"));
    }

    #[test]
    fn test_markdown_list_items_separated() {
        let text = extract_markdown(b"- first\n- second\n");
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_markdown_inline_code_preserved() {
        let text = extract_markdown(b"order the `daily special` today");
        assert!(text.contains("daily special"));
        assert!(!text.contains('`'));
    }
}
