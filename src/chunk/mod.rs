// file: src/chunk/mod.rs
// description: overlap-aware text chunking with natural break preference

/// Splits extracted text into overlapping passages sized for the embedding
/// context window. Boundaries prefer paragraph and sentence breaks; a
/// sentence longer than the chunk size is hard-cut so every chunk stays
/// within `chunk_size + overlap` bytes.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        // overlap >= chunk_size would stall forward progress
        let overlap = overlap.min(chunk_size.saturating_sub(1));
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(text) {
            for piece in hard_split(sentence, self.chunk_size) {
                if !current.is_empty() && current.len() + piece.len() > self.chunk_size {
                    let tail = self.overlap_tail(&current);
                    let finished = current.trim().to_string();
                    if !finished.is_empty() {
                        chunks.push(finished);
                    }
                    current = tail;
                }
                current.push_str(piece);
            }
        }

        let finished = current.trim().to_string();
        if !finished.is_empty() {
            chunks.push(finished);
        }

        chunks
    }

    /// The trailing `overlap` bytes of a finished chunk, nudged forward to
    /// the next sentence or word boundary so the carried context reads
    /// cleanly.
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let tail = &text[start..];

        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}

/// Split on paragraph breaks first, then on sentence-ending punctuation
/// followed by whitespace. Returned slices keep their trailing separator
/// so concatenation reproduces readable text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();

    for paragraph in text.split_inclusive("\n\n") {
        let mut start = 0;
        let mut prev_was_terminator = false;

        for (idx, ch) in paragraph.char_indices() {
            if prev_was_terminator && ch.is_whitespace() {
                let end = idx + ch.len_utf8();
                sentences.push(&paragraph[start..end]);
                start = end;
                prev_was_terminator = false;
                continue;
            }
            prev_was_terminator = matches!(ch, '.' | '!' | '?');
        }

        if start < paragraph.len() {
            sentences.push(&paragraph[start..]);
        }
    }

    sentences
}

/// Cut a span that exceeds `max_len` into char-boundary-aligned pieces.
fn hard_split(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut pieces = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // single oversized char, should not happen with max_len >= 4
            end = (start + max_len).min(text.len());
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
        }
        pieces.push(&text[start..end]);
        start = end;
    }

    pieces
}
