//! Fixed-window, page-tagged text chunker.
//!
//! Splits each page's text into non-overlapping windows of `chunk_size`
//! characters after flattening newlines to spaces. Windows are trimmed and
//! empty results dropped, so a chunk's text is always non-empty and never
//! contains a newline. Chunks never cross a page boundary.
//!
//! The output order — all chunks of page 1, then page 2, and within a page by
//! offset — is load-bearing: a chunk's position in this sequence is its
//! identifier throughout the index and the persisted bundle.

use crate::models::{Chunk, Page};

/// Split pages into chunks of at most `chunk_size` characters.
///
/// Windows advance by exactly `chunk_size` characters (code points, not
/// bytes), with no overlap and no stride configuration. A page shorter than
/// `chunk_size` yields one chunk; a page that is empty after trimming yields
/// none. Never fails; empty input produces an empty result.
pub fn chunk_pages(pages: &[Page], chunk_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    if chunk_size == 0 {
        return chunks;
    }

    for page in pages {
        let flat: Vec<char> = page
            .text
            .chars()
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();

        for window in flat.chunks(chunk_size) {
            let text: String = window.iter().collect();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    text: trimmed.to_string(),
                    page: page.page,
                });
            }
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32, text: &str) -> Page {
        Page {
            page: n,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_window_boundaries() {
        // "AAAA BBBB" with size 5: window [0..5) = "AAAA " -> "AAAA",
        // window [5..10) = "BBBB" -> "BBBB".
        let chunks = chunk_pages(&[page(1, "AAAA BBBB")], 5);
        assert_eq!(
            chunks,
            vec![
                Chunk {
                    text: "AAAA".to_string(),
                    page: 1
                },
                Chunk {
                    text: "BBBB".to_string(),
                    page: 1
                },
            ]
        );
    }

    #[test]
    fn test_newlines_flattened() {
        let chunks = chunk_pages(&[page(1, "line one\nline two\nline three")], 800);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "line one line two line three");
        assert!(!chunks.iter().any(|c| c.text.contains('\n')));
    }

    #[test]
    fn test_short_page_single_chunk() {
        let chunks = chunk_pages(&[page(1, "short")], 800);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
    }

    #[test]
    fn test_empty_page_no_chunks() {
        let chunks = chunk_pages(&[page(1, ""), page(2, "   \n  ")], 800);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_no_chunk_crosses_page_boundary() {
        let pages = vec![page(1, "aaa"), page(2, "bbb")];
        let chunks = chunk_pages(&pages, 800);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 2);
    }

    #[test]
    fn test_page_order_preserved() {
        let pages = vec![page(1, "aaaa bbbb"), page(2, "cccc dddd")];
        let chunks = chunk_pages(&pages, 5);
        let order: Vec<u32> = chunks.iter().map(|c| c.page).collect();
        assert_eq!(order, vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_deterministic() {
        let pages = vec![page(1, "The quick brown fox jumps over the lazy dog")];
        let a = chunk_pages(&pages, 7);
        let b = chunk_pages(&pages, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_multibyte_characters_counted_as_chars() {
        // 6 code points, size 3: two windows, no byte-boundary panic.
        let chunks = chunk_pages(&[page(1, "ééé患患患")], 3);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "ééé");
        assert_eq!(chunks[1].text, "患患患");
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_pages(&[], 800).is_empty());
    }
}
