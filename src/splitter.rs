//! Greedy fixed-size window splitter.
//!
//! Pages are consumed into windows of at most `chunk_size` characters, each
//! window starting `chunk_size - chunk_overlap` characters after the
//! previous one. Splitting is a pure function of the page text and the two
//! parameters: the same input always yields the same chunk sequence.

use serde::{Deserialize, Serialize};

use crate::loader::Page;
use crate::types::RagError;

/// A bounded substring of a page, the unit of embedding and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Page the chunk was cut from (1-indexed).
    pub page_number: usize,
    /// Character offset of the chunk within the page text.
    ///
    /// Recorded for traceability; consumers never slice the page with it.
    pub start_offset: usize,
    /// Chunk text, at most `chunk_size` characters.
    pub text: String,
}

/// Splits page text into overlapping fixed-size windows.
#[derive(Debug, Clone, Copy)]
pub struct WindowSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WindowSplitter {
    /// Creates a splitter, rejecting parameter pairs where the window start
    /// would never advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::config("chunk_size must be greater than zero"));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits a single page into chunks.
    ///
    /// Offsets and lengths are measured in characters, and windows never cut
    /// through a multi-byte code point. Empty pages yield no chunks.
    pub fn split_page(&self, page: &Page) -> Vec<Chunk> {
        let text = page.text.as_str();
        // Byte index of every char boundary, terminated by the text length,
        // so char windows can be mapped back onto byte ranges.
        let mut bounds: Vec<usize> = text.char_indices().map(|(index, _)| index).collect();
        bounds.push(text.len());
        let char_count = bounds.len() - 1;

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(Chunk {
                page_number: page.number,
                start_offset: start,
                text: text[bounds[start]..bounds[end]].to_string(),
            });
            if end == char_count {
                break;
            }
            start += step;
        }
        chunks
    }

    /// Splits every page in order, concatenating the per-page sequences.
    pub fn split_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        pages
            .iter()
            .flat_map(|page| self.split_page(page))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, text: impl Into<String>) -> Page {
        Page {
            number,
            text: text.into(),
        }
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(matches!(
            WindowSplitter::new(100, 100),
            Err(RagError::Config(_))
        ));
        assert!(matches!(
            WindowSplitter::new(100, 250),
            Err(RagError::Config(_))
        ));
        assert!(matches!(WindowSplitter::new(0, 0), Err(RagError::Config(_))));
        assert!(WindowSplitter::new(100, 99).is_ok());
        assert!(WindowSplitter::new(1, 0).is_ok());
    }

    #[test]
    fn produces_expected_offsets_for_2500_char_page() {
        let splitter = WindowSplitter::new(1000, 200).unwrap();
        let text: String = std::iter::repeat('x').take(2500).collect();
        let chunks = splitter.split_page(&page(1, text));

        let offsets: Vec<usize> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 800, 1600]);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        assert_eq!(lengths, vec![1000, 1000, 900]);
    }

    #[test]
    fn every_chunk_respects_the_size_bound() {
        let splitter = WindowSplitter::new(7, 3).unwrap();
        let chunks = splitter.split_page(&page(1, "abcdefghijklmnopqrstuvwxyz"));
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 7);
        }
    }

    #[test]
    fn non_overlapping_tails_reconstruct_the_page() {
        let splitter = WindowSplitter::new(7, 3).unwrap();
        let original = "the quick brown fox jumps over the lazy dog";
        let chunks = splitter.split_page(&page(1, original));

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(3));
        }
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn splitting_is_deterministic() {
        let splitter = WindowSplitter::new(11, 4).unwrap();
        let source = page(2, "determinism is a property worth testing twice");
        assert_eq!(splitter.split_page(&source), splitter.split_page(&source));
    }

    #[test]
    fn short_page_yields_a_single_chunk() {
        let splitter = WindowSplitter::new(1000, 200).unwrap();
        let chunks = splitter.split_page(&page(3, "short"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].page_number, 3);
    }

    #[test]
    fn empty_page_yields_no_chunks() {
        let splitter = WindowSplitter::new(10, 2).unwrap();
        assert!(splitter.split_page(&page(1, "")).is_empty());
    }

    #[test]
    fn windows_never_split_multibyte_characters() {
        let splitter = WindowSplitter::new(4, 1).unwrap();
        let text: String = "héllö wörld çafé".to_string();
        let chunks = splitter.split_page(&page(1, text.clone()));
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 4);
        }
        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(1));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn split_pages_keeps_page_order() {
        let splitter = WindowSplitter::new(100, 10).unwrap();
        let pages = vec![page(1, "first"), page(2, "second"), page(3, "third")];
        let chunks = splitter.split_pages(&pages);
        let numbers: Vec<usize> = chunks.iter().map(|c| c.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
