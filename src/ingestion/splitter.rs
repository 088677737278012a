//! Overlapping text splitter with boundary preference
//!
//! Splitting is pure and deterministic: the same text and parameters
//! always produce the same chunks. Sizes are measured in characters, not
//! bytes, so multi-byte text never lands on an invalid boundary.

use crate::error::{Error, Result};

/// Split text into overlapping chunks of roughly `chunk_size` characters
///
/// Each cut prefers, in order: the last paragraph break in the window,
/// the last sentence end, the last space. Only when none exists does the
/// cut fall on a bare character boundary. The next chunk starts `overlap`
/// characters before the previous cut, so context spanning a cut appears
/// in both chunks.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
    }
    if overlap >= chunk_size {
        return Err(Error::InvalidConfig(format!(
            "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every character boundary, including the end of the
    // string, so char indices translate to slice bounds in O(1).
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = offsets.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total_chars {
        let hard_end = (start + chunk_size).min(total_chars);
        let end = if hard_end < total_chars {
            match preferred_break(&text[offsets[start]..offsets[hard_end]]) {
                Some(chars_into_window) => start + chars_into_window,
                None => hard_end,
            }
        } else {
            hard_end
        };

        // Whitespace-only pieces are kept: dropping them would lose
        // characters and break exact reconstruction of the source.
        chunks.push(text[offsets[start]..offsets[end]].to_string());

        if end >= total_chars {
            break;
        }
        // Step back by the overlap, but always move forward overall.
        let next = end.saturating_sub(overlap);
        start = if next <= start { end } else { next };
    }

    Ok(chunks)
}

/// Find the best cut point within a window, as a character count from the
/// window start. Returns `None` when no natural boundary exists.
fn preferred_break(window: &str) -> Option<usize> {
    if let Some(pos) = window.rfind("\n\n") {
        if pos > 0 {
            return Some(window[..pos + 2].chars().count());
        }
    }

    let mut sentence_end = None;
    for (i, c) in window.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let after = i + c.len_utf8();
            let followed_by_space = window[after..]
                .chars()
                .next()
                .map_or(true, |next| next.is_whitespace());
            if followed_by_space && after > 0 {
                sentence_end = Some(after);
            }
        }
    }
    if let Some(pos) = sentence_end {
        return Some(window[..pos].chars().count());
    }

    if let Some(pos) = window.rfind(' ') {
        if pos > 0 {
            return Some(window[..pos + 1].chars().count());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_text("hello world", 100, 10).unwrap();
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn empty_and_whitespace_text_yield_no_chunks() {
        assert!(split_text("", 100, 10).unwrap().is_empty());
        assert!(split_text("   \n\t  ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(
            split_text("text", 0, 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert!(matches!(
            split_text("text", 10, 10),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            split_text("text", 10, 20),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn splitting_is_deterministic() {
        let text = "The quick brown fox. Jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. "
            .repeat(20);
        let a = split_text(&text, 120, 30).unwrap();
        let b = split_text(&text, 120, 30).unwrap();
        assert_eq!(a, b);
        assert!(a.len() > 1);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(50), "b".repeat(50));
        let chunks = split_text(&text, 80, 0).unwrap();
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[0].ends_with("\n\n"));
        assert_eq!(chunks[1], "b".repeat(50));
    }

    #[test]
    fn prefers_sentence_ends_over_spaces() {
        let text = "First sentence here. Second part continues with more words after";
        let chunks = split_text(text, 40, 0).unwrap();
        assert_eq!(chunks[0], "First sentence here.");
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let text = "abcdefghij".repeat(10);
        let chunks = split_text(&text, 40, 10).unwrap();
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(10).collect::<Vec<_>>().into_iter().rev().collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn round_trip_reconstructs_the_source() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        let overlap = 20;
        let chunks = split_text(&text, 100, overlap).unwrap();
        assert!(chunks.len() > 2);

        // Dropping each chunk's leading overlap recovers the source exactly.
        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn long_whitespace_runs_survive_the_round_trip() {
        let text = format!("alpha{}omega", " ".repeat(300));
        let overlap = 10;
        let chunks = split_text(&text, 100, overlap).unwrap();
        assert!(chunks.len() > 2);

        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn unbreakable_text_still_makes_progress() {
        let text = "x".repeat(500);
        let chunks = split_text(&text, 100, 20).unwrap();
        assert!(chunks.len() > 1);
        let reassembled_len: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(reassembled_len >= 500);
    }

    #[test]
    fn multibyte_text_never_panics() {
        let text = "日本語のテキストです。".repeat(30);
        let chunks = split_text(&text, 50, 10).unwrap();
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
    }
}
