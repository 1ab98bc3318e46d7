//! Typewriter chunking.
//!
//! The simulated incremental reveal of a completed message is modeled as a
//! lazy, finite, restartable sequence of accumulated-prefix chunks plus a
//! pacing policy. The broadcaster consumes the sequence and applies the
//! delay; nothing here knows about the transport.

use std::time::Duration;

/// Default inter-character delay for typewriter delivery.
pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(50);

/// Pacing policy for typewriter delivery (chunk size = one character).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterPacing {
    pub char_delay: Duration,
}

impl Default for TypewriterPacing {
    fn default() -> Self {
        Self {
            char_delay: DEFAULT_CHAR_DELAY,
        }
    }
}

impl TypewriterPacing {
    /// Pacing with no delay, for tests and batch consumers.
    pub fn immediate() -> Self {
        Self {
            char_delay: Duration::ZERO,
        }
    }
}

/// One step of the reveal: the accumulated prefix so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingChunk {
    pub partial_content: String,
    /// 1-based position of the last revealed character.
    pub current_position: usize,
    pub total_length: usize,
}

/// Lazily yield the accumulated prefixes of `text`, one character at a time.
///
/// Chunks split on `char` boundaries so multi-byte text reveals cleanly.
/// The iterator is finite and can be recreated to restart delivery.
pub fn chunks(text: &str) -> impl Iterator<Item = TypingChunk> + '_ {
    let total_length = text.chars().count();
    text.char_indices().enumerate().map(move |(i, (byte_idx, ch))| {
        TypingChunk {
            partial_content: text[..byte_idx + ch.len_utf8()].to_string(),
            current_position: i + 1,
            total_length,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert_eq!(chunks("").count(), 0);
    }

    #[test]
    fn chunks_accumulate_prefixes() {
        let all: Vec<TypingChunk> = chunks("hey").collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].partial_content, "h");
        assert_eq!(all[1].partial_content, "he");
        assert_eq!(all[2].partial_content, "hey");
        assert_eq!(all[2].current_position, 3);
        assert_eq!(all[2].total_length, 3);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let all: Vec<TypingChunk> = chunks("面试ok").collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].partial_content, "面");
        assert_eq!(all[1].partial_content, "面试");
        assert_eq!(all[3].partial_content, "面试ok");
        assert_eq!(all[3].total_length, 4);
    }

    #[test]
    fn sequence_is_restartable() {
        let text = "ab";
        let first: Vec<_> = chunks(text).collect();
        let second: Vec<_> = chunks(text).collect();
        assert_eq!(first, second);
    }
}
