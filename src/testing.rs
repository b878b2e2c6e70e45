//! # Test Fixtures
//!
//! A deterministic, in-process [`Encoder`] fixture, for this crate's own
//! tests and for downstream integrators' test suites (behind the `testing`
//! feature). It performs no real BPE merging — every byte is its own token —
//! so it is fast, offline, and exact, at the cost of not exercising the
//! multi-byte-token edge cases a real vocabulary would. Integration tests
//! against a real encoding (`tiktoken-rs`) live in `tests/`.

use std::convert::Infallible;

use fancy_regex::Regex;

use crate::encoder::Encoder;

/// Pre-tokenization pattern: runs of whitespace, or runs of non-whitespace.
const TOY_PATTERN: &str = r"\s+|\S+";

/// A byte-identity [`Encoder`] fixture: `encode_ordinary` maps each byte of
/// the input to a token of the same value. Pre-tokenization pieces are
/// whitespace/non-whitespace runs, matching the simplest real encoders'
/// shape without needing a learned vocabulary.
pub struct ToyEncoder {
    pattern: Regex,
}

impl ToyEncoder {
    /// Build a new fixture encoder.
    pub fn new() -> Self {
        Self { pattern: Regex::new(TOY_PATTERN).expect("fixture pattern is valid") }
    }

    fn piece_ranges(
        &self,
        text: &str,
    ) -> Vec<(usize, usize)> {
        self.pattern
            .find_iter(text)
            .filter_map(Result::ok)
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

impl Default for ToyEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for ToyEncoder {
    type Token = u32;
    type Error = Infallible;

    fn pat_str(&self) -> &str {
        TOY_PATTERN
    }

    fn encode_ordinary(
        &self,
        text: &str,
    ) -> Result<Vec<u32>, Infallible> {
        Ok(text.bytes().map(u32::from).collect())
    }

    fn encode_single_piece(
        &self,
        piece: &str,
    ) -> Result<Vec<u32>, Infallible> {
        self.encode_ordinary(piece)
    }

    fn encode_with_unstable(
        &self,
        text: &str,
    ) -> Result<(Vec<u32>, Vec<Vec<u32>>), Infallible> {
        let pieces = self.piece_ranges(text);
        // Everything up to the start of the last pre-tokenization piece is
        // final: this pattern makes purely local, left-to-right decisions,
        // so only the trailing piece can be re-segmented by an extension.
        let stable_end = pieces.last().map_or(0, |&(start, _)| start);
        let stable_tokens = self.encode_ordinary(&text[..stable_end])?;
        Ok((stable_tokens, Vec::new()))
    }

    fn decode(
        &self,
        tokens: &[u32],
    ) -> Result<String, Infallible> {
        let bytes: Vec<u8> = tokens.iter().map(|&t| t as u8).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_ordinary_is_byte_identity() {
        let encoder = ToyEncoder::new();
        assert_eq!(encoder.encode_ordinary("ab").unwrap(), vec![b'a' as u32, b'b' as u32]);
    }

    #[test]
    fn encode_with_unstable_keeps_completed_pieces_stable() {
        let encoder = ToyEncoder::new();
        let (stable, _) = encoder.encode_with_unstable("hello world").unwrap();
        assert_eq!(encoder.decode(&stable).unwrap(), "hello ");
    }
}
