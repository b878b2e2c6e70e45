//! # Append-Only Piece Cache
//!
//! Incremental tokenizer for a single text buffer that grows by appended
//! deltas (a chat transcript). Re-running the encoder's pre-tokenization
//! regex and BPE pass over the full buffer on every turn makes per-turn cost
//! grow with conversation length. This cache instead re-tokenizes only the
//! last `backtrack_pieces` pre-tokenization pieces plus the new delta, and
//! returns a `(rollback, append)` delta suitable for editing a downstream
//! KV cache.

use fancy_regex::Regex;

use crate::encoder::Encoder;
use crate::errors::{CacheError, CacheResult, encoder_error};

/// A maximal non-overlapping match of the encoder's pre-tokenization regex,
/// identified by a half-open byte range into the cache's text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Start byte offset, inclusive.
    pub start: usize,
    /// End byte offset, exclusive.
    pub end: usize,
}

/// The delta returned by [`AppendOnlyPieceCache::append`].
///
/// For an integrator with a KV cache: drop the last `rollback_tokens`
/// entries, then extend with `tokens_to_append`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDelta<T> {
    /// How many tokens to drop from the end of the prior token stream.
    pub rollback_tokens: usize,
    /// The tokens to append after the rollback.
    pub tokens_to_append: Vec<T>,
}

/// Incremental, pre-tokenization-aware tokenizer cache for append-only text.
///
/// `backtrack_pieces` is the cache's speed-vs-safety knob: the count of
/// trailing pre-tokenization pieces re-encoded on every append. A value too
/// small for the encoder's pre-tokenization pattern can produce a
/// segmentation that disagrees with a cold run; see
/// [`append_verified`](Self::append_verified) for a way to confirm a chosen
/// value empirically. This crate does not attempt to derive a safe value
/// from the pattern itself — no such static derivation is known.
pub struct AppendOnlyPieceCache<E: Encoder> {
    encoder: E,
    pattern: Regex,
    backtrack_pieces: usize,
    text: String,
    pieces: Vec<Piece>,
    piece_tokens: Vec<Vec<E::Token>>,
    tokens: Vec<E::Token>,
}

impl<E: Encoder> AppendOnlyPieceCache<E> {
    /// Build a new cache from an initial text.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidArgument`] if `backtrack_pieces < 1`.
    pub fn new(
        encoder: E,
        initial_text: impl Into<String>,
        backtrack_pieces: usize,
    ) -> CacheResult<Self> {
        if backtrack_pieces < 1 {
            return Err(CacheError::InvalidArgument { value: backtrack_pieces });
        }

        let pattern = Regex::new(encoder.pat_str())?;
        let mut cache = Self {
            encoder,
            pattern,
            backtrack_pieces,
            text: String::new(),
            pieces: Vec::new(),
            piece_tokens: Vec::new(),
            tokens: Vec::new(),
        };
        cache.reset(initial_text)?;
        Ok(cache)
    }

    /// The full current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The flattened concatenation of every piece's tokens, in order.
    pub fn tokens(&self) -> &[E::Token] {
        &self.tokens
    }

    /// The configured backtrack window.
    pub fn backtrack_pieces(&self) -> usize {
        self.backtrack_pieces
    }

    /// The ordered, non-overlapping pre-tokenization pieces currently
    /// covering `text()`. Exposed for integrators verifying the invariants
    /// of their own `backtrack_pieces` choice.
    #[cfg(feature = "testing")]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Per-piece token lists, parallel to [`pieces`](Self::pieces).
    #[cfg(feature = "testing")]
    pub fn piece_tokens(&self) -> &[Vec<E::Token>] {
        &self.piece_tokens
    }

    /// Cold path: discard all state and re-tokenize `text` from scratch.
    ///
    /// Segments `text` by iterating non-overlapping matches of the
    /// pre-tokenization regex left to right, encoding each match as a single
    /// piece. New state is built into temporaries and only committed once
    /// every piece has been encoded successfully, so a failure partway
    /// through leaves the cache unchanged rather than poisoned.
    pub fn reset(
        &mut self,
        text: impl Into<String>,
    ) -> CacheResult<()> {
        let text = text.into();
        let (pieces, piece_tokens, tokens) = self.tokenize_pieces(&text, 0)?;

        self.text = text;
        self.pieces = pieces;
        self.piece_tokens = piece_tokens;
        self.tokens = tokens;
        Ok(())
    }

    /// Hot path: append `delta` to the text, re-tokenizing only the last
    /// `backtrack_pieces` pieces plus `delta`.
    ///
    /// Returns an empty, zero-rollback delta if `delta` is empty, leaving all
    /// state bit-identical.
    pub fn append(
        &mut self,
        delta: &str,
    ) -> CacheResult<TokenDelta<E::Token>> {
        if delta.is_empty() {
            return Ok(TokenDelta { rollback_tokens: 0, tokens_to_append: Vec::new() });
        }

        if self.pieces.is_empty() {
            let prev_token_count = self.tokens.len();
            let mut new_text = self.text.clone();
            new_text.push_str(delta);
            self.reset(new_text)?;
            return Ok(TokenDelta {
                rollback_tokens: prev_token_count,
                tokens_to_append: self.tokens.clone(),
            });
        }

        let mut new_text = self.text.clone();
        new_text.push_str(delta);

        let b = self.backtrack_pieces.min(self.pieces.len());
        let start_idx = self.pieces.len() - b;
        let reprocess_start = self.pieces[start_idx].start;
        let rollback: usize = self.piece_tokens[start_idx..].iter().map(Vec::len).sum();

        let (new_pieces, new_piece_tokens, tokens_to_append) =
            self.tokenize_pieces(&new_text, reprocess_start)?;

        if new_pieces.is_empty() {
            log::debug!(
                "append: pre-tokenization pattern yielded no matches on the {} byte tail; \
                 pieces shrank by {b}",
                new_text.len() - reprocess_start,
            );
        }

        self.text = new_text;
        self.pieces.truncate(start_idx);
        self.pieces.extend(new_pieces);
        self.piece_tokens.truncate(start_idx);
        self.piece_tokens.extend(new_piece_tokens);
        self.tokens.truncate(self.tokens.len() - rollback);
        self.tokens.extend(tokens_to_append.iter().copied());

        Ok(TokenDelta { rollback_tokens: rollback, tokens_to_append })
    }

    /// Like [`append`](Self::append), but additionally cold re-tokenizes the
    /// resulting text and confirms it agrees with the incremental result.
    ///
    /// This is strictly more expensive than `append` (it pays the full
    /// re-tokenization cost every call) and exists only so an integrator can
    /// confirm their chosen `backtrack_pieces` is safe for their encoder and
    /// workload, per the verification mode called for when a static safety
    /// proof for the pattern isn't available.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::BacktrackUnsafe`] if the incremental and cold
    /// token streams disagree.
    pub fn append_verified(
        &mut self,
        delta: &str,
    ) -> CacheResult<TokenDelta<E::Token>> {
        let token_delta = self.append(delta)?;
        let cold_tokens = self.encoder.encode_ordinary(&self.text).map_err(encoder_error)?;
        if cold_tokens != self.tokens {
            return Err(CacheError::BacktrackUnsafe {
                backtrack_pieces: self.backtrack_pieces,
                incremental_len: self.tokens.len(),
                cold_len: cold_tokens.len(),
            });
        }
        Ok(token_delta)
    }

    /// Tokenize the pre-tokenization pieces of `text[from..]`, returning
    /// piece ranges (offsets absolute into `text`), per-piece tokens, and the
    /// flattened token list. Does not mutate `self`.
    fn tokenize_pieces(
        &self,
        text: &str,
        from: usize,
    ) -> CacheResult<(Vec<Piece>, Vec<Vec<E::Token>>, Vec<E::Token>)> {
        let tail = &text[from..];

        let mut pieces = Vec::new();
        let mut piece_tokens = Vec::new();
        let mut tokens = Vec::new();

        for m in self.pattern.find_iter(tail) {
            let m = m?;
            let piece_text = &tail[m.start()..m.end()];
            let toks = self.encoder.encode_single_piece(piece_text).map_err(encoder_error)?;
            pieces.push(Piece { start: from + m.start(), end: from + m.end() });
            tokens.extend(toks.iter().copied());
            piece_tokens.push(toks);
        }

        Ok((pieces, piece_tokens, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ToyEncoder;

    #[test]
    fn append_empty_is_a_no_op() {
        let mut cache = AppendOnlyPieceCache::new(ToyEncoder::new(), "hello", 2).unwrap();
        let before_tokens = cache.tokens().to_vec();
        let before_text = cache.text().to_string();

        let delta = cache.append("").unwrap();

        assert_eq!(delta, TokenDelta { rollback_tokens: 0, tokens_to_append: Vec::new() });
        assert_eq!(cache.tokens(), before_tokens.as_slice());
        assert_eq!(cache.text(), before_text);
    }

    #[test]
    fn cold_start_from_empty_text() {
        let encoder = ToyEncoder::new();
        let mut cache = AppendOnlyPieceCache::new(ToyEncoder::new(), "", 2).unwrap();
        let delta = cache.append("hello world").unwrap();

        assert_eq!(delta.rollback_tokens, 0);
        assert_eq!(delta.tokens_to_append, encoder.encode_ordinary("hello world").unwrap());
        assert_eq!(cache.tokens(), encoder.encode_ordinary("hello world").unwrap().as_slice());
    }

    #[test]
    fn append_matches_cold_retokenization() {
        let encoder = ToyEncoder::new();
        let foo_token_count = encoder.encode_ordinary("foo").unwrap().len();
        let mut cache = AppendOnlyPieceCache::new(ToyEncoder::new(), "foo", 2).unwrap();
        let delta = cache.append("bar").unwrap();

        assert_eq!(cache.tokens(), encoder.encode_ordinary("foobar").unwrap().as_slice());
        assert!(delta.rollback_tokens <= foo_token_count);
    }

    #[test]
    fn multi_turn_chat_matches_cold_retokenization() {
        let encoder = ToyEncoder::new();
        let mut cache = AppendOnlyPieceCache::new(ToyEncoder::new(), "", 2).unwrap();
        let mut full = String::new();

        for turn in 0..400 {
            let delta = format!(" turn {turn} says something interesting about the weather today.");
            full.push_str(&delta);
            cache.append(&delta).unwrap();
        }

        assert_eq!(cache.tokens(), encoder.encode_ordinary(&full).unwrap().as_slice());
    }

    #[test]
    fn reset_after_appends_matches_incremental_state() {
        let mut incremental = AppendOnlyPieceCache::new(ToyEncoder::new(), "alpha", 2).unwrap();
        incremental.append(" beta").unwrap();
        incremental.append(" gamma delta").unwrap();

        let mut cold = AppendOnlyPieceCache::new(ToyEncoder::new(), "", 2).unwrap();
        cold.reset(incremental.text().to_string()).unwrap();

        assert_eq!(cold.text(), incremental.text());
        assert_eq!(cold.tokens(), incremental.tokens());
    }

    #[test]
    fn invalid_backtrack_pieces_is_rejected() {
        let err = AppendOnlyPieceCache::new(ToyEncoder::new(), "hi", 0).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument { value: 0 }));
    }

    #[test]
    fn append_verified_detects_agreement() {
        let mut cache = AppendOnlyPieceCache::new(ToyEncoder::new(), "foo", 2).unwrap();
        cache.append_verified("bar").unwrap();
    }
}
