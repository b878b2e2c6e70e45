//! # Encoder Adapter
//!
//! The boundary through which the caches reach a BPE encoder. How the
//! encoder is implemented — merge tables, vocabulary, byte-level encoding —
//! is not this crate's concern; an [`Encoder`] is just the five operations
//! below, expected to hold to their documented contracts exactly. Any
//! deviation is a bug in the adapter, not in the caches built on top of it.

/// A BPE encoder adapter.
///
/// Implementations typically wrap a real tokenizer (e.g. a `tiktoken`-style
/// `cl100k_base`/`o200k_base` encoding) behind these five operations.
pub trait Encoder {
    /// The token type this encoder emits. Equality is by value; the caches
    /// never interpret token numerics.
    type Token: Copy + Eq + std::fmt::Debug;

    /// The error type this encoder's operations can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The regex source used by the encoder for pre-tokenization, used
    /// verbatim. The adapter must not transform it.
    fn pat_str(&self) -> &str;

    /// Full cold tokenization, no special tokens.
    fn encode_ordinary(
        &self,
        text: &str,
    ) -> Result<Vec<Self::Token>, Self::Error>;

    /// Tokenize a single pre-tokenization piece, as the encoder would if that
    /// piece were matched inside a larger text. Must produce results
    /// identical to what `encode_ordinary` would emit for that piece's span.
    fn encode_single_piece(
        &self,
        piece: &str,
    ) -> Result<Vec<Self::Token>, Self::Error>;

    /// Returns a token prefix guaranteed to be a prefix of
    /// `encode_ordinary(text ++ any_extension)` for any extension, plus a
    /// list of candidate completions. This crate never reads the second
    /// element.
    fn encode_with_unstable(
        &self,
        text: &str,
    ) -> Result<(Vec<Self::Token>, Vec<Vec<Self::Token>>), Self::Error>;

    /// Inverse of encoding, on valid token sequences.
    fn decode(
        &self,
        tokens: &[Self::Token],
    ) -> Result<String, Self::Error>;
}
