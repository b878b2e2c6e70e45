//! # Fixed-Prefix Cache
//!
//! Exact tokenization for many strings of the shape `prefix ++ suffix`, for a
//! constant `prefix` (e.g. a long system/template prompt) and many varying
//! `suffix` values. Caches the stable token prefix of `prefix` once at
//! construction, and re-encodes only the small unstable tail plus `suffix`
//! on each call.

use crate::encoder::Encoder;
use crate::errors::{CacheResult, encoder_error};
use crate::stable_split::stable_split;

/// Exact tokenization cache for fixed-prefix reuse.
///
/// Cost per [`encode_ordinary`](Self::encode_ordinary) call is proportional
/// to `unstable_prefix_char_count() + suffix.len()`, independent of the
/// length of `prefix`. The stable portion is paid once, at construction.
pub struct FixedPrefixCache<E: Encoder> {
    encoder: E,
    prefix: String,
    stable_tokens: Vec<E::Token>,
    unstable_text: String,
}

impl<E: Encoder> FixedPrefixCache<E> {
    /// Build a cache from a template prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StableSplitMismatch`](crate::CacheError::StableSplitMismatch)
    /// or [`CacheError::EncoderError`](crate::CacheError::EncoderError) if the
    /// encoder's stable-split contract is violated. This is the only failure
    /// mode; `encode_ordinary` cannot fail afterward.
    pub fn new(
        encoder: E,
        prefix: impl Into<String>,
    ) -> CacheResult<Self> {
        let prefix = prefix.into();
        let split = stable_split(&encoder, &prefix)?;

        log::debug!(
            "FixedPrefixCache: {} char prefix split into {} stable tokens + {} unstable chars",
            prefix.chars().count(),
            split.stable_tokens.len(),
            split.unstable_text.chars().count(),
        );

        Ok(Self {
            encoder,
            prefix,
            stable_tokens: split.stable_tokens,
            unstable_text: split.unstable_text,
        })
    }

    /// The original template text this cache was built from.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Length of the stable token prefix. Constant time.
    pub fn stable_prefix_token_count(&self) -> usize {
        self.stable_tokens.len()
    }

    /// Character length of the unstable tail of the prefix. Constant time.
    pub fn unstable_prefix_char_count(&self) -> usize {
        self.unstable_text.chars().count()
    }

    /// Encode `prefix ++ suffix` exactly, reusing the cached stable prefix.
    ///
    /// Equivalent to `encoder.encode_ordinary(prefix ++ suffix)`.
    pub fn encode_ordinary(
        &self,
        suffix: &str,
    ) -> CacheResult<Vec<E::Token>> {
        let mut tokens = self.stable_tokens.clone();
        tokens.extend(self.encode_ordinary_tail(suffix)?);
        Ok(tokens)
    }

    /// Encode just the tail tokens (unstable prefix tail ++ suffix), so
    /// callers with their own token storage can avoid a concatenation.
    pub fn encode_ordinary_tail(
        &self,
        suffix: &str,
    ) -> CacheResult<Vec<E::Token>> {
        let mut tail = String::with_capacity(self.unstable_text.len() + suffix.len());
        tail.push_str(&self.unstable_text);
        tail.push_str(suffix);
        self.encoder.encode_ordinary(&tail).map_err(encoder_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ToyEncoder;

    #[test]
    fn empty_prefix_matches_cold_encode() {
        let encoder = ToyEncoder::new();
        let cache = FixedPrefixCache::new(ToyEncoder::new(), "").unwrap();
        assert_eq!(
            cache.encode_ordinary("hello").unwrap(),
            encoder.encode_ordinary("hello").unwrap()
        );
    }

    #[test]
    fn empty_suffix_matches_cold_encode() {
        let prefix = "A long system prompt.\n";
        let encoder = ToyEncoder::new();
        let cache = FixedPrefixCache::new(ToyEncoder::new(), prefix).unwrap();
        assert_eq!(
            cache.encode_ordinary("").unwrap(),
            encoder.encode_ordinary(prefix).unwrap()
        );
    }

    #[test]
    fn prefix_plus_suffix_matches_cold_encode() {
        let prefix = "The quick brown fox jumps over ";
        let suffix = "the lazy dog.";
        let encoder = ToyEncoder::new();
        let cache = FixedPrefixCache::new(ToyEncoder::new(), prefix).unwrap();
        let combined = format!("{prefix}{suffix}");
        assert_eq!(
            cache.encode_ordinary(suffix).unwrap(),
            encoder.encode_ordinary(&combined).unwrap()
        );
    }

    #[test]
    fn stable_and_unstable_counts_are_consistent() {
        let prefix = "system: you are a helpful assistant.\n";
        let cache = FixedPrefixCache::new(ToyEncoder::new(), prefix).unwrap();
        assert!(cache.stable_prefix_token_count() <= prefix.len());
        assert!(cache.unstable_prefix_char_count() <= prefix.chars().count());
    }
}
