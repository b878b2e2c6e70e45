//! # Stable-Split Function
//!
//! Pure function: given an encoder and text, find the prefix of the token
//! stream that is provably invariant under arbitrary right-extension of the
//! text, and the small text tail that is not.

use crate::encoder::Encoder;
use crate::errors::{CacheError, CacheResult, encoder_error};

/// The result of splitting a text into a stable token prefix and an unstable
/// text tail.
///
/// Invariant: `stable_text ++ unstable_text == text` (as character
/// sequences), and `stable_text` decodes exactly from `stable_tokens`.
#[derive(Debug, Clone)]
pub struct StableSplit<T> {
    /// A token prefix invariant under any right-extension of the input text.
    pub stable_tokens: Vec<T>,
    /// `decode(stable_tokens)`, a character prefix of the input text.
    pub stable_text: String,
    /// The suffix of the input text not covered by `stable_tokens`.
    pub unstable_text: String,
}

/// Split `text` into a stable token prefix and an unstable text tail.
///
/// For any extension `E`, `encoder.encode_ordinary(text ++ E)` is guaranteed
/// to begin with the returned `stable_tokens`.
///
/// # Errors
///
/// Returns [`CacheError::StableSplitMismatch`] if the encoder's
/// `encode_with_unstable` returned tokens that do not decode to a character
/// prefix of `text` — this signals an encoder or adapter defect, and is not
/// papered over here. Returns [`CacheError::EncoderError`] if the adapter
/// itself fails.
pub fn stable_split<E: Encoder>(
    encoder: &E,
    text: &str,
) -> CacheResult<StableSplit<E::Token>> {
    let (stable_tokens, _completions) = encoder.encode_with_unstable(text).map_err(encoder_error)?;
    let stable_text = encoder.decode(&stable_tokens).map_err(encoder_error)?;

    if !text.starts_with(&stable_text) {
        return Err(CacheError::StableSplitMismatch);
    }

    let unstable_text = text[stable_text.len()..].to_string();
    Ok(StableSplit {
        stable_tokens,
        stable_text,
        unstable_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ToyEncoder;

    #[test]
    fn splits_prefix_and_tail() {
        let encoder = ToyEncoder::new();
        let split = stable_split(&encoder, "hello world").unwrap();
        assert_eq!(split.stable_text.len() + split.unstable_text.len(), "hello world".len());
        assert!("hello world".starts_with(&split.stable_text));
    }

    #[test]
    fn empty_text_splits_trivially() {
        let encoder = ToyEncoder::new();
        let split = stable_split(&encoder, "").unwrap();
        assert!(split.stable_tokens.is_empty());
        assert_eq!(split.stable_text, "");
        assert_eq!(split.unstable_text, "");
    }
}
