//! # Error Types

/// Errors from `bpecache` cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// `backtrack_pieces` was zero (or otherwise invalid) at construction.
    #[error("backtrack_pieces must be >= 1, got {value}")]
    InvalidArgument {
        /// The invalid value supplied.
        value: usize,
    },

    /// The encoder's `encode_with_unstable` returned a token prefix that does
    /// not decode to a character prefix of the input. This indicates a defect
    /// in the encoder or its adapter, not in the cache.
    #[error("stable token prefix does not decode to a character prefix of the input text")]
    StableSplitMismatch,

    /// The pre-tokenization pattern failed to compile or a match attempt
    /// failed (`fancy_regex` can fail on pathological inputs).
    #[error("pre-tokenization pattern error: {0}")]
    Pattern(#[from] fancy_regex::Error),

    /// A failure propagated from the [`Encoder`](crate::Encoder) adapter.
    ///
    /// The cache's state after this error is undefined; callers should
    /// discard the cache rather than continue operating on it.
    #[error("encoder error: {0}")]
    EncoderError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// [`AppendOnlyPieceCache::append_verified`](crate::AppendOnlyPieceCache::append_verified)
    /// found that the incrementally produced token stream disagrees with a
    /// cold re-tokenization of the same text. This means `backtrack_pieces`
    /// is too small for the encoder's pre-tokenization pattern.
    #[error(
        "backtrack_pieces={backtrack_pieces} is unsafe for this encoder: incremental append \
         produced {incremental_len} tokens, cold re-tokenization produced {cold_len} tokens \
         for the same text"
    )]
    BacktrackUnsafe {
        /// The `backtrack_pieces` value in effect when the mismatch was detected.
        backtrack_pieces: usize,
        /// Token count produced by the incremental append path.
        incremental_len: usize,
        /// Token count produced by cold re-tokenization.
        cold_len: usize,
    },
}

/// Result type for `bpecache` operations.
pub type CacheResult<T> = core::result::Result<T, CacheError>;

/// Wrap an adapter-supplied error as a [`CacheError::EncoderError`].
pub(crate) fn encoder_error<E>(err: E) -> CacheError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CacheError::EncoderError(Box::new(err))
}
