#![warn(missing_docs, unused)]
//! # `bpecache`
//!
//! Incremental BPE tokenization caches for two workloads that dominate
//! repeated tokenization of text sharing large immutable regions with
//! previously tokenized input:
//!
//! * **Fixed-prefix reuse** — many independent inputs of the shape
//!   `prefix ++ suffix_i`, where `prefix` (a long system/template prompt) is
//!   constant. See [`FixedPrefixCache`].
//! * **Append-only growth** — a single buffer that grows monotonically by
//!   appending short deltas (a chat transcript). See [`AppendOnlyPieceCache`].
//!
//! Both caches produce token sequences **bit-identical** to a full cold
//! `encoder.encode_ordinary(text)` call; they only change where the work is
//! spent, not what is computed. The underlying BPE encoder is an opaque
//! collaborator behind the [`Encoder`] trait — this crate has no opinion on
//! merge tables, vocabularies, or byte-level encoding.
//!
//! ## Crate Features
#![doc = document_features::document_features!()]

mod append_only;
mod encoder;
mod errors;
mod fixed_prefix;
mod stable_split;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use append_only::{AppendOnlyPieceCache, Piece, TokenDelta};
pub use encoder::Encoder;
pub use errors::{CacheError, CacheResult};
pub use fixed_prefix::FixedPrefixCache;
pub use stable_split::{StableSplit, stable_split};
