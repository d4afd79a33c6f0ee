use std::fmt::Debug;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the checked accessors of the stratum containers.
///
/// Lookups that only need to know about presence (`get`, `contains_key`, `find`) return `Option`/`bool` instead.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The key (or position) has no value in the map.
    #[error("no value stored at {key}")]
    NotFound { key: String },

    /// A sequence handed to a set-algebra view is not sorted.
    ///
    /// Only reported by the explicit ordering check; the views themselves never verify their inputs.
    #[error("sequence is out of order at item {index}")]
    Unordered { index: usize },

    /// A slot index at or beyond the fixed length of a packed array.
    #[error("index {index} is out of range for a packed array of length {len}")]
    OutOfRange { index: usize, len: usize },
}

impl Error {
    pub fn not_found(key: &impl Debug) -> Self {
        Self::NotFound {
            key: format!("{:?}", key),
        }
    }
}
