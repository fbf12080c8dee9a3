//! Failures reported by cache backends

use thiserror::Error;

/// Why a backend could not serve a request
///
/// The verification cache never surfaces these to callers: a failing
/// backend degrades to a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend is unreachable or refused the operation
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// Encoded verification result exceeds the per-entry limit
    #[error("entry of {size} bytes exceeds the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },
}

pub type CacheResult<T> = Result<T, CacheError>;
