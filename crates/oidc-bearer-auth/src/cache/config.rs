//! Cache configuration types

use std::str::FromStr;

/// Default maximum value size: 64KB of serialized claims
pub const DEFAULT_MAX_VALUE_SIZE: usize = 65_536;

/// Default entry cap of the in-memory backend
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    Noop,
    #[default]
    Memory,
}

impl FromStr for CacheBackend {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "noop" | "none" | "off" => Self::Noop,
            _ => Self::Memory,
        })
    }
}

/// Cache configuration
///
/// The TTL itself is not configured here: it is the provider's
/// revalidation time and is passed per lookup.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Cache backend type
    pub backend: CacheBackend,
    /// Maximum entries for in-memory cache
    pub max_entries: Option<usize>,
    /// Maximum size of a single cached value in bytes
    pub max_value_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            backend: CacheBackend::Memory,
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_backend(mut self, backend: CacheBackend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max;
        self
    }

    #[must_use]
    pub const fn with_max_value_size(mut self, max: usize) -> Self {
        self.max_value_size = max;
        self
    }
}
