//! Error types surfaced by the cache.
//!
//! - [`CacheError`] is returned by lookups: either the key is absent and no
//!   loader could populate it, or the loader itself failed.
//! - [`ConfigError`] is returned by [`CacheBuilder::try_build`] when the
//!   configuration cannot produce a working cache.
//!
//! [`CacheBuilder::try_build`]: crate::CacheBuilder::try_build

use std::error::Error as StdError;
use std::sync::Arc;

/// Error type produced by user-supplied loaders.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error returned by [`Cache::get`](crate::Cache::get) and friends.
///
/// `Clone` so a single loader failure can be handed to every caller that was
/// waiting on the same in-flight load.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The key is not cached and there was no loader to populate it.
    #[error("key not found")]
    KeyNotFound,
    /// The loader returned an error.  Display and `source()` are those of the
    /// loader's own error.
    #[error(transparent)]
    Load(Arc<dyn StdError + Send + Sync + 'static>),
}

impl CacheError {
    pub(crate) fn load(err: BoxError) -> Self {
        CacheError::Load(Arc::from(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound)
    }

    /// Returns the loader's error as `E`, if this is a load failure of that type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            CacheError::KeyNotFound => None,
            CacheError::Load(err) => err.downcast_ref::<E>(),
        }
    }
}

/// Error returned when cache configuration parameters are invalid.
///
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use cairn::CacheBuilder;
///
/// let err = CacheBuilder::<u64, u64>::new(0).try_build().unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
