use crate::{PoolId, Pooled};
use std::{fmt, time::Duration};
use thiserror::Error;

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a [`BoundedPool`](crate::BoundedPool).
///
/// A failed operation leaves the pool exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No object became available before the deadline.
    #[error("no object available in pool '{pool}' after {waited:?}")]
    Timeout {
        /// Label of the pool.
        pool: String,
        /// How long the caller waited.
        waited: Duration,
    },

    /// The released object was checked out of a different pool.
    #[error("object owned by {owner} cannot be released into {pool}")]
    ForeignObject {
        /// The pool the object was released into.
        pool: PoolId,
        /// The pool the object was checked out of.
        owner: PoolId,
    },
}

/// A release that the pool refused.
///
/// Carries the reason and hands the object back so it can be returned to
/// the pool that owns it.
pub struct Rejected<T> {
    error: Error,
    object: Pooled<T>,
}

impl<T> Rejected<T> {
    pub(crate) fn new(error: Error, object: Pooled<T>) -> Self {
        Rejected { error, object }
    }

    /// The reason the release was refused.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Gives back the rejected object, still checked out.
    pub fn into_pooled(self) -> Pooled<T> {
        self.object
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("owner", &self.object.owner())
            .finish()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
