use std::{borrow::Cow, time::Duration};

/// Settings applied to a [`BoundedPool`](crate::BoundedPool) at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Name attached to log events and errors emitted by the pool.
    pub label: Cow<'static, str>,
    /// Upper bound on how long [`BoundedPool::get`](crate::BoundedPool::get)
    /// and [`BoundedPool::get_rc`](crate::BoundedPool::get_rc) wait for an
    /// object. `None` waits forever.
    pub acquire_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Creates the default configuration: label `"pool"`, no timeout.
    pub fn new() -> Self {
        PoolConfig {
            label: Cow::Borrowed("pool"),
            acquire_timeout: None,
        }
    }

    /// Sets the label used in log events and errors.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Bounds guarded acquisition to `timeout`.
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
