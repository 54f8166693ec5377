use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

pub trait CancelToken: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> CancelToken for F
where
    F: Fn() -> bool + Send + Sync,
{
    #[inline]
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Cancelled as soon as the shared generation moves past the one this token
/// was issued for. Bumping the counter retires every outstanding run at once.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    current: Arc<AtomicU64>,
    issued: u64,
}

impl GenerationToken {
    #[must_use]
    pub fn new(current: Arc<AtomicU64>, issued: u64) -> Self {
        Self { current, issued }
    }

    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl CancelToken for GenerationToken {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.issued
    }
}
