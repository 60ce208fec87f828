//! Cooperative cancellation for ranking calls.
//!
//! Corpus size is up to the caller, so a ranking call can take a while. A
//! [`Cancellation`] is checked once per document (tokenization and scoring); when it
//! trips, the call returns [`Error::Cancelled`] or [`Error::DeadlineExceeded`] instead of
//! a partial ranking.

use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline and/or shared cancel flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    flag: Option<Arc<AtomicBool>>,
}

impl Cancellation {
    /// Never trips.
    pub fn none() -> Self {
        Self::default()
    }

    /// Trip once `deadline` has passed.
    pub fn until(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            flag: None,
        }
    }

    /// Trip once `timeout` has elapsed from now.
    pub fn after(timeout: Duration) -> Self {
        Self::until(Instant::now() + timeout)
    }

    /// Trip when `flag` is set (by any thread).
    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.flag = Some(flag);
        self
    }

    /// `Ok(())` while the call may continue.
    ///
    /// A raised flag wins over an expired deadline.
    pub fn check(&self) -> Result<()> {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
