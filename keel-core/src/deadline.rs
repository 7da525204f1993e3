use crate::{Error, Result};
use std::time::{Duration, Instant};

/// Ambient time budget of the enclosing transaction.
pub trait DeadlineSource {
    /// Seconds left before the transaction times out, zero or negative when there is no deadline.
    fn remaining_budget(&self) -> Result<i64>;
}

impl<F> DeadlineSource for F
where
    F: Fn() -> Result<i64>,
{
    fn remaining_budget(&self) -> Result<i64> {
        self()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeadline;

impl DeadlineSource for NoDeadline {
    fn remaining_budget(&self) -> Result<i64> {
        Ok(-1)
    }
}

/// Tracks the timeout of the transaction currently running on a logical connection.
#[derive(Debug, Default, Clone)]
pub struct TransactionTimer {
    expires_at: Option<Instant>,
}

impl TransactionTimer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Start timing a transaction, `None` means the transaction never times out.
    pub fn begin(&mut self, timeout: Option<Duration>) {
        self.expires_at = timeout.map(|v| Instant::now() + v);
    }

    pub fn end(&mut self) {
        self.expires_at = None;
    }

    pub fn is_timed(&self) -> bool {
        self.expires_at.is_some()
    }
}

impl DeadlineSource for TransactionTimer {
    fn remaining_budget(&self) -> Result<i64> {
        let Some(expires_at) = self.expires_at else {
            return Ok(-1);
        };
        let remaining = expires_at.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::msg("The transaction timeout expired"));
        }
        // Rounded up, a transaction with some time left never reports zero
        let seconds = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Ok(i64::try_from(seconds).unwrap_or(i64::MAX))
    }
}
