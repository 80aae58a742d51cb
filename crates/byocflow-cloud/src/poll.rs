//! Poll engine
//!
//! Repeatedly invokes a probe until it produces a value, reports a halting
//! error, or the deadline passes. Exactly one probe runs at a time; the
//! wait between attempts races the backoff timer against the deadline and
//! the caller's [`CancellationToken`].

use crate::backoff::Backoff;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Probe failure, tagged with whether polling should stop
#[derive(Debug)]
pub struct RetriableError<E> {
    pub error: E,
    pub halt: bool,
}

impl<E> RetriableError<E> {
    /// Expected intermediate state: keep polling
    pub fn retry(error: E) -> Self {
        Self { error, halt: false }
    }

    /// Final failure: stop polling and surface `error`
    pub fn halt(error: E) -> Self {
        Self { error, halt: true }
    }

    pub fn into_inner(self) -> E {
        self.error
    }
}

/// Terminal outcome of a failed poll
#[derive(Debug)]
pub enum PollError<E> {
    /// The probe reported a halting error; surfaced verbatim
    Halted(E),

    /// The deadline passed while only transient errors were observed
    Timeout {
        timeout: Duration,
        attempts: u32,
        last: Option<E>,
    },

    /// The caller cancelled while the engine was waiting
    Cancelled { attempts: u32, last: Option<E> },
}

impl<E> PollError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, PollError::Halted(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollError::Cancelled { .. })
    }

    /// The halting error, or the last transient error seen before giving up
    pub fn last_error(&self) -> Option<&E> {
        match self {
            PollError::Halted(e) => Some(e),
            PollError::Timeout { last, .. } | PollError::Cancelled { last, .. } => last.as_ref(),
        }
    }

    pub fn attempts(&self) -> Option<u32> {
        match self {
            PollError::Halted(_) => None,
            PollError::Timeout { attempts, .. } | PollError::Cancelled { attempts, .. } => {
                Some(*attempts)
            }
        }
    }
}

impl<E: fmt::Display> fmt::Display for PollError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Halted(e) => write!(f, "{}", e),
            PollError::Timeout {
                timeout,
                attempts,
                last,
            } => {
                write!(f, "timeout after {:?} ({} attempts)", timeout, attempts)?;
                if let Some(e) = last {
                    write!(f, ", last error: {}", e)?;
                }
                Ok(())
            }
            PollError::Cancelled { attempts, last } => {
                write!(f, "cancelled after {} attempts", attempts)?;
                if let Some(e) = last {
                    write!(f, ", last error: {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl<E: StdError + 'static> StdError for PollError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            // Display already forwards to the halted error
            PollError::Halted(e) => e.source(),
            PollError::Timeout { last, .. } | PollError::Cancelled { last, .. } => {
                last.as_ref().map(|e| e as &(dyn StdError + 'static))
            }
        }
    }
}

/// Poll engine bound to one timeout and backoff
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    timeout: Duration,
    backoff: Backoff,
}

impl Poller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            backoff: Backoff::generic(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Invoke `probe` until it yields a value, halts, or the poll runs out
    /// of time.
    ///
    /// The probe always runs at least once. An in-flight probe is never
    /// interrupted; cancellation and the deadline are observed only while
    /// waiting between attempts.
    pub async fn poll<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut probe: F,
    ) -> Result<T, PollError<E>>
    where
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RetriableError<E>>>,
    {
        // `None` when the timeout is too large to represent: wait forever
        let deadline = Instant::now().checked_add(self.timeout);
        let mut attempt = 0u32;

        loop {
            attempt = attempt.saturating_add(1);

            let error = match probe().await {
                Ok(value) => {
                    tracing::debug!(attempt, "probe succeeded");
                    return Ok(value);
                }
                Err(RetriableError { error, halt: true }) => {
                    tracing::warn!(attempt, error = %error, "probe halted");
                    return Err(PollError::Halted(error));
                }
                Err(RetriableError { error, .. }) => error,
            };

            let wait = self.backoff.delay(attempt);
            tracing::debug!(
                attempt,
                error = %error,
                wait_ms = wait.as_millis() as u64,
                "probe not ready"
            );
            let last = Some(error);

            let now = Instant::now();
            let wake = match deadline {
                Some(deadline) => deadline.min(now + wait),
                None => now + wait,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(attempt, "poll cancelled");
                    return Err(PollError::Cancelled { attempts: attempt, last });
                }
                _ = tokio::time::sleep_until(wake) => {}
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::warn!(attempt, timeout = ?self.timeout, "poll timed out");
                return Err(PollError::Timeout {
                    timeout: self.timeout,
                    attempts: attempt,
                    last,
                });
            }
        }
    }
}

/// [`Poller::poll`] with the generic backoff
pub async fn poll<T, E, F, Fut>(
    cancel: &CancellationToken,
    timeout: Duration,
    probe: F,
) -> Result<T, PollError<E>>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetriableError<E>>>,
{
    Poller::new(timeout).poll(cancel, probe).await
}
