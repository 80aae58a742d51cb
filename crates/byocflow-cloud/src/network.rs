//! Network error classification and connectivity retry

use crate::backoff::Backoff;
use std::error::Error as StdError;
use std::future::Future;
use std::io;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Lower-cased message fragments that mark a transient network failure.
///
/// The HTTP stack does not wrap every transient failure in a typed error,
/// so messages are matched as a fallback.
const NETWORK_ERROR_PATTERNS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection timeout",
    "network unreachable",
    "temporary failure",
    "timeout",
    "no such host",
    "i/o timeout",
    "tls handshake timeout",
    "context deadline exceeded",
];

/// Network retries were exhausted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("network retries exhausted after {attempts} attempts: {message}")]
pub struct NetworkGiveUpError {
    pub attempts: u32,
    pub message: String,
}

impl NetworkGiveUpError {
    pub fn new(attempts: u32, message: impl Into<String>) -> Self {
        Self {
            attempts,
            message: message.into(),
        }
    }
}

/// Whether `err` is a transient network condition rather than an
/// application error. `None` is never a network error.
pub fn is_network_error(err: Option<&(dyn StdError + 'static)>) -> bool {
    let mut current = err;
    while let Some(e) = current {
        if is_transport_error(e) || matches_network_message(&e.to_string()) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Whether `err` (or anything in its source chain) is a [`NetworkGiveUpError`]
pub fn is_network_give_up(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<NetworkGiveUpError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn is_transport_error(err: &(dyn StdError + 'static)) -> bool {
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        return e.is_timeout() || e.is_connect();
    }

    if let Some(e) = err.downcast_ref::<io::Error>() {
        return matches!(
            e.kind(),
            io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::TimedOut
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::NetworkUnreachable
                | io::ErrorKind::HostUnreachable
        );
    }

    err.is::<tokio::time::error::Elapsed>()
}

fn matches_network_message(message: &str) -> bool {
    let message = message.to_lowercase();
    NETWORK_ERROR_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

/// Runs `op` until it succeeds, fails with a non-network error, or
/// `max_attempts` network failures have been seen.
///
/// Waits between attempts follow `backoff` (normally [`Backoff::network`])
/// and never run past `deadline`. Exhaustion, cancellation and reaching the
/// deadline all surface as [`NetworkGiveUpError`] converted into the
/// caller's error type.
pub async fn retry_network<T, E, F, Fut>(
    cancel: &CancellationToken,
    backoff: &Backoff,
    max_attempts: u32,
    deadline: Option<Instant>,
    mut op: F,
) -> Result<T, E>
where
    E: StdError + From<NetworkGiveUpError> + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !is_network_error(Some(&error as &(dyn StdError + 'static))) {
            return Err(error);
        }

        if attempt >= max_attempts {
            tracing::warn!(attempt, error = %error, "giving up after network errors");
            return Err(NetworkGiveUpError::new(attempt, error.to_string()).into());
        }

        let wait = backoff.delay(attempt);
        tracing::warn!(
            attempt,
            error = %error,
            wait_ms = wait.as_millis() as u64,
            "network error, retrying"
        );

        let now = Instant::now();
        let wake = match deadline {
            Some(deadline) => deadline.min(now + wait),
            None => now + wait,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(NetworkGiveUpError::new(
                    attempt,
                    format!("cancelled while retrying: {}", error),
                )
                .into());
            }
            _ = tokio::time::sleep_until(wake) => {}
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::warn!(attempt, error = %error, "deadline reached during network retries");
            return Err(NetworkGiveUpError::new(
                attempt,
                format!("deadline reached while retrying: {}", error),
            )
            .into());
        }
    }
}
