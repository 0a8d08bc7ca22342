use std::io;
use std::time::Duration;

/// Classification of a failed send for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The counterpart is not reachable right now (no socket, refused, reset).
    Unavailable,
    /// Anything else; retrying would not help.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Fixed-delay policy: at most `max_attempts` tries, `delay` apart.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::Unavailable => RetryDecision::RetryAfter(self.delay),
            ErrorKind::Other => RetryDecision::NoRetry,
        }
    }
}

/// Classify an error chain: any I/O error meaning "nobody is listening" is
/// [`ErrorKind::Unavailable`].
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    let unavailable = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| {
            matches!(
                e.kind(),
                io::ErrorKind::NotFound
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::TimedOut
            )
        });
    if unavailable {
        ErrorKind::Unavailable
    } else {
        ErrorKind::Other
    }
}
