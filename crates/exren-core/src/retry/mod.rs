//! Retry policy for messages to a counterpart that may be asleep.
//!
//! A message is tried at most `max_attempts` times with a fixed delay in
//! between, and only when the failure says the counterpart is unavailable.
//! What to do after the last failure is the caller's fallback.

mod policy;
mod run;

pub use policy::{classify, ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
