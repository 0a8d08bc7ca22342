//! CLI parse tests, socket round trips and offline fallbacks.

use super::{Cli, CliCommand};
use clap::Parser;
use exren_core::retry::RetryPolicy;
use std::time::Duration;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

/// Two attempts, short delay: enough to exercise the retry without slowing tests.
pub(super) fn quick() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        delay: Duration::from_millis(50),
    }
}

mod fallback;
