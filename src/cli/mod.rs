//! CLI module for tokenwire.
//!
//! - Argument parsing
//! - Version display
//! - Terminal output of streamed events
//! - Log level and exit code selection
//!
//! # Usage
//!
//! ```ignore
//! use tokenwire::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args()) {
//!     CliCommand::Stream(args) => { /* run the session */ }
//!     other => { /* version, help, usage error */ }
//! }
//! ```

pub mod args;
pub mod output;
pub mod version;

pub use args::{parse_args, CliCommand, StreamArgs};
pub use output::TerminalSink;
pub use version::{handle_version_command, VERSION};

use crate::stream::SessionOutcome;

/// Usage text printed by `--help` and on argument errors.
pub const USAGE: &str = "\
Usage: tokenwire <url> [options]

Streams a POST to <url> and prints tokens as they arrive.

Options:
  -p, --payload <json>  Request body (default: {})
      --strict          Stop on malformed token frames
      --no-inference    Ignore frames without an event name
  -v, -vv, -vvv         More logging (RUST_LOG overrides)
  -V, --version         Print version
  -h, --help            Print this help";

/// Exit code for an aborted session (128 + SIGINT).
pub const EXIT_ABORTED: i32 = 130;

/// Default log filter for a given number of `-v` flags.
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Process exit code for a session outcome.
pub fn exit_code(outcome: Option<&SessionOutcome>) -> i32 {
    match outcome {
        Some(SessionOutcome::Done(_)) => 0,
        Some(SessionOutcome::Aborted) => EXIT_ABORTED,
        Some(SessionOutcome::Error(_)) | None => 1,
    }
}
