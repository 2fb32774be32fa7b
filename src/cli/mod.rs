//! CLI module for chatline.
//!
//! The binary replays fixture scripts through a [`crate::context::ChatContext`]
//! backed by the mock backend, which makes merge behaviour easy to inspect:
//!
//! ```ignore
//! use chatline::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args()) {
//!     CliCommand::Replay { fixture } => { /* run_replay_file(&fixture).await */ }
//!     CliCommand::Version => println!("chatline {}", chatline::cli::VERSION),
//!     CliCommand::Help => print!("{}", chatline::cli::USAGE),
//! }
//! ```

pub mod args;
pub mod replay;

pub use args::{parse_args, CliCommand};
pub use replay::{render_message, run_replay, run_replay_file, Fixture, ReplayStep, StepReport};

/// The current version of chatline, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "\
Usage: chatline [replay] <fixture.json>
       chatline --version

Replays a JSON script of list, deltas, send, attach and thread steps and
prints the display list after each step.
";
