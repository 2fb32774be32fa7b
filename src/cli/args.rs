//! Command-line argument parsing for the chatline binary.

use std::path::PathBuf;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Print usage
    Help,
    /// Replay a fixture script and print the display list after each step
    Replay { fixture: PathBuf },
}

/// Parse command-line arguments and return the appropriate command.
///
/// `replay <file>` and a bare `<file>` both replay; anything unrecognised
/// prints usage.
///
/// # Examples
///
/// ```
/// use chatline::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["chatline".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "replay" => {
                return match args.next() {
                    Some(path) => CliCommand::Replay {
                        fixture: PathBuf::from(path),
                    },
                    None => CliCommand::Help,
                }
            }
            flag if flag.starts_with('-') => {}
            path => {
                return CliCommand::Replay {
                    fixture: PathBuf::from(path),
                }
            }
        }
    }
    CliCommand::Help
}
