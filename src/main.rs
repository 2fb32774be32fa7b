use chatline::cli::{parse_args, run_replay_file, CliCommand, USAGE, VERSION};
use chatline::logging::init_tracing;

use color_eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing("chatline=warn");

    match parse_args(std::env::args()) {
        CliCommand::Version => println!("chatline {}", VERSION),
        CliCommand::Help => print!("{}", USAGE),
        CliCommand::Replay { fixture } => {
            let reports = run_replay_file(&fixture).await?;
            for (index, report) in reports.iter().enumerate() {
                println!("== step {}: {}", index + 1, report.label);
                for line in &report.lines {
                    println!("  {}", line);
                }
                for notification in &report.notifications {
                    println!("  ! {:?}: {}", notification.level, notification.message);
                }
            }
        }
    }

    Ok(())
}
