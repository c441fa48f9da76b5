//! Main entry point for the replay tool.

use clap::Parser;
use relayink_cli::CliArgs;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting RelayInk replay");

    let args = CliArgs::parse();
    match relayink_cli::run(&args) {
        Ok(summary) => {
            if summary.rejected > 0 {
                log::warn!("{} of {} steps were rejected", summary.rejected, summary.steps);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Replay failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
