use joblog_core::logging;

mod cli;
mod tui;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // The dashboard owns the terminal, so a logging failure is reported
    // now or never.
    if let Err(err) = logging::init_logging() {
        eprintln!("joblog warning: logging disabled: {:#}", err);
    }

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("joblog error: {:#}", err);
        std::process::exit(1);
    }
}
