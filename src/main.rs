//! SU Curries CLI

use std::process::ExitCode;

use clap::Parser;
use su_curries::config;

use crate::cli::Cli;

mod cli;
mod observability;

#[tokio::main]
pub async fn main() -> ExitCode {
    config::load_dotenv();

    let cli = Cli::parse();

    if let Err(error) = observability::init(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging is not initialised, stderr is the only channel"
        )]
        {
            eprintln!("{error}");
        }

        return ExitCode::FAILURE;
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            #[expect(clippy::print_stderr, reason = "command errors are reported to the user")]
            {
                eprintln!("{error}");
            }

            ExitCode::FAILURE
        }
    }
}
