// SPDX-License-Identifier: MPL-2.0
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use video_viewport::app::{self, Flags};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let flags = match Flags::from_env() {
        Ok(Some(flags)) => flags,
        Ok(None) => {
            println!("{}", app::USAGE);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}\n\n{}", app::USAGE);
            return ExitCode::from(2);
        }
    };

    match app::run(flags) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
