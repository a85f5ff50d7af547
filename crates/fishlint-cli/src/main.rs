//! fishlint entry point.
//!
//! ```bash
//! fishlint script.fish          # check a file
//! fishlint < script.fish        # check standard input
//! RUST_LOG=fishlint_kernel=trace fishlint script.fish
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fishlint_cli::Args;

fn main() -> ExitCode {
    // Logs go to stderr so they never mix with the report
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match fishlint_cli::run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}
