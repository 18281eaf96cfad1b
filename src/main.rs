mod cli;
mod client;
mod controller;
mod model;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

/// Initialize tracing with optional file output.
///
/// Logging is disabled by default so the TUI display is never corrupted.
/// Set `SMS_SPAM_CLI_LOG` to a file path to enable it.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let Ok(log_path) = std::env::var("SMS_SPAM_CLI_LOG") else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Ok(file) = std::fs::File::create(&log_path) else {
        eprintln!("Warning: failed to create log file: {log_path}");
        return;
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file).with_ansi(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = cli::Cli::parse();
    let is_non_tui = args.message.is_some();

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success for one-shot modes
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
