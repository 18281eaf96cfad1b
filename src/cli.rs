use crate::client::PredictClient;
use crate::model::{validate_message, RunConfig};
use anyhow::Result;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sms-spam-cli",
    version,
    about = "SMS spam classification client with optional TUI"
)]
pub struct Cli {
    /// Base URL of the spam classification service
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub base_url: String,

    /// Classify a single message and exit (no TUI)
    #[arg(long)]
    pub message: Option<String>,

    /// Print the raw result as JSON (requires --message)
    #[arg(long)]
    pub json: bool,

    /// HTTP request timeout
    #[arg(long, default_value = "10s")]
    pub request_timeout: humantime::Duration,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.message.is_none() {
        return Err(anyhow::anyhow!(
            "--json can only be used with --message. Use --message <TEXT> --json together."
        ));
    }

    if let Some(message) = args.message.clone() {
        return run_once(&args, &message).await;
    }

    #[cfg(feature = "tui")]
    {
        crate::tui::run(args).await
    }
    #[cfg(not(feature = "tui"))]
    {
        // Fallback when built without TUI support.
        Err(anyhow::anyhow!(
            "built without the `tui` feature; use --message <TEXT> for one-shot mode"
        ))
    }
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        base_url: args.base_url.clone(),
        request_timeout: Duration::from(args.request_timeout),
        user_agent: format!("sms-spam-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// One-shot mode: classify a single message, print text or JSON, and exit.
///
/// Validation and failure messages match the interactive path; any failure
/// surfaces its user message and a non-zero exit code.
async fn run_once(args: &Cli, message: &str) -> Result<()> {
    let trimmed = message.trim();
    if let Err(e) = validate_message(trimmed) {
        return Err(anyhow::anyhow!(e.user_message()));
    }

    let client = PredictClient::new(&build_config(args))?;
    let result = match client.classify(trimmed).await {
        Ok(r) => r,
        Err(e) => return Err(anyhow::anyhow!(e.user_message())),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in crate::text_summary::build_text_summary(&result).lines {
            println!("{line}");
        }
    }
    Ok(())
}
