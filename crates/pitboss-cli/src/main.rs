use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod app;
mod commands;
mod keys;
mod theme;

#[derive(Parser)]
#[command(name = "pitboss")]
#[command(about = "Pit Boss - terminal chat client")]
#[command(version)]
struct Cli {
    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Completion endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Color theme (dark, tokyo-night, dracula)
    #[arg(long, default_value = "dark")]
    theme: String,

    /// Directory holding saved conversations
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = pitboss_core::Settings::load();

    if let Some(ref endpoint) = cli.endpoint {
        settings.completion.endpoint = endpoint.clone();
    }
    if let Some(ref dir) = cli.state_dir {
        settings.storage.state_dir = Some(dir.clone());
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, &prompt).await?;
    } else {
        app::run_tui(settings, &cli.theme).await?;
    }

    Ok(())
}
