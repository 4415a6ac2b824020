mod commands;
mod config;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Command, Config};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    info!("docx-report v{}", env!("CARGO_PKG_VERSION"));

    let output = match &config.command {
        Command::Export(args) => commands::export(args)?,
        Command::Styles { template } => commands::styles(template)?,
        Command::Outline {
            template,
            as_sections,
        } => commands::outline(template, *as_sections)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
