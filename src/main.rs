use anyhow::Result;
use clap::Parser;
use release_packer::config::Cli;
use release_packer::{pipeline, CargoBuildRunner};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.resolve().await?;
    info!(
        "Packaging for {} ({} mode)",
        config.target.as_deref().unwrap_or("host"),
        config.profile_name()
    );

    let runner = CargoBuildRunner::new();
    let summary = pipeline::run(&runner, &config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
