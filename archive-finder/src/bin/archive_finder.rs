use anyhow::{Context, Result};
use archive_finder::cli::{cancel_on_ctrl_c, init_logging, ConfigArgs, RangeArgs};
use archive_finder::Finder;
use clap::Parser;

/// Find the hourly archive files for a range of days and download them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    range: RangeArgs,

    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = cli.config.resolve()?;
    let range = cli.range.resolve(config.tz()?);

    let finder = Finder::new(config, cancel_on_ctrl_c()).context("Failed to set up finder")?;
    let summary = finder.run(&range).await?;

    println!("\n{}", summary);
    Ok(())
}
