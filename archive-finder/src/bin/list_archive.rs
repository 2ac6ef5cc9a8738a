use std::path::PathBuf;

use anyhow::{Context, Result};
use archive_finder::cli::{cancel_on_ctrl_c, init_logging, ConfigArgs, RangeArgs};
use archive_finder::{readable_name, save_listing, Finder};
use clap::Parser;

/// Find the hourly archive files for a range of days without downloading them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    range: RangeArgs,

    #[command(flatten)]
    config: ConfigArgs,

    /// Where to save the JSON listing
    #[arg(long, default_value = "listing.json")]
    listing: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = cli.config.resolve()?;
    let tz = config.tz()?;
    let range = cli.range.resolve(tz);

    let finder = Finder::new(config, cancel_on_ctrl_c()).context("Failed to set up finder")?;
    let (anchors, summary) = finder.list(&range).await?;

    if !anchors.is_empty() {
        println!("\nArchive files:");
        for (index, anchor) in anchors.iter().enumerate() {
            println!(
                "{}. {} ({})",
                index + 1,
                readable_name(anchor.timestamp, tz),
                anchor.url
            );
        }
    }

    save_listing(&anchors, &cli.listing)?;
    println!("\nListing saved to {}", cli.listing.display());
    println!("\n{}", summary);
    Ok(())
}
