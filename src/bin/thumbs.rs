//! Gradient Thumbnail Generator
//!
//! Renders placeholder campaign thumbnails: themed gradients with a glyph
//! overlay written as data-URI artifacts, or plain gradients uploaded
//! straight to object storage for campaigns with no image at all.
use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use reviewops::thumb;
use reviewops::wrangler::R2;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Render themed gradient thumbnails to data-uri artifacts", alias = "gen")]
    Generate {
        /// JSON theme manifest; the built-in campaign palette when omitted.
        #[arg(long)]
        themes: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    #[command(about = "Upload plain gradient placeholders for campaigns with no image")]
    Fill {
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
        #[arg(long, default_value = reviewops::BUCKET)]
        bucket: String,
        #[arg(long)]
        local: bool,
    },
}

fn main() -> anyhow::Result<()> {
    reviewops::log();
    match Args::parse().command {
        Command::Generate { themes, out } => {
            let entries = match themes {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading theme manifest {}", path.display()))?;
                    serde_json::from_str(&text).context("parsing theme manifest")?
                }
                None => thumb::campaign_palette(),
            };
            println!("{}", thumb::generate(&entries, &out));
        }
        Command::Fill { ids, bucket, local } => {
            let store = if local { R2::local(&bucket) } else { R2::remote(&bucket) };
            println!("{}", thumb::fill(&ids, &store));
        }
    }
    Ok(())
}
