//! Artifact Uploader
//!
//! Scans a directory for `campaign_*_base64.txt` artifacts and uploads
//! each payload into object storage under the campaign's key.
use clap::Parser;
use reviewops::artifact;
use reviewops::wrangler::R2;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the artifacts.
    #[arg(default_value = ".")]
    dir: PathBuf,
    #[arg(long, default_value = reviewops::BUCKET)]
    bucket: String,
    #[arg(long)]
    local: bool,
}

fn main() -> anyhow::Result<()> {
    reviewops::log();
    let args = Args::parse();
    let store = if args.local { R2::local(&args.bucket) } else { R2::remote(&args.bucket) };
    println!("{}", artifact::upload(&args.dir, &store)?);
    Ok(())
}
