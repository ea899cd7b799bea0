//! Base64 → Object Storage Migration
//!
//! Moves inline image payloads out of the database and into object
//! storage, repointing each row at its uploaded object.
//!
//! Subcommands: run (everything, one batched repoint script), batch
//! (bounded id range, per-row repoint), recover (table-format fallback,
//! upload only).
use clap::Parser;
use clap::Subcommand;
use reviewops::migrate;
use reviewops::report::RowPolicy;
use reviewops::wrangler::D1;
use reviewops::wrangler::R2;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// D1 database to read and repoint.
    #[arg(long, default_value = reviewops::DATABASE)]
    database: String,
    /// R2 bucket uploads land in.
    #[arg(long, default_value = reviewops::BUCKET)]
    bucket: String,
    /// Target the local simulator instead of production.
    #[arg(long)]
    local: bool,
    /// Stop at the first row failure instead of counting and continuing.
    #[arg(long)]
    abort_on_error: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Migrate every base64 thumbnail, repointing rows with one batched script",
        alias = "all"
    )]
    Run {
        #[arg(long, default_value = "migrate_to_r2_urls.sql")]
        script: PathBuf,
    },
    #[command(about = "Migrate a bounded id range, repointing each row as it uploads")]
    Batch {
        #[arg(long, default_value_t = 1)]
        start_id: i64,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    #[command(about = "Re-upload payloads parsed from table-format output; rows keep their pointers")]
    Recover,
}

fn main() -> anyhow::Result<()> {
    reviewops::log();
    let args = Args::parse();
    let db = if args.local { D1::local(&args.database) } else { D1::remote(&args.database) };
    let store = if args.local { R2::local(&args.bucket) } else { R2::remote(&args.bucket) };
    let policy = if args.abort_on_error { RowPolicy::Abort } else { RowPolicy::SkipAndCount };
    match args.command {
        Command::Run { script } => {
            let opts = migrate::Options {
                record: migrate::Record::Deferred(script),
                policy,
                batch: None,
            };
            println!("{}", migrate::run(&db, &store, &opts)?.tally);
        }
        Command::Batch { start_id, limit } => {
            let opts = migrate::Options {
                record: migrate::Record::Immediate,
                policy,
                batch: Some(migrate::Batch { start_id, limit }),
            };
            let summary = migrate::run(&db, &store, &opts)?;
            println!("{}", summary.tally);
            if let Some(next) = summary.next {
                println!("next: migrate batch --start-id {}", next);
            }
        }
        Command::Recover => {
            let rows = db.query_table(migrate::SELECT_ALL)?;
            println!("{}", migrate::recover(rows, &store)?);
        }
    }
    Ok(())
}
