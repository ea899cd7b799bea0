//! Production → Local Database Sync
//!
//! Copies every production table into the local database in referential
//! dependency order, either as one batched SQL script or row by row.
use clap::Parser;
use clap::ValueEnum;
use reviewops::sync;
use reviewops::wrangler::D1;
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// One guarded SQL script, applied in a single CLI call.
    Script,
    /// One CLI call per statement; slower, but each table stands alone.
    Rows,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value = "script")]
    mode: Mode,
    #[arg(long, default_value = reviewops::DATABASE)]
    database: String,
    /// Where the batched sync script is written in script mode.
    #[arg(long, default_value = "prod-to-local-sync.sql")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    reviewops::log();
    let args = Args::parse();
    let remote = D1::remote(&args.database);
    let local = D1::local(&args.database);
    let schema = sync::Schema::production();
    let outcome = match args.mode {
        Mode::Script => sync::script(&remote, &local, &schema, &args.out)?,
        Mode::Rows => sync::rows(&remote, &local, &schema)?,
    };
    println!("{} tables synced", outcome.synced);
    if !outcome.clean() {
        anyhow::bail!("failed tables: {}", outcome.failed.join(", "));
    }
    Ok(())
}
