//! Boundary with the external `wrangler` CLI.
//!
//! Every database and object-storage operation in this crate is a blocking
//! `npx wrangler ...` subprocess. This module owns the invocation plumbing,
//! the output parsing, and the error taxonomy; the pipelines above it only
//! see the [`Database`] and [`Store`] traits.
mod d1;
mod output;
mod r2;

pub use d1::*;
pub use output::*;
pub use r2::*;

use crate::Row;
use std::path::Path;
use std::process::Command;
use std::process::Output;

/// How much captured stderr to keep on a failed invocation.
const STDERR_KEEP: usize = 200;

/// Failure modes at the CLI boundary.
///
/// Transport errors ([`Io`](Error::Io), [`Status`](Error::Status)) are
/// distinct from parse errors ([`NoJson`](Error::NoJson),
/// [`Json`](Error::Json)) so callers can tell "the CLI failed" apart from
/// "the CLI replied with something unexpected".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o around the wrangler call failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("wrangler exited with status {code:?}: {stderr}")]
    Status { code: Option<i32>, stderr: String },
    #[error("no JSON array in wrangler output")]
    NoJson,
    #[error("malformed JSON in wrangler output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database defines the read/write interface between the pipelines and the
/// database CLI. All SQL execution is consolidated behind it, decoupling
/// subprocess plumbing from batch logic.
pub trait Database {
    /// Run a SELECT and return its result rows.
    fn select(&self, sql: &str) -> Result<Vec<Row>, Error>;
    /// Run a write statement; success is the exit status.
    fn apply(&self, sql: &str) -> Result<(), Error>;
    /// Execute a SQL script file in one invocation.
    fn apply_script(&self, path: &Path) -> Result<(), Error>;
}

/// Store defines the upload interface between the pipelines and the
/// object-storage CLI.
pub trait Store {
    /// Upload bytes under a key. No retries, no post-upload verification.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), Error>;
}

/// Run a prepared command to completion, capturing both streams.
/// Non-zero exit becomes [`Error::Status`] with truncated stderr.
pub(crate) fn run(cmd: &mut Command) -> Result<Output, Error> {
    log::debug!("exec {:?}", cmd);
    let out = cmd.output()?;
    if out.status.success() {
        Ok(out)
    } else {
        Err(Error::Status {
            code: out.status.code(),
            stderr: crate::ellipsize(&String::from_utf8_lossy(&out.stderr), STDERR_KEEP),
        })
    }
}
