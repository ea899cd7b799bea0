use super::Database;
use super::Error;
use crate::Row;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

/// Which side of the database the CLI talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Remote,
    Local,
}

impl Mode {
    const fn flag(self) -> &'static str {
        match self {
            Self::Remote => "--remote",
            Self::Local => "--local",
        }
    }
}

/// Handle on one D1 database in one mode. Every call is a fresh
/// `npx wrangler d1 execute` subprocess.
pub struct D1 {
    database: String,
    mode: Mode,
    cwd: Option<PathBuf>,
}

impl D1 {
    pub fn remote(database: &str) -> Self {
        Self::new(database, Mode::Remote)
    }

    pub fn local(database: &str) -> Self {
        Self::new(database, Mode::Local)
    }

    pub fn new(database: &str, mode: Mode) -> Self {
        Self {
            database: database.to_string(),
            mode,
            cwd: None,
        }
    }

    /// Run from the webapp checkout so the CLI picks up its wrangler config.
    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("npx");
        cmd.args(["wrangler", "d1", "execute", &self.database, self.mode.flag()]);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// SELECT without `--json`: parse the human-readable pipe table instead.
    /// Only the image recovery path needs this fallback format.
    pub fn query_table(&self, sql: &str) -> Result<Vec<Vec<String>>, Error> {
        let mut cmd = self.command();
        cmd.args(["--command", sql]);
        let out = super::run(&mut cmd)?;
        Ok(super::table(&String::from_utf8_lossy(&out.stdout)))
    }
}

impl Database for D1 {
    fn select(&self, sql: &str) -> Result<Vec<Row>, Error> {
        let mut cmd = self.command();
        cmd.args(["--command", sql, "--json"]);
        let out = super::run(&mut cmd)?;
        super::results(&String::from_utf8_lossy(&out.stdout))
    }

    fn apply(&self, sql: &str) -> Result<(), Error> {
        let mut cmd = self.command();
        cmd.args(["--command", sql]);
        super::run(&mut cmd).map(|_| ())
    }

    fn apply_script(&self, path: &Path) -> Result<(), Error> {
        let mut cmd = self.command();
        cmd.arg("--file").arg(path);
        super::run(&mut cmd).map(|_| ())
    }
}
