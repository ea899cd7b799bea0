use super::Error;
use super::Store;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

/// Handle on one R2 bucket. Uploads go through a uniquely named temp file
/// because the CLI only reads payloads from disk; the temp file is removed
/// on every exit path when the handle drops.
pub struct R2 {
    bucket: String,
    remote: bool,
    cwd: Option<PathBuf>,
}

impl R2 {
    pub fn remote(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            remote: true,
            cwd: None,
        }
    }

    pub fn local(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            remote: false,
            cwd: None,
        }
    }

    /// Run from the webapp checkout so the CLI picks up its wrangler config.
    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }
}

impl Store for R2 {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), Error> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        let mut cmd = Command::new("npx");
        cmd.args(["wrangler", "r2", "object", "put"])
            .arg(format!("{}/{}", self.bucket, key))
            .arg("--file")
            .arg(file.path())
            .args(["--content-type", content_type])
            .arg(if self.remote { "--remote" } else { "--local" });
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        super::run(&mut cmd).map(|_| ())
    }
}
