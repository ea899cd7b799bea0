//! Data-URI text artifacts on disk.
//!
//! The generator writes one `campaign_{id}_base64.txt` per campaign; the
//! upload job scans a directory for them and pushes each payload into
//! object storage under the campaign's deterministic key.
use crate::CampaignId;
use crate::payload;
use crate::report::Tally;
use crate::storage_key;
use crate::wrangler::Store;
use anyhow::Context;
use std::path::Path;
use std::path::PathBuf;

/// Canonical artifact path for a campaign.
pub fn path(dir: &Path, id: CampaignId) -> PathBuf {
    dir.join(format!("campaign_{}_base64.txt", id))
}

/// Write one data URI to its artifact file.
pub fn write(dir: &Path, id: CampaignId, uri: &str) -> std::io::Result<PathBuf> {
    let path = path(dir, id);
    std::fs::write(&path, uri)?;
    Ok(path)
}

/// Find artifact files in `dir`, sorted by campaign id. Accepts the
/// `_base64_updated` variants older generator runs left behind.
pub fn scan(dir: &Path) -> anyhow::Result<Vec<(CampaignId, PathBuf)>> {
    let pattern = dir.join("campaign_*_base64*.txt");
    let pattern = pattern.to_str().context("artifact directory is not utf-8")?;
    let mut found = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        match parse_id(&path) {
            Some(id) => found.push((id, path)),
            None => log::warn!("unrecognized artifact name: {}", path.display()),
        }
    }
    found.sort();
    Ok(found)
}

fn parse_id(path: &Path) -> Option<CampaignId> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("campaign_")?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Upload every artifact in `dir`. Per-file failures are counted and
/// skipped.
pub fn upload(dir: &Path, store: &impl Store) -> anyhow::Result<Tally> {
    let files = scan(dir)?;
    log::info!("{} artifact files found", files.len());
    let mut tally = Tally::default();
    for (id, path) in &files {
        match upload_one(*id, path, store) {
            Ok(bytes) => {
                log::info!("campaign {}: uploaded {} bytes as {}", id, bytes, storage_key(*id));
                tally.ok();
            }
            Err(e) => {
                log::warn!("campaign {}: {:#}", id, e);
                tally.fail();
            }
        }
    }
    Ok(tally)
}

fn upload_one(id: CampaignId, path: &Path, store: &impl Store) -> anyhow::Result<usize> {
    let uri = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let bytes = payload::decode(uri.trim())?;
    store.put(&storage_key(id), &bytes, "image/jpeg")?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_from_both_artifact_names() {
        assert_eq!(parse_id(Path::new("campaign_17_base64.txt")), Some(17));
        assert_eq!(parse_id(Path::new("campaign_17_base64_updated.txt")), Some(17));
        assert_eq!(parse_id(Path::new("notes.txt")), None);
    }

    #[test]
    fn scan_finds_written_artifacts_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), 21, "data:image/jpeg;base64,AAAA").unwrap();
        write(dir.path(), 13, "data:image/jpeg;base64,BBBB").unwrap();
        std::fs::write(dir.path().join("unrelated.txt"), "x").unwrap();
        let found = scan(dir.path()).unwrap();
        let ids: Vec<CampaignId> = found.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [13, 21]);
    }
}
