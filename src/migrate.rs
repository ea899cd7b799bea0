//! Base64 → object storage migration.
//!
//! The one pipeline every ad-hoc migration used to reimplement: select the
//! rows still carrying inline payloads, decode each, upload under the
//! deterministic key, and repoint the row at the uploaded object. The
//! selection filter makes re-runs idempotent: a repointed row no longer
//! matches `LIKE 'data:image%'`.
use crate::CampaignId;
use crate::Row;
use crate::image_pointer;
use crate::payload;
use crate::report::RowPolicy;
use crate::report::Tally;
use crate::sql;
use crate::sql::Script;
use crate::storage_key;
use crate::wrangler;
use crate::wrangler::Database;
use crate::wrangler::Store;
use anyhow::Context;
use const_format::concatcp;
use serde_json::Value;
use std::path::PathBuf;

/// Table and column being migrated.
pub const TABLE: &str = "campaigns";
pub const COLUMN: &str = "thumbnail_image";

/// Rows that still carry an inline payload.
#[rustfmt::skip]
pub const SELECT: &str = concatcp!(
    "SELECT id, title, ", COLUMN, " ",
    "FROM   ", TABLE, " ",
    "WHERE  ", COLUMN, " IS NOT NULL ",
    "AND    ", COLUMN, " LIKE 'data:image%'"
);

/// Every row, pointer or payload, for the table-format recovery path.
#[rustfmt::skip]
pub const SELECT_ALL: &str = concatcp!(
    "SELECT   id, title, ", COLUMN, " ",
    "FROM     ", TABLE, " ",
    "ORDER BY id"
);

/// When the repoint statements run.
pub enum Record {
    /// Accumulate all updates into one script, applied once at the end.
    Deferred(PathBuf),
    /// Execute each update as its row uploads.
    Immediate,
}

/// Bounded slice of the id space for incremental runs.
pub struct Batch {
    pub start_id: CampaignId,
    pub limit: usize,
}

pub struct Options {
    pub record: Record,
    pub policy: RowPolicy,
    pub batch: Option<Batch>,
}

pub struct Summary {
    pub tally: Tally,
    /// Start id for the next batch when this one came back full.
    pub next: Option<CampaignId>,
}

enum Step {
    Uploaded(Option<String>),
    Skipped,
}

/// Run the migration. Setup failures (the selection query, the final
/// script application) are errors; row failures follow `opts.policy`.
pub fn run(db: &impl Database, store: &impl Store, opts: &Options) -> anyhow::Result<Summary> {
    let rows = select(db, &opts.batch).context("base64 campaign query")?;
    log::info!("{} base64 campaigns to migrate", rows.len());
    let mut tally = Tally::default();
    let mut script = Script::new("repoint campaign thumbnails at object storage");
    for row in &rows {
        match step(db, store, row, &opts.record) {
            Ok(Step::Uploaded(Some(update))) => {
                script.push(update);
                tally.ok();
            }
            Ok(Step::Uploaded(None)) => tally.ok(),
            Ok(Step::Skipped) => tally.skip(),
            Err(e) => {
                log::warn!("row failed: {:#}", e);
                tally.fail();
                if opts.policy == RowPolicy::Abort {
                    return Err(e.context("aborting on first row failure"));
                }
            }
        }
    }
    if let Record::Deferred(path) = &opts.record {
        if script.is_empty() {
            log::info!("no rows to repoint");
        } else {
            script.write(path).context("writing update script")?;
            log::info!("{} updates written to {}", script.statements(), path.display());
            db.apply_script(path).context("applying update script")?;
        }
    }
    let next = match &opts.batch {
        Some(batch) if rows.len() == batch.limit => last_id(&rows).map(|id| id + 1),
        _ => None,
    };
    Ok(Summary { tally, next })
}

fn select(db: &impl Database, batch: &Option<Batch>) -> Result<Vec<Row>, wrangler::Error> {
    let sql = match batch {
        None => SELECT.to_string(),
        Some(b) => format!("{} AND id >= {} ORDER BY id LIMIT {}", SELECT, b.start_id, b.limit),
    };
    db.select(&sql)
}

fn step(db: &impl Database, store: &impl Store, row: &Row, record: &Record) -> anyhow::Result<Step> {
    let id = row.get("id").and_then(Value::as_i64).context("row without integer id")?;
    let uri = row
        .get(COLUMN)
        .and_then(Value::as_str)
        .with_context(|| format!("campaign {} without payload column", id))?;
    if !payload::is_data_uri(uri) {
        log::info!("campaign {}: already repointed, skipping", id);
        return Ok(Step::Skipped);
    }
    let title = row.get("title").and_then(Value::as_str).unwrap_or("");
    log::info!("campaign {} ({}): uploading", id, crate::ellipsize(title, 40));
    let bytes = payload::decode(uri).with_context(|| format!("campaign {} payload", id))?;
    store
        .put(&storage_key(id), &bytes, "image/jpeg")
        .with_context(|| format!("campaign {} upload", id))?;
    log::info!("campaign {}: uploaded {} bytes", id, bytes.len());
    let update = sql::update_pointer(TABLE, COLUMN, &image_pointer(id), id);
    match record {
        Record::Immediate => {
            db.apply(&update).with_context(|| format!("campaign {} repoint", id))?;
            Ok(Step::Uploaded(None))
        }
        Record::Deferred(_) => Ok(Step::Uploaded(Some(update))),
    }
}

fn last_id(rows: &[Row]) -> Option<CampaignId> {
    rows.last()?.get("id")?.as_i64()
}

/// Recovery path: the rows arrive as pipe-table cells instead of JSON, and
/// the database already points at storage keys, so there is no Record
/// stage. Zero payload rows is a setup error here, not a clean exit.
pub fn recover(rows: Vec<Vec<String>>, store: &impl Store) -> anyhow::Result<Tally> {
    let found: Vec<(CampaignId, String)> = rows
        .into_iter()
        .filter_map(|cells| {
            let id = cells.first()?.parse().ok()?;
            let uri = cells.get(2)?.clone();
            payload::is_data_uri(&uri).then_some((id, uri))
        })
        .collect();
    anyhow::ensure!(!found.is_empty(), "no base64 thumbnails in table output");
    log::info!("{} base64 thumbnails found", found.len());
    let mut tally = Tally::default();
    for (id, uri) in &found {
        match recover_one(*id, uri, store) {
            Ok(bytes) => {
                log::info!("campaign {}: uploaded {} bytes", id, bytes);
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

fn recover_one(id: CampaignId, uri: &str, store: &impl Store) -> anyhow::Result<usize> {
    let bytes = payload::decode(uri)?;
    store.put(&storage_key(id), &bytes, "image/jpeg")?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrangler::Error;
    use std::cell::RefCell;
    use std::path::Path;

    struct FakeDb {
        rows: Vec<Row>,
        applied: RefCell<Vec<String>>,
        scripts: RefCell<Vec<PathBuf>>,
    }

    impl FakeDb {
        fn with_rows(rows: Vec<Row>) -> Self {
            Self {
                rows,
                applied: RefCell::new(Vec::new()),
                scripts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Database for FakeDb {
        fn select(&self, _sql: &str) -> Result<Vec<Row>, Error> {
            Ok(self.rows.clone())
        }
        fn apply(&self, sql: &str) -> Result<(), Error> {
            self.applied.borrow_mut().push(sql.to_string());
            Ok(())
        }
        fn apply_script(&self, path: &Path) -> Result<(), Error> {
            self.scripts.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FlakyStore {
        fail_key: &'static str,
        puts: RefCell<Vec<String>>,
    }

    impl FlakyStore {
        fn failing_on(key: &'static str) -> Self {
            Self {
                fail_key: key,
                puts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Store for FlakyStore {
        fn put(&self, key: &str, _bytes: &[u8], _content_type: &str) -> Result<(), Error> {
            self.puts.borrow_mut().push(key.to_string());
            if key == self.fail_key {
                Err(Error::Status {
                    code: Some(1),
                    stderr: "upload rejected".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn row(id: CampaignId, thumbnail: &str) -> Row {
        serde_json::json!({
            "id": id,
            "title": format!("campaign {}", id),
            "thumbnail_image": thumbnail,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn data_uri() -> String {
        payload::encode(b"\xff\xd8\xff fake jpeg bytes", "jpeg")
    }

    #[test]
    fn deferred_run_scripts_only_the_uploaded_rows() {
        let uri = data_uri();
        let db = FakeDb::with_rows(vec![row(1, &uri), row(2, &uri), row(3, &uri)]);
        let store = FlakyStore::failing_on("2.jpg");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updates.sql");
        let opts = Options {
            record: Record::Deferred(path.clone()),
            policy: RowPolicy::SkipAndCount,
            batch: None,
        };
        let summary = run(&db, &store, &opts).unwrap();
        assert_eq!(summary.tally.success, 2);
        assert_eq!(summary.tally.failed, 1);
        assert_eq!(summary.next, None);
        let script = std::fs::read_to_string(&path).unwrap();
        assert_eq!(script.matches("UPDATE").count(), 2);
        assert!(script.contains("WHERE id = 1;"));
        assert!(script.contains("WHERE id = 3;"));
        assert!(!script.contains("WHERE id = 2;"));
        assert_eq!(db.scripts.borrow().len(), 1);
        assert!(db.applied.borrow().is_empty());
    }

    #[test]
    fn immediate_mode_repoints_each_row() {
        let uri = data_uri();
        let db = FakeDb::with_rows(vec![row(4, &uri), row(7, &uri)]);
        let store = FlakyStore::failing_on("none");
        let opts = Options {
            record: Record::Immediate,
            policy: RowPolicy::SkipAndCount,
            batch: Some(Batch { start_id: 1, limit: 2 }),
        };
        let summary = run(&db, &store, &opts).unwrap();
        assert_eq!(summary.tally.success, 2);
        assert_eq!(summary.next, Some(8));
        let applied = db.applied.borrow();
        assert_eq!(applied.len(), 2);
        assert!(applied[0].contains("'/api/images/4.jpg'"));
        assert!(applied[1].contains("WHERE id = 7;"));
    }

    #[test]
    fn short_batch_has_no_next_hint() {
        let uri = data_uri();
        let db = FakeDb::with_rows(vec![row(4, &uri)]);
        let store = FlakyStore::failing_on("none");
        let opts = Options {
            record: Record::Immediate,
            policy: RowPolicy::SkipAndCount,
            batch: Some(Batch { start_id: 1, limit: 5 }),
        };
        assert_eq!(run(&db, &store, &opts).unwrap().next, None);
    }

    #[test]
    fn repointed_rows_are_skipped_not_uploaded() {
        let db = FakeDb::with_rows(vec![row(9, "/api/images/9.jpg")]);
        let store = FlakyStore::failing_on("none");
        let opts = Options {
            record: Record::Immediate,
            policy: RowPolicy::SkipAndCount,
            batch: None,
        };
        let summary = run(&db, &store, &opts).unwrap();
        assert_eq!(summary.tally.skipped, 1);
        assert!(store.puts.borrow().is_empty());
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let uri = data_uri();
        let db = FakeDb::with_rows(vec![row(1, &uri), row(2, &uri)]);
        let store = FlakyStore::failing_on("1.jpg");
        let opts = Options {
            record: Record::Immediate,
            policy: RowPolicy::Abort,
            batch: None,
        };
        assert!(run(&db, &store, &opts).is_err());
        assert_eq!(store.puts.borrow().len(), 1);
    }

    #[test]
    fn selection_filter_is_idempotent_by_construction() {
        assert!(SELECT.contains("LIKE 'data:image%'"));
        assert!(!payload::is_data_uri(&image_pointer(5)));
    }

    #[test]
    fn recover_skips_header_and_pointer_rows() {
        let uri = data_uri();
        let rows = vec![
            vec!["id".to_string(), "title".to_string(), "thumbnail_image".to_string()],
            vec!["5".to_string(), "cake".to_string(), uri.clone()],
            vec!["6".to_string(), "coffee".to_string(), "/api/images/6.jpg".to_string()],
        ];
        let store = FlakyStore::failing_on("none");
        let tally = recover(rows, &store).unwrap();
        assert_eq!(tally.success, 1);
        assert_eq!(*store.puts.borrow(), ["5.jpg"]);
    }

    #[test]
    fn recover_with_no_payloads_is_a_setup_error() {
        let store = FlakyStore::failing_on("none");
        let rows = vec![vec!["6".to_string(), "coffee".to_string(), "/api/images/6.jpg".to_string()]];
        assert!(recover(rows, &store).is_err());
    }
}
