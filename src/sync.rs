//! Production → local table sync.
//!
//! Copies every table of the production database into the local one,
//! parents before children. The original ordering invariant was a manually
//! maintained list; here the schema declares which tables each table
//! references and the order is a topological sort, so a schema change that
//! breaks the ordering fails loudly instead of corrupting inserts.
use crate::Row;
use crate::sql;
use crate::sql::Script;
use crate::wrangler;
use crate::wrangler::Database;
use anyhow::Context;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// The production schema: each table with the tables it references.
const PRODUCTION: &[(&str, &[&str])] = &[
    ("users", &[]),
    ("advertiser_profiles", &["users"]),
    ("influencer_profiles", &["users"]),
    ("campaigns", &["advertiser_profiles"]),
    ("applications", &["campaigns", "users"]),
    ("reviews", &["applications"]),
    ("points", &["users"]),
    ("notifications", &["users"]),
    ("settlements", &["users", "campaigns"]),
    ("withdrawal_requests", &["users"]),
    ("password_reset_tokens", &["users"]),
    ("system_settings", &[]),
];

/// Declared referential dependencies between tables.
pub struct Schema {
    tables: &'static [(&'static str, &'static [&'static str])],
}

impl Schema {
    pub const fn new(tables: &'static [(&'static str, &'static [&'static str])]) -> Self {
        Self { tables }
    }

    pub const fn production() -> Self {
        Self::new(PRODUCTION)
    }

    /// Table order for one sync pass: every table after all tables it
    /// references. A cycle or a reference to an undeclared table is a
    /// setup error.
    pub fn plan(&self) -> anyhow::Result<Vec<&'static str>> {
        let mut graph = DiGraph::<&'static str, ()>::new();
        let mut index = HashMap::new();
        for (table, _) in self.tables {
            index.insert(*table, graph.add_node(*table));
        }
        for (table, references) in self.tables {
            for parent in *references {
                let from = *index
                    .get(parent)
                    .with_context(|| format!("table {} references undeclared table {}", table, parent))?;
                graph.add_edge(from, index[table], ());
            }
        }
        let order = toposort(&graph, None)
            .map_err(|cycle| anyhow::anyhow!("dependency cycle involving table {}", graph[cycle.node_id()]))?;
        Ok(order.into_iter().map(|ix| graph[ix]).collect())
    }
}

/// What one sync pass did.
pub struct Outcome {
    pub synced: usize,
    pub failed: Vec<&'static str>,
}

impl Outcome {
    pub fn clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Row-by-row sync: per table, fetch from production, clear local, insert
/// each row through its own CLI call. Slow, but each table stands alone.
pub fn rows(remote: &impl Database, local: &impl Database, schema: &Schema) -> anyhow::Result<Outcome> {
    let plan = schema.plan()?;
    let mut outcome = Outcome { synced: 0, failed: Vec::new() };
    for table in plan {
        log::info!("syncing table {}", table);
        match copy_table(remote, local, table) {
            Ok((ok, total)) if ok == total => {
                log::info!("table {}: {}/{} rows", table, ok, total);
                outcome.synced += 1;
            }
            Ok((ok, total)) => {
                log::warn!("table {}: only {}/{} rows inserted", table, ok, total);
                outcome.failed.push(table);
            }
            Err(e) => {
                log::warn!("table {}: {:#}", table, e);
                outcome.failed.push(table);
            }
        }
    }
    Ok(outcome)
}

fn copy_table(remote: &impl Database, local: &impl Database, table: &str) -> anyhow::Result<(usize, usize)> {
    let rows = remote
        .select(&format!("SELECT * FROM {}", table))
        .context("production fetch")?;
    local
        .apply(&format!("DELETE FROM {}", table))
        .context("clearing local table")?;
    let mut ok = 0;
    for row in &rows {
        match local.apply(&sql::insert(table, row)) {
            Ok(()) => ok += 1,
            Err(e) => log::warn!("insert into {} failed: {}", table, e),
        }
    }
    Ok((ok, rows.len()))
}

/// Script sync: accumulate one guarded SQL script (clear + repopulate per
/// table, parents first), apply it in a single CLI call, then verify local
/// row counts against what production reported.
///
/// Best-effort by policy: the CLI rejects explicit transaction statements
/// in scripts, so a mid-script failure leaves a partial state. Re-running
/// is the recovery path; every table is cleared before repopulating.
pub fn script(
    remote: &impl Database,
    local: &impl Database,
    schema: &Schema,
    path: &Path,
) -> anyhow::Result<Outcome> {
    let plan = schema.plan()?;
    let mut script = Script::new("production database snapshot").guarded();
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    let mut failed = Vec::new();
    for table in plan {
        let rows = match remote.select(&format!("SELECT * FROM {}", table)) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("table {}: fetch failed: {}", table, e);
                failed.push(table);
                continue;
            }
        };
        log::info!("table {}: {} rows", table, rows.len());
        script.comment(&format!("table {}: {} rows", table, rows.len()));
        script.push(format!("DELETE FROM {};", table));
        for row in &rows {
            script.push(sql::insert(table, row));
        }
        counts.push((table, rows.len()));
    }
    script.write(path).context("writing sync script")?;
    log::info!("sync script written to {}", path.display());
    local.apply_script(path).context("applying sync script")?;
    verify(local, &counts);
    Ok(Outcome { synced: counts.len(), failed })
}

/// Compare local row counts to what production reported; mismatches are
/// logged, not fatal.
fn verify(local: &impl Database, counts: &[(&'static str, usize)]) {
    for (table, want) in counts {
        match count(local, table) {
            Ok(got) if got == *want => {}
            Ok(got) => log::warn!("table {}: local has {} rows, expected {}", table, got, want),
            Err(e) => log::warn!("table {}: count check failed: {}", table, e),
        }
    }
}

fn count(db: &impl Database, table: &str) -> Result<usize, wrangler::Error> {
    let rows = db.select(&format!("SELECT COUNT(*) AS n FROM {}", table))?;
    Ok(rows
        .first()
        .and_then(|row| row.get("n"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize)
}
