//! Operational toolkit for the ReviewSpheres data plane.
//!
//! Batch maintenance jobs that move image payloads and table data between
//! the production database, the local development database, and object
//! storage, all through the external `wrangler` CLI.
//!
//! ## External Boundary
//!
//! - [`wrangler`] — D1/R2 CLI invocation, output parsing, error taxonomy
//!
//! ## Pipelines
//!
//! - [`migrate`] — Base64 thumbnails out of the database, into object storage
//! - [`sync`] — production tables copied into the local database
//! - [`artifact`] — data-URI text artifacts written and re-uploaded
//!
//! ## Building Blocks
//!
//! - [`payload`] — data-URI decode/encode
//! - [`sql`] — literal escaping, statement builders, script assembly
//! - [`thumb`] — gradient thumbnail synthesis
//! - [`report`] — per-row tallies and the row failure policy
pub mod artifact;
pub mod migrate;
pub mod payload;
pub mod report;
pub mod sql;
pub mod sync;
pub mod thumb;
pub mod wrangler;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// One result row from the database CLI: column name to scalar value,
/// in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;
/// Primary key of the campaigns table.
pub type CampaignId = i64;

// ============================================================================
// PRODUCTION DEFAULTS
// ============================================================================
/// D1 database every job targets unless overridden.
pub const DATABASE: &str = "review-spheres-v1-production";
/// R2 bucket holding campaign images.
pub const BUCKET: &str = "reviewsphere-images";
/// Route prefix the app serves uploaded images under.
pub const IMAGE_ROUTE: &str = "/api/images";

/// Deterministic storage key for a campaign image. Re-uploads overwrite
/// rather than duplicate.
pub fn storage_key(id: CampaignId) -> String {
    format!("{}.jpg", id)
}

/// The pointer written back into the database once an image lives in
/// object storage.
pub fn image_pointer(id: CampaignId) -> String {
    format!("{}/{}.jpg", IMAGE_ROUTE, id)
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Truncate a string to at most `max` characters, appending an ellipsis
/// when anything was cut. Safe on multi-byte text.
pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsize_short_passthrough() {
        assert_eq!(ellipsize("chicken", 40), "chicken");
    }

    #[test]
    fn ellipsize_cuts_on_char_boundary() {
        assert_eq!(ellipsize("치킨 리뷰 캠페인", 2), "치킨...");
    }

    #[test]
    fn keys_and_pointers_are_deterministic() {
        assert_eq!(storage_key(13), "13.jpg");
        assert_eq!(image_pointer(13), "/api/images/13.jpg");
        assert_eq!(storage_key(13), storage_key(13));
    }
}
