use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;
use crate::models::{UnifiedRecord, format_price};
use crate::storage::csv;

pub const SNAPSHOT_PREFIX: &str = "skis_unified_";
pub const SNAPSHOT_HEADER: [&str; 8] = [
    "shop",
    "brand",
    "model",
    "condition",
    "orig_price",
    "price",
    "length_cm",
    "url",
];
/// Capture-time stamp encoded in snapshot filenames.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// `<dir>/skis_unified_<YYYYMMDD>_<HHMM>.csv`
pub fn default_snapshot_path(dir: &Path, captured_at: NaiveDateTime) -> PathBuf {
    dir.join(format!(
        "{SNAPSHOT_PREFIX}{}.csv",
        captured_at.format(STAMP_FORMAT)
    ))
}

/// Stamps an explicit `--output` path with the capture time before the
/// extension, so successive runs never overwrite each other.
pub fn stamp_output_path(path: &Path, captured_at: NaiveDateTime) -> PathBuf {
    let stamp = captured_at.format(STAMP_FORMAT);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("skis_unified");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    path.with_file_name(format!("{stem}_{stamp}.{ext}"))
}

pub fn encode_record(record: &UnifiedRecord) -> String {
    csv::encode_row(&[
        record.shop.code().to_string(),
        record.brand.clone(),
        record.model.clone(),
        record.condition.to_string(),
        record.orig_price.map(format_price).unwrap_or_default(),
        format_price(record.price),
        record.length_cm.to_string(),
        record.url.clone(),
    ])
}

/// Serializes the snapshot to `dest` and returns the byte count
/// written. The file is written to a temp path in the destination
/// directory and persisted only after a complete write, so a failed
/// run never leaves a partial snapshot behind.
pub fn write_snapshot(records: &[UnifiedRecord], dest: &Path) -> Result<u64> {
    let mut body = csv::encode_row(
        &SNAPSHOT_HEADER
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>(),
    );
    for record in records {
        body.push_str(&encode_record(record));
    }

    write_atomic(body.as_bytes(), dest)?;

    info!(
        rows = records.len(),
        bytes = body.len(),
        dest = %dest.display(),
        "Snapshot exported"
    );
    Ok(body.len() as u64)
}

/// Temp-file-then-persist write shared by snapshot and diff exports.
pub fn write_atomic(bytes: &[u8], dest: &Path) -> Result<()> {
    let dir = dest.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(23, 4, 0)
            .unwrap()
    }

    #[test]
    fn default_path_encodes_capture_time() {
        let path = default_snapshot_path(Path::new("data/exports"), stamp());
        assert_eq!(
            path,
            PathBuf::from("data/exports/skis_unified_20251115_2304.csv")
        );
    }

    #[test]
    fn explicit_output_gets_stamped_before_extension() {
        let path = stamp_output_path(Path::new("out/skis.csv"), stamp());
        assert_eq!(path, PathBuf::from("out/skis_20251115_2304.csv"));
    }
}
