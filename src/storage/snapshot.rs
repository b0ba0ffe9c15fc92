use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Condition, Shop, UnifiedRecord};
use crate::storage::csv;
use crate::storage::export::{SNAPSHOT_HEADER, SNAPSHOT_PREFIX, STAMP_FORMAT};

/// Reads one snapshot back into records. A missing file, a header that
/// does not match the unified schema, or an unparseable row fails the
/// whole read; diff never works from a partially understood snapshot.
pub fn read_snapshot(path: &Path) -> Result<Vec<UnifiedRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::format(path, format!("cannot read snapshot: {e}")))?;

    let rows = csv::parse_rows(&text);
    let Some((header, body)) = rows.split_first() else {
        return Err(Error::format(path, "empty file"));
    };

    if header != &SNAPSHOT_HEADER {
        return Err(Error::format(
            path,
            format!("unexpected header: {}", header.join(",")),
        ));
    }

    let mut records = Vec::with_capacity(body.len());
    for (i, row) in body.iter().enumerate() {
        records.push(parse_row(row).map_err(|reason| {
            // +2: one-based, after the header row
            Error::format(path, format!("row {}: {reason}", i + 2))
        })?);
    }
    Ok(records)
}

fn parse_row(row: &[String]) -> std::result::Result<UnifiedRecord, String> {
    let [shop, brand, model, condition, orig_price, price, length_cm, url] = row else {
        return Err(format!("expected 8 fields, got {}", row.len()));
    };

    let shop: Shop = shop.parse()?;
    let condition = Condition::from_text(condition);
    let orig_price = if orig_price.trim().is_empty() {
        None
    } else {
        Some(parse_decimal(orig_price)?)
    };
    let price = parse_decimal(price)?;
    let length_cm = parse_length(length_cm)?;

    Ok(UnifiedRecord {
        shop,
        brand: brand.clone(),
        model: model.clone(),
        condition,
        orig_price,
        price,
        length_cm,
        url: url.clone(),
    })
}

fn parse_decimal(value: &str) -> std::result::Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("bad price '{value}'"))
}

/// Accepts both `170` and legacy `170.0` spellings.
fn parse_length(value: &str) -> std::result::Result<u32, String> {
    let trimmed = value.trim();
    if let Ok(v) = trimmed.parse::<u32>() {
        return Ok(v);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0 && v.fract() == 0.0)
        .map(|v| v as u32)
        .ok_or_else(|| format!("bad length '{value}'"))
}

/// The capture stamp encoded in a snapshot filename, e.g.
/// `20251115_2304` for `skis_unified_20251115_2304.csv`.
pub fn snapshot_stamp(path: &Path) -> Option<(String, NaiveDateTime)> {
    let stem = path.file_stem()?.to_str()?;
    let stamp = stem.strip_prefix(SNAPSHOT_PREFIX)?;
    let captured_at = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some((stamp.to_string(), captured_at))
}

/// Finds the two most recent snapshots in `dir` by the capture time
/// encoded in their filenames, never by filesystem mtime. Returns
/// (previous, current), or None when fewer than two exist.
pub fn find_latest_snapshots(dir: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
    let mut snapshots: Vec<(NaiveDateTime, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        match snapshot_stamp(&path) {
            Some((_, captured_at)) => snapshots.push((captured_at, path)),
            None => debug!(path = %path.display(), "Ignoring non-snapshot file"),
        }
    }

    snapshots.sort_by_key(|(captured_at, _)| *captured_at);

    let mut iter = snapshots.into_iter().rev();
    let Some((_, current)) = iter.next() else {
        return Ok(None);
    };
    let Some((_, previous)) = iter.next() else {
        return Ok(None);
    };
    Ok(Some((previous, current)))
}
