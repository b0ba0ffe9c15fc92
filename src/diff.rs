use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::models::{ChangeEntry, ChangeKind, Condition, Shop, UnifiedRecord, format_price};
use crate::storage::csv;
use crate::storage::export::write_atomic;
use crate::storage::snapshot::snapshot_stamp;

/// The tuple that stands in for a product ID across snapshots. URL is
/// excluded (re-listings change it) and so is price (the thing being
/// compared). Field order doubles as the report sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
    pub shop: Shop,
    pub brand: String,
    pub model: String,
    pub length_cm: u32,
    pub condition: Condition,
}

/// The single place the matching policy lives. Everything downstream
/// treats the key as opaque.
pub fn identity_key(record: &UnifiedRecord) -> IdentityKey {
    IdentityKey {
        shop: record.shop,
        brand: record.brand.clone(),
        model: record.model.clone(),
        length_cm: record.length_cm,
        condition: record.condition.clone(),
    }
}

fn index_by_key(records: &[UnifiedRecord]) -> BTreeMap<IdentityKey, &UnifiedRecord> {
    let mut map: BTreeMap<IdentityKey, &UnifiedRecord> = BTreeMap::new();
    for record in records {
        let key = identity_key(record);
        if map.contains_key(&key) {
            warn!(
                shop = %key.shop,
                brand = %key.brand,
                model = %key.model,
                length_cm = key.length_cm,
                "Duplicate identity key in snapshot, keeping first occurrence"
            );
            continue;
        }
        map.insert(key, record);
    }
    map
}

/// Classifies every identity key across two snapshots. Unchanged items
/// produce no entry. Output order: sold, then new arrivals, then price
/// changes, each ascending by (shop, brand, model, length_cm), fully
/// deterministic regardless of input row order.
pub fn diff(previous: &[UnifiedRecord], current: &[UnifiedRecord]) -> Vec<ChangeEntry> {
    let prev = index_by_key(previous);
    let cur = index_by_key(current);

    let mut sold = Vec::new();
    let mut arrived = Vec::new();
    let mut repriced = Vec::new();

    for (key, record) in &prev {
        if !cur.contains_key(key) {
            sold.push(ChangeEntry {
                kind: ChangeKind::Sold,
                record: (*record).clone(),
                old_price: Some(record.price),
                new_price: None,
            });
        }
    }

    for (key, record) in &cur {
        match prev.get(key) {
            None => arrived.push(ChangeEntry {
                kind: ChangeKind::NewArrival,
                record: (*record).clone(),
                old_price: None,
                new_price: Some(record.price),
            }),
            Some(previous_record) => {
                if (previous_record.price - record.price).abs() > f64::EPSILON {
                    repriced.push(ChangeEntry {
                        kind: ChangeKind::PriceChanged,
                        record: (*record).clone(),
                        old_price: Some(previous_record.price),
                        new_price: Some(record.price),
                    });
                }
            }
        }
    }

    let mut entries = sold;
    entries.append(&mut arrived);
    entries.append(&mut repriced);
    entries
}

pub const REPORT_HEADER: [&str; 9] = [
    "status",
    "shop",
    "brand",
    "model",
    "length_cm",
    "condition",
    "old_price",
    "new_price",
    "url",
];

/// Writes the change report as CSV, atomically. Returns bytes written.
pub fn write_report(entries: &[ChangeEntry], dest: &Path) -> Result<u64> {
    let mut body = csv::encode_row(
        &REPORT_HEADER
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>(),
    );
    for entry in entries {
        let record = &entry.record;
        body.push_str(&csv::encode_row(&[
            entry.kind.as_str().to_string(),
            record.shop.code().to_string(),
            record.brand.clone(),
            record.model.clone(),
            record.length_cm.to_string(),
            record.condition.to_string(),
            entry.old_price.map(format_price).unwrap_or_default(),
            entry.new_price.map(format_price).unwrap_or_default(),
            record.url.clone(),
        ]));
    }

    write_atomic(body.as_bytes(), dest)?;
    info!(
        entries = entries.len(),
        dest = %dest.display(),
        "Diff report written"
    );
    Ok(body.len() as u64)
}

/// `<dir>/skis_diff_<old-stamp>_vs_<new-stamp>.csv`
pub fn report_path(dir: &Path, previous: &Path, current: &Path) -> PathBuf {
    let label = |path: &Path| {
        snapshot_stamp(path)
            .map(|(stamp, _)| stamp)
            .unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("snapshot")
                    .to_string()
            })
    };
    dir.join(format!(
        "skis_diff_{}_vs_{}.csv",
        label(previous),
        label(current)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(model: &str, length_cm: u32, price: f64) -> UnifiedRecord {
        UnifiedRecord {
            shop: Shop::Xtreme,
            brand: "Atomic".to_string(),
            model: model.to_string(),
            condition: Condition::New,
            orig_price: None,
            price,
            length_cm,
            url: format!("https://www.xtreme.ge/en/shop/{model}"),
        }
    }

    #[test]
    fn classifies_sold_new_and_price_changed() {
        let previous = vec![
            record("Redster", 160, 280.0),
            record("Redster", 170, 300.0),
        ];
        let current = vec![
            record("Redster", 170, 250.0),
            record("Redster", 180, 260.0),
        ];

        let entries = diff(&previous, &current);
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].kind, ChangeKind::Sold);
        assert_eq!(entries[0].record.length_cm, 160);

        assert_eq!(entries[1].kind, ChangeKind::NewArrival);
        assert_eq!(entries[1].record.length_cm, 180);
        assert_eq!(entries[1].new_price, Some(260.0));

        assert_eq!(entries[2].kind, ChangeKind::PriceChanged);
        assert_eq!(entries[2].record.length_cm, 170);
        assert_eq!(entries[2].old_price, Some(300.0));
        assert_eq!(entries[2].new_price, Some(250.0));
    }

    #[test]
    fn self_diff_is_empty() {
        let snapshot = vec![
            record("Redster", 170, 300.0),
            record("Bent 100", 180, 450.0),
        ];
        assert!(diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn diff_ignores_input_row_order() {
        let previous = vec![
            record("Redster", 160, 280.0),
            record("Redster", 170, 300.0),
            record("Bent 100", 180, 450.0),
        ];
        let current = vec![
            record("Redster", 170, 250.0),
            record("Redster", 180, 260.0),
        ];

        let baseline = diff(&previous, &current);

        let mut previous_shuffled = previous.clone();
        previous_shuffled.reverse();
        let mut current_shuffled = current.clone();
        current_shuffled.reverse();

        assert_eq!(diff(&previous_shuffled, &current_shuffled), baseline);
    }

    #[test]
    fn url_change_alone_is_not_a_change() {
        let previous = vec![record("Redster", 170, 300.0)];
        let mut relisted = previous.clone();
        relisted[0].url = "https://www.xtreme.ge/en/shop/redster-relisted".to_string();
        assert!(diff(&previous, &relisted).is_empty());
    }

    #[test]
    fn duplicate_key_keeps_first_occurrence() {
        let previous = vec![record("Redster", 170, 300.0)];
        let mut current = vec![record("Redster", 170, 300.0), record("Redster", 170, 199.0)];
        // first occurrence wins: no price change reported
        assert!(diff(&previous, &current).is_empty());

        current.swap(0, 1);
        let entries = diff(&previous, &current);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ChangeKind::PriceChanged);
        assert_eq!(entries[0].new_price, Some(199.0));
    }

    #[test]
    fn groups_are_sorted_by_shop_brand_model_length() {
        let previous = vec![record("Zag", 170, 100.0), record("Alpha", 150, 100.0)];
        let current = vec![record("Beta", 160, 200.0), record("Alpha", 140, 90.0)];

        let entries = diff(&previous, &current);
        let kinds: Vec<ChangeKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Sold,
                ChangeKind::Sold,
                ChangeKind::NewArrival,
                ChangeKind::NewArrival,
            ]
        );
        // within the sold group, ascending by model
        assert_eq!(entries[0].record.model, "Alpha");
        assert_eq!(entries[1].record.model, "Zag");
        assert_eq!(entries[2].record.model, "Alpha");
        assert_eq!(entries[3].record.model, "Beta");
    }

    #[test]
    fn report_path_uses_encoded_stamps() {
        let path = report_path(
            Path::new("data/exports"),
            Path::new("data/exports/skis_unified_20250101_0900.csv"),
            Path::new("data/exports/skis_unified_20250201_1000.csv"),
        );
        assert_eq!(
            path,
            PathBuf::from("data/exports/skis_diff_20250101_0900_vs_20250201_1000.csv")
        );
    }
}
