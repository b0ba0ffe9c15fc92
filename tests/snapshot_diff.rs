use ski_etl::diff;
use ski_etl::models::{ChangeKind, Condition, Shop, UnifiedRecord};
use ski_etl::storage;

fn record(length_cm: u32, price: f64) -> UnifiedRecord {
    UnifiedRecord {
        shop: Shop::Xtreme,
        brand: "Atomic".to_string(),
        model: "Redster".to_string(),
        condition: Condition::New,
        orig_price: None,
        price,
        length_cm,
        url: "https://www.xtreme.ge/en/shop/redster".to_string(),
    }
}

#[test]
fn two_exports_diff_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    let previous = vec![record(160, 280.0), record(170, 300.0)];
    let current = vec![record(170, 250.0), record(180, 260.0)];

    storage::write_snapshot(
        &previous,
        &dir.path().join("skis_unified_20250101_0900.csv"),
    )
    .unwrap();
    storage::write_snapshot(
        &current,
        &dir.path().join("skis_unified_20250108_0900.csv"),
    )
    .unwrap();

    // the differ picks its inputs by the stamp encoded in the filename
    let (old_path, new_path) = storage::find_latest_snapshots(dir.path()).unwrap().unwrap();
    assert!(old_path.ends_with("skis_unified_20250101_0900.csv"));
    assert!(new_path.ends_with("skis_unified_20250108_0900.csv"));

    let old_records = storage::read_snapshot(&old_path).unwrap();
    let new_records = storage::read_snapshot(&new_path).unwrap();
    assert_eq!(old_records, previous);
    assert_eq!(new_records, current);

    let entries = diff::diff(&old_records, &new_records);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, ChangeKind::Sold);
    assert_eq!(entries[0].record.length_cm, 160);
    assert_eq!(entries[1].kind, ChangeKind::NewArrival);
    assert_eq!(entries[1].record.length_cm, 180);
    assert_eq!(entries[2].kind, ChangeKind::PriceChanged);
    assert_eq!(entries[2].old_price, Some(300.0));
    assert_eq!(entries[2].new_price, Some(250.0));

    let report = diff::report_path(dir.path(), &old_path, &new_path);
    diff::write_report(&entries, &report).unwrap();

    let body = std::fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        lines[0],
        "status,shop,brand,model,length_cm,condition,old_price,new_price,url"
    );
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("sold_out,xtreme,Atomic,Redster,160,new,280,,"));
    assert!(lines[2].starts_with("new_arrival,xtreme,Atomic,Redster,180,new,,260,"));
    assert!(lines[3].starts_with("price_change,xtreme,Atomic,Redster,170,new,300,250,"));
    assert!(
        report
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .contains("20250101_0900_vs_20250108_0900")
    );
}

#[test]
fn snapshot_against_itself_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = vec![record(160, 280.0), record(170, 300.0)];

    let path = dir.path().join("skis_unified_20250101_0900.csv");
    storage::write_snapshot(&snapshot, &path).unwrap();
    let read_back = storage::read_snapshot(&path).unwrap();

    assert!(diff::diff(&read_back, &read_back).is_empty());
}
