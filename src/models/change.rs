use serde::{Deserialize, Serialize};

use super::UnifiedRecord;

/// What happened to one identity key between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Sold,
    NewArrival,
    PriceChanged,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Sold => "sold_out",
            ChangeKind::NewArrival => "new_arrival",
            ChangeKind::PriceChanged => "price_change",
        }
    }
}

/// One line of a diff report. For sold items `record` is the previous
/// snapshot's row; for new and price-changed items it is the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    pub record: UnifiedRecord,
    pub old_price: Option<f64>,
    pub new_price: Option<f64>,
}
