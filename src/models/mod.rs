mod change;
mod listing;
mod record;
mod shop;

pub use change::{ChangeEntry, ChangeKind};
pub use listing::{Condition, RawListing};
pub use record::{UnifiedRecord, format_price};
pub use shop::Shop;
