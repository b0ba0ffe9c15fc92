pub mod csv;
pub mod export;
pub mod snapshot;

pub use export::{default_snapshot_path, stamp_output_path, write_snapshot};
pub use snapshot::{find_latest_snapshots, read_snapshot};
