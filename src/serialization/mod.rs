pub mod snapshot;

pub use snapshot::{export_snapshot, import_snapshot, ExportSnapshotError, ImportSnapshotError, Snapshot};
