pub mod snapshot;

pub use snapshot::{
    colony_json, export_colony_json, import_colony_json, list_snapshots,
    load_latest_valid_snapshot, load_snapshot, prune_snapshots, save_snapshot, SessionSnapshot,
    SnapshotError, SnapshotMetadata,
};
