use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::colony::{Colony, ColonyRecord, ModuleKind};
use crate::config::generation::GridParams;
use crate::simulation::{Session, SessionSettings};
use crate::world::topology::wrap;
use crate::world::{Placement, Position};

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a session. The grid itself is not stored:
/// it is regenerated from `grid` and the placements replayed onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub session_id: Uuid,
    pub grid: GridParams,
    pub colony: ColonyRecord,
    pub placements: Vec<Placement>,
    pub avatar: Position,
    pub elapsed_ms: u64,
}

impl SessionSnapshot {
    pub fn capture(session: &Session) -> Self {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            session_id: session.id(),
            grid: session.grid().params().clone(),
            colony: session.colony().to_record(),
            placements: session.placements().to_vec(),
            avatar: session.avatar(),
            elapsed_ms: session.elapsed_ms(),
        }
    }

    /// Structural checks that bincode alone cannot catch.
    fn validate(&self) -> Result<(), String> {
        if self.version != SNAPSHOT_VERSION {
            return Err(format!(
                "snapshot version {} is not supported (expected {})",
                self.version, SNAPSHOT_VERSION
            ));
        }
        self.grid.validate()?;
        if !self.colony.kerbals.is_finite() || self.colony.kerbals < 0.0 {
            return Err(format!("invalid kerbal count {}", self.colony.kerbals));
        }
        for &(kind, amount) in &self.colony.resources {
            if !amount.is_finite() || amount < 0.0 {
                return Err(format!("invalid {} amount {}", kind.name(), amount));
            }
        }

        let (w, h) = (self.grid.width as i32, self.grid.height as i32);
        let command_center = (w / 2, h / 2);
        let mut occupied = HashSet::new();
        for p in &self.placements {
            if p.kind == ModuleKind::CommandCenter {
                return Err("placement records contain a command center".to_string());
            }
            let tile = (wrap(p.x, w), wrap(p.y, h));
            if tile == command_center {
                return Err(format!(
                    "{} placed on the command center tile ({}, {})",
                    p.kind.name(),
                    tile.0,
                    tile.1
                ));
            }
            if !occupied.insert(tile) {
                return Err(format!("two placements share tile ({}, {})", tile.0, tile.1));
            }
            let built = self
                .colony
                .modules
                .iter()
                .find(|(k, _)| *k == p.kind)
                .map_or(0, |&(_, n)| n);
            let placed = self.placements.iter().filter(|q| q.kind == p.kind).count();
            if placed > built as usize {
                return Err(format!(
                    "{} placements of {} but only {} built",
                    placed,
                    p.kind.name(),
                    built
                ));
            }
        }
        Ok(())
    }

    /// Rebuild the session this snapshot was captured from.
    pub fn restore(&self, settings: SessionSettings, now_ms: u64) -> Session {
        Session::restore(
            self.grid.clone(),
            Colony::from_record(&self.colony, now_ms),
            self.placements.clone(),
            self.avatar,
            self.elapsed_ms,
            settings,
            now_ms,
        )
    }
}

/// Metadata about a snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub path: PathBuf,
    pub elapsed_ms: u64,
    pub timestamp: u64,
    pub file_size: u64,
}

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    #[error("Corrupt snapshot {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("No valid snapshots found. Start a new colony with: outpost new")]
    NoValidSnapshots,
}

/// Build a snapshot filename from elapsed game time and timestamp.
fn snapshot_filename(elapsed_ms: u64, timestamp: u64) -> String {
    format!("colony-t{}-{}.bin", elapsed_ms, timestamp)
}

/// Parse elapsed time and timestamp from a snapshot filename.
/// Expected format: `colony-t{ms}-{timestamp}.bin`
fn parse_snapshot_filename(filename: &str) -> Option<(u64, u64)> {
    let stem = filename.strip_suffix(".bin")?;
    let rest = stem.strip_prefix("colony-t")?;
    let (elapsed_str, ts_str) = rest.split_once('-')?;
    let elapsed = elapsed_str.parse::<u64>().ok()?;
    let ts = ts_str.parse::<u64>().ok()?;
    Some((elapsed, ts))
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Write `bytes` to `target` through a temp file and rename, so a partial
/// write never replaces an existing file.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("snapshot");
    let tmp = target.with_file_name(format!(".{}.tmp", filename));

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(e));
    }

    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(e));
    }

    Ok(())
}

/// Save a session snapshot into `snapshot_dir`, creating it if needed.
pub fn save_snapshot(session: &Session, snapshot_dir: &Path) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(snapshot_dir)?;

    let snapshot = SessionSnapshot::capture(session);
    let filename = snapshot_filename(snapshot.elapsed_ms, unix_timestamp_now());
    let target = snapshot_dir.join(&filename);

    let encoded =
        bincode::serialize(&snapshot).map_err(|e| SnapshotError::Serialize(e.to_string()))?;
    write_atomic(&target, &encoded)?;

    Ok(target)
}

/// Load and validate a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<SessionSnapshot, SnapshotError> {
    let data = fs::read(path)?;
    let snapshot: SessionSnapshot =
        bincode::deserialize(&data).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;

    snapshot
        .validate()
        .map_err(|reason| SnapshotError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })?;

    Ok(snapshot)
}

/// List all snapshots in a directory, newest first.
pub fn list_snapshots(snapshot_dir: &Path) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
    if !snapshot_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();

    for entry in fs::read_dir(snapshot_dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };

        // Skip temp files
        if filename.starts_with('.') {
            continue;
        }

        if let Some((elapsed_ms, timestamp)) = parse_snapshot_filename(&filename) {
            let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            snapshots.push(SnapshotMetadata {
                path: path.clone(),
                elapsed_ms,
                timestamp,
                file_size,
            });
        }
    }

    snapshots.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then(b.elapsed_ms.cmp(&a.elapsed_ms))
    });

    Ok(snapshots)
}

/// Prune old snapshots, keeping only the `max_snapshots` most recent.
///
/// Returns the list of deleted file paths.
pub fn prune_snapshots(
    snapshot_dir: &Path,
    max_snapshots: usize,
) -> Result<Vec<PathBuf>, SnapshotError> {
    let snapshots = list_snapshots(snapshot_dir)?;

    let mut deleted = Vec::new();
    if snapshots.len() > max_snapshots {
        for snapshot in &snapshots[max_snapshots..] {
            fs::remove_file(&snapshot.path)?;
            deleted.push(snapshot.path.clone());
        }
    }

    Ok(deleted)
}

/// Load the most recent valid snapshot, falling back to older ones if the
/// latest is corrupt. Errors only if none can be loaded.
pub fn load_latest_valid_snapshot(snapshot_dir: &Path) -> Result<SessionSnapshot, SnapshotError> {
    let snapshots = list_snapshots(snapshot_dir)?;

    for snapshot in &snapshots {
        match load_snapshot(&snapshot.path) {
            Ok(loaded) => return Ok(loaded),
            Err(e) => {
                warn!(
                    path = %snapshot.path.display(),
                    error = %e,
                    "Corrupt snapshot, trying next"
                );
            }
        }
    }

    Err(SnapshotError::NoValidSnapshots)
}

/// Pretty JSON for a colony record.
pub fn colony_json(record: &ColonyRecord) -> Result<String, SnapshotError> {
    serde_json::to_string_pretty(record).map_err(|e| SnapshotError::Serialize(e.to_string()))
}

/// Write a colony record as pretty JSON.
pub fn export_colony_json(record: &ColonyRecord, path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_atomic(path, colony_json(record)?.as_bytes())
}

/// Read a colony record written by `export_colony_json`.
pub fn import_colony_json(path: &Path) -> Result<ColonyRecord, SnapshotError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| SnapshotError::Deserialize(e.to_string()))
}
