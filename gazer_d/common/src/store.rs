use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use api::{Observation, TrackerSnapshot};
use log::info;

const SNAPSHOT_FILENAME: &str = "gaze_data.json";

/// Persists tracker data across sessions as a JSON snapshot.
pub struct SnapshotStore {
    storage_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            storage_path: storage_dir.join(SNAPSHOT_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn sanitized_for_save(snapshot: &TrackerSnapshot) -> TrackerSnapshot {
        let finite_obs = |obs: &&Observation| {
            obs.target.is_finite() && obs.prediction.map_or(true, |p| p.is_finite())
        };

        let mut data = snapshot.clone();
        data.regression.clicks = snapshot
            .regression
            .clicks
            .iter()
            .filter(finite_obs)
            .copied()
            .collect();
        data.regression.moves = snapshot
            .regression
            .moves
            .iter()
            .filter(finite_obs)
            .copied()
            .collect();

        let mut stored = api::StoredPoints::new();
        for point in snapshot.stored_points.points() {
            if point.is_finite() {
                stored.push(point);
            }
        }
        data.stored_points = stored;

        data
    }

    pub fn save(&self, snapshot: &TrackerSnapshot) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create snapshot dir: {:?}", parent))?;
            }
        }
        let file = File::create(&self.storage_path).context("Failed to create snapshot file")?;
        let sanitized = Self::sanitized_for_save(snapshot);
        serde_json::to_writer_pretty(file, &sanitized)
            .context("Failed to serialize snapshot data")?;
        info!("Saved gaze snapshot to {:?}", self.storage_path);
        Ok(())
    }

    /// Load the snapshot if one exists. A missing file is not an error.
    pub fn load(&self) -> Result<Option<TrackerSnapshot>> {
        if !self.storage_path.exists() {
            info!(
                "No gaze snapshot found at {:?}, starting fresh",
                self.storage_path
            );
            return Ok(None);
        }

        let file = File::open(&self.storage_path).context("Failed to open snapshot file")?;
        let reader = BufReader::new(file);
        let snapshot: TrackerSnapshot =
            serde_json::from_reader(reader).context("Failed to deserialize snapshot data")?;

        info!("Loaded gaze snapshot from {:?}", self.storage_path);
        Ok(Some(snapshot))
    }

    /// Delete the on-disk snapshot if present.
    pub fn clear(&self) -> Result<()> {
        if self.storage_path.exists() {
            std::fs::remove_file(&self.storage_path)
                .with_context(|| format!("Failed to remove snapshot: {:?}", self.storage_path))?;
            info!("Cleared gaze snapshot at {:?}", self.storage_path);
        }
        Ok(())
    }
}
