use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use api::{GazePoint, RecordingSample, TrackerModule, TrackerParams};
use log::{info, warn};

pub const MODULE_NAME: &str = "replay";

/// Replays a previously captured gaze trace in real time.
///
/// The trace is a JSON array of recording samples ordered by
/// `elapsedMs`. Each sample is emitted once, on the first update after
/// its time has been reached; ticks that cross no sample, ticks before
/// the first sample, and every tick after the trace ends yield nothing.
pub struct ReplayGazeModule {
    path: Option<PathBuf>,
    samples: Vec<RecordingSample>,
    cursor: usize,
    started: Option<Instant>,
}

impl ReplayGazeModule {
    /// A module that takes its trace path from the tracker parameters.
    pub fn new() -> Self {
        Self {
            path: None,
            samples: Vec::new(),
            cursor: 0,
            started: None,
        }
    }

    /// A module bound to an explicit trace file.
    pub fn with_trace(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for ReplayGazeModule {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerModule for ReplayGazeModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn initialize(&mut self, params: &TrackerParams) -> Result<()> {
        let path = match self.path.clone().or_else(|| params.static_trace.clone()) {
            Some(path) => path,
            None => bail!("replay module needs a trace path (static_trace is unset)"),
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read gaze trace: {:?}", path))?;
        let mut samples: Vec<RecordingSample> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse gaze trace: {:?}", path))?;

        if samples.is_empty() {
            warn!("Gaze trace {:?} holds no samples", path);
        }
        if samples.windows(2).any(|w| w[1].elapsed_ms < w[0].elapsed_ms) {
            warn!("Gaze trace {:?} is out of order; sorting by elapsed time", path);
            samples.sort_by_key(|s| s.elapsed_ms);
        }

        info!(
            "Replaying {} samples ({} ms) from {:?}",
            samples.len(),
            samples.last().map(|s| s.elapsed_ms).unwrap_or(0),
            path
        );
        self.samples = samples;
        self.cursor = 0;
        self.started = Some(Instant::now());
        Ok(())
    }

    fn update(&mut self) -> Result<Option<GazePoint>> {
        let started = match self.started {
            Some(started) => started,
            None => bail!("replay module was never initialized"),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut reached = None;
        while let Some(sample) = self.samples.get(self.cursor) {
            if sample.elapsed_ms > elapsed_ms {
                break;
            }
            reached = Some(sample.point());
            self.cursor += 1;
        }
        Ok(reached)
    }

    fn unload(&mut self) {
        info!(
            "Replay finished at sample {}/{}",
            self.cursor,
            self.samples.len()
        );
        self.started = None;
    }
}
