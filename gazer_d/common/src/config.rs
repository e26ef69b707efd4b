use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use api::{TrackerParams, Viewport};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::calibration::DEFAULT_CLICK_THRESHOLD;
use crate::ReduceAxis;

/// Which gaze source the daemon activates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    #[serde(alias = "active_module")]
    pub active: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            active: "sim".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub enabled: bool,
    #[serde(alias = "clickThreshold")]
    pub click_threshold: u32,
    /// Predictions collected on the center target for the accuracy score.
    pub accuracy_window: usize,
    /// Custom grid as (x, y) percentage pairs. None means the standard
    /// nine-point grid.
    pub points: Option<Vec<(f32, f32)>>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            click_threshold: DEFAULT_CLICK_THRESHOLD,
            accuracy_window: 50,
            points: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub viewport: Viewport,
    pub axis: ReduceAxis,
    /// Stop recording after this many seconds; None records until Ctrl-C.
    #[serde(alias = "durationSecs")]
    pub duration_secs: Option<f64>,
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("gazer_d/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            axis: ReduceAxis::default(),
            duration_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Session export destination. None writes to stdout.
    pub path: Option<PathBuf>,
    pub pretty: bool,
    /// Also dump the raw sample trace here, replayable later.
    pub raw_trace_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("session.json")),
            pretty: true,
            raw_trace_path: None,
        }
    }
}

/// The daemon configuration document. Every field has a default, so a
/// config file only needs the sections it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GazerConfig {
    pub module: ModuleConfig,
    pub tracker: TrackerParams,
    pub calibration: CalibrationConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
}

impl GazerConfig {
    /// Tracker parameters with the active module name applied, so the
    /// module section is the single source of truth for what runs.
    pub fn tracker_params(&self) -> TrackerParams {
        let mut params = self.tracker.clone();
        params.tracker = self.module.active.clone();
        params.viewport = self.session.viewport;
        params
    }

    /// Read the config file, or create it with defaults when missing.
    pub fn load_or_create(path: &Path) -> Result<GazerConfig> {
        if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {:?}", path))?;
            let config: GazerConfig = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config: {:?}", path))?;
            info!("Loaded config from {:?}", path);
            return Ok(config);
        }

        let config = GazerConfig::default();
        match serde_json::to_string_pretty(&config) {
            Ok(text) => {
                if let Err(e) = std::fs::write(path, text) {
                    warn!("Could not write default config to {:?}: {}", path, e);
                } else {
                    info!("Created default config at {:?}", path);
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }
        Ok(config)
    }
}
