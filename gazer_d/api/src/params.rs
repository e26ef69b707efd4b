use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{TrackEye, Viewport};

pub const DEFAULT_TRACKER: &str = "TFFacemesh";
pub const DEFAULT_REGRESSION: &str = "ridge";
pub const DEFAULT_DATA_DIR: &str = ".";

/// One dimension of a camera constraint, browser media-track style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRange {
    pub min: u32,
    pub ideal: u32,
    pub max: u32,
}

impl ConstraintRange {
    pub fn new(min: u32, ideal: u32, max: u32) -> Self {
        Self { min, ideal, max }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub width: ConstraintRange,
    pub height: ConstraintRange,
    pub facing_mode: String,
}

/// Constraints handed to tracker modules that open a camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraints {
    pub video: VideoConstraints,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            video: VideoConstraints {
                width: ConstraintRange::new(320, 640, 1920),
                height: ConstraintRange::new(240, 480, 1080),
                facing_mode: "user".to_string(),
            },
        }
    }
}

/// Runtime parameters for the tracker. Every field has a default, so a
/// config file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Name of the active tracker module.
    pub tracker: String,
    /// Name of the active regression model.
    pub regression: String,
    /// Milliseconds between prediction ticks.
    #[serde(alias = "dataTimestep")]
    pub data_timestep: u64,
    /// Minimum milliseconds between accepted cursor-move observations.
    #[serde(alias = "moveTickSize")]
    pub move_tick_size: u64,
    pub video_viewer_width: u32,
    pub video_viewer_height: u32,
    pub face_feedback_box_ratio: f32,
    pub show_video: bool,
    pub show_video_preview: bool,
    pub mirror_video: bool,
    pub show_face_overlay: bool,
    pub show_face_feedback_box: bool,
    pub show_gaze_dot: bool,
    #[serde(alias = "applyKalmanFilter")]
    pub apply_kalman_filter: bool,
    #[serde(alias = "saveDataAcrossSessions")]
    pub save_data_across_sessions: bool,
    #[serde(alias = "storingPoints")]
    pub storing_points: bool,
    #[serde(alias = "trackEye")]
    pub track_eye: TrackEye,
    #[serde(alias = "camConstraints")]
    pub cam_constraints: CameraConstraints,
    pub viewport: Viewport,
    /// Pre-recorded trace for replay sources, instead of a live camera.
    pub static_trace: Option<PathBuf>,
    /// Directory the cross-session snapshot lives in.
    pub data_dir: PathBuf,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            tracker: DEFAULT_TRACKER.to_string(),
            regression: DEFAULT_REGRESSION.to_string(),
            data_timestep: 50,
            move_tick_size: 50,
            video_viewer_width: 320,
            video_viewer_height: 240,
            face_feedback_box_ratio: 0.66,
            show_video: true,
            show_video_preview: true,
            mirror_video: false,
            show_face_overlay: true,
            show_face_feedback_box: true,
            show_gaze_dot: true,
            apply_kalman_filter: true,
            save_data_across_sessions: true,
            storing_points: false,
            track_eye: TrackEye::Both,
            cam_constraints: CameraConstraints::default(),
            viewport: Viewport::default(),
            static_trace: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}
