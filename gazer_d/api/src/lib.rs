mod error;
mod params;
mod window;

pub use error::{SessionError, TrackerError};
pub use params::{
    CameraConstraints, ConstraintRange, TrackerParams, VideoConstraints, DEFAULT_DATA_DIR,
    DEFAULT_REGRESSION, DEFAULT_TRACKER,
};
pub use window::DataWindow;

use anyhow::Result;
use chrono::{DateTime, Utc};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single gaze prediction, in viewport pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f32,
    pub y: f32,
}

impl GazePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn distance_to(self, other: GazePoint) -> f32 {
        self.to_vec2().distance(other.to_vec2())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Vec2> for GazePoint {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<GazePoint> for Vec2 {
    fn from(p: GazePoint) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Input event kinds that supervise regression data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Move,
}

/// Which eye(s) a tracker module should follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackEye {
    Left,
    Right,
    #[default]
    Both,
}

/// The rectangle predictions are made into. Gaze coordinates are pixels
/// inside this rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> GazePoint {
        GazePoint::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point into the viewport rectangle.
    pub fn bound(self, p: GazePoint) -> GazePoint {
        GazePoint::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    pub fn contains(self, p: GazePoint) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Convert percentage coordinates (0..=100 of each axis) to pixels.
    pub fn percent_to_px(self, x_pct: f32, y_pct: f32) -> GazePoint {
        GazePoint::new(self.width * x_pct / 100.0, self.height * y_pct / 100.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Discrete phase of the recording workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingSessionState {
    #[default]
    Ready,
    Calibration,
    Recording,
    Paused,
    Completed,
}

impl RecordingSessionState {
    /// Whether the workflow may move from this state to `target`.
    pub fn can_transition_to(self, target: RecordingSessionState) -> bool {
        use RecordingSessionState::*;
        matches!(
            (self, target),
            (Ready, Calibration)
                | (Ready, Recording)
                | (Calibration, Recording)
                | (Calibration, Ready)
                | (Recording, Paused)
                | (Recording, Completed)
                | (Paused, Recording)
                | (Paused, Completed)
                | (Completed, Ready)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordingSessionState::Ready => "ready",
            RecordingSessionState::Calibration => "calibration",
            RecordingSessionState::Recording => "recording",
            RecordingSessionState::Paused => "paused",
            RecordingSessionState::Completed => "completed",
        }
    }
}

/// One on-screen calibration target. `x` and `y` are percentages of the
/// viewport, not pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub x: f32,
    pub y: f32,
    pub clicks: u32,
    pub completed: bool,
}

impl CalibrationPoint {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            clicks: 0,
            completed: false,
        }
    }

    /// Count one click against this target. Returns true once the target
    /// has collected `required` clicks; `completed` latches on.
    pub fn register_click(&mut self, required: u32) -> bool {
        self.clicks += 1;
        if self.clicks >= required {
            self.completed = true;
        }
        self.completed
    }
}

/// One raw gaze sample tagged with time since recording start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSample {
    pub x: f32,
    pub y: f32,
    pub elapsed_ms: u64,
}

impl RecordingSample {
    pub fn point(&self) -> GazePoint {
        GazePoint::new(self.x, self.y)
    }
}

/// One reduced sample in a session export: wall-clock time plus the
/// gaze position collapsed to a single 0..=1 scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSessionSample {
    pub timestamp: DateTime<Utc>,
    pub pos: f64,
}

/// A completed session in its export shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSessionData {
    pub sample_rate: f64,
    pub recorded_at: DateTime<Utc>,
    pub duration: f64,
    pub samples: Vec<RecordingSessionSample>,
}

/// Descriptive envelope stored alongside a session export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub user_agent: String,
    pub accuracy: Option<u8>,
    pub sample_rate: f64,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
}

/// A supervised screen position paired with whatever the tracker was
/// predicting when it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub target: GazePoint,
    pub prediction: Option<GazePoint>,
    pub kind: EventType,
    pub elapsed_ms: u64,
}

/// Snapshot of a regression model's recorded observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionData {
    pub clicks: Vec<Observation>,
    pub moves: Vec<Observation>,
}

impl RegressionData {
    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty() && self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clicks.len() + self.moves.len()
    }
}

pub const STORED_POINT_SLOTS: usize = 50;

/// Fixed ring of recent predictions kept for accuracy measurement.
/// Slots are overwritten in place, so readers see at most
/// [`STORED_POINT_SLOTS`] points regardless of how long storing ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPoints {
    slots: Vec<Option<GazePoint>>,
    cursor: usize,
}

impl StoredPoints {
    pub fn new() -> Self {
        Self {
            slots: vec![None; STORED_POINT_SLOTS],
            cursor: 0,
        }
    }

    /// Store a point at an explicit slot, wrapping past the ring size.
    pub fn store_at(&mut self, point: GazePoint, slot: usize) {
        let n = self.slots.len();
        self.slots[slot % n] = Some(point);
    }

    /// Store a point at the rolling cursor and advance it.
    pub fn push(&mut self, point: GazePoint) {
        let at = self.cursor;
        self.store_at(point, at);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Filled slots in slot order.
    pub fn points(&self) -> Vec<GazePoint> {
        self.slots.iter().filter_map(|s| *s).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn clear(&mut self) {
        self.slots = vec![None; STORED_POINT_SLOTS];
        self.cursor = 0;
    }
}

impl Default for StoredPoints {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the tracker persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub regression: RegressionData,
    pub stored_points: StoredPoints,
}

/// Callback receiving each tick's prediction (`None` when the source had
/// nothing usable) and milliseconds elapsed since the tracker began.
pub type GazeListener = Box<dyn FnMut(Option<GazePoint>, u64) + Send>;

/// Invoked at most once if the tracker fails to come up after a start.
pub type OnFail = Box<dyn FnOnce(TrackerError) + Send>;

/// A gaze source hosted by the tracker. Implementations are driven from
/// the producer thread: `initialize` once, `update` per tick, `unload`
/// on shutdown.
pub trait TrackerModule: Send {
    fn name(&self) -> &str;

    fn initialize(&mut self, params: &TrackerParams) -> Result<()>;

    /// Produce the next prediction. `Ok(None)` means the source had no
    /// estimate this tick and is not an error.
    fn update(&mut self) -> Result<Option<GazePoint>>;

    fn unload(&mut self);
}

/// A trainable mapping from observations to gaze corrections. The host
/// only moves observation data in and out; fitting is up to the module.
pub trait RegressionModel: Send {
    fn name(&self) -> &str;

    fn record(&mut self, obs: Observation);

    fn data(&self) -> RegressionData;

    fn restore(&mut self, data: RegressionData);

    fn clear(&mut self);

    fn click_count(&self) -> usize;

    fn move_count(&self) -> usize;
}
