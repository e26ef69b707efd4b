pub use api::{
    CalibrationPoint, CameraConstraints, DataWindow, EventType, GazeListener, GazePoint,
    Observation, OnFail, RecordingSample, RecordingSessionData, RecordingSessionSample,
    RecordingSessionState, RegressionData, RegressionModel, SessionError, SessionInfo,
    StoredPoints, TrackEye, TrackerError, TrackerModule, TrackerParams, TrackerSnapshot, Viewport,
};

mod calibration;
mod config;
mod kalman;
mod mutator;
mod registry;
mod regression;
mod session;
mod store;
mod tracker;

pub use calibration::{
    measure_accuracy, CalibrationSequence, CENTER_POINT, DEFAULT_CLICK_THRESHOLD,
};
pub use config::{CalibrationConfig, GazerConfig, ModuleConfig, OutputConfig, SessionConfig};
pub use kalman::KalmanFilter;
pub use mutator::GazeMutator;
pub use registry::{ModuleRegistry, RegressionFactory, TrackerFactory, REGRESSION_NAMES};
pub use regression::{WindowedRegression, CLICK_WINDOW, MOVE_WINDOW};
pub use session::{RecordingSession, ReduceAxis};
pub use store::SnapshotStore;
pub use tracker::{FaceFeedbackBox, GazeTracker};
