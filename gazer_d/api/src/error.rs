use crate::RecordingSessionState;

/// Errors surfaced by the tracker facade and its module host.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("unknown tracker module '{0}'")]
    UnknownTrackerModule(String),
    #[error("unknown regression model '{0}'")]
    UnknownRegressionModule(String),
    #[error("tracker is already running")]
    AlreadyRunning,
    #[error("tracker is not running")]
    NotRunning,
    #[error("tracker module '{name}' failed to initialize")]
    ModuleInit {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("snapshot store failed")]
    Snapshot(#[source] anyhow::Error),
}

/// Errors from the recording session state machine.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session transition: {} -> {}", from.name(), to.name())]
    InvalidTransition {
        from: RecordingSessionState,
        to: RecordingSessionState,
    },
    #[error("sample time went backwards: last {last_ms}ms, got {got_ms}ms")]
    NonMonotonicSample { last_ms: u64, got_ms: u64 },
    #[error("session is not recording")]
    NotRecording,
}
