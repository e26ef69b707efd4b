use std::time::Instant;

use api::{
    GazePoint, RecordingSample, RecordingSessionData, RecordingSessionSample,
    RecordingSessionState, SessionError, SessionInfo, Viewport,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which screen axis a sample collapses to in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReduceAxis {
    #[default]
    NormalizedX,
    NormalizedY,
}

/// Drives one recording session through the ready/calibration/recording/
/// paused/completed workflow, collecting raw samples and reducing them to
/// the export shape on completion.
///
/// Elapsed time is active time: the clock stops across `pause`/`resume`.
pub struct RecordingSession {
    state: RecordingSessionState,
    viewport: Viewport,
    axis: ReduceAxis,
    id: Option<Uuid>,
    recorded_at: Option<DateTime<Utc>>,
    samples: Vec<RecordingSample>,
    last_elapsed_ms: u64,
    baseline_ms: u64,
    anchor: Option<Instant>,
    accuracy: Option<u8>,
    final_duration: f64,
    final_sample_rate: f64,
}

impl RecordingSession {
    pub fn new(viewport: Viewport, axis: ReduceAxis) -> Self {
        Self {
            state: RecordingSessionState::Ready,
            viewport,
            axis,
            id: None,
            recorded_at: None,
            samples: Vec::new(),
            last_elapsed_ms: 0,
            baseline_ms: 0,
            anchor: None,
            accuracy: None,
            final_duration: 0.0,
            final_sample_rate: 0.0,
        }
    }

    pub fn state(&self) -> RecordingSessionState {
        self.state
    }

    pub fn samples(&self) -> &[RecordingSample] {
        &self.samples
    }

    pub fn accuracy(&self) -> Option<u8> {
        self.accuracy
    }

    /// Attach a measured calibration accuracy percentage (0..=100).
    pub fn set_accuracy(&mut self, accuracy: u8) {
        self.accuracy = Some(accuracy.min(100));
    }

    /// Milliseconds of active recording time so far.
    pub fn active_ms(&self) -> u64 {
        let running = self
            .anchor
            .map(|a| a.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.baseline_ms + running
    }

    fn transition(&mut self, to: RecordingSessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn begin_calibration(&mut self) -> Result<(), SessionError> {
        self.transition(RecordingSessionState::Calibration)
    }

    /// Abandon calibration and fall back to ready.
    pub fn cancel_calibration(&mut self) -> Result<(), SessionError> {
        self.transition(RecordingSessionState::Ready)
    }

    /// Enter recording, stamp the wall-clock start, and anchor the active
    /// clock. Legal from ready or calibration.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.transition(RecordingSessionState::Recording)?;
        self.id = Some(Uuid::new_v4());
        self.recorded_at = Some(Utc::now());
        self.samples.clear();
        self.last_elapsed_ms = 0;
        self.baseline_ms = 0;
        self.anchor = Some(Instant::now());
        Ok(())
    }

    /// Bank active time and stop the clock.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.transition(RecordingSessionState::Paused)?;
        if let Some(anchor) = self.anchor.take() {
            self.baseline_ms += anchor.elapsed().as_millis() as u64;
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.transition(RecordingSessionState::Recording)?;
        self.anchor = Some(Instant::now());
        Ok(())
    }

    /// Append a sample stamped with the current active elapsed time.
    pub fn record(&mut self, point: GazePoint) -> Result<(), SessionError> {
        let elapsed_ms = self.active_ms();
        self.record_at(point, elapsed_ms)
    }

    /// Append a pre-timed sample. Time must not run backwards.
    pub fn record_at(&mut self, point: GazePoint, elapsed_ms: u64) -> Result<(), SessionError> {
        if self.state != RecordingSessionState::Recording {
            return Err(SessionError::NotRecording);
        }
        if elapsed_ms < self.last_elapsed_ms {
            return Err(SessionError::NonMonotonicSample {
                last_ms: self.last_elapsed_ms,
                got_ms: elapsed_ms,
            });
        }
        self.last_elapsed_ms = elapsed_ms;
        self.samples.push(RecordingSample {
            x: point.x,
            y: point.y,
            elapsed_ms,
        });
        Ok(())
    }

    /// Finish the session and reduce it to the export shape. `duration`
    /// is active seconds; `sample_rate` is samples per second rounded to
    /// two decimals. A session with no samples exports an empty vector
    /// and rate zero.
    pub fn complete(&mut self) -> Result<RecordingSessionData, SessionError> {
        if let Some(anchor) = self.anchor.take() {
            self.baseline_ms += anchor.elapsed().as_millis() as u64;
        }
        self.transition(RecordingSessionState::Completed)?;

        let recorded_at = self.recorded_at.unwrap_or_else(Utc::now);
        let duration = self.baseline_ms as f64 / 1000.0;
        let sample_rate = if duration > 0.0 && !self.samples.is_empty() {
            round2(self.samples.len() as f64 / duration)
        } else {
            0.0
        };

        let samples = self
            .samples
            .iter()
            .map(|s| RecordingSessionSample {
                timestamp: recorded_at + Duration::milliseconds(s.elapsed_ms as i64),
                pos: self.reduce(s.point()),
            })
            .collect();

        self.final_duration = duration;
        self.final_sample_rate = sample_rate;

        Ok(RecordingSessionData {
            sample_rate,
            recorded_at,
            duration,
            samples,
        })
    }

    /// Collapse a gaze point to the export scalar, clamped to [0, 1].
    fn reduce(&self, point: GazePoint) -> f64 {
        let (value, extent) = match self.axis {
            ReduceAxis::NormalizedX => (point.x, self.viewport.width),
            ReduceAxis::NormalizedY => (point.y, self.viewport.height),
        };
        if extent <= 0.0 {
            return 0.0;
        }
        (value as f64 / extent as f64).clamp(0.0, 1.0)
    }

    /// The descriptive envelope for a completed session.
    pub fn session_info(&self, user_agent: &str) -> Option<SessionInfo> {
        if self.state != RecordingSessionState::Completed {
            return None;
        }
        Some(SessionInfo {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            user_agent: user_agent.to_string(),
            accuracy: self.accuracy,
            sample_rate: self.final_sample_rate,
            duration: self.final_duration,
            created_at: self.recorded_at.unwrap_or_else(Utc::now),
        })
    }

    /// Return a completed session to ready, dropping all collected data.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.transition(RecordingSessionState::Ready)?;
        self.id = None;
        self.recorded_at = None;
        self.samples.clear();
        self.last_elapsed_ms = 0;
        self.baseline_ms = 0;
        self.anchor = None;
        self.accuracy = None;
        self.final_duration = 0.0;
        self.final_sample_rate = 0.0;
        Ok(())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
