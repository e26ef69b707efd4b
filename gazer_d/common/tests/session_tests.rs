use std::thread::sleep;
use std::time::Duration;

use api::{GazePoint, RecordingSessionState, SessionError, Viewport};
use chrono::Duration as ChronoDuration;
use common::{RecordingSession, ReduceAxis};

fn session() -> RecordingSession {
    RecordingSession::new(Viewport::new(1000.0, 500.0), ReduceAxis::NormalizedX)
}

#[test]
fn test_full_workflow_walks_every_state() {
    let mut session = session();
    assert_eq!(session.state(), RecordingSessionState::Ready);

    session.begin_calibration().expect("ready -> calibration");
    assert_eq!(session.state(), RecordingSessionState::Calibration);

    session.start().expect("calibration -> recording");
    assert_eq!(session.state(), RecordingSessionState::Recording);

    session.pause().expect("recording -> paused");
    assert_eq!(session.state(), RecordingSessionState::Paused);

    session.resume().expect("paused -> recording");
    session.complete().expect("recording -> completed");
    assert_eq!(session.state(), RecordingSessionState::Completed);

    session.reset().expect("completed -> ready");
    assert_eq!(session.state(), RecordingSessionState::Ready);
}

#[test]
fn test_illegal_transitions_name_both_states() {
    let mut session = session();

    assert_eq!(
        session.pause(),
        Err(SessionError::InvalidTransition {
            from: RecordingSessionState::Ready,
            to: RecordingSessionState::Paused,
        })
    );
    assert_eq!(
        session.resume(),
        Err(SessionError::InvalidTransition {
            from: RecordingSessionState::Ready,
            to: RecordingSessionState::Recording,
        })
    );
    assert!(session.complete().is_err(), "cannot complete before starting");

    session.start().expect("start");
    assert_eq!(
        session.begin_calibration(),
        Err(SessionError::InvalidTransition {
            from: RecordingSessionState::Recording,
            to: RecordingSessionState::Calibration,
        })
    );
}

#[test]
fn test_record_requires_recording_state() {
    let mut session = session();
    let point = GazePoint::new(100.0, 100.0);

    assert_eq!(session.record(point), Err(SessionError::NotRecording));

    session.start().expect("start");
    session.record(point).expect("recording accepts samples");

    session.pause().expect("pause");
    assert_eq!(session.record(point), Err(SessionError::NotRecording));
}

#[test]
fn test_samples_must_move_forward_in_time() {
    let mut session = session();
    session.start().expect("start");

    let point = GazePoint::new(100.0, 100.0);
    session.record_at(point, 100).expect("first sample");
    session.record_at(point, 100).expect("equal timestamps are fine");

    assert_eq!(
        session.record_at(point, 50),
        Err(SessionError::NonMonotonicSample {
            last_ms: 100,
            got_ms: 50,
        })
    );
    assert_eq!(session.samples().len(), 2, "the rejected sample is dropped");
}

#[test]
fn test_pause_excludes_time_from_the_active_clock() {
    let mut session = session();
    session.start().expect("start");

    sleep(Duration::from_millis(50));
    session.pause().expect("pause");
    let banked = session.active_ms();
    assert!(banked >= 50, "active time covers the recording window, got {}", banked);

    // A long pause must not leak into active time.
    sleep(Duration::from_millis(300));
    assert_eq!(session.active_ms(), banked, "the clock is stopped while paused");

    session.resume().expect("resume");
    let after_resume = session.active_ms();
    assert!(
        after_resume < 250,
        "paused time leaked into the active clock: {} ms",
        after_resume
    );
}

#[test]
fn test_completion_reduces_samples_and_stamps_timestamps() {
    let mut session = session();
    session.start().expect("start");

    session.record_at(GazePoint::new(250.0, 400.0), 0).expect("sample");
    session.record_at(GazePoint::new(500.0, 400.0), 500).expect("sample");
    session.record_at(GazePoint::new(2000.0, 400.0), 1000).expect("sample");
    session.record_at(GazePoint::new(-40.0, 400.0), 1500).expect("sample");

    let data = session.complete().expect("complete");

    let positions: Vec<f64> = data.samples.iter().map(|s| s.pos).collect();
    assert_eq!(positions, vec![0.25, 0.5, 1.0, 0.0], "x over width, clamped to [0, 1]");

    assert_eq!(data.samples[0].timestamp, data.recorded_at);
    assert_eq!(
        data.samples[2].timestamp,
        data.recorded_at + ChronoDuration::milliseconds(1000)
    );
}

#[test]
fn test_vertical_reduction_uses_height() {
    let mut session = RecordingSession::new(Viewport::new(1000.0, 500.0), ReduceAxis::NormalizedY);
    session.start().expect("start");

    session.record_at(GazePoint::new(0.0, 100.0), 0).expect("sample");
    session.record_at(GazePoint::new(0.0, 750.0), 100).expect("sample");
    session.record_at(GazePoint::new(0.0, -10.0), 200).expect("sample");

    let data = session.complete().expect("complete");
    let positions: Vec<f64> = data.samples.iter().map(|s| s.pos).collect();
    assert_eq!(positions, vec![0.2, 1.0, 0.0]);
}

#[test]
fn test_sample_rate_rounds_to_two_decimals() {
    let mut session = session();
    session.start().expect("start");

    for i in 0..10u64 {
        session
            .record_at(GazePoint::new(100.0, 100.0), i * 10)
            .expect("sample");
    }
    sleep(Duration::from_millis(120));

    let data = session.complete().expect("complete");
    assert!(data.duration > 0.0);
    assert!(data.sample_rate > 0.0);

    let scaled = data.sample_rate * 100.0;
    assert!(
        (scaled - scaled.round()).abs() < 1e-6,
        "rate {} carries more than two decimals",
        data.sample_rate
    );
}

#[test]
fn test_empty_session_exports_cleanly() {
    let mut session = session();
    session.start().expect("start");

    let data = session.complete().expect("complete");
    assert!(data.samples.is_empty());
    assert_eq!(data.sample_rate, 0.0);
    assert!(data.duration >= 0.0);
}

#[test]
fn test_session_info_appears_only_after_completion() {
    let mut session = session();
    assert!(session.session_info("agent").is_none());

    session.start().expect("start");
    session.set_accuracy(87);
    assert!(session.session_info("agent").is_none());

    let data = session.complete().expect("complete");
    let info = session.session_info("gazer_d/test").expect("completed sessions have info");
    assert_eq!(info.user_agent, "gazer_d/test");
    assert_eq!(info.accuracy, Some(87));
    assert_eq!(info.duration, data.duration);
    assert_eq!(info.sample_rate, data.sample_rate);
    assert_eq!(info.created_at, data.recorded_at);

    let again = session.session_info("gazer_d/test").expect("info");
    assert_eq!(info.id, again.id, "the session id is stable");
}

#[test]
fn test_accuracy_is_capped_at_one_hundred() {
    let mut session = session();
    session.set_accuracy(255);
    assert_eq!(session.accuracy(), Some(100));
}

#[test]
fn test_reset_drops_all_session_data() {
    let mut session = session();
    session.start().expect("start");
    session.record_at(GazePoint::new(1.0, 1.0), 10).expect("sample");
    session.set_accuracy(90);
    session.complete().expect("complete");

    session.reset().expect("reset");
    assert_eq!(session.state(), RecordingSessionState::Ready);
    assert!(session.samples().is_empty());
    assert_eq!(session.accuracy(), None);
    assert!(session.session_info("agent").is_none());

    // A reset session starts over from scratch.
    session.start().expect("restart");
    session.record_at(GazePoint::new(1.0, 1.0), 5).expect("old timestamps are legal again");
}

#[test]
fn test_calibration_can_be_cancelled() {
    let mut session = session();
    session.begin_calibration().expect("begin");
    session.cancel_calibration().expect("cancel");
    assert_eq!(session.state(), RecordingSessionState::Ready);

    session.begin_calibration().expect("begin again");
    session.start().expect("record straight out of calibration");
}
