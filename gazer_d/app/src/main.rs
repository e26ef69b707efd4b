use anyhow::{bail, Context, Result};
use api::{CalibrationPoint, EventType, GazePoint};
use common::{
    measure_accuracy, CalibrationSequence, GazeTracker, GazerConfig, RecordingSession,
    CENTER_POINT,
};
use log::{debug, error, info, trace, warn};
use replay_module::ReplayGazeModule;
use sim_module::SimGazeModule;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Value following `flag`, if present.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

/// Drive the click-to-calibrate pass against the live tracker, then
/// measure accuracy by storing a window of predictions on the center
/// target.
fn run_calibration(
    tracker: &mut GazeTracker,
    config: &GazerConfig,
    running: &Arc<AtomicBool>,
) -> Result<u8> {
    let viewport = config.session.viewport;
    let mut sequence = match &config.calibration.points {
        Some(points) => CalibrationSequence::with_points(
            points.iter().map(|&(x, y)| CalibrationPoint::at(x, y)),
            config.calibration.click_threshold,
        ),
        None => CalibrationSequence::new(config.calibration.click_threshold),
    };
    if sequence.is_empty() {
        bail!("calibration grid is empty");
    }

    info!(
        "Calibrating: {} targets, {} clicks each",
        sequence.len(),
        sequence.click_threshold()
    );
    let tick = Duration::from_millis(config.tracker.data_timestep.max(1));

    for index in 0..sequence.len() {
        let target = match sequence.point_px(index, viewport) {
            Some(target) => target,
            None => continue,
        };
        for _ in 0..sequence.click_threshold() {
            if !running.load(Ordering::SeqCst) {
                bail!("calibration interrupted");
            }
            tracker.record_screen_position(target.x, target.y, EventType::Click);
            sequence.click(index);
            thread::sleep(tick);
        }
        info!(
            "Calibration target {}/{} complete ({:.0}%)",
            index + 1,
            sequence.len(),
            sequence.progress() * 100.0
        );
    }

    let center_index = if sequence.len() == 9 {
        CENTER_POINT
    } else {
        sequence.len() / 2
    };
    let center = match sequence.point_px(center_index, viewport) {
        Some(center) => center,
        None => bail!("calibration grid has no center target"),
    };

    info!(
        "Measuring accuracy on the center target ({} predictions)",
        config.calibration.accuracy_window
    );
    for k in 0..config.calibration.accuracy_window {
        if !running.load(Ordering::SeqCst) {
            bail!("accuracy measurement interrupted");
        }
        if let Some(point) = tracker.current_prediction() {
            tracker.store_points(point.x, point.y, k);
        }
        thread::sleep(tick);
    }

    let stored = tracker.get_stored_points();
    if stored.is_empty() {
        warn!("No predictions were stored during the accuracy pass");
    }
    Ok(measure_accuracy(&stored, center, viewport))
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    info!("Starting...");
    debug!("Debug logging is active");
    trace!("Trace logging is active");

    let args: Vec<String> = std::env::args().collect();

    let config_path = arg_value(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let mut config = GazerConfig::load_or_create(&config_path).unwrap_or_else(|e| {
        error!("Failed to load config: {}. Using defaults.", e);
        GazerConfig::default()
    });

    if let Some(trace_path) = arg_value(&args, "--replay") {
        config.module.active = replay_module::MODULE_NAME.to_string();
        config.tracker.static_trace = Some(PathBuf::from(trace_path));
    }
    if args.iter().any(|arg| arg == "--calibrate") {
        config.calibration.enabled = true;
    }
    if let Some(secs) = arg_value(&args, "--duration") {
        let secs: f64 = secs
            .parse()
            .with_context(|| format!("Invalid --duration value: {}", secs))?;
        config.session.duration_secs = Some(secs);
    }
    if let Some(out) = arg_value(&args, "--out") {
        config.output.path = if out == "-" {
            None
        } else {
            Some(PathBuf::from(out))
        };
    }
    info!("Loaded Config: {:?}", config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("Received Ctrl-C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    let params = config.tracker_params();
    let mut tracker = GazeTracker::new(params);

    tracker.add_tracker_module(
        sim_module::MODULE_NAME,
        Box::new(|| Box::new(SimGazeModule::default())),
    );
    info!("✓ Registered gaze source '{}'", sim_module::MODULE_NAME);
    tracker.add_tracker_module(
        replay_module::MODULE_NAME,
        Box::new(|| Box::new(ReplayGazeModule::new())),
    );
    info!("✓ Registered gaze source '{}'", replay_module::MODULE_NAME);

    let (tx, rx) = sync_channel::<(Option<GazePoint>, u64)>(1);
    tracker.set_gaze_listener(Box::new(move |prediction, elapsed_ms| {
        let _ = tx.try_send((prediction, elapsed_ms));
    }));

    let failed = Arc::new(AtomicBool::new(false));
    let on_fail: api::OnFail = {
        let running = running.clone();
        let failed = failed.clone();
        Box::new(move |e| {
            error!("✗ Gaze source failed to start: {}", e);
            failed.store(true, Ordering::SeqCst);
            running.store(false, Ordering::SeqCst);
        })
    };
    tracker.begin(Some(on_fail))?;

    let wait_start = Instant::now();
    while !tracker.is_ready() && running.load(Ordering::SeqCst) {
        if wait_start.elapsed() > Duration::from_secs(10) {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    if !tracker.is_ready() {
        let _ = tracker.end();
        if failed.load(Ordering::SeqCst) {
            bail!("gaze source '{}' failed to initialize", config.module.active);
        }
        if !running.load(Ordering::SeqCst) {
            return Ok(());
        }
        bail!("gaze source '{}' never became ready", config.module.active);
    }
    info!("Gaze source '{}' is ready", config.module.active);

    let mut session = RecordingSession::new(config.session.viewport, config.session.axis);

    if config.calibration.enabled {
        session
            .begin_calibration()
            .context("Could not enter calibration")?;
        match run_calibration(&mut tracker, &config, &running) {
            Ok(accuracy) => {
                session.set_accuracy(accuracy);
                info!("Calibration accuracy: {}%", accuracy);
            }
            Err(e) => warn!("Calibration aborted: {}", e),
        }
    }

    if !running.load(Ordering::SeqCst) {
        let _ = tracker.end();
        return Ok(());
    }

    session.start().context("Could not start recording")?;
    info!("Recording... (Ctrl-C to finish)");

    let duration_limit_ms = config.session.duration_secs.map(|s| (s * 1000.0) as u64);
    let mut sample_count: u64 = 0;
    let mut dropped: u64 = 0;

    while running.load(Ordering::SeqCst) {
        if let Some(limit_ms) = duration_limit_ms {
            if session.active_ms() >= limit_ms {
                info!("Configured duration reached");
                break;
            }
        }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok((Some(point), _elapsed_ms)) => {
                if let Err(e) = session.record(point) {
                    warn!("Dropped sample: {}", e);
                    continue;
                }
                sample_count += 1;
                if sample_count.is_multiple_of(100) {
                    info!(
                        "Recorded {} samples ({:.1}s active)",
                        sample_count,
                        session.active_ms() as f32 / 1000.0
                    );
                }
            }
            Ok((None, _elapsed_ms)) => {
                dropped += 1;
                #[cfg(feature = "xtralog")]
                trace!("No prediction at {}ms", _elapsed_ms);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Gaze stream disconnected");
                break;
            }
        }
    }

    tracker.clear_gaze_listener();

    let data = session.complete().context("Could not complete session")?;
    if dropped > 0 {
        info!("{} ticks carried no prediction", dropped);
    }
    if let Some(info) = session.session_info(&config.session.user_agent) {
        info!(
            "Session {}: {} samples, {:.2}s at {} samples/s, accuracy {}",
            info.id,
            data.samples.len(),
            data.duration,
            data.sample_rate,
            info.accuracy
                .map(|a| format!("{}%", a))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    let json = if config.output.pretty {
        serde_json::to_string_pretty(&data)?
    } else {
        serde_json::to_string(&data)?
    };
    match &config.output.path {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write export: {:?}", path))?;
            info!("✓ Wrote session export to {:?}", path);
        }
        None => println!("{}", json),
    }

    if let Some(trace_path) = &config.output.raw_trace_path {
        let raw = serde_json::to_string_pretty(session.samples())?;
        std::fs::write(trace_path, raw)
            .with_context(|| format!("Failed to write raw trace: {:?}", trace_path))?;
        info!(
            "✓ Wrote raw trace ({} samples) to {:?}",
            session.samples().len(),
            trace_path
        );
    }

    tracker.end()?;
    info!("Done.");
    Ok(())
}
