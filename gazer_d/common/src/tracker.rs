use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use api::{
    CameraConstraints, EventType, GazeListener, GazePoint, Observation, OnFail, RegressionData,
    RegressionModel, StoredPoints, TrackEye, TrackerError, TrackerModule, TrackerParams,
    TrackerSnapshot,
};
use log::{error, info, warn};

use crate::registry::{ModuleRegistry, RegressionFactory, TrackerFactory};
use crate::{GazeMutator, SnapshotStore};

/// The centered validation square inside the video viewer, in viewer
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFeedbackBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// The gaze tracking facade: hosts one tracker module on a producer
/// thread, post-processes its predictions, and fans them out to the
/// registered listener and the calibration surfaces.
///
/// `begin` resolves the active module by name and spawns the producer;
/// the module's `initialize` runs on that thread, so a slow camera never
/// blocks the caller. Elapsed time is measured from `begin` and keeps
/// counting across `pause`. Paused ticks dispatch nothing; a stopped
/// video feed dispatches `None` ticks.
pub struct GazeTracker {
    params: Arc<RwLock<TrackerParams>>,
    registry: ModuleRegistry,
    listener: Arc<Mutex<Option<GazeListener>>>,
    prediction: Arc<Mutex<Option<GazePoint>>>,
    regression: Arc<Mutex<Box<dyn RegressionModel>>>,
    stored: Arc<Mutex<StoredPoints>>,
    mutator: Arc<Mutex<GazeMutator>>,
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    video_on: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    started: Option<Instant>,
    last_move_ms: Option<u64>,
    handle: Option<JoinHandle<()>>,
}

impl GazeTracker {
    pub fn new(params: TrackerParams) -> Self {
        let registry = ModuleRegistry::with_defaults();
        let regression = registry.create_regression(&params.regression).unwrap_or_else(|e| {
            warn!("{}; falling back to '{}'", e, api::DEFAULT_REGRESSION);
            registry
                .create_regression(api::DEFAULT_REGRESSION)
                .unwrap_or_else(|_| Box::new(crate::WindowedRegression::new(api::DEFAULT_REGRESSION)))
        });

        Self {
            params: Arc::new(RwLock::new(params)),
            registry,
            listener: Arc::new(Mutex::new(None)),
            prediction: Arc::new(Mutex::new(None)),
            regression: Arc::new(Mutex::new(regression)),
            stored: Arc::new(Mutex::new(StoredPoints::new())),
            mutator: Arc::new(Mutex::new(GazeMutator::new())),
            stop: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            video_on: Arc::new(AtomicBool::new(true)),
            ready: Arc::new(AtomicBool::new(false)),
            started: None,
            last_move_ms: None,
            handle: None,
        }
    }

    /// Start the producer thread. Fails immediately when the configured
    /// tracker module was never registered; an asynchronous module
    /// initialization failure is reported through `on_fail` instead.
    pub fn begin(&mut self, on_fail: Option<OnFail>) -> Result<(), TrackerError> {
        if self.handle.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }

        let init_params = self.params_snapshot();
        let module = self.registry.create_tracker(&init_params.tracker)?;

        if init_params.save_data_across_sessions {
            match self.store().load() {
                Ok(Some(snapshot)) => {
                    if let Ok(mut stored) = self.stored.lock() {
                        *stored = snapshot.stored_points.clone();
                    }
                    if let Ok(mut model) = self.regression.lock() {
                        info!(
                            "Restoring {} click / {} move observations into '{}'",
                            snapshot.regression.clicks.len(),
                            snapshot.regression.moves.len(),
                            model.name()
                        );
                        model.restore(snapshot.regression);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Could not load gaze snapshot: {:#}", e),
            }
        }

        self.stop.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.video_on.store(true, Ordering::SeqCst);
        self.ready.store(false, Ordering::SeqCst);
        self.last_move_ms = None;
        if let Ok(mut slot) = self.prediction.lock() {
            *slot = None;
        }
        if let Ok(mut mutator) = self.mutator.lock() {
            mutator.reset();
        }

        let started = Instant::now();
        self.started = Some(started);

        let params = self.params.clone();
        let listener = self.listener.clone();
        let prediction = self.prediction.clone();
        let stored = self.stored.clone();
        let mutator = self.mutator.clone();
        let stop = self.stop.clone();
        let paused = self.paused.clone();
        let video_on = self.video_on.clone();
        let ready = self.ready.clone();

        let handle = thread::spawn(move || {
            producer_loop(
                module, on_fail, started, params, listener, prediction, stored, mutator, stop,
                paused, video_on, ready,
            );
        });
        self.handle = Some(handle);
        Ok(())
    }

    /// True once the module initialized on the producer thread.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Suspend tick dispatch. The elapsed clock keeps counting.
    pub fn pause(&mut self) -> Result<(), TrackerError> {
        if self.handle.is_none() {
            return Err(TrackerError::NotRunning);
        }
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TrackerError> {
        if self.handle.is_none() {
            return Err(TrackerError::NotRunning);
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Halt the source feed without stopping the tracker. Subsequent
    /// ticks dispatch `None` until the next `begin`.
    pub fn stop_video(&mut self) -> Result<(), TrackerError> {
        if self.handle.is_none() {
            return Err(TrackerError::NotRunning);
        }
        self.video_on.store(false, Ordering::SeqCst);
        info!("Video feed stopped; ticks now dispatch no prediction");
        Ok(())
    }

    /// Stop the producer, unload the module, and persist the snapshot
    /// when cross-session saving is on.
    pub fn end(&mut self) -> Result<(), TrackerError> {
        let handle = self.handle.take().ok_or(TrackerError::NotRunning)?;
        self.stop.store(true, Ordering::SeqCst);
        if handle.join().is_err() {
            error!("Gaze producer thread panicked");
        }

        if self.params_snapshot().save_data_across_sessions {
            if let Err(e) = self.save_snapshot() {
                warn!("Could not save gaze snapshot: {:#}", e);
            }
        }

        self.ready.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.video_on.store(true, Ordering::SeqCst);
        self.started = None;
        if let Ok(mut slot) = self.prediction.lock() {
            *slot = None;
        }
        info!("Gaze tracker ended");
        Ok(())
    }

    /// Milliseconds since `begin`, 0 when stopped.
    pub fn elapsed_ms(&self) -> u64 {
        self.started
            .map(|s| s.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn set_gaze_listener(&mut self, listener: GazeListener) -> &mut Self {
        if let Ok(mut slot) = self.listener.lock() {
            *slot = Some(listener);
        }
        self
    }

    pub fn clear_gaze_listener(&mut self) -> &mut Self {
        if let Ok(mut slot) = self.listener.lock() {
            *slot = None;
        }
        self
    }

    /// The latest published prediction, None before the first tick or on
    /// dropout.
    pub fn current_prediction(&self) -> Option<GazePoint> {
        self.prediction.lock().ok().and_then(|slot| *slot)
    }

    /// Pair an on-screen target with the current prediction and feed it
    /// to the active regression model. Move events closer together than
    /// `move_tick_size` milliseconds are dropped.
    pub fn record_screen_position(&mut self, x: f32, y: f32, kind: EventType) {
        let elapsed_ms = self.elapsed_ms();

        if kind == EventType::Move {
            let tick = self.params_snapshot().move_tick_size;
            if let Some(last) = self.last_move_ms {
                if elapsed_ms < last.saturating_add(tick) {
                    return;
                }
            }
            self.last_move_ms = Some(elapsed_ms);
        }

        let obs = Observation {
            target: GazePoint::new(x, y),
            prediction: self.current_prediction(),
            kind,
            elapsed_ms,
        };
        if let Ok(mut model) = self.regression.lock() {
            model.record(obs);
        }
    }

    /// Write a prediction into stored-points slot `k`, wrapping past the
    /// ring size.
    pub fn store_points(&mut self, x: f32, y: f32, k: usize) {
        if let Ok(mut stored) = self.stored.lock() {
            stored.store_at(GazePoint::new(x, y), k);
        }
    }

    /// Filled stored-point slots in ring order.
    pub fn get_stored_points(&self) -> Vec<GazePoint> {
        self.stored
            .lock()
            .map(|stored| stored.points())
            .unwrap_or_default()
    }

    /// Drop all recorded observations, stored points, and smoothing
    /// state, and delete the on-disk snapshot when persistence is on.
    pub fn clear_data(&mut self) -> Result<(), TrackerError> {
        if let Ok(mut model) = self.regression.lock() {
            model.clear();
        }
        if let Ok(mut stored) = self.stored.lock() {
            stored.clear();
        }
        if let Ok(mut mutator) = self.mutator.lock() {
            mutator.reset();
        }
        if self.params_snapshot().save_data_across_sessions {
            self.store().clear().map_err(TrackerError::Snapshot)?;
        }
        info!("Cleared gaze data");
        Ok(())
    }

    pub fn add_tracker_module(&mut self, name: &str, factory: TrackerFactory) -> &mut Self {
        self.registry.register_tracker(name, factory);
        self
    }

    pub fn add_regression_module(&mut self, name: &str, factory: RegressionFactory) -> &mut Self {
        self.registry.register_regression(name, factory);
        self
    }

    /// Select the tracker module used by the next `begin`.
    pub fn set_tracker(&mut self, name: &str) -> Result<&mut Self, TrackerError> {
        if !self.registry.has_tracker(name) {
            return Err(TrackerError::UnknownTrackerModule(name.to_string()));
        }
        if let Ok(mut params) = self.params.write() {
            params.tracker = name.to_string();
        }
        if self.handle.is_some() {
            info!("Tracker module '{}' takes effect on the next start", name);
        }
        Ok(self)
    }

    /// Swap in a fresh regression model, restoring the persisted
    /// observations into it when cross-session saving is on.
    pub fn set_regression(&mut self, name: &str) -> Result<&mut Self, TrackerError> {
        let mut model = self.registry.create_regression(name)?;

        if self.params_snapshot().save_data_across_sessions {
            match self.store().load() {
                Ok(Some(snapshot)) => model.restore(snapshot.regression),
                Ok(None) => {}
                Err(e) => warn!("Could not reload snapshot into '{}': {:#}", name, e),
            }
        }

        if let Ok(mut slot) = self.regression.lock() {
            *slot = model;
        }
        if let Ok(mut params) = self.params.write() {
            params.regression = name.to_string();
        }
        info!("Active regression model is now '{}'", name);
        Ok(self)
    }

    pub fn regression_name(&self) -> String {
        self.regression
            .lock()
            .map(|model| model.name().to_string())
            .unwrap_or_default()
    }

    /// Snapshot of the active model's recorded observations.
    pub fn regression_data(&self) -> RegressionData {
        self.regression
            .lock()
            .map(|model| model.data())
            .unwrap_or_default()
    }

    pub fn set_camera_constraints(&mut self, constraints: CameraConstraints) -> &mut Self {
        self.update_params(|p| p.cam_constraints = constraints)
    }

    /// Point replay-style sources at a pre-recorded trace file.
    pub fn set_static_trace(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        let path = path.into();
        self.update_params(|p| p.static_trace = Some(path))
    }

    pub fn set_viewer_size(&mut self, width: u32, height: u32) -> &mut Self {
        self.update_params(|p| {
            p.video_viewer_width = width;
            p.video_viewer_height = height;
        })
    }

    pub fn set_track_eye(&mut self, eye: TrackEye) -> &mut Self {
        self.update_params(|p| p.track_eye = eye)
    }

    pub fn show_video(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.show_video = on)
    }

    pub fn show_video_preview(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.show_video_preview = on)
    }

    pub fn mirror_video(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.mirror_video = on)
    }

    pub fn show_face_overlay(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.show_face_overlay = on)
    }

    pub fn show_face_feedback_box(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.show_face_feedback_box = on)
    }

    pub fn show_prediction_points(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.show_gaze_dot = on)
    }

    pub fn apply_kalman_filter(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.apply_kalman_filter = on)
    }

    pub fn save_data_across_sessions(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.save_data_across_sessions = on)
    }

    pub fn storing_points(&mut self, on: bool) -> &mut Self {
        self.update_params(|p| p.storing_points = on)
    }

    pub fn params(&self) -> TrackerParams {
        self.params_snapshot()
    }

    pub fn update_params(&mut self, f: impl FnOnce(&mut TrackerParams)) -> &mut Self {
        if let Ok(mut params) = self.params.write() {
            f(&mut params);
        }
        self
    }

    /// The centered validation square inside the video viewer, sized by
    /// the feedback-box ratio against the smaller viewer dimension.
    pub fn face_feedback_box_bounds(&self) -> FaceFeedbackBox {
        let params = self.params_snapshot();
        let width = params.video_viewer_width as f32;
        let height = params.video_viewer_height as f32;
        let side = params.face_feedback_box_ratio * width.min(height);
        FaceFeedbackBox {
            left: (width - side) / 2.0,
            top: (height - side) / 2.0,
            width: side,
            height: side,
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.store().path().to_path_buf()
    }

    fn params_snapshot(&self) -> TrackerParams {
        self.params
            .read()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn store(&self) -> SnapshotStore {
        SnapshotStore::new(self.params_snapshot().data_dir)
    }

    fn save_snapshot(&self) -> Result<(), TrackerError> {
        let regression = self
            .regression
            .lock()
            .map(|model| model.data())
            .unwrap_or_default();
        let stored_points = self
            .stored
            .lock()
            .map(|stored| stored.clone())
            .unwrap_or_default();
        self.store()
            .save(&TrackerSnapshot {
                regression,
                stored_points,
            })
            .map_err(TrackerError::Snapshot)
    }
}

impl Drop for GazeTracker {
    /// Joins the producer so a dropped tracker never leaks its thread.
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn producer_loop(
    mut module: Box<dyn TrackerModule>,
    mut on_fail: Option<OnFail>,
    started: Instant,
    params: Arc<RwLock<TrackerParams>>,
    listener: Arc<Mutex<Option<GazeListener>>>,
    prediction: Arc<Mutex<Option<GazePoint>>>,
    stored: Arc<Mutex<StoredPoints>>,
    mutator: Arc<Mutex<GazeMutator>>,
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    video_on: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
) {
    info!("Gaze producer started (module '{}')", module.name());

    let init_params = match params.read() {
        Ok(guard) => guard.clone(),
        Err(_) => {
            error!("Tracker parameter lock poisoned; producer exiting");
            return;
        }
    };

    if let Err(e) = module.initialize(&init_params) {
        error!("✗ Failed to initialize tracker module '{}': {}", module.name(), e);
        if let Some(callback) = on_fail.take() {
            callback(TrackerError::ModuleInit {
                name: module.name().to_string(),
                source: e,
            });
        }
        return;
    }
    info!("✓ Initialized tracker module '{}'", module.name());
    ready.store(true, Ordering::SeqCst);

    let mut tick_count: u64 = 0;
    let mut log_interval: u64 = 1000;
    let mut last_log = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        let tick_start = Instant::now();
        let (timestep, apply_kalman, storing, viewport) = match params.read() {
            Ok(guard) => (
                guard.data_timestep,
                guard.apply_kalman_filter,
                guard.storing_points,
                guard.viewport,
            ),
            Err(_) => break,
        };
        let target = Duration::from_millis(timestep.max(1));

        if paused.load(Ordering::SeqCst) {
            thread::sleep(target);
            continue;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;

        let raw = if video_on.load(Ordering::SeqCst) {
            match module.update() {
                Ok(point) => point,
                Err(e) => {
                    use std::cell::Cell;
                    thread_local! {
                        static LAST_UPDATE_WARN: Cell<Option<Instant>> = const { Cell::new(None) };
                    }
                    let now = Instant::now();
                    let should_log = LAST_UPDATE_WARN.with(|cell| match cell.get() {
                        Some(last) if now.duration_since(last).as_secs() < 5 => false,
                        _ => {
                            cell.set(Some(now));
                            true
                        }
                    });
                    if should_log {
                        warn!("Tracker module '{}' update failed: {}", module.name(), e);
                    }
                    None
                }
            }
        } else {
            None
        };

        let processed = raw.filter(|p| p.is_finite()).map(|p| match mutator.lock() {
            Ok(mut m) => m.process(p, viewport, apply_kalman),
            Err(_) => viewport.bound(p),
        });

        if let Ok(mut slot) = prediction.lock() {
            *slot = processed;
        }

        if storing {
            if let Some(point) = processed {
                if let Ok(mut stored) = stored.lock() {
                    stored.push(point);
                }
            }
        }

        if let Ok(mut slot) = listener.lock() {
            if let Some(callback) = slot.as_mut() {
                callback(processed, elapsed_ms);
            }
        }

        #[cfg(feature = "xtralog")]
        log::trace!("Tick {}: {:?} at {}ms", tick_count + 1, processed, elapsed_ms);

        tick_count += 1;
        if tick_count.is_multiple_of(log_interval) {
            let elapsed = last_log.elapsed().as_secs_f32();
            let rate = log_interval as f32 / elapsed;
            info!(
                "Tracking active: {} ticks (approx {:.1} Hz)",
                tick_count, rate
            );
            last_log = Instant::now();

            if tick_count >= 1_000_000 {
                log_interval = 1_000_000;
            } else if tick_count >= 100_000 {
                log_interval = 100_000;
            } else if tick_count >= 10_000 {
                log_interval = 10_000;
            }
        }

        let spent = tick_start.elapsed();
        if spent < target {
            thread::sleep(target - spent);
        }
    }

    module.unload();
    info!("Gaze producer stopped after {} ticks", tick_count);
}
