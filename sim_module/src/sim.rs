use anyhow::Result;
use api::{GazePoint, TrackerModule, TrackerParams, Viewport};
use glam::Vec2;
use log::info;

pub const MODULE_NAME: &str = "sim";

/// Drop every Nth prediction by default, to exercise consumers against
/// missing-data ticks.
pub const DEFAULT_DROPOUT_INTERVAL: u64 = 25;

/// Fraction of each half-axis the Lissajous sweep covers.
const LISSAJOUS_AMPLITUDE: f32 = 0.9;

/// Percentage coordinates visited by the sweep pattern, row major.
const SWEEP_POINTS: [(f32, f32); 9] = [
    (10.0, 10.0),
    (50.0, 10.0),
    (90.0, 10.0),
    (10.0, 50.0),
    (50.0, 50.0),
    (90.0, 50.0),
    (10.0, 90.0),
    (50.0, 90.0),
    (90.0, 90.0),
];

/// How the simulated gaze moves across the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimPattern {
    /// Smooth Lissajous curve at the given axis frequencies (Hz).
    Lissajous { fx: f32, fy: f32 },
    /// Visit the nine grid targets cyclically, dwelling on each.
    Sweep { dwell_ms: u64 },
}

impl Default for SimPattern {
    fn default() -> Self {
        SimPattern::Lissajous { fx: 0.11, fy: 0.17 }
    }
}

/// A deterministic synthetic gaze source. No camera, no model, no
/// randomness: the same tick sequence always produces the same points.
pub struct SimGazeModule {
    pattern: SimPattern,
    dropout_interval: u64,
    viewport: Viewport,
    timestep_ms: u64,
    tick: u64,
}

impl SimGazeModule {
    pub fn new(pattern: SimPattern) -> Self {
        Self {
            pattern,
            dropout_interval: DEFAULT_DROPOUT_INTERVAL,
            viewport: Viewport::default(),
            timestep_ms: 50,
            tick: 0,
        }
    }

    /// Drop every `interval`th prediction; 0 disables dropout.
    pub fn with_dropout(mut self, interval: u64) -> Self {
        self.dropout_interval = interval;
        self
    }

    fn point_at(&self, tick: u64) -> GazePoint {
        let elapsed_ms = tick * self.timestep_ms;
        match self.pattern {
            SimPattern::Lissajous { fx, fy } => {
                let t = elapsed_ms as f32 / 1000.0;
                let center = Vec2::from(self.viewport.center());
                let half = Vec2::new(self.viewport.width, self.viewport.height) / 2.0;
                let phase = Vec2::new(
                    (std::f32::consts::TAU * fx * t).sin(),
                    (std::f32::consts::TAU * fy * t + std::f32::consts::FRAC_PI_2).sin(),
                );
                GazePoint::from(center + phase * half * LISSAJOUS_AMPLITUDE)
            }
            SimPattern::Sweep { dwell_ms } => {
                let dwell = dwell_ms.max(1);
                let index = (elapsed_ms / dwell) as usize % SWEEP_POINTS.len();
                let (x_pct, y_pct) = SWEEP_POINTS[index];
                self.viewport.percent_to_px(x_pct, y_pct)
            }
        }
    }
}

impl Default for SimGazeModule {
    fn default() -> Self {
        Self::new(SimPattern::default())
    }
}

impl TrackerModule for SimGazeModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn initialize(&mut self, params: &TrackerParams) -> Result<()> {
        self.viewport = params.viewport;
        self.timestep_ms = params.data_timestep.max(1);
        self.tick = 0;
        info!(
            "Simulated gaze source ready: {:?} over {}x{} viewport",
            self.pattern, self.viewport.width, self.viewport.height
        );
        Ok(())
    }

    fn update(&mut self) -> Result<Option<GazePoint>> {
        let tick = self.tick;
        self.tick += 1;

        if self.dropout_interval > 0 && (tick + 1).is_multiple_of(self.dropout_interval) {
            return Ok(None);
        }
        Ok(Some(self.point_at(tick)))
    }

    fn unload(&mut self) {
        info!("Simulated gaze source unloaded after {} ticks", self.tick);
    }
}
