use api::{GazePoint, Viewport};

use crate::KalmanFilter;

/// Post-processes raw module predictions before they are published.
///
/// Order is fixed: clamp into the viewport, then smooth. Smoothing
/// state survives pauses but is dropped by `reset`.
pub struct GazeMutator {
    x: KalmanFilter,
    y: KalmanFilter,
}

impl GazeMutator {
    pub fn new() -> Self {
        Self {
            x: KalmanFilter::new(),
            y: KalmanFilter::new(),
        }
    }

    pub fn new_with_config(process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            x: KalmanFilter::new_with_config(process_noise, measurement_noise),
            y: KalmanFilter::new_with_config(process_noise, measurement_noise),
        }
    }

    pub fn process(&mut self, raw: GazePoint, viewport: Viewport, apply_kalman: bool) -> GazePoint {
        let bounded = viewport.bound(raw);
        if !apply_kalman {
            return bounded;
        }
        GazePoint::new(self.x.filter(bounded.x), self.y.filter(bounded.y))
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }
}

impl Default for GazeMutator {
    fn default() -> Self {
        Self::new()
    }
}
