use glam::{Mat2, Vec2};

/// Two-state (position, velocity) Kalman filter for one gaze axis.
///
/// Ticks are treated as unit time steps. The first finite sample
/// initializes the state and passes through unchanged; a NaN sample
/// resets the axis so the next finite sample re-initializes it.
#[derive(Debug, Clone, Copy)]
pub struct KalmanFilter {
    transition: Mat2,
    process_noise: Mat2,
    measurement_noise: f32,
    state: Vec2,
    covariance: Mat2,
    initialized: bool,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self {
            transition: Mat2::from_cols(Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)),
            process_noise: Mat2::from_diagonal(Vec2::new(0.05, 0.05)),
            measurement_noise: 4.0,
            state: Vec2::ZERO,
            covariance: Mat2::IDENTITY,
            initialized: false,
        }
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_config(process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            process_noise: Mat2::from_diagonal(Vec2::splat(process_noise)),
            measurement_noise,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.state = Vec2::ZERO;
        self.covariance = Mat2::IDENTITY;
        self.initialized = false;
    }

    /// Feed one measurement, get the filtered position estimate.
    pub fn filter(&mut self, x: f32) -> f32 {
        if x.is_nan() {
            self.reset();
            return x;
        }

        if !self.initialized {
            self.initialized = true;
            self.state = Vec2::new(x, 0.0);
            self.covariance = Mat2::IDENTITY;
            return x;
        }

        // Predict.
        self.state = self.transition * self.state;
        self.covariance =
            self.transition * self.covariance * self.transition.transpose() + self.process_noise;

        // Update against the scalar position measurement.
        let innovation = x - self.state.x;
        let innovation_var = self.covariance.col(0).x + self.measurement_noise;
        let gain = self.covariance.col(0) / innovation_var;

        self.state += gain * innovation;
        let gain_h = Mat2::from_cols(gain, Vec2::ZERO);
        self.covariance = (Mat2::IDENTITY - gain_h) * self.covariance;

        self.state.x
    }
}
