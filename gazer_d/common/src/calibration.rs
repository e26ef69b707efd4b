use api::{CalibrationPoint, GazePoint, Viewport};
use log::warn;

pub const DEFAULT_CLICK_THRESHOLD: u32 = 5;

/// Percentage coordinates of the standard nine-point grid, row major.
const GRID_POINTS: [(f32, f32); 9] = [
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

/// Index of the center target, used for the accuracy measurement pass.
pub const CENTER_POINT: usize = 4;

/// Drives a click-to-calibrate pass over a grid of screen targets.
pub struct CalibrationSequence {
    points: Vec<CalibrationPoint>,
    click_threshold: u32,
}

impl CalibrationSequence {
    /// The standard nine-point grid at 10/50/90 percent of each axis.
    pub fn new(click_threshold: u32) -> Self {
        Self::with_points(
            GRID_POINTS.iter().map(|&(x, y)| CalibrationPoint::at(x, y)),
            click_threshold,
        )
    }

    pub fn with_points(
        points: impl IntoIterator<Item = CalibrationPoint>,
        click_threshold: u32,
    ) -> Self {
        Self {
            points: points.into_iter().collect(),
            click_threshold: click_threshold.max(1),
        }
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn click_threshold(&self) -> u32 {
        self.click_threshold
    }

    /// Register a click on target `index`. Returns whether that target is
    /// now complete. Clicks past completion keep counting but change
    /// nothing; an out-of-range index is ignored.
    pub fn click(&mut self, index: usize) -> bool {
        match self.points.get_mut(index) {
            Some(point) => point.register_click(self.click_threshold),
            None => {
                warn!(
                    "Calibration click on target {} out of range ({} targets)",
                    index,
                    self.points.len()
                );
                false
            }
        }
    }

    /// Overall click progress in [0, 1]. Each target contributes at most
    /// `click_threshold` clicks.
    pub fn progress(&self) -> f32 {
        if self.points.is_empty() {
            return 1.0;
        }
        let collected: u32 = self
            .points
            .iter()
            .map(|p| p.clicks.min(self.click_threshold))
            .sum();
        collected as f32 / (self.click_threshold * self.points.len() as u32) as f32
    }

    pub fn is_complete(&self) -> bool {
        self.points.iter().all(|p| p.completed)
    }

    pub fn reset(&mut self) {
        for point in &mut self.points {
            point.clicks = 0;
            point.completed = false;
        }
    }

    /// Pixel position of target `index` inside `viewport`.
    pub fn point_px(&self, index: usize, viewport: Viewport) -> Option<GazePoint> {
        self.points
            .get(index)
            .map(|p| viewport.percent_to_px(p.x, p.y))
    }
}

/// Score stored predictions against a known on-screen target.
///
/// Each prediction earns 100 at zero distance, falling linearly to 0 at
/// half the viewport height; the result is the rounded mean. An empty
/// set of predictions scores 0.
pub fn measure_accuracy(stored: &[GazePoint], target_px: GazePoint, viewport: Viewport) -> u8 {
    if stored.is_empty() {
        return 0;
    }

    let half_height = viewport.height / 2.0;
    if half_height <= 0.0 {
        return 0;
    }

    let total: f32 = stored
        .iter()
        .map(|p| {
            let distance = p.distance_to(target_px);
            if distance.is_finite() && distance <= half_height {
                100.0 - (distance / half_height) * 100.0
            } else {
                0.0
            }
        })
        .sum();

    let mean = total / stored.len() as f32;
    mean.round().clamp(0.0, 100.0) as u8
}
