use api::{DataWindow, EventType, Observation, RegressionData, RegressionModel};

/// Retained click observations, matching the upstream ridge store.
pub const CLICK_WINDOW: usize = 700;
/// Retained cursor-trail observations.
pub const MOVE_WINDOW: usize = 50;

/// The observation store shared by every supported regression name.
///
/// The excluded solvers differ only in how they fit this data; what the
/// host records, snapshots, and restores is identical, so one windowed
/// store backs `ridge`, `weightedRidge`, and `threadedRidge` alike.
pub struct WindowedRegression {
    name: String,
    clicks: DataWindow<Observation>,
    moves: DataWindow<Observation>,
}

impl WindowedRegression {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            clicks: DataWindow::new(CLICK_WINDOW),
            moves: DataWindow::new(MOVE_WINDOW),
        }
    }
}

impl RegressionModel for WindowedRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&mut self, obs: Observation) {
        match obs.kind {
            EventType::Click => self.clicks.push(obs),
            EventType::Move => self.moves.push(obs),
        }
    }

    fn data(&self) -> RegressionData {
        RegressionData {
            clicks: self.clicks.to_vec(),
            moves: self.moves.to_vec(),
        }
    }

    fn restore(&mut self, data: RegressionData) {
        self.clear();
        self.clicks.extend(data.clicks);
        self.moves.extend(data.moves);
    }

    fn clear(&mut self) {
        self.clicks.clear();
        self.moves.clear();
    }

    fn click_count(&self) -> usize {
        self.clicks.len()
    }

    fn move_count(&self) -> usize {
        self.moves.len()
    }
}
