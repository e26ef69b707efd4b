use std::collections::HashMap;

use api::{RegressionModel, TrackerError, TrackerModule};
use log::debug;

use crate::WindowedRegression;

pub type TrackerFactory = Box<dyn Fn() -> Box<dyn TrackerModule> + Send>;
pub type RegressionFactory = Box<dyn Fn() -> Box<dyn RegressionModel> + Send>;

/// Supported regression names. The solvers behind them are external;
/// the host only distinguishes the name it reports and snapshots.
pub const REGRESSION_NAMES: [&str; 3] = ["ridge", "weightedRidge", "threadedRidge"];

/// Name-to-factory registry for tracker and regression modules.
///
/// Tracker modules are deliberately not pre-registered: gaze sources are
/// plugins, and a host that never registered one fails module resolution
/// at start instead of silently producing nothing.
pub struct ModuleRegistry {
    trackers: HashMap<String, TrackerFactory>,
    regressions: HashMap<String, RegressionFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            trackers: HashMap::new(),
            regressions: HashMap::new(),
        }
    }

    /// A registry with the canonical regression names pre-registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in REGRESSION_NAMES {
            registry.register_regression(name, Box::new(move || {
                Box::new(WindowedRegression::new(name))
            }));
        }
        registry
    }

    pub fn register_tracker(&mut self, name: &str, factory: TrackerFactory) {
        debug!("Registered tracker module '{}'", name);
        self.trackers.insert(name.to_string(), factory);
    }

    pub fn register_regression(&mut self, name: &str, factory: RegressionFactory) {
        debug!("Registered regression model '{}'", name);
        self.regressions.insert(name.to_string(), factory);
    }

    pub fn has_tracker(&self, name: &str) -> bool {
        self.trackers.contains_key(name)
    }

    pub fn has_regression(&self, name: &str) -> bool {
        self.regressions.contains_key(name)
    }

    pub fn create_tracker(&self, name: &str) -> Result<Box<dyn TrackerModule>, TrackerError> {
        self.trackers
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| TrackerError::UnknownTrackerModule(name.to_string()))
    }

    pub fn create_regression(&self, name: &str) -> Result<Box<dyn RegressionModel>, TrackerError> {
        self.regressions
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| TrackerError::UnknownRegressionModule(name.to_string()))
    }

    pub fn tracker_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.trackers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn regression_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.regressions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
