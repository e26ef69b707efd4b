use api::{
    EventType, GazePoint, Observation, RegressionModel, TrackerError, TrackerModule, TrackerParams,
};
use common::{ModuleRegistry, WindowedRegression, MOVE_WINDOW, REGRESSION_NAMES};

struct NullModule;

impl TrackerModule for NullModule {
    fn name(&self) -> &str {
        "null"
    }

    fn initialize(&mut self, _params: &TrackerParams) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self) -> anyhow::Result<Option<GazePoint>> {
        Ok(None)
    }

    fn unload(&mut self) {}
}

fn observation(x: f32, kind: EventType) -> Observation {
    Observation {
        target: GazePoint::new(x, 0.0),
        prediction: None,
        kind,
        elapsed_ms: x as u64,
    }
}

#[test]
fn test_defaults_carry_every_regression_name() {
    let registry = ModuleRegistry::with_defaults();

    for name in REGRESSION_NAMES {
        assert!(registry.has_regression(name), "'{}' should be registered", name);
        let model = registry.create_regression(name).expect("create model");
        assert_eq!(model.name(), name);
    }
    assert_eq!(
        registry.regression_names(),
        vec!["ridge", "threadedRidge", "weightedRidge"]
    );
    assert!(registry.tracker_names().is_empty(), "gaze sources are plugins");
}

#[test]
fn test_unknown_names_are_errors() {
    let registry = ModuleRegistry::with_defaults();

    assert!(matches!(
        registry.create_tracker("TFFacemesh"),
        Err(TrackerError::UnknownTrackerModule(_))
    ));
    assert!(matches!(
        registry.create_regression("linear"),
        Err(TrackerError::UnknownRegressionModule(_))
    ));
}

#[test]
fn test_registered_tracker_factory_is_used() {
    let mut registry = ModuleRegistry::new();
    assert!(!registry.has_tracker("null"));

    registry.register_tracker("null", Box::new(|| Box::new(NullModule)));
    assert!(registry.has_tracker("null"));

    let module = registry.create_tracker("null").expect("create module");
    assert_eq!(module.name(), "null");
    assert_eq!(registry.tracker_names(), vec!["null"]);
}

#[test]
fn test_regression_routes_events_by_kind() {
    let mut model = WindowedRegression::new("ridge");

    model.record(observation(1.0, EventType::Click));
    model.record(observation(2.0, EventType::Move));
    model.record(observation(3.0, EventType::Click));

    assert_eq!(model.click_count(), 2);
    assert_eq!(model.move_count(), 1);

    let data = model.data();
    assert_eq!(data.clicks[0].target.x, 1.0);
    assert_eq!(data.clicks[1].target.x, 3.0);
    assert_eq!(data.moves[0].target.x, 2.0);
}

#[test]
fn test_move_window_evicts_the_oldest() {
    let mut model = WindowedRegression::new("ridge");

    for i in 0..(MOVE_WINDOW + 10) {
        model.record(observation(i as f32, EventType::Move));
    }

    assert_eq!(model.move_count(), MOVE_WINDOW);
    let data = model.data();
    assert_eq!(data.moves.first().map(|o| o.target.x), Some(10.0));
    assert_eq!(
        data.moves.last().map(|o| o.target.x),
        Some((MOVE_WINDOW + 9) as f32)
    );
}

#[test]
fn test_restore_replaces_recorded_data() {
    let mut model = WindowedRegression::new("ridge");
    model.record(observation(1.0, EventType::Click));

    let mut replacement = WindowedRegression::new("weightedRidge");
    replacement.record(observation(50.0, EventType::Click));
    replacement.record(observation(60.0, EventType::Move));

    model.restore(replacement.data());
    assert_eq!(model.click_count(), 1);
    assert_eq!(model.move_count(), 1);
    assert_eq!(model.data().clicks[0].target.x, 50.0);

    model.clear();
    assert_eq!(model.click_count(), 0);
    assert_eq!(model.move_count(), 0);
    assert!(model.data().is_empty());
}
