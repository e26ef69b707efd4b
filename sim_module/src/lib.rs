pub mod sim;

pub use sim::{SimGazeModule, SimPattern, DEFAULT_DROPOUT_INTERVAL, MODULE_NAME};
