pub mod replay;

pub use replay::{ReplayGazeModule, MODULE_NAME};
