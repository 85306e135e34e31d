pub mod planner;
pub mod task;

pub use planner::{
    bundled_runtime_relative_path, resolve_template, LaunchParameters, LaunchPlanner,
    ResolvedCommand,
};
pub use task::{GameProcess, LogLine, LogStream, ProcessLauncher};
