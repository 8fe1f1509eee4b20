pub mod settings;

pub use settings::{LogFormat, LoggingSettings, RunEnvironment, Settings};
