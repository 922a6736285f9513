pub mod config;
pub mod errors;

pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use errors::{FailureClass, InterfaceError};
