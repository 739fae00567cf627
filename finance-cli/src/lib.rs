pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod report;
pub mod utils;

pub use cli::Cli;
pub use commands::{Context, build_registry, execute};
pub use config::{AppConfig, ConfigError};
