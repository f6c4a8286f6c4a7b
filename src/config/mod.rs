pub mod settings;

pub use settings::{ApiConfig, ConsoleConfig, ExportConfig, LoggingConfig, Settings};
