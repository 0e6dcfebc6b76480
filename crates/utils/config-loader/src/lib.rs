pub mod app_config;
pub mod env;
pub mod loader;
pub mod logging;
pub mod scenario;

pub use app_config::BaseAppConfig;
pub use config::FileFormat;
pub use env::Env;
pub use loader::{PropertiesFile, load_config, load_config_from_str};
pub use logging::{FileLoggerConfig, LoggerConfig};
pub use scenario::StressScenarioConfig;
