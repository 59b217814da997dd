pub mod config;
pub mod config_loader;

pub use config::{AppConfig, ExecutionConfig, PricingConfig, SelectionConfig};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
