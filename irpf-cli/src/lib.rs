pub mod config;
pub mod http_rates;
pub mod logging;
pub mod output;

pub use config::{AppConfig, ConfigError};
pub use http_rates::HttpRateProvider;
pub use output::{CliOutput, OutputFormat};
