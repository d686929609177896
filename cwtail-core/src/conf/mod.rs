mod constraints;
pub mod error;
mod loader;
#[cfg(test)]
mod tests;
pub mod types;

pub use error::ConfigError;
pub use loader::{DEFAULT_CONFIG_PATH, load_config, load_or_default};
pub use types::CwtailConfig;
