use crate::conf::constraints::validate_config;
use crate::conf::error::ConfigError;
use crate::conf::types::CwtailConfig;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "cwtail.hcl";

pub fn load_config(path: &Path) -> Result<CwtailConfig, ConfigError> {
    //--------------------------------------------------------------------------
    // Hard fail: IO and parsing
    //--------------------------------------------------------------------------
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    let config: CwtailConfig = hcl::from_str(&raw).map_err(|e| ConfigError::parse(path, e))?;

    //--------------------------------------------------------------------------
    // Range validation (aggregate all errors)
    //--------------------------------------------------------------------------
    let errors = validate_config(&config);
    if !errors.is_empty() {
        return Err(ConfigError::Validation {
            path: path.to_path_buf(),
            errors,
        });
    }

    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<CwtailConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::ReadFile { source, .. }) if source.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(CwtailConfig::default())
        }
        other => other,
    }
}
