use crate::backend::{DEFAULT_EVENT_PAGE_SIZE, FileBackend};
use crate::conf::{CwtailConfig, DEFAULT_CONFIG_PATH, load_config, load_or_default};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: CwtailConfig,
    pub store_path: PathBuf,
}

impl CliContext {
    /// An explicit `config_path` must exist. Without one, `cwtail.hcl` in the
    /// working directory is used when present.
    pub fn load(config_path: Option<&Path>, store: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
        };
        let store_path = store.unwrap_or_else(|| config.store.path.clone());

        Ok(Self { config, store_path })
    }

    pub fn backend(&self) -> FileBackend {
        FileBackend::with_page_sizes(
            &self.store_path,
            self.config.store.page_size,
            DEFAULT_EVENT_PAGE_SIZE,
        )
    }
}
