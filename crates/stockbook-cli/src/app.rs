use std::path::PathBuf;

use stockbook_core::{open_store, Store};
use tracing::debug;

use crate::cli::Cli;
use crate::config::{default_config_path, read_config};

/// `--config` (or `STOCKBOOK_CONFIG`, via clap) wins over the XDG default.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.config.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_config_path()
}

pub struct AppContext {
    pub store: Box<dyn Store>,
    pub quiet: bool,
}

impl AppContext {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(cli)?;
        if !config_path.exists() {
            return Err(anyhow::anyhow!(
                "No config found at {}. Run `stockbook init` first.",
                config_path.display()
            ));
        }
        let config = read_config(&config_path)?;
        debug!(config = %config_path.display(), "opening store");
        let store = open_store(&config.storage)?;
        Ok(Self {
            store,
            quiet: cli.quiet,
        })
    }
}
