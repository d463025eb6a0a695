use std::path::PathBuf;

use stockbook_core::config::create_store;
use stockbook_core::BackendConfig;
use tracing::info;

use crate::app::resolve_config_path;
use crate::cli::{BackendKind, Cli, InitArgs};
use crate::config::{default_data_dir, default_snapshot_path, write_config, StockbookConfig};

fn backend_config(args: &InitArgs) -> anyhow::Result<BackendConfig> {
    match args.backend {
        BackendKind::FlatFile => {
            if args.snapshot.is_some() {
                return Err(anyhow::anyhow!(
                    "--snapshot only applies to the document backend"
                ));
            }
            let directory = match args.directory.as_deref() {
                Some(path) => PathBuf::from(path),
                None => default_data_dir()?,
            };
            Ok(BackendConfig::FlatFile { directory })
        }
        BackendKind::Document => {
            if args.directory.is_some() {
                return Err(anyhow::anyhow!(
                    "--directory only applies to the flat-file backend"
                ));
            }
            let snapshot = match args.snapshot.as_deref() {
                Some(path) => PathBuf::from(path),
                None => default_snapshot_path()?,
            };
            Ok(BackendConfig::Document {
                snapshot: Some(snapshot),
            })
        }
    }
}

pub fn handle_init(cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path(cli)?;
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        ));
    }

    let storage = backend_config(args)?;
    if let BackendConfig::Document {
        snapshot: Some(path),
    } = &storage
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create {}: {}", parent.display(), e)
            })?;
        }
    }
    create_store(&storage)?;
    write_config(&config_path, &StockbookConfig::new(storage))?;
    info!(config = %config_path.display(), "initialized");

    if !cli.quiet {
        println!("Config written to {}", config_path.display());
    }
    Ok(())
}
