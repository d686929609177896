use crate::conf::{ConfigError, CwtailConfig, DEFAULT_CONFIG_PATH, load_config};
use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Validate configuration and exit
    Check {
        /// Path to the config file
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },

    /// Print resolved configuration, defaults included
    Dump {
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,

        /// Output as JSON
        #[arg(long, conflicts_with = "yaml")]
        json: bool,

        /// Output as YAML
        #[arg(long)]
        yaml: bool,
    },
}

pub fn check(path: PathBuf) -> Result<()> {
    let cfg = load_config(&path).inspect_err(|err| {
        if let Some(hint) = config_error_hint(err) {
            eprintln!("{hint}\n");
        }
    })?;
    let settings = cfg.tail_settings();

    println!("✔ Config loaded successfully");
    println!("✔ poll every {}ms", settings.poll_interval.as_millis());
    println!(
        "✔ {} pages per stream per cycle",
        settings.page_budget
    );
    println!("✔ store at {}", cfg.store.path.display());

    Ok(())
}

pub fn dump(path: PathBuf, json: bool, yaml: bool) -> Result<()> {
    let cfg: CwtailConfig = load_config(&path)?;

    if yaml {
        dump_yaml(&cfg)?;
    } else if json || !yaml {
        // default: json
        dump_json(&cfg)?;
    }

    Ok(())
}

fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::Parse { .. } => Some(
            "Sections are HCL objects and every field is optional.\n\
             \n\
             Example:\n\
             \n\
             tail = {\n\
             \x20 poll_interval_ms = 1000\n\
             \x20 page_budget      = 5\n\
             }",
        ),
        _ => None,
    }
}

fn dump_json<T: Serialize>(value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

fn dump_yaml<T: Serialize>(value: &T) -> Result<()> {
    let s = serde_yaml::to_string(value)?;
    println!("{s}");
    Ok(())
}
