use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::drawing::palette::{Brush, Color};

const APP_DIR: &str = "pixgrid";
pub const STORE_ENV: &str = "PIXGRID_STORE";

/// Runtime settings. Layered as: defaults < config file < `PIXGRID_STORE` <
/// `--store`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
    pub default_color: Color,
    pub default_brush: Brush,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            store_path: data_dir.join("drawings.json"),
            log_dir: data_dir,
            default_color: Color::Gray,
            default_brush: Brush::Solid,
        }
    }
}

impl Config {
    pub fn config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
    }

    pub fn load(cli_store: Option<PathBuf>) -> Result<Self> {
        let file = Self::config_file();
        let env_store = std::env::var(STORE_ENV).ok();
        Self::resolve(file.as_deref(), env_store, cli_store)
    }

    pub fn resolve(
        file: Option<&Path>,
        env_store: Option<String>,
        cli_store: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = match file {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Malformed config {}", path.display()))?
            }
            _ => Self::default(),
        };

        if let Some(env) = env_store.filter(|v| !v.trim().is_empty()) {
            config.store_path = PathBuf::from(env);
        }
        if let Some(cli) = cli_store {
            config.store_path = cli;
        }
        Ok(config)
    }
}
