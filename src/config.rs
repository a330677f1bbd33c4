use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use crate::filter::DEFAULT_PAGE_SIZE;

pub const DEFAULT_LOG_FILTER: &str = "spendbook=warn";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page size used by `expense list` when `--size` is not given.
    #[serde(default = "default_page_size")]
    pub default_page_size: NonZeroU32,

    /// `tracing` filter directives, overridden by `SPENDBOOK_LOG`.
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_page_size() -> NonZeroU32 {
    DEFAULT_PAGE_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            log_filter: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

/// Resolves the config and data directories. `home` (from `--home` or
/// `SPENDBOOK_HOME`) keeps everything under one directory, which the tests
/// rely on; otherwise the platform locations are used.
pub fn app_paths(home: Option<PathBuf>) -> Result<AppPaths> {
    let (config_dir, data_dir) = match home {
        Some(home) => (home.join("config"), home.join("data")),
        None => {
            let dirs = ProjectDirs::from("com", "spendbook", "spendbook")
                .context("Could not determine a home directory for spendbook")?;
            (dirs.config_dir().to_owned(), dirs.data_dir().to_owned())
        }
    };
    Ok(AppPaths {
        config_dir,
        data_dir,
    })
}

/// Reads `config.json`, writing the defaults first when it does not exist.
pub fn load_or_init_config(paths: &AppPaths) -> Result<(AppConfig, PathBuf)> {
    let cfg_path = paths.config_dir.join("config.json");

    let cfg = match fs::read_to_string(&cfg_path) {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("Malformed config at {}", cfg_path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(&paths.config_dir).with_context(|| {
                format!("Cannot create config dir {}", paths.config_dir.display())
            })?;
            let cfg = AppConfig::default();
            write_config(&cfg_path, &cfg)?;
            cfg
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Cannot read {}", cfg_path.display()));
        }
    };

    Ok((cfg, cfg_path))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let mut json = serde_json::to_string_pretty(cfg)?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
