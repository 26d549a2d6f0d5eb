//! Configuration loading.
//!
//! Settings come from, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `<config_dir>/fz-cmd/config.json` (or the file given with `--config`)
//! 3. `FZ_CMD_CACHE_DIR` / `FZ_CMD_RECENT_FILE`
//! 4. Command-line flags (applied by the caller)

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::entry::{PriorityTable, Source};
use crate::error::FzCmdError;
use crate::format::ColumnWidths;
use crate::limit::Limits;

// ============================================================================
// Constants
// ============================================================================

/// Directory name under the platform config/cache dirs
const APP_DIR: &str = "fz-cmd";

const CONFIG_FILE: &str = "config.json";

/// Recency record file name inside the cache dir
const RECENT_FILE: &str = "recent";

/// Curated catalog, next to the config file
const CURATED_FILE: &str = "commands.yaml";

/// tldr cache, inside the cache dir
const TLDR_FILE: &str = "tldr-commands.yaml";

/// Maximum number of remembered selections
pub const DEFAULT_RECENT_MAX: usize = 100;

pub const ENV_CACHE_DIR: &str = "FZ_CMD_CACHE_DIR";
pub const ENV_RECENT_FILE: &str = "FZ_CMD_RECENT_FILE";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub priority: PriorityTable,
    pub limits: Limits,
    pub widths: ColumnWidths,
    /// Where the per-source `<source>.json` collections live
    pub cache_dir: PathBuf,
    pub recent_file: PathBuf,
    pub recent_max: usize,
    /// YAML catalogs read by the `curated` and `tldr` adapters
    pub curated_file: PathBuf,
    pub tldr_file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    priority: Option<Vec<String>>,
    limits: Option<HashMap<String, usize>>,
    widths: Option<RawWidths>,
    cache_dir: Option<PathBuf>,
    recent_file: Option<PathBuf>,
    recent_max: Option<usize>,
    curated_file: Option<PathBuf>,
    tldr_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWidths {
    command: Option<usize>,
    description: Option<usize>,
    tags: Option<usize>,
}

// ============================================================================
// Loading
// ============================================================================

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn read_raw(path: &Path) -> Result<RawConfig, FzCmdError> {
    let content = fs::read_to_string(path).map_err(|e| FzCmdError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    serde_json::from_str(&content).map_err(|e| FzCmdError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl Config {
    /// Load configuration from `explicit`, or from the default location if it
    /// exists. An explicit file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, FzCmdError> {
        let raw = match explicit {
            Some(path) => read_raw(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_raw(&path)?,
                _ => {
                    debug!("No config file, using defaults");
                    RawConfig::default()
                }
            },
        };

        let cache_dir = dirs::cache_dir().map(|dir| dir.join(APP_DIR));
        let config_dir = dirs::config_dir().map(|dir| dir.join(APP_DIR));
        Self::resolve(raw, |key| std::env::var(key).ok(), cache_dir, config_dir)
    }

    fn resolve<F>(
        raw: RawConfig,
        env: F,
        default_cache_dir: Option<PathBuf>,
        default_config_dir: Option<PathBuf>,
    ) -> Result<Self, FzCmdError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let priority = match &raw.priority {
            Some(order) => PriorityTable::from_order(order.as_slice())?,
            None => PriorityTable::default(),
        };

        let limits = match &raw.limits {
            Some(map) => Limits::from_map(map)?,
            None => Limits::new(),
        };

        let mut widths = ColumnWidths::default();
        if let Some(raw_widths) = &raw.widths {
            widths.command = raw_widths.command.unwrap_or(widths.command);
            widths.description = raw_widths.description.unwrap_or(widths.description);
            widths.tags = raw_widths.tags.unwrap_or(widths.tags);
        }

        let cache_dir = non_empty(ENV_CACHE_DIR)
            .map(PathBuf::from)
            .or(raw.cache_dir)
            .or(default_cache_dir)
            .ok_or(FzCmdError::NoCacheDir)?;

        let recent_file = non_empty(ENV_RECENT_FILE)
            .map(PathBuf::from)
            .or(raw.recent_file)
            .unwrap_or_else(|| cache_dir.join(RECENT_FILE));

        let curated_file = raw.curated_file.unwrap_or_else(|| {
            default_config_dir
                .unwrap_or_else(|| cache_dir.clone())
                .join(CURATED_FILE)
        });
        let tldr_file = raw.tldr_file.unwrap_or_else(|| cache_dir.join(TLDR_FILE));

        Ok(Self {
            priority,
            limits,
            widths,
            recent_file,
            recent_max: raw.recent_max.unwrap_or(DEFAULT_RECENT_MAX),
            curated_file,
            tldr_file,
            cache_dir,
        })
    }

    /// Default collection path for a source
    pub fn source_path(&self, source: Source) -> PathBuf {
        self.cache_dir.join(format!("{}.json", source))
    }
}

// ============================================================================
// Tests
// ============================================================================
