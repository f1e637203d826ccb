//! Configuration loading and parsing.
//!
//! Parses `paned.toml` (or an override path provided by the host) into typed
//! sections. Every field has a default, so a missing file or a missing key
//! yields a usable configuration. Unknown fields are ignored. Values outside
//! their usable range are clamped by [`Config::apply_clamps`], which logs each
//! adjustment under the `config` target.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "paned.toml";
const CONFIG_DIR_NAME: &str = "paned";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_tab_width")]
    pub tab_width: usize,
    /// Maximum number of undo frames kept per view.
    #[serde(default = "EditorConfig::default_undo_limit")]
    pub undo_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: Self::default_tab_width(),
            undo_limit: Self::default_undo_limit(),
        }
    }
}

impl EditorConfig {
    const fn default_tab_width() -> usize {
        4
    }
    const fn default_undo_limit() -> usize {
        500
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    /// Ring buffer capacity of a command view, in lines.
    #[serde(default = "CommandConfig::default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "CommandConfig::default_refresh_ms")]
    pub refresh_ms: u64,
    /// Value exported as `TERM` to child processes.
    #[serde(default = "CommandConfig::default_term")]
    pub term: String,
    /// Prefix of the instance/view id environment variables.
    #[serde(default = "CommandConfig::default_env_prefix")]
    pub env_prefix: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            max_rows: Self::default_max_rows(),
            refresh_ms: Self::default_refresh_ms(),
            term: Self::default_term(),
            env_prefix: Self::default_env_prefix(),
        }
    }
}

impl CommandConfig {
    const fn default_max_rows() -> usize {
        10_000
    }
    const fn default_refresh_ms() -> u64 {
        50
    }
    fn default_term() -> String {
        "vt100".to_string()
    }
    fn default_env_prefix() -> String {
        "PANED".to_string()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AutoScrollConfig {
    #[serde(default = "AutoScrollConfig::default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
        }
    }
}

impl AutoScrollConfig {
    const fn default_interval_ms() -> u64 {
        200
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub command: CommandConfig,
    #[serde(default)]
    pub autoscroll: AutoScrollConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub source: Option<PathBuf>,
}

/// Best-effort config path: local working directory first, then the
/// platform config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load configuration from `path` (or the discovered path). A missing or
/// unparsable file yields defaults; the result is always clamped.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut cfg = match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Config {
                raw: Some(content),
                file,
                source: Some(path),
            },
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    };
    cfg.apply_clamps();
    Ok(cfg)
}

impl Config {
    /// Parse from an in-memory TOML string (clamped).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file = toml::from_str::<ConfigFile>(content)?;
        let mut cfg = Config {
            raw: Some(content.to_string()),
            file,
            source: None,
        };
        cfg.apply_clamps();
        Ok(cfg)
    }

    /// Clamp values to their usable minimums. Returns the number of fields
    /// that were adjusted.
    pub fn apply_clamps(&mut self) -> usize {
        let mut changed = 0;
        changed += clamp_min("editor.tab_width", &mut self.file.editor.tab_width, 1);
        changed += clamp_min("editor.undo_limit", &mut self.file.editor.undo_limit, 1);
        changed += clamp_min("command.max_rows", &mut self.file.command.max_rows, 2);
        changed += clamp_min("command.refresh_ms", &mut self.file.command.refresh_ms, 10);
        changed += clamp_min(
            "autoscroll.interval_ms",
            &mut self.file.autoscroll.interval_ms,
            10,
        );
        changed
    }

    pub fn editor(&self) -> &EditorConfig {
        &self.file.editor
    }

    pub fn command(&self) -> &CommandConfig {
        &self.file.command
    }

    pub fn autoscroll(&self) -> &AutoScrollConfig {
        &self.file.autoscroll
    }
}

fn clamp_min<T>(field: &'static str, value: &mut T, min: T) -> usize
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if *value < min {
        info!(target: "config", field, raw = %*value, clamped = %min, "config_value_clamped");
        *value = min;
        1
    } else {
        0
    }
}
