use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use crate::shell::context::LogicMode;

pub const CONFIG_FILE: &str = "mush.toml";
pub const CONFIG_ENV: &str = "MUSH_CONFIG";

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct MushConfig {
    pub shell: ShellConfig,
    pub log: LogConfig,
    /// Where this configuration was read from, if anywhere.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub logic: LogicMode,
    /// Printed before each read when stdin is a terminal.
    pub prompt: String,
    pub reap_zombies: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            logic: LogicMode::default(),
            prompt: "mush$ ".to_string(),
            reap_zombies: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Resolves the configuration: an explicit path, then `$MUSH_CONFIG`, then
/// `./mush.toml`. Only the implicit local file may be absent.
pub fn load_config(explicit: Option<&Path>) -> Result<MushConfig> {
    let requested = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    let path = match requested {
        Some(path) => {
            if !path.exists() {
                bail!("❌ Configuration file not found: {}", path.display());
            }
            path
        }
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if !local.exists() {
                return Ok(MushConfig::default());
            }
            local
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut config: MushConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.source = Some(path);
    Ok(config)
}
