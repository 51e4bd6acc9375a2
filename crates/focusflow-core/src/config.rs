use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{info, warn};

const CONFIG_FILE: &str = "focusflow.toml";
const CONFIG_ENV_VAR: &str = "FOCUSFLOW_CONFIG";

/// Optional TOML configuration. A missing or broken file is never fatal;
/// the defaults below apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSection,
    pub ui: UiSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Data directory override; `~/` expands to the home directory.
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSection {
    pub color: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Config {
    #[tracing::instrument(skip(override_path))]
    pub fn load(override_path: Option<&Path>) -> Self {
        let Some(path) = resolve_config_path(override_path) else {
            info!("no config path resolvable; using defaults");
            return Self::default();
        };

        if !path.exists() {
            info!(file = %path.display(), "config file not found; using defaults");
            return Self::default();
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed reading config; using defaults");
                return Self::default();
            }
        };

        match toml::from_str::<Config>(&raw) {
            Ok(cfg) => {
                info!(file = %path.display(), "loaded config");
                cfg
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed parsing config; using defaults");
                Self::default()
            }
        }
    }
}

fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }

    if let Ok(raw) = std::env::var(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    dirs::config_dir().map(|dir| dir.join("focusflow").join(CONFIG_FILE))
}

#[tracing::instrument(skip(cfg, override_dir))]
pub fn resolve_data_dir(cfg: &Config, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Some(location) = cfg.data.location.as_deref() {
        expand_tilde(Path::new(location))
    } else {
        default_data_dir()?
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine data directory"))?;
    Ok(base.join("focusflow"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
