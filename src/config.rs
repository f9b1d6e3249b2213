use crate::model::PersistedState;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tunebox";
const SETTINGS_FILE: &str = "settings.json";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("TUNEBOX_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

/// Database location for `state`: absolute paths are kept, relative ones
/// live under the config root.
pub fn database_path(state: &PersistedState) -> Result<PathBuf> {
    let configured = Path::new(&state.database_file);
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    Ok(config_root()?.join(configured))
}

pub fn load_state() -> Result<PersistedState> {
    load_state_from_path(&settings_path()?)
}

pub fn save_state(state: &PersistedState) -> Result<()> {
    ensure_config_dir()?;
    save_state_to_path(&settings_path()?, state)
}

fn load_state_from_path(path: &Path) -> Result<PersistedState> {
    if !path.exists() {
        return Ok(PersistedState::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let state: PersistedState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(state)
}

fn save_state_to_path(path: &Path, state: &PersistedState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
