//! Engine config resolution: `--config`, then the per-user file, then defaults.

use std::path::{Path, PathBuf};

use pogkit_recon::EngineConfig;

use crate::CliError;

/// `<config dir>/pogkit/config.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pogkit").join("config.toml"))
}

pub fn resolve(explicit: Option<&Path>, locale: Option<&str>) -> Result<EngineConfig, CliError> {
    let mut config = match explicit {
        Some(path) => load(path)?,
        None => match user_config_path().filter(|p| p.is_file()) {
            Some(path) => load(&path)?,
            None => EngineConfig::default(),
        },
    };

    if let Some(locale) = locale {
        config.locale = locale.trim().to_string();
    }
    config
        .validate()
        .map_err(|e| CliError::usage(e.to_string()).with_hint("--locale must not be blank"))?;

    log::debug!(
        "config: locale={} group_dir={} category_dir={}",
        config.locale,
        config.group_dir,
        config.category_dir
    );
    Ok(config)
}

fn load(path: &Path) -> Result<EngineConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    EngineConfig::from_toml(&text).map_err(|e| {
        CliError::usage(format!("{}: {e}", path.display()))
            .with_hint("keys: locale, group_dir, category_dir")
    })
}
