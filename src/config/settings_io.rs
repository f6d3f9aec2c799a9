use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::settings::BotSettings;

const APP_DIR: &str = "rpg_arena_bot";

pub fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    fs::create_dir_all(&path).ok();
    path.push("settings.json");
    path
}

/// Where `profiles.json` lives.
pub fn data_dir(settings: &BotSettings) -> PathBuf {
    match &settings.data_dir {
        Some(dir) => dir.clone(),
        None => {
            let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(APP_DIR);
            path
        }
    }
}

/// `Ok(None)` when no settings file exists yet.
///
/// Runs before logging is set up, so failures are returned rather than
/// logged.
pub fn load_settings() -> anyhow::Result<Option<BotSettings>> {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Option<BotSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let settings = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(settings))
}

pub fn save_settings(settings: &BotSettings) -> anyhow::Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &BotSettings) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_survive_a_round_trip() {
        let dir = std::env::temp_dir().join(format!("rpg_arena_bot_cfg_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        let settings = BotSettings {
            settlement_retries: 7,
            data_dir: Some(dir.clone()),
            ..BotSettings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path).unwrap(), Some(settings.clone()));
        assert_eq!(data_dir(&settings), dir);

        fs::write(&path, "not json").unwrap();
        let err = load_settings_from(&path).unwrap_err();
        assert!(format!("{err:#}").starts_with("parsing "), "{err:#}");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("rpg_arena_bot_no_such_settings.json");
        assert_eq!(load_settings_from(&path).unwrap(), None);
    }
}
