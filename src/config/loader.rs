use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;

use crate::config::AppConfig;

const CONFIG_DIR: &str = "applyform";
const CONFIG_FILE: &str = "config.toml";

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the config file, falling back to defaults when there is none.
pub fn load() -> color_eyre::Result<AppConfig> {
    let Some(path) = config_path() else {
        tracing::debug!("No config directory found, using defaults");
        return Ok(AppConfig::default());
    };
    load_from(&path)
}

pub fn load_from(path: &Path) -> color_eyre::Result<AppConfig> {
    if !path.exists() {
        tracing::debug!("Config file not found at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("applyform-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_from(&temp_path("missing.toml")).unwrap();
        assert_eq!(config.theme.name, "Catppuccin Mocha");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_path("partial.toml");
        fs::write(
            &path,
            "[theme]\nname = \"Catppuccin Latte\"\n\n[keybindings.form]\nsubmit = \"ctrl+s\"\n",
        )
        .unwrap();
        let config = load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.theme.name, "Catppuccin Latte");
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(config.keybindings.form.submit.matches(&ctrl_s));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(config.keybindings.form.cancel.matches(&esc));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = temp_path("invalid.toml");
        fs::write(&path, "[keybindings.global]\nquit = \"hyper+q\"\n").unwrap();
        let result = load_from(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
