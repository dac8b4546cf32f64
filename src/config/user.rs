//! User configuration loading for prettier-ls.
//!
//! User config location: $XDG_CONFIG_HOME/prettier-ls/prettier-ls.toml
//! Fallback: the platform config directory (`dirs::config_dir()`).

use std::path::PathBuf;
use thiserror::Error;

use super::settings::FormatterSettings;

pub const CONFIG_FILE_NAME: &str = "prettier-ls.toml";
const CONFIG_DIR_NAME: &str = "prettier-ls";

#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type UserConfigResult<T> = Result<T, UserConfigError>;

/// Returns the path to the user configuration file.
///
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/prettier-ls/prettier-ls.toml
/// 2. Otherwise: <platform config dir>/prettier-ls/prettier-ls.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(
            PathBuf::from(xdg_config)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the user config file.
///
/// A missing file is not an error: `Ok(None)` keeps the zero-config experience.
pub fn load_user_config() -> UserConfigResult<Option<FormatterSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| UserConfigError::Io {
        path: path.clone(),
        source,
    })?;
    toml::from_str::<FormatterSettings>(&contents)
        .map(Some)
        .map_err(|source| UserConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn with_xdg_config_home<T>(value: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let original = env::var("XDG_CONFIG_HOME").ok();
        // SAFETY: #[serial(xdg_env)] prevents concurrent modification of XDG_CONFIG_HOME
        unsafe {
            env::set_var("XDG_CONFIG_HOME", value);
        }
        let result = f();
        // SAFETY: same as above, restoring original env state
        unsafe {
            match original {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
        result
    }

    #[test]
    #[serial(xdg_env)]
    fn user_config_path_uses_xdg_config_home_when_set() {
        let path = with_xdg_config_home(std::path::Path::new("/custom/config"), user_config_path);
        assert_eq!(
            path,
            Some(PathBuf::from("/custom/config/prettier-ls/prettier-ls.toml"))
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn load_user_config_returns_none_when_missing() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let result = with_xdg_config_home(dir.path(), load_user_config);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    #[serial(xdg_env)]
    fn load_user_config_reports_parse_errors() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let config_dir = dir.path().join("prettier-ls");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join(CONFIG_FILE_NAME), "requireConfig = [").unwrap();

        let result = with_xdg_config_home(dir.path(), load_user_config);
        assert!(matches!(result, Err(UserConfigError::Parse { .. })));
    }
}
