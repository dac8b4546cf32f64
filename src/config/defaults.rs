//! Default configuration values for prettier-ls.
//!
//! These form the lowest-precedence settings layer.

use super::settings::{FormatterSettings, PrettierOptions};

/// Ignore file looked up in each workspace folder when not configured.
pub const DEFAULT_IGNORE_FILE: &str = ".prettierignore";

/// Returns the programmed default settings layer.
pub fn default_settings() -> FormatterSettings {
    FormatterSettings {
        disable_languages: Some(Vec::new()),
        require_config: Some(false),
        config_path: None,
        ignore_path: Some(DEFAULT_IGNORE_FILE.to_string()),
        use_editor_config: Some(true),
        prettier_path: None,
        languages: None,
        options: Some(PrettierOptions::default()),
        eslint_integration: None,
        tslint_integration: None,
        stylelint_integration: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_do_not_trigger_legacy_warning() {
        assert!(default_settings().legacy_keys().is_empty());
    }

    #[test]
    fn defaults_format_without_config_file() {
        let settings = default_settings();
        assert_eq!(settings.require_config, Some(false));
        assert_eq!(settings.use_editor_config, Some(true));
    }
}
