use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keys from older releases that are still accepted but no longer drive
/// behavior. Lint-integrated formatters are now picked by availability alone.
pub const LEGACY_KEYS: &[&str] = &[
    "eslintIntegration",
    "tslintIntegration",
    "stylelintIntegration",
];

/// Editor-level style options handed to the engine when the project has no
/// Prettier config file of its own.
///
/// Field names mirror Prettier's option names so the same object can be
/// written in `prettier-ls.toml` or sent from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrettierOptions {
    pub print_width: Option<u32>,
    pub tab_width: Option<u32>,
    pub use_tabs: Option<bool>,
    pub semi: Option<bool>,
    pub single_quote: Option<bool>,
    pub jsx_single_quote: Option<bool>,
    pub trailing_comma: Option<String>,
    pub bracket_spacing: Option<bool>,
    pub arrow_parens: Option<String>,
    pub prose_wrap: Option<String>,
    pub end_of_line: Option<String>,
    pub quote_props: Option<String>,
}

impl PrettierOptions {
    /// Field-wise merge; values from `primary` win.
    pub fn merge(self, primary: PrettierOptions) -> PrettierOptions {
        PrettierOptions {
            print_width: primary.print_width.or(self.print_width),
            tab_width: primary.tab_width.or(self.tab_width),
            use_tabs: primary.use_tabs.or(self.use_tabs),
            semi: primary.semi.or(self.semi),
            single_quote: primary.single_quote.or(self.single_quote),
            jsx_single_quote: primary.jsx_single_quote.or(self.jsx_single_quote),
            trailing_comma: primary.trailing_comma.or(self.trailing_comma),
            bracket_spacing: primary.bracket_spacing.or(self.bracket_spacing),
            arrow_parens: primary.arrow_parens.or(self.arrow_parens),
            prose_wrap: primary.prose_wrap.or(self.prose_wrap),
            end_of_line: primary.end_of_line.or(self.end_of_line),
            quote_props: primary.quote_props.or(self.quote_props),
        }
    }
}

/// One settings layer as read from TOML or JSON.
///
/// Every field is optional so layers (defaults, user, project, client) can be
/// merged with later layers overriding earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatterSettings {
    /// Language ids that must never be formatted
    pub disable_languages: Option<Vec<String>>,
    /// Only format files that have a Prettier config file
    pub require_config: Option<bool>,
    /// Explicit Prettier config file; relative paths resolve against the workspace root
    pub config_path: Option<String>,
    /// Ignore file; relative paths resolve against the workspace folder
    pub ignore_path: Option<String>,
    pub use_editor_config: Option<bool>,
    /// Explicit prettier executable
    pub prettier_path: Option<String>,
    /// Extra language id -> parser candidates, merged over the built-in table
    pub languages: Option<HashMap<String, Vec<String>>>,
    pub options: Option<PrettierOptions>,

    pub eslint_integration: Option<bool>,
    pub tslint_integration: Option<bool>,
    pub stylelint_integration: Option<bool>,
}

impl FormatterSettings {
    /// Legacy keys present in this layer, in `LEGACY_KEYS` order.
    pub fn legacy_keys(&self) -> Vec<&'static str> {
        let flags = [
            self.eslint_integration,
            self.tslint_integration,
            self.stylelint_integration,
        ];
        LEGACY_KEYS
            .iter()
            .zip(flags)
            .filter(|(_, flag)| flag.is_some())
            .map(|(key, _)| *key)
            .collect()
    }
}

/// Fully resolved settings used at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSettings {
    pub disable_languages: Vec<String>,
    pub require_config: bool,
    pub config_path: Option<String>,
    pub ignore_path: String,
    pub use_editor_config: bool,
    pub prettier_path: Option<String>,
    pub languages: HashMap<String, Vec<String>>,
    pub options: PrettierOptions,
    pub legacy_keys: Vec<&'static str>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        WorkspaceSettings::from(super::defaults::default_settings())
    }
}

impl WorkspaceSettings {
    pub fn is_language_disabled(&self, language_id: &str) -> bool {
        self.disable_languages.iter().any(|l| l == language_id)
    }
}

impl From<&FormatterSettings> for WorkspaceSettings {
    fn from(settings: &FormatterSettings) -> Self {
        Self {
            disable_languages: settings.disable_languages.clone().unwrap_or_default(),
            require_config: settings.require_config.unwrap_or(false),
            config_path: settings
                .config_path
                .clone()
                .filter(|path| !path.trim().is_empty()),
            ignore_path: settings
                .ignore_path
                .clone()
                .unwrap_or_else(|| super::defaults::DEFAULT_IGNORE_FILE.to_string()),
            use_editor_config: settings.use_editor_config.unwrap_or(true),
            prettier_path: settings
                .prettier_path
                .clone()
                .filter(|path| !path.trim().is_empty()),
            languages: settings.languages.clone().unwrap_or_default(),
            options: settings.options.clone().unwrap_or_default(),
            legacy_keys: settings.legacy_keys(),
        }
    }
}

impl From<FormatterSettings> for WorkspaceSettings {
    fn from(settings: FormatterSettings) -> Self {
        WorkspaceSettings::from(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_keys_from_json() {
        let json = serde_json::json!({
            "disableLanguages": ["markdown"],
            "requireConfig": true,
            "configPath": "config/.prettierrc",
            "options": { "singleQuote": true, "printWidth": 100 }
        });
        let settings: FormatterSettings = serde_json::from_value(json).unwrap();

        assert_eq!(settings.disable_languages, Some(vec!["markdown".to_string()]));
        assert_eq!(settings.require_config, Some(true));
        assert_eq!(settings.config_path.as_deref(), Some("config/.prettierrc"));
        let options = settings.options.unwrap();
        assert_eq!(options.single_quote, Some(true));
        assert_eq!(options.print_width, Some(100));
    }

    #[test]
    fn deserializes_toml_layer() {
        let toml_src = r#"
            requireConfig = false
            ignorePath = "config/.prettierignore"

            [languages]
            svelte = ["svelte"]

            [options]
            tabWidth = 4
        "#;
        let settings: FormatterSettings = toml::from_str(toml_src).unwrap();

        assert_eq!(settings.ignore_path.as_deref(), Some("config/.prettierignore"));
        assert_eq!(
            settings.languages.unwrap().get("svelte"),
            Some(&vec!["svelte".to_string()])
        );
        assert_eq!(settings.options.unwrap().tab_width, Some(4));
    }

    #[test]
    fn legacy_keys_are_reported_when_present() {
        let settings = FormatterSettings {
            eslint_integration: Some(true),
            stylelint_integration: Some(false),
            ..Default::default()
        };
        assert_eq!(
            settings.legacy_keys(),
            vec!["eslintIntegration", "stylelintIntegration"]
        );
        assert!(FormatterSettings::default().legacy_keys().is_empty());
    }

    #[test]
    fn resolved_settings_drop_blank_paths() {
        let settings = FormatterSettings {
            config_path: Some("  ".to_string()),
            prettier_path: Some(String::new()),
            ..Default::default()
        };
        let resolved = WorkspaceSettings::from(settings);
        assert_eq!(resolved.config_path, None);
        assert_eq!(resolved.prettier_path, None);
        assert_eq!(resolved.ignore_path, ".prettierignore");
        assert!(resolved.use_editor_config);
    }

    #[test]
    fn options_merge_prefers_primary() {
        let fallback = PrettierOptions {
            tab_width: Some(2),
            semi: Some(false),
            ..Default::default()
        };
        let primary = PrettierOptions {
            tab_width: Some(4),
            ..Default::default()
        };
        let merged = fallback.merge(primary);
        assert_eq!(merged.tab_width, Some(4));
        assert_eq!(merged.semi, Some(false));
    }
}
