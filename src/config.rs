pub mod defaults;
pub mod settings;
pub mod user;

pub use settings::{FormatterSettings, LEGACY_KEYS, PrettierOptions, WorkspaceSettings};
use std::collections::HashMap;
pub use user::{
    CONFIG_FILE_NAME, UserConfigError, UserConfigResult, load_user_config, user_config_path,
};

/// Merge an ordered list of layers; later layers override earlier ones.
pub fn merge_all(configs: &[Option<FormatterSettings>]) -> Option<FormatterSettings> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two FormatterSettings, preferring values from `primary` over `fallback`
pub fn merge_settings(
    fallback: Option<FormatterSettings>,
    primary: Option<FormatterSettings>,
) -> Option<FormatterSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) => Some(settings),
        (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(FormatterSettings {
            disable_languages: primary.disable_languages.or(fallback.disable_languages),
            require_config: primary.require_config.or(fallback.require_config),
            config_path: primary.config_path.or(fallback.config_path),
            ignore_path: primary.ignore_path.or(fallback.ignore_path),
            use_editor_config: primary.use_editor_config.or(fallback.use_editor_config),
            prettier_path: primary.prettier_path.or(fallback.prettier_path),
            languages: merge_languages(fallback.languages, primary.languages),
            options: match (fallback.options, primary.options) {
                (Some(fallback), Some(primary)) => Some(fallback.merge(primary)),
                (fallback, primary) => primary.or(fallback),
            },
            eslint_integration: primary.eslint_integration.or(fallback.eslint_integration),
            tslint_integration: primary.tslint_integration.or(fallback.tslint_integration),
            stylelint_integration: primary
                .stylelint_integration
                .or(fallback.stylelint_integration),
        }),
    }
}

fn merge_languages(
    fallback: Option<HashMap<String, Vec<String>>>,
    primary: Option<HashMap<String, Vec<String>>>,
) -> Option<HashMap<String, Vec<String>>> {
    match (fallback, primary) {
        (Some(mut fallback), Some(primary)) => {
            for (key, value) in primary {
                fallback.insert(key, value);
            }
            Some(fallback)
        }
        (fallback, primary) => primary.or(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_settings_with_none() {
        assert!(merge_settings(None, None).is_none());
    }

    #[test]
    fn test_merge_settings_fallback_only() {
        let fallback = FormatterSettings {
            require_config: Some(true),
            ..Default::default()
        };
        let result = merge_settings(Some(fallback), None).unwrap();
        assert_eq!(result.require_config, Some(true));
    }

    #[test]
    fn test_merge_settings_prefer_primary() {
        let fallback = FormatterSettings {
            require_config: Some(false),
            ignore_path: Some(".prettierignore".to_string()),
            disable_languages: Some(vec!["markdown".to_string()]),
            ..Default::default()
        };
        let primary = FormatterSettings {
            require_config: Some(true),
            disable_languages: Some(vec!["yaml".to_string()]),
            ..Default::default()
        };

        let result = merge_settings(Some(fallback), Some(primary)).unwrap();

        assert_eq!(result.require_config, Some(true));
        assert_eq!(result.ignore_path.as_deref(), Some(".prettierignore"));
        // Lists are replaced, not concatenated
        assert_eq!(result.disable_languages, Some(vec!["yaml".to_string()]));
    }

    #[test]
    fn test_merge_languages_overrides_per_key() {
        let fallback = FormatterSettings {
            languages: Some(HashMap::from([
                ("svelte".to_string(), vec!["svelte".to_string()]),
                ("astro".to_string(), vec!["astro".to_string()]),
            ])),
            ..Default::default()
        };
        let primary = FormatterSettings {
            languages: Some(HashMap::from([(
                "svelte".to_string(),
                vec!["svelte-custom".to_string()],
            )])),
            ..Default::default()
        };

        let languages = merge_settings(Some(fallback), Some(primary))
            .unwrap()
            .languages
            .unwrap();

        assert_eq!(languages["svelte"], vec!["svelte-custom".to_string()]);
        assert_eq!(languages["astro"], vec!["astro".to_string()]);
    }

    #[test]
    fn test_merge_options_field_wise() {
        let fallback = FormatterSettings {
            options: Some(PrettierOptions {
                tab_width: Some(2),
                semi: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let primary = FormatterSettings {
            options: Some(PrettierOptions {
                semi: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = merge_settings(Some(fallback), Some(primary))
            .unwrap()
            .options
            .unwrap();

        assert_eq!(options.tab_width, Some(2));
        assert_eq!(options.semi, Some(false));
    }

    #[test]
    fn test_merge_all_applies_layers_in_order() {
        let layers = [
            Some(defaults::default_settings()),
            None,
            Some(FormatterSettings {
                require_config: Some(true),
                ..Default::default()
            }),
            Some(FormatterSettings {
                tslint_integration: Some(true),
                ..Default::default()
            }),
        ];

        let merged = WorkspaceSettings::from(merge_all(&layers).unwrap());

        assert!(merged.require_config);
        assert_eq!(merged.ignore_path, ".prettierignore");
        assert_eq!(merged.legacy_keys, vec!["tslintIntegration"]);
    }
}
