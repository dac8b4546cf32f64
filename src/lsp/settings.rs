use crate::config::{
    CONFIG_FILE_NAME, FormatterSettings, WorkspaceSettings, defaults::default_settings,
    load_user_config, merge_all,
};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Client settings may arrive bare or under this key.
pub const SETTINGS_SECTION: &str = "prettier";

/// Top-level keys of the server's settings object.
const SETTINGS_KEYS: &[&str] = &[
    "disableLanguages",
    "requireConfig",
    "configPath",
    "ignorePath",
    "useEditorConfig",
    "prettierPath",
    "languages",
    "options",
    "eslintIntegration",
    "tslintIntegration",
    "stylelintIntegration",
];

/// The part of a `workspace/didChangeConfiguration` payload that belongs to
/// this server, or `None` if the change is about other settings.
pub fn prettier_section(value: &Value) -> Option<Value> {
    let map = value.as_object()?;
    if let Some(section) = map.get(SETTINGS_SECTION) {
        return Some(section.clone());
    }
    map.keys()
        .any(|key| SETTINGS_KEYS.contains(&key.as_str()))
        .then(|| value.clone())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSource {
    InitializationOptions,
    ClientConfiguration,
}

impl SettingsSource {
    fn description(self) -> &'static str {
        match self {
            SettingsSource::InitializationOptions => "initialization options",
            SettingsSource::ClientConfiguration => "client configuration",
        }
    }
}

#[derive(Default, Debug)]
pub struct SettingsLoadOutcome {
    pub settings: Option<WorkspaceSettings>,
    pub events: Vec<SettingsEvent>,
}

/// Merge all settings layers: defaults < user < project < client.
pub fn load_settings(
    root_path: Option<&Path>,
    override_settings: Option<(SettingsSource, Value)>,
) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(default_settings());
    let user_config = load_user_config_with_events(&mut events);
    let project_settings = load_toml_settings(root_path, &mut events);
    let override_settings = override_settings
        .and_then(|(source, value)| parse_override_settings(source, value, &mut events));

    let merged = merge_all(&[defaults, user_config, project_settings, override_settings]);
    let settings = merged.map(WorkspaceSettings::from);

    if let Some(settings) = &settings
        && !settings.legacy_keys.is_empty()
    {
        events.push(SettingsEvent::warning(format!(
            "Deprecated settings in use: {}",
            settings.legacy_keys.join(", ")
        )));
    }

    SettingsLoadOutcome { settings, events }
}

/// `languages` additions declared in each folder's project config.
pub fn load_folder_languages(folders: &[PathBuf]) -> HashMap<PathBuf, HashMap<String, Vec<String>>> {
    folders
        .iter()
        .filter_map(|folder| {
            let mut events = Vec::new();
            let languages = load_toml_settings(Some(folder), &mut events)?.languages?;
            for event in events
                .iter()
                .filter(|e| e.kind == SettingsEventKind::Warning)
            {
                log::warn!(target: "prettier_ls::settings", "{}", event.message);
            }
            Some((folder.clone(), languages))
        })
        .collect()
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<FormatterSettings> {
    match load_user_config() {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info(
                "Loaded user config from XDG_CONFIG_HOME",
            ));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_toml_settings(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<FormatterSettings> {
    let root = root_path?;
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return None;
    }

    events.push(SettingsEvent::info(format!(
        "Found config file: {}",
        config_path.display()
    )));

    match fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<FormatterSettings>(&contents) {
            Ok(settings) => {
                events.push(SettingsEvent::info(format!(
                    "Successfully loaded {}",
                    CONFIG_FILE_NAME
                )));
                Some(settings)
            }
            Err(err) => {
                events.push(SettingsEvent::warning(format!(
                    "Failed to parse {}: {}",
                    CONFIG_FILE_NAME, err
                )));
                None
            }
        },
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to read {}: {}",
                CONFIG_FILE_NAME, err
            )));
            None
        }
    }
}

fn parse_override_settings(
    source: SettingsSource,
    value: Value,
    events: &mut Vec<SettingsEvent>,
) -> Option<FormatterSettings> {
    let value = match value {
        Value::Null => return None,
        Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => {
            map.remove(SETTINGS_SECTION).unwrap_or(Value::Null)
        }
        other => other,
    };

    match serde_json::from_value::<FormatterSettings>(value) {
        Ok(settings) => {
            events.push(SettingsEvent::info(format!(
                "Parsed {} as prettier settings",
                source.description()
            )));
            Some(settings)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to parse {}: {}",
                source.description(),
                err
            )));
            None
        }
    }
}
