//! Prettier config file discovery and option resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PrettierOptions;

use super::options::{EngineOptions, RangeOptions};

/// Config files Prettier looks for in each directory, in lookup order.
const CONFIG_SEARCH_ORDER: &[&str] = &[
    "package.json",
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.yaml",
    ".prettierrc.yml",
    ".prettierrc.json5",
    ".prettierrc.js",
    ".prettierrc.cjs",
    "prettier.config.js",
    "prettier.config.cjs",
    ".prettierrc.toml",
];

/// Inputs to option resolution for one request.
#[derive(Debug, Clone)]
pub struct OptionsRequest<'a> {
    pub file_path: Option<&'a Path>,
    pub parser: &'a str,
    pub use_editorconfig: bool,
    /// Absolute `configPath` override, already resolved against the workspace
    pub config_path: Option<PathBuf>,
    pub fallback: &'a PrettierOptions,
    pub range: Option<RangeOptions>,
}

/// Merged options, or the reason they could not be produced.
pub type OptionsResolution = Result<EngineOptions, String>;

/// Locates and validates Prettier configuration for a file.
pub trait ConfigProvider: Send + Sync {
    /// Whether a Prettier config file applies to `file`.
    fn has_config(&self, file: &Path) -> bool;

    fn resolve_options(&self, request: OptionsRequest<'_>) -> OptionsResolution;
}

/// Walks the filesystem the way Prettier's own config resolution does.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsConfigProvider;

impl FsConfigProvider {
    pub fn new() -> Self {
        Self
    }

    /// Nearest config file at or above `start`.
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            CONFIG_SEARCH_ORDER.iter().find_map(|name| {
                let candidate = dir.join(name);
                if !candidate.is_file() {
                    return None;
                }
                if *name == "package.json" && !package_json_has_prettier_key(&candidate) {
                    return None;
                }
                Some(candidate)
            })
        })
    }

    /// Parse config files whose format we understand so malformed ones are
    /// reported before the engine is spawned.
    fn validate(path: &Path) -> Result<(), String> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let read = || {
            fs::read_to_string(path)
                .map_err(|err| format!("Failed to read {}: {}", path.display(), err))
        };

        match name {
            ".prettierrc.json" | "package.json" => {
                let contents = read()?;
                serde_json::from_str::<serde_json::Value>(&contents)
                    .map(|_| ())
                    .map_err(|err| format!("Invalid JSON in {}: {}", path.display(), err))
            }
            ".prettierrc" => {
                // Either JSON or YAML; only JSON-looking content is checked
                let contents = read()?;
                if contents.trim_start().starts_with('{') {
                    serde_json::from_str::<serde_json::Value>(&contents)
                        .map(|_| ())
                        .map_err(|err| format!("Invalid JSON in {}: {}", path.display(), err))
                } else {
                    Ok(())
                }
            }
            ".prettierrc.toml" => {
                let contents = read()?;
                toml::from_str::<toml::Table>(&contents)
                    .map(|_| ())
                    .map_err(|err| format!("Invalid TOML in {}: {}", path.display(), err))
            }
            _ => Ok(()),
        }
    }
}

fn package_json_has_prettier_key(path: &Path) -> bool {
    fs::read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str::<serde_json::Value>(&contents).ok())
        .is_some_and(|json| json.get("prettier").is_some())
}

impl ConfigProvider for FsConfigProvider {
    fn has_config(&self, file: &Path) -> bool {
        file.parent()
            .and_then(Self::find_config_file)
            .is_some()
    }

    fn resolve_options(&self, request: OptionsRequest<'_>) -> OptionsResolution {
        let config_file = match request.config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(format!("Config file not found: {}", path.display()));
                }
                Some(path)
            }
            None => request
                .file_path
                .and_then(Path::parent)
                .and_then(Self::find_config_file),
        };

        if let Some(path) = &config_file {
            Self::validate(path)?;
            log::debug!(
                target: "prettier_ls::config",
                "Using config file {}",
                path.display()
            );
        }

        Ok(EngineOptions {
            parser: request.parser.to_string(),
            file_path: request.file_path.map(Path::to_path_buf),
            config_file,
            use_editorconfig: request.use_editorconfig,
            fallback: request.fallback.clone(),
            range: request.range,
        })
    }
}
