//! Document selectors the formatter is registered for.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::capabilities::CapabilityResolver;

const FILE_SCHEME: &str = "file";
const UNTITLED_SCHEME: &str = "untitled";

/// One document filter: a language, optionally narrowed by glob and scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorEntry {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

impl SelectorEntry {
    fn new(language: impl Into<String>, pattern: Option<String>) -> Self {
        Self {
            language: language.into(),
            pattern,
            scheme: None,
        }
    }

    fn with_scheme(&self, scheme: &str) -> Self {
        Self {
            scheme: Some(scheme.to_string()),
            ..self.clone()
        }
    }

    /// Whether a document with these properties passes this filter.
    pub fn matches(&self, language_id: &str, scheme: &str, path: Option<&Path>) -> bool {
        if self.language != language_id {
            return false;
        }
        if self.scheme.as_deref().is_some_and(|s| s != scheme) {
            return false;
        }
        match self.pattern.as_deref().and_then(folder_of_pattern) {
            // Untitled documents have no path and so only match unscoped entries
            Some(folder) => path.is_some_and(|path| path != folder && path.starts_with(folder)),
            None => true,
        }
    }
}

/// Glob scoping an entry to everything under `folder`.
fn folder_pattern(folder: &Path) -> String {
    format!("{}/**/*", folder.display())
}

fn folder_of_pattern(pattern: &str) -> Option<&Path> {
    pattern.strip_suffix("/**/*").map(Path::new)
}

/// Full-document and range selectors. Rebuilt on every registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSet {
    pub language_selector: Vec<SelectorEntry>,
    pub range_language_selector: Vec<SelectorEntry>,
}

impl SelectorSet {
    pub fn is_empty(&self) -> bool {
        self.language_selector.is_empty() && self.range_language_selector.is_empty()
    }

    pub fn matches(&self, language_id: &str, scheme: &str, path: Option<&Path>) -> bool {
        self.language_selector
            .iter()
            .any(|entry| entry.matches(language_id, scheme, path))
    }

    pub fn matches_range(&self, language_id: &str, scheme: &str, path: Option<&Path>) -> bool {
        self.range_language_selector
            .iter()
            .any(|entry| entry.matches(language_id, scheme, path))
    }
}

/// Compute the selectors for the given workspace folders.
///
/// Without folders every enabled language is registered globally. With
/// folders each folder gets its own entries scoped to a glob under it, so a
/// language enabled in one folder never applies in a sibling. Disabled
/// languages are dropped from both sets.
pub fn compute_selectors(
    resolver: &dyn CapabilityResolver,
    folders: &[PathBuf],
    disabled_languages: &[String],
) -> SelectorSet {
    let enabled = |language: &String| !disabled_languages.contains(language);

    let mut language_selector: Vec<SelectorEntry> = if folders.is_empty() {
        resolver
            .all_enabled_languages(None)
            .into_iter()
            .filter(enabled)
            .map(|language| SelectorEntry::new(language, None))
            .collect()
    } else {
        folders
            .iter()
            .flat_map(|folder| {
                let pattern = folder_pattern(folder);
                resolver
                    .all_enabled_languages(Some(folder))
                    .into_iter()
                    .filter(enabled)
                    .map(move |language| SelectorEntry::new(language, Some(pattern.clone())))
            })
            .collect()
    };

    let mut range_language_selector: Vec<SelectorEntry> = resolver
        .range_supported_languages()
        .into_iter()
        .filter(enabled)
        .map(|language| SelectorEntry::new(language, None))
        .collect();

    if !folders.is_empty() {
        language_selector = with_schemes(&language_selector);
        range_language_selector = with_schemes(&range_language_selector);
    }

    let selectors = SelectorSet {
        language_selector,
        range_language_selector,
    };
    log::debug!(
        target: "prettier_ls::selectors",
        "Computed selectors: {} full, {} range",
        selectors.language_selector.len(),
        selectors.range_language_selector.len()
    );
    log::trace!(target: "prettier_ls::selectors", "{:?}", selectors);
    selectors
}

fn with_schemes(entries: &[SelectorEntry]) -> Vec<SelectorEntry> {
    entries
        .iter()
        .flat_map(|entry| [entry.with_scheme(FILE_SCHEME), entry.with_scheme(UNTITLED_SCHEME)])
        .collect()
}
