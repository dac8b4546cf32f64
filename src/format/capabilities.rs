//! Language and parser support tables.
//!
//! Maps LSP language ids (and file names) to Prettier parsers and answers
//! which languages support range formatting or a lint-integrated formatter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::workspace::WorkspaceView;

/// Answers "what can be formatted, and with which parser".
pub trait CapabilityResolver: Send + Sync {
    /// Language ids enabled for `scope` (a workspace folder), or globally.
    fn all_enabled_languages(&self, scope: Option<&Path>) -> Vec<String>;

    /// Language ids that support range formatting.
    fn range_supported_languages(&self) -> Vec<String>;

    /// Parser candidates for a language, most preferred first.
    fn parsers_for_language(&self, file: Option<&Path>, language_id: &str) -> Vec<String>;

    fn supports_eslint(&self, language_id: &str) -> bool;

    fn parser_supports_stylelint(&self, parser: &str) -> bool;
}

/// One entry of the built-in support table.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSupport {
    pub name: &'static str,
    pub language_ids: &'static [&'static str],
    pub parsers: &'static [&'static str],
    pub extensions: &'static [&'static str],
    /// Exact basenames; entries with no extensions only match these
    pub filenames: &'static [&'static str],
}

/// Languages Prettier supports out of the box. Order matters: the first
/// entry matching a language id (and file name) wins.
pub const BUILTIN_LANGUAGES: &[LanguageSupport] = &[
    LanguageSupport {
        name: "JavaScript",
        language_ids: &["javascript", "mongo"],
        parsers: &["babel", "acorn", "espree", "meriyah", "flow", "babel-flow"],
        extensions: &[".js", ".cjs", ".mjs", ".es6", ".jsb", ".jsm"],
        filenames: &["Jakefile"],
    },
    LanguageSupport {
        name: "JSX",
        language_ids: &["javascriptreact"],
        parsers: &["babel", "flow", "babel-flow"],
        extensions: &[".jsx"],
        filenames: &[],
    },
    LanguageSupport {
        name: "TypeScript",
        language_ids: &["typescript"],
        parsers: &["typescript", "babel-ts"],
        extensions: &[".ts", ".cts", ".mts"],
        filenames: &[],
    },
    LanguageSupport {
        name: "TSX",
        language_ids: &["typescriptreact"],
        parsers: &["typescript", "babel-ts"],
        extensions: &[".tsx"],
        filenames: &[],
    },
    LanguageSupport {
        name: "JSON.stringify",
        language_ids: &["json"],
        parsers: &["json-stringify"],
        extensions: &[],
        filenames: &["package.json", "package-lock.json", "composer.json"],
    },
    LanguageSupport {
        name: "JSON",
        language_ids: &["json"],
        parsers: &["json"],
        extensions: &[".json", ".4DForm", ".4DProject", ".avsc", ".geojson", ".webmanifest"],
        filenames: &[".prettierrc", ".babelrc", ".jscsrc", ".jshintrc"],
    },
    LanguageSupport {
        name: "JSON with Comments",
        language_ids: &["jsonc"],
        parsers: &["json"],
        extensions: &[".jsonc", ".code-workspace"],
        filenames: &[".eslintrc", ".swcrc"],
    },
    LanguageSupport {
        name: "JSON5",
        language_ids: &["json5"],
        parsers: &["json5"],
        extensions: &[".json5"],
        filenames: &[],
    },
    LanguageSupport {
        name: "CSS",
        language_ids: &["css"],
        parsers: &["css"],
        extensions: &[".css", ".wxss"],
        filenames: &[],
    },
    LanguageSupport {
        name: "PostCSS",
        language_ids: &["postcss"],
        parsers: &["css"],
        extensions: &[".pcss", ".postcss"],
        filenames: &[],
    },
    LanguageSupport {
        name: "Less",
        language_ids: &["less"],
        parsers: &["less"],
        extensions: &[".less"],
        filenames: &[],
    },
    LanguageSupport {
        name: "SCSS",
        language_ids: &["scss"],
        parsers: &["scss"],
        extensions: &[".scss"],
        filenames: &[],
    },
    LanguageSupport {
        name: "GraphQL",
        language_ids: &["graphql"],
        parsers: &["graphql"],
        extensions: &[".graphql", ".gql", ".graphqls"],
        filenames: &[],
    },
    LanguageSupport {
        name: "Markdown",
        language_ids: &["markdown"],
        parsers: &["markdown"],
        extensions: &[".md", ".markdown", ".mkd", ".mkdn", ".mdown", ".ronn"],
        filenames: &["contents.lr", "README"],
    },
    LanguageSupport {
        name: "MDX",
        language_ids: &["mdx"],
        parsers: &["mdx"],
        extensions: &[".mdx"],
        filenames: &[],
    },
    LanguageSupport {
        name: "Vue",
        language_ids: &["vue"],
        parsers: &["vue"],
        extensions: &[".vue"],
        filenames: &[],
    },
    LanguageSupport {
        name: "HTML",
        language_ids: &["html"],
        parsers: &["html"],
        extensions: &[".html", ".htm", ".html.hl", ".inc", ".xht", ".xhtml"],
        filenames: &[],
    },
    LanguageSupport {
        name: "Handlebars",
        language_ids: &["handlebars"],
        parsers: &["glimmer"],
        extensions: &[".handlebars", ".hbs"],
        filenames: &[],
    },
    LanguageSupport {
        name: "YAML",
        language_ids: &["yaml", "ansible", "home-assistant"],
        parsers: &["yaml"],
        extensions: &[".yml", ".yaml", ".sublime-syntax", ".syntax"],
        filenames: &[".prettierrc", ".stylelintrc", ".lintstagedrc"],
    },
];

/// Languages for which Prettier's range formatting is reliable.
pub const RANGE_SUPPORTED_LANGUAGES: &[&str] = &[
    "javascript",
    "javascriptreact",
    "typescript",
    "typescriptreact",
    "json",
    "graphql",
];

/// Languages `prettier-eslint` can handle.
pub const ESLINT_SUPPORTED_LANGUAGES: &[&str] = &[
    "javascript",
    "javascriptreact",
    "typescript",
    "typescriptreact",
    "vue",
];

/// Parsers `prettier-stylelint` can handle.
pub const STYLELINT_SUPPORTED_PARSERS: &[&str] = &["css", "less", "scss"];

type LanguageMap = HashMap<String, Vec<String>>;

/// Built-in table extended by the `languages` setting, globally and per
/// workspace folder.
pub struct SupportTable {
    workspace: Arc<dyn WorkspaceView>,
    folder_languages: ArcSwap<HashMap<PathBuf, LanguageMap>>,
}

impl std::fmt::Debug for SupportTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupportTable")
            .field("folder_languages", &self.folder_languages.load_full())
            .finish_non_exhaustive()
    }
}

impl SupportTable {
    pub fn new(workspace: Arc<dyn WorkspaceView>) -> Self {
        Self {
            workspace,
            folder_languages: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// Replace the per-folder language additions (from each folder's
    /// `prettier-ls.toml`).
    pub fn set_folder_languages(&self, folders: HashMap<PathBuf, LanguageMap>) {
        self.folder_languages.store(Arc::new(folders));
    }

    /// Language id for a file, judged by extension then basename.
    pub fn language_for_path(path: &Path) -> Option<&'static str> {
        let basename = path.file_name()?.to_str()?;
        BUILTIN_LANGUAGES
            .iter()
            .find(|lang| {
                lang.filenames.contains(&basename)
                    || lang.extensions.iter().any(|ext| basename.ends_with(ext))
            })
            .and_then(|lang| lang.language_ids.first().copied())
    }

    /// Additions that apply to `file`: innermost folder first, then global.
    fn additions_for(&self, file: Option<&Path>) -> Vec<LanguageMap> {
        let mut layers = Vec::new();
        if let Some(file) = file {
            let folders = self.folder_languages.load();
            let mut matching: Vec<_> = folders
                .iter()
                .filter(|(folder, _)| file.starts_with(folder))
                .collect();
            matching.sort_by_key(|(folder, _)| std::cmp::Reverse(folder.components().count()));
            layers.extend(matching.into_iter().map(|(_, map)| map.clone()));
        }
        layers.push(self.workspace.settings().languages.clone());
        layers
    }
}

impl CapabilityResolver for SupportTable {
    fn all_enabled_languages(&self, scope: Option<&Path>) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        let mut push = |id: &str| {
            if !languages.iter().any(|l| l == id) {
                languages.push(id.to_string());
            }
        };

        for lang in BUILTIN_LANGUAGES {
            for id in lang.language_ids {
                push(id);
            }
        }

        let mut extra: Vec<String> = self.workspace.settings().languages.keys().cloned().collect();
        if let Some(scope) = scope
            && let Some(map) = self.folder_languages.load().get(scope)
        {
            extra.extend(map.keys().cloned());
        }
        // HashMap order is unstable; keep the output deterministic
        extra.sort();
        for id in &extra {
            push(id.as_str());
        }

        languages
    }

    fn range_supported_languages(&self) -> Vec<String> {
        RANGE_SUPPORTED_LANGUAGES
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    fn parsers_for_language(&self, file: Option<&Path>, language_id: &str) -> Vec<String> {
        for layer in self.additions_for(file) {
            if let Some(parsers) = layer.get(language_id) {
                return parsers.clone();
            }
        }

        let basename = file
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str());
        BUILTIN_LANGUAGES
            .iter()
            .find(|lang| {
                lang.language_ids.contains(&language_id)
                    && (!lang.extensions.is_empty()
                        || basename.is_some_and(|name| lang.filenames.contains(&name)))
            })
            .map(|lang| lang.parsers.iter().map(|p| p.to_string()).collect())
            .unwrap_or_default()
    }

    fn supports_eslint(&self, language_id: &str) -> bool {
        ESLINT_SUPPORTED_LANGUAGES.contains(&language_id)
    }

    fn parser_supports_stylelint(&self, parser: &str) -> bool {
        STYLELINT_SUPPORTED_PARSERS.contains(&parser)
    }
}
