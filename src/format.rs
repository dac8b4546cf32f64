//! Formatter resolution and execution pipeline.
//!
//! The orchestrator decides which backend, parser and options apply to a
//! document and runs the chosen backend through the safe executor. Everything
//! it depends on is reached through the collaborator traits re-exported here,
//! so the pipeline can be driven by the LSP server, the CLI, or test fakes.

pub mod capabilities;
pub mod config_provider;
pub mod executor;
pub mod ignore;
pub mod modules;
pub mod options;
pub mod orchestrator;
pub mod request;
pub mod selectors;
pub mod status;
pub mod workspace;

use std::future::Future;
use std::pin::Pin;

pub use capabilities::{CapabilityResolver, SupportTable};
pub use config_provider::{ConfigProvider, FsConfigProvider, OptionsRequest, OptionsResolution};
pub use executor::FormatCall;
pub use ignore::{IgnoreResolver, RootIgnoreResolver};
pub use modules::{CliModuleProvider, Engine, FileInfo, FormatterModule, LintModule, ModuleProvider};
pub use options::{EngineOptions, RangeOptions};
pub use orchestrator::{Collaborators, Orchestrator};
pub use request::{FormattingOutcome, FormattingRequest};
pub use selectors::{SelectorEntry, SelectorSet, compute_selectors};
pub use status::{FormatStatus, LogReporter, StatusReporter, WarningLedger};
pub use workspace::{StaticWorkspace, WorkspaceView};

/// Boxed future used at the object-safe collaborator seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Basenames whose creation, change or deletion invalidates the registered
/// selectors and cached module resolutions.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".prettierrc",
    ".prettierrc.json",
    ".prettierrc.yaml",
    ".prettierrc.yml",
    ".prettierrc.js",
    "package.json",
    "prettier.config.js",
    ".editorconfig",
];

/// Returns true if `path` ends in one of [`CONFIG_FILE_NAMES`].
pub fn is_config_file(path: &std::path::Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn recognizes_config_basenames_only() {
        assert!(is_config_file(Path::new("/ws/.prettierrc")));
        assert!(is_config_file(Path::new("/ws/sub/package.json")));
        assert!(is_config_file(Path::new("/ws/.editorconfig")));
        assert!(!is_config_file(Path::new("/ws/src/index.js")));
        assert!(!is_config_file(Path::new("/ws/package.json.bak")));
    }
}
