//! Read-only view of the workspace the pipeline runs in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::WorkspaceSettings;

/// Settings and folder layout as seen by the formatting pipeline.
pub trait WorkspaceView: Send + Sync {
    /// Current merged editor-level settings.
    fn settings(&self) -> Arc<WorkspaceSettings>;

    /// Open workspace folders, in the order the client reported them.
    fn folders(&self) -> Vec<PathBuf>;

    /// Root used when a path belongs to no folder.
    fn root(&self) -> Option<PathBuf>;

    /// Innermost workspace folder containing `path`, else the root.
    fn folder_for(&self, path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = path {
            let innermost = self
                .folders()
                .into_iter()
                .filter(|folder| path.starts_with(folder))
                .max_by_key(|folder| folder.components().count());
            if innermost.is_some() {
                return innermost;
            }
        }
        self.root()
    }

    /// Resolve a configured path; relative values are taken against the
    /// folder containing `file` (or the root).
    fn resolve_configured_path(&self, file: Option<&Path>, configured: &str) -> PathBuf {
        let configured = Path::new(configured);
        if configured.is_absolute() {
            return path_clean::clean(configured);
        }
        match self.folder_for(file) {
            Some(base) => path_clean::clean(base.join(configured)),
            None => path_clean::clean(configured),
        }
    }
}

/// Fixed workspace, used by the CLI and tests.
#[derive(Debug, Clone)]
pub struct StaticWorkspace {
    settings: Arc<WorkspaceSettings>,
    folders: Vec<PathBuf>,
    root: Option<PathBuf>,
}

impl StaticWorkspace {
    pub fn new(settings: WorkspaceSettings, root: Option<PathBuf>) -> Self {
        Self {
            settings: Arc::new(settings),
            folders: root.iter().cloned().collect(),
            root,
        }
    }

    pub fn with_folders(mut self, folders: Vec<PathBuf>) -> Self {
        self.folders = folders;
        self
    }
}

impl WorkspaceView for StaticWorkspace {
    fn settings(&self) -> Arc<WorkspaceSettings> {
        Arc::clone(&self.settings)
    }

    fn folders(&self) -> Vec<PathBuf> {
        self.folders.clone()
    }

    fn root(&self) -> Option<PathBuf> {
        self.root.clone()
    }
}
