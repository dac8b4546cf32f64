use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::workspace::WorkspaceView;

/// Supplies the ignore file that applies to a document.
pub trait IgnoreResolver: Send + Sync {
    fn ignore_path(&self, file: &Path) -> Option<PathBuf>;
}

/// Resolves the `ignorePath` setting against the workspace folder that
/// contains the file.
pub struct RootIgnoreResolver {
    workspace: Arc<dyn WorkspaceView>,
}

impl RootIgnoreResolver {
    pub fn new(workspace: Arc<dyn WorkspaceView>) -> Self {
        Self { workspace }
    }
}

impl IgnoreResolver for RootIgnoreResolver {
    fn ignore_path(&self, file: &Path) -> Option<PathBuf> {
        let settings = self.workspace.settings();
        if settings.ignore_path.is_empty() {
            return None;
        }
        let configured = Path::new(&settings.ignore_path);
        if configured.is_absolute() {
            return Some(configured.to_path_buf());
        }
        // Files outside every folder resolve against their own directory
        let base = self
            .workspace
            .folder_for(Some(file))
            .or_else(|| file.parent().map(Path::to_path_buf))?;
        Some(path_clean::clean(base.join(configured)))
    }
}
