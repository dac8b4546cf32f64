//! Settings, workspace layout and client capabilities for the server.
//!
//! `SettingsManager` is the server's [`WorkspaceView`]: the formatting
//! pipeline reads the current settings and folders through it while LSP
//! notifications swap in new values.

use arc_swap::ArcSwap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tower_lsp_server::ls_types::ClientCapabilities;

use crate::config::WorkspaceSettings;
use crate::format::WorkspaceView;

/// Thread-safe holder of everything configuration-shaped.
///
/// `ArcSwap` for values replaced at runtime, `OnceLock` for capabilities
/// received once during initialize.
pub(crate) struct SettingsManager {
    root_path: ArcSwap<Option<PathBuf>>,
    folders: ArcSwap<Vec<PathBuf>>,
    settings: ArcSwap<WorkspaceSettings>,
    client_capabilities: OnceLock<ClientCapabilities>,
}

impl std::fmt::Debug for SettingsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsManager")
            .field("root_path", &self.root_path.load_full())
            .field("folders", &self.folders.load_full())
            .field("client_capabilities", &"OnceLock<ClientCapabilities>")
            .finish_non_exhaustive()
    }
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsManager {
    pub(crate) fn new() -> Self {
        Self {
            root_path: ArcSwap::new(Arc::new(None)),
            folders: ArcSwap::new(Arc::new(Vec::new())),
            settings: ArcSwap::new(Arc::new(WorkspaceSettings::default())),
            client_capabilities: OnceLock::new(),
        }
    }

    /// Store client capabilities from initialize(). Later calls are ignored.
    pub(crate) fn set_capabilities(&self, caps: ClientCapabilities) {
        let _ = self.client_capabilities.set(caps);
    }

    pub(crate) fn set_root_path(&self, path: Option<PathBuf>) {
        self.root_path.store(Arc::new(path));
    }

    pub(crate) fn root_path(&self) -> Arc<Option<PathBuf>> {
        self.root_path.load_full()
    }

    pub(crate) fn set_folders(&self, folders: Vec<PathBuf>) {
        self.folders.store(Arc::new(folders));
    }

    /// Apply folder additions and removals from a workspace-folders change.
    pub(crate) fn change_folders(&self, added: Vec<PathBuf>, removed: &[PathBuf]) {
        let mut folders: Vec<PathBuf> = self
            .folders
            .load()
            .iter()
            .filter(|folder| !removed.contains(folder))
            .cloned()
            .collect();
        for folder in added {
            if !folders.contains(&folder) {
                folders.push(folder);
            }
        }
        self.set_folders(folders);
    }

    pub(crate) fn load_settings(&self) -> Arc<WorkspaceSettings> {
        self.settings.load_full()
    }

    pub(crate) fn apply_settings(&self, settings: WorkspaceSettings) {
        self.settings.store(Arc::new(settings));
    }

    /// Whether the client lets us register formatting providers at runtime.
    ///
    /// False before initialize().
    pub(crate) fn supports_dynamic_formatting(&self) -> bool {
        self.client_capabilities
            .get()
            .and_then(|caps| caps.text_document.as_ref())
            .map(|td| {
                let formatting = td
                    .formatting
                    .as_ref()
                    .and_then(|f| f.dynamic_registration)
                    .unwrap_or(false);
                let range = td
                    .range_formatting
                    .as_ref()
                    .and_then(|f| f.dynamic_registration)
                    .unwrap_or(false);
                formatting && range
            })
            .unwrap_or(false)
    }

    /// Whether the client lets us register file watchers at runtime.
    pub(crate) fn supports_dynamic_file_watching(&self) -> bool {
        self.client_capabilities
            .get()
            .and_then(|caps| caps.workspace.as_ref())
            .and_then(|ws| ws.did_change_watched_files.as_ref())
            .and_then(|watched| watched.dynamic_registration)
            .unwrap_or(false)
    }
}

impl WorkspaceView for SettingsManager {
    fn settings(&self) -> Arc<WorkspaceSettings> {
        self.load_settings()
    }

    fn folders(&self) -> Vec<PathBuf> {
        self.folders.load().as_ref().clone()
    }

    fn root(&self) -> Option<PathBuf> {
        self.root_path.load().as_ref().clone()
    }
}
