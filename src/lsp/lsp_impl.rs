mod text_document;

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use serde_json::Value;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;
use tower_lsp_server::{Client, LanguageServer};
use url::Url;

use crate::format::{
    Collaborators, Orchestrator, SelectorSet, StatusReporter, SupportTable, WorkspaceView,
    compute_selectors, is_config_file,
};
use crate::workspace::DocumentStore;

use super::client::ClientNotifier;
use super::registration::{
    ClientRegistrationSink, FormatterRegistration, config_watcher_registration,
};
use super::settings::{load_folder_languages, prettier_section};
use super::settings_manager::SettingsManager;
use super::{SettingsSource, load_settings};

pub(crate) fn uri_to_url(uri: &Uri) -> Option<Url> {
    Url::parse(uri.as_str()).ok()
}

fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri_to_url(uri)?.to_file_path().ok()
}

pub struct PrettierLs {
    client: Client,
    notifier: Arc<ClientNotifier>,
    settings_manager: Arc<SettingsManager>,
    documents: DocumentStore,
    support: Arc<SupportTable>,
    orchestrator: Orchestrator,
    registration: FormatterRegistration,
    /// Selectors computed on the last refresh; filters requests when the
    /// providers were advertised statically.
    selectors: ArcSwap<SelectorSet>,
    /// Last client-provided settings layer, re-applied on every reload.
    client_settings: ArcSwapOption<(SettingsSource, Value)>,
}

impl std::fmt::Debug for PrettierLs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettierLs")
            .field("client", &self.client)
            .field("settings_manager", &self.settings_manager)
            .field("documents", &self.documents.len())
            .field("support", &self.support)
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

impl PrettierLs {
    pub fn new(client: Client) -> Self {
        let settings_manager = Arc::new(SettingsManager::new());
        let notifier = Arc::new(ClientNotifier::new(client.clone()));
        let workspace: Arc<dyn WorkspaceView> = settings_manager.clone();
        let reporter: Arc<dyn StatusReporter> = notifier.clone();
        let support = Arc::new(SupportTable::new(Arc::clone(&workspace)));
        let orchestrator = Orchestrator::new(Collaborators::with_defaults(
            workspace,
            reporter,
            Arc::clone(&support),
        ));
        let registration =
            FormatterRegistration::new(Arc::new(ClientRegistrationSink::new(client.clone())));

        Self {
            client,
            notifier,
            settings_manager,
            documents: DocumentStore::new(),
            support,
            orchestrator,
            registration,
            selectors: ArcSwap::new(Arc::new(SelectorSet::default())),
            client_settings: ArcSwapOption::empty(),
        }
    }

    /// Re-merge every settings layer and the per-folder language additions.
    async fn reload_settings(&self) {
        let root = self.settings_manager.root_path();
        let client_settings = self.client_settings.load_full().map(|s| s.as_ref().clone());
        let outcome = load_settings(root.as_deref(), client_settings);
        self.notifier.log_settings_events(&outcome.events).await;
        if let Some(settings) = outcome.settings {
            self.settings_manager.apply_settings(settings);
        }

        let folders = self.settings_manager.folders();
        self.support
            .set_folder_languages(load_folder_languages(&folders));
    }

    /// Recompute the selectors and, when the client allows it, replace the
    /// dynamic registrations with them.
    async fn refresh_formatter(&self) {
        let settings = self.settings_manager.load_settings();
        let selectors = compute_selectors(
            self.support.as_ref(),
            &self.settings_manager.folders(),
            &settings.disable_languages,
        );
        self.selectors.store(Arc::new(selectors.clone()));

        if !self.settings_manager.supports_dynamic_formatting() {
            return;
        }
        if let Err(err) = self.registration.replace(&selectors).await {
            self.notifier
                .log_warning(format!("Failed to register formatting providers: {}", err))
                .await;
        }
    }

    async fn register_config_watcher(&self) {
        if !self.settings_manager.supports_dynamic_file_watching() {
            return;
        }
        if let Err(err) = self
            .client
            .register_capability(vec![config_watcher_registration()])
            .await
        {
            self.notifier
                .log_warning(format!("Failed to watch config files: {}", err))
                .await;
        }
    }

    /// Whether a request for this document should be served. Clients that
    /// registered dynamically only send matching documents already.
    fn accepts(&self, url: &Url, language_id: &str, range: bool) -> bool {
        if self.settings_manager.supports_dynamic_formatting() {
            return true;
        }
        let path = url.to_file_path().ok();
        let selectors = self.selectors.load();
        if range {
            selectors.matches_range(language_id, url.scheme(), path.as_deref())
        } else {
            selectors.matches(language_id, url.scheme(), path.as_deref())
        }
    }
}

impl LanguageServer for PrettierLs {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.settings_manager
            .set_capabilities(params.capabilities.clone());

        let folders: Vec<PathBuf> = params
            .workspace_folders
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|folder| uri_to_path(&folder.uri))
            .collect();

        // Root from workspace folders, root_uri, or the current directory
        #[allow(deprecated)]
        let root_path = folders
            .first()
            .cloned()
            .or_else(|| params.root_uri.as_ref().and_then(uri_to_path))
            .or_else(|| std::env::current_dir().ok());
        self.settings_manager.set_root_path(root_path);
        self.settings_manager.set_folders(folders);

        if let Some(options) = params.initialization_options {
            self.client_settings.store(Some(Arc::new((
                SettingsSource::InitializationOptions,
                options,
            ))));
        }
        self.reload_settings().await;

        // Without dynamic registration the providers are advertised up front
        // and requests are filtered by the selectors instead.
        let static_formatting = !self.settings_manager.supports_dynamic_formatting();

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                document_formatting_provider: static_formatting.then_some(OneOf::Left(true)),
                document_range_formatting_provider: static_formatting
                    .then_some(OneOf::Left(true)),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "prettier-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..InitializeResult::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.register_config_watcher().await;
        self.refresh_formatter().await;
        self.notifier.log_info("server is ready").await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.registration.dispose().await;
        let collaborators = self.orchestrator.collaborators();
        collaborators.modules.dispose();
        collaborators.reporter.dispose();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Some(url) = uri_to_url(&params.text_document.uri) else {
            return;
        };
        self.documents.open(
            url,
            params.text_document.text,
            params.text_document.language_id,
            params.text_document.version,
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(url) = uri_to_url(&params.text_document.uri) else {
            return;
        };
        // Full sync: the last change carries the whole document
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        if !self
            .documents
            .update(&url, change.text, params.text_document.version)
        {
            log::debug!(
                target: "prettier_ls::lsp",
                "Ignored change for {} at version {}",
                url,
                params.text_document.version
            );
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Some(url) = uri_to_url(&params.text_document.uri) {
            self.documents.close(&url);
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(section) = prettier_section(&params.settings) else {
            log::debug!(target: "prettier_ls::lsp", "Configuration change outside prettier section");
            return;
        };
        self.client_settings.store(Some(Arc::new((
            SettingsSource::ClientConfiguration,
            section,
        ))));
        self.reload_settings().await;
        self.refresh_formatter().await;
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let added = params
            .event
            .added
            .iter()
            .filter_map(|folder| uri_to_path(&folder.uri))
            .collect();
        let removed: Vec<PathBuf> = params
            .event
            .removed
            .iter()
            .filter_map(|folder| uri_to_path(&folder.uri))
            .collect();
        self.settings_manager.change_folders(added, &removed);
        self.reload_settings().await;
        self.refresh_formatter().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let touches_config = params
            .changes
            .iter()
            .filter_map(|change| uri_to_path(&change.uri))
            .any(|path| is_config_file(&path));
        if !touches_config {
            return;
        }
        log::info!(target: "prettier_ls::lsp", "Config file changed; resetting formatters");
        self.orchestrator.collaborators().modules.dispose();
        self.reload_settings().await;
        self.refresh_formatter().await;
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        self.formatting_impl(params).await
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        self.range_formatting_impl(params).await
    }
}
