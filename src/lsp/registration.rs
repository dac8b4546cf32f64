//! Dynamic registration of the formatting providers.
//!
//! At most one (full-document, range) registration pair is live at a time.
//! [`FormatterRegistration::replace`] always unregisters the previous pair
//! before registering the new one, and `replace`/`dispose` are serialized
//! by an async mutex.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;
use tokio::sync::Mutex;
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::{Registration, Unregistration};

use crate::format::{BoxFuture, CONFIG_FILE_NAMES, SelectorEntry, SelectorSet};

pub const FORMATTING_METHOD: &str = "textDocument/formatting";
pub const RANGE_FORMATTING_METHOD: &str = "textDocument/rangeFormatting";
pub const WATCHED_FILES_METHOD: &str = "workspace/didChangeWatchedFiles";

const WATCHER_ID: &str = "prettier-config-watcher";

/// Where registration requests go.
pub trait RegistrationSink: Send + Sync {
    fn register(&self, registrations: Vec<Registration>) -> BoxFuture<'_, Result<(), String>>;

    fn unregister(&self, unregistrations: Vec<Unregistration>)
    -> BoxFuture<'_, Result<(), String>>;
}

/// Sends `client/registerCapability` and `client/unregisterCapability`.
pub struct ClientRegistrationSink {
    client: Client,
}

impl ClientRegistrationSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RegistrationSink for ClientRegistrationSink {
    fn register(&self, registrations: Vec<Registration>) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            self.client
                .register_capability(registrations)
                .await
                .map_err(|err| err.to_string())
        })
    }

    fn unregister(
        &self,
        unregistrations: Vec<Unregistration>,
    ) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            self.client
                .unregister_capability(unregistrations)
                .await
                .map_err(|err| err.to_string())
        })
    }
}

/// Ids of a live registration pair.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RegisteredPair {
    full_id: String,
    range_id: String,
}

impl RegisteredPair {
    fn unregistrations(&self) -> Vec<Unregistration> {
        vec![
            Unregistration {
                id: self.full_id.clone(),
                method: FORMATTING_METHOD.to_string(),
            },
            Unregistration {
                id: self.range_id.clone(),
                method: RANGE_FORMATTING_METHOD.to_string(),
            },
        ]
    }
}

/// Scoped handle for the formatter registrations.
pub struct FormatterRegistration {
    sink: Arc<dyn RegistrationSink>,
    current: Mutex<Option<RegisteredPair>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for FormatterRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistration")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl FormatterRegistration {
    pub fn new(sink: Arc<dyn RegistrationSink>) -> Self {
        Self {
            sink,
            current: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Dispose the live pair (if any), then register `selectors`.
    pub async fn replace(&self, selectors: &SelectorSet) -> Result<(), String> {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            self.release(previous).await;
        }

        let generation = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pair = RegisteredPair {
            full_id: format!("prettier-format-{}", generation),
            range_id: format!("prettier-range-format-{}", generation),
        };
        let registrations = vec![
            registration(&pair.full_id, FORMATTING_METHOD, &selectors.language_selector),
            registration(
                &pair.range_id,
                RANGE_FORMATTING_METHOD,
                &selectors.range_language_selector,
            ),
        ];

        self.sink.register(registrations).await?;
        log::debug!(
            target: "prettier_ls::registration",
            "Registered formatter pair {} / {}",
            pair.full_id,
            pair.range_id
        );
        *current = Some(pair);
        Ok(())
    }

    /// Release the live pair. Safe when nothing is registered.
    pub async fn dispose(&self) {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            self.release(previous).await;
        }
    }

    pub async fn is_registered(&self) -> bool {
        self.current.lock().await.is_some()
    }

    async fn release(&self, pair: RegisteredPair) {
        if let Err(err) = self.sink.unregister(pair.unregistrations()).await {
            // The client may already have dropped them; the handle is gone either way
            log::warn!(
                target: "prettier_ls::registration",
                "Failed to unregister {} / {}: {}",
                pair.full_id,
                pair.range_id,
                err
            );
        }
    }
}

fn registration(id: &str, method: &str, selector: &[SelectorEntry]) -> Registration {
    Registration {
        id: id.to_string(),
        method: method.to_string(),
        register_options: Some(json!({ "documentSelector": selector })),
    }
}

/// Watcher for every config basename that invalidates the registrations.
pub fn config_watcher_registration() -> Registration {
    let watchers: Vec<_> = CONFIG_FILE_NAMES
        .iter()
        .map(|name| json!({ "globPattern": format!("**/{}", name) }))
        .collect();
    Registration {
        id: WATCHER_ID.to_string(),
        method: WATCHED_FILES_METHOD.to_string(),
        register_options: Some(json!({ "watchers": watchers })),
    }
}
