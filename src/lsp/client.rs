//! Client-facing notifications: log messages, formatting status and
//! one-time warnings.
//!
//! `ClientNotifier` is the server's [`StatusReporter`]. The pipeline calls it
//! synchronously; the notifications are sent from spawned tasks so a slow
//! client never stalls a formatting request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::MessageType;
use tower_lsp_server::ls_types::notification::Notification;

use crate::format::{FormatStatus, StatusReporter, WarningLedger};
use crate::lsp::{SettingsEvent, SettingsEventKind};

/// `prettier/status`: outcome of the most recent formatting request.
#[derive(Debug)]
pub enum StatusNotification {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusParams {
    pub status: FormatStatus,
}

impl Notification for StatusNotification {
    type Params = StatusParams;
    const METHOD: &'static str = "prettier/status";
}

fn settings_message_type(kind: SettingsEventKind) -> MessageType {
    match kind {
        SettingsEventKind::Info => MessageType::INFO,
        SettingsEventKind::Warning => MessageType::WARNING,
    }
}

/// Wrapper around the LSP client for all server-to-client traffic.
#[derive(Clone)]
pub(crate) struct ClientNotifier {
    client: Client,
    warnings: Arc<WarningLedger>,
}

impl std::fmt::Debug for ClientNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientNotifier")
            .field("client", &self.client)
            .field("warnings", &self.warnings)
            .finish()
    }
}

impl ClientNotifier {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            warnings: Arc::new(WarningLedger::new()),
        }
    }

    pub(crate) async fn log(&self, level: MessageType, message: impl Into<String>) {
        self.client.log_message(level, message.into()).await;
    }

    pub(crate) async fn log_info(&self, message: impl Into<String>) {
        self.log(MessageType::INFO, message).await;
    }

    pub(crate) async fn log_warning(&self, message: impl Into<String>) {
        self.log(MessageType::WARNING, message).await;
    }

    /// Forward settings load events as log messages.
    pub(crate) async fn log_settings_events(&self, events: &[SettingsEvent]) {
        for event in events {
            self.client
                .log_message(settings_message_type(event.kind), event.message.clone())
                .await;
        }
    }
}

impl StatusReporter for ClientNotifier {
    fn update_status(&self, status: FormatStatus) {
        log::debug!(target: "prettier_ls::status", "status: {:?}", status);
        // Fire-and-forget: notifications have no response
        let client = self.client.clone();
        tokio::spawn(async move {
            client
                .send_notification::<StatusNotification>(StatusParams { status })
                .await;
            if status == FormatStatus::Error {
                client
                    .log_message(
                        MessageType::ERROR,
                        "Formatting failed; the document was left unchanged. See the server log for details.",
                    )
                    .await;
            }
        });
    }

    fn warn_once(&self, key: &str, message: &str) -> bool {
        if !self.warnings.first_time(key) {
            return false;
        }
        log::warn!(target: "prettier_ls::status", "{}", message);
        let client = self.client.clone();
        let message = message.to_string();
        tokio::spawn(async move {
            client.show_message(MessageType::WARNING, message).await;
        });
        true
    }

    fn dispose(&self) {
        self.warnings.clear();
    }
}
