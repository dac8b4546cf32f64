//! Formatting methods for PrettierLs.

use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;

use crate::format::FormattingRequest;
use crate::text::{full_document_edit, range_to_options};

use super::super::{PrettierLs, uri_to_url};

/// Edits turning `original` into the formatter's answer. No answer and no
/// change both mean "nothing to apply".
fn edits_for(original: &str, formatted: Option<String>) -> Vec<TextEdit> {
    formatted
        .and_then(|formatted| full_document_edit(original, &formatted))
        .into_iter()
        .collect()
}

impl PrettierLs {
    pub(crate) async fn formatting_impl(
        &self,
        params: DocumentFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let Some(request) = self.request_for(&params.text_document.uri, false) else {
            return Ok(None);
        };

        let formatted = self.orchestrator.format(&request).await;
        Ok(Some(edits_for(&request.text, formatted)))
    }

    pub(crate) async fn range_formatting_impl(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let Some(request) = self.request_for(&params.text_document.uri, true) else {
            return Ok(None);
        };
        let range = range_to_options(&request.text, params.range);
        let request = request.with_range(range);

        let formatted = self.orchestrator.format(&request).await;
        Ok(Some(edits_for(&request.text, formatted)))
    }

    /// Snapshot the open document as a formatting request, or `None` when
    /// it is unknown or not handled by this server.
    fn request_for(&self, uri: &Uri, range: bool) -> Option<FormattingRequest> {
        let url = uri_to_url(uri)?;
        let Some(document) = self.documents.snapshot(&url) else {
            log::debug!(target: "prettier_ls::formatting", "No document found for {}", url);
            return None;
        };
        if !self.accepts(&url, document.language_id(), range) {
            log::debug!(
                target: "prettier_ls::formatting",
                "{} ({}) is outside the formatting selectors",
                url,
                document.language_id()
            );
            return None;
        }
        Some(FormattingRequest::new(
            url,
            document.language_id(),
            document.text(),
        ))
    }
}
