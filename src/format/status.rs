//! Status and one-time warning reporting.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::LockResultExt;

/// Last-outcome indicator published after every formatting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStatus {
    Success,
    Error,
    Ignore,
}

/// Surfaces formatting outcomes and one-time warnings to the user.
pub trait StatusReporter: Send + Sync {
    fn update_status(&self, status: FormatStatus);

    /// Show `message` the first time `key` is seen. Returns true if shown.
    fn warn_once(&self, key: &str, message: &str) -> bool;

    /// Forget shown warnings and the last status.
    fn dispose(&self);
}

/// Set of warning keys already shown to the user.
#[derive(Debug, Default)]
pub struct WarningLedger {
    shown: Mutex<HashSet<String>>,
}

impl WarningLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; returns true only the first time it is recorded.
    pub fn first_time(&self, key: &str) -> bool {
        self.shown
            .lock()
            .recover_poison("WarningLedger::first_time")
            .is_ok_and(|mut shown| shown.insert(key.to_string()))
    }

    pub fn clear(&self) {
        if let Ok(mut shown) = self.shown.lock().recover_poison("WarningLedger::clear") {
            shown.clear();
        }
    }
}

/// Reporter that only writes to the log sink. Used by the CLI.
#[derive(Debug, Default)]
pub struct LogReporter {
    warnings: WarningLedger,
    last: Mutex<Option<FormatStatus>>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<FormatStatus> {
        self.last
            .lock()
            .recover_poison("LogReporter::last_status")
            .ok()
            .and_then(|last| *last)
    }
}

impl StatusReporter for LogReporter {
    fn update_status(&self, status: FormatStatus) {
        log::debug!(target: "prettier_ls::status", "status: {:?}", status);
        if let Ok(mut last) = self.last.lock().recover_poison("LogReporter::update_status") {
            *last = Some(status);
        }
    }

    fn warn_once(&self, key: &str, message: &str) -> bool {
        if !self.warnings.first_time(key) {
            return false;
        }
        log::warn!(target: "prettier_ls::status", "{}", message);
        true
    }

    fn dispose(&self) {
        self.warnings.clear();
        if let Ok(mut last) = self.last.lock().recover_poison("LogReporter::dispose") {
            *last = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_reports_first_time_only() {
        let ledger = WarningLedger::new();
        assert!(ledger.first_time("legacy"));
        assert!(!ledger.first_time("legacy"));
        assert!(ledger.first_time("outdated"));
    }

    #[test]
    fn ledger_keeps_working_after_a_poisoned_lock() {
        let ledger = std::sync::Arc::new(WarningLedger::new());
        assert!(ledger.first_time("before"));
        let clone = std::sync::Arc::clone(&ledger);
        let _ = std::thread::spawn(move || {
            let _guard = clone.shown.lock().unwrap();
            panic!("poison the ledger");
        })
        .join();

        assert!(!ledger.first_time("before"));
        assert!(ledger.first_time("after"));
    }

    #[test]
    fn dispose_forgets_warnings_and_status() {
        let reporter = LogReporter::new();
        assert!(reporter.warn_once("legacy", "legacy settings"));
        assert!(!reporter.warn_once("legacy", "legacy settings"));
        reporter.update_status(FormatStatus::Success);
        assert_eq!(reporter.last_status(), Some(FormatStatus::Success));

        reporter.dispose();

        assert_eq!(reporter.last_status(), None);
        assert!(reporter.warn_once("legacy", "legacy settings"));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(FormatStatus::Ignore).unwrap(),
            serde_json::json!("ignore")
        );
    }
}
