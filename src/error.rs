//! Error handling types for prettier-ls
//!
//! `LspError` covers server plumbing (lock recovery).
//! `FormatError` covers the formatting pipeline; none of its variants ever
//! reach the client as a JSON-RPC error.

use std::sync::PoisonError;
use thiserror::Error;

/// Error type for server plumbing
#[derive(Debug, Error)]
pub enum LspError {
    /// Lock acquisition failed or was poisoned
    #[error("Lock acquisition failed: {message}")]
    Lock { message: String },
}

/// Helper trait to convert PoisonError to LspError
pub trait LockResultExt<T> {
    /// Convert a PoisonError to LspError with recovery and logging.
    ///
    /// The context parameter identifies which operation triggered lock recovery.
    fn recover_poison(self, context: &str) -> Result<T, LspError>;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> Result<T, LspError> {
        match self {
            Ok(guard) => Ok(guard),
            Err(poisoned) => {
                log::warn!(
                    target: "prettier_ls::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                Ok(poisoned.into_inner())
            }
        }
    }
}

/// Failures of the formatting pipeline.
///
/// Every variant is absorbed by the orchestrator: the client only ever sees
/// "edits" or "no edits".
#[derive(Debug, Error)]
pub enum FormatError {
    /// No prettier executable could be located for the file
    #[error("Prettier engine not found: {message}")]
    EngineNotFound { message: String },

    /// Neither file-info nor the language table produced a parser
    #[error("Failed to resolve a parser for language: {language}")]
    ParserNotFound { language: String },

    /// Config discovery or merge failed
    #[error("Failed to resolve formatting options: {message}")]
    Options { message: String },

    /// The chosen formatter exited with an error
    #[error("{module} failed: {message}")]
    Backend { module: String, message: String },

    /// The chosen formatter panicked
    #[error("{module} panicked")]
    Panicked { module: String },

    /// The formatter produced something that is not UTF-8 text or JSON we understand
    #[error("{module} produced invalid output: {message}")]
    InvalidOutput { module: String, message: String },

    /// IO error while spawning or talking to a formatter process
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub fn engine_not_found(message: impl Into<String>) -> Self {
        FormatError::EngineNotFound {
            message: message.into(),
        }
    }

    pub fn parser_not_found(language: impl Into<String>) -> Self {
        FormatError::ParserNotFound {
            language: language.into(),
        }
    }

    pub fn options(message: impl Into<String>) -> Self {
        FormatError::Options {
            message: message.into(),
        }
    }

    pub fn backend(module: impl Into<String>, message: impl Into<String>) -> Self {
        FormatError::Backend {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn invalid_output(module: impl Into<String>, message: impl Into<String>) -> Self {
        FormatError::InvalidOutput {
            module: module.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn recover_poison_returns_inner_guard() {
        let lock = Arc::new(Mutex::new(1));
        let clone = Arc::clone(&lock);
        let _ = thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("intentional panic to poison the lock");
        })
        .join();

        assert!(lock.lock().is_err());
        let guard = lock.lock().recover_poison("test").unwrap();
        assert_eq!(*guard, 1);
    }

    #[test]
    fn backend_error_names_the_module() {
        let err = FormatError::backend("prettier-tslint", "exit status 2");
        assert_eq!(err.to_string(), "prettier-tslint failed: exit status 2");
    }
}
