//! Safe execution of a single backend call.
//!
//! Backends are invoked in one of two shapes: an already-started asynchronous
//! computation, or a synchronous closure that may fail (or panic) when called.
//! [`FormatCall`] folds both into one boxed future. [`run`] awaits it on its
//! own task and always yields text: the formatted result on success, the
//! original text on any failure.

use std::future::Future;

use tokio_util::task::AbortOnDropHandle;

use crate::error::FormatError;

use super::BoxFuture;
use super::request::FormattingOutcome;
use super::status::{FormatStatus, StatusReporter};

/// A pending backend invocation.
pub struct FormatCall {
    future: BoxFuture<'static, Result<String, FormatError>>,
}

impl std::fmt::Debug for FormatCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatCall").finish_non_exhaustive()
    }
}

impl FormatCall {
    /// Wrap an asynchronous computation.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<String, FormatError>> + Send + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }

    /// Wrap a synchronous computation. It runs when the call is executed.
    pub fn deferred<F>(compute: F) -> Self
    where
        F: FnOnce() -> Result<String, FormatError> + Send + 'static,
    {
        Self::pending(async move { compute() })
    }

    /// A call that has already settled.
    pub fn ready(result: Result<String, FormatError>) -> Self {
        Self::pending(std::future::ready(result))
    }
}

/// Await `call` on a dedicated task.
///
/// A panic inside the backend surfaces as [`FormatError::Panicked`]. Dropping
/// the returned future aborts the task.
pub async fn execute(call: FormatCall, module: &str) -> Result<String, FormatError> {
    let handle = AbortOnDropHandle::new(tokio::spawn(call.future));
    match handle.await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(FormatError::Panicked {
            module: module.to_string(),
        }),
        Err(err) => Err(FormatError::backend(module, err.to_string())),
    }
}

/// Execute `call` and classify the result, publishing the status.
///
/// Failures are logged with `module` as context and turn into
/// `FormattingOutcome::Error` carrying `original` unchanged.
pub async fn run_outcome(
    call: FormatCall,
    original: &str,
    module: &str,
    reporter: &dyn StatusReporter,
) -> FormattingOutcome {
    match execute(call, module).await {
        Ok(text) => {
            reporter.update_status(FormatStatus::Success);
            if text == original {
                FormattingOutcome::Unchanged(text)
            } else {
                FormattingOutcome::Formatted(text)
            }
        }
        Err(err) => {
            log::error!(target: "prettier_ls::executor", "[{}] {}", module, err);
            reporter.update_status(FormatStatus::Error);
            FormattingOutcome::Error(Some(original.to_string()))
        }
    }
}

/// Execute `call`, returning the formatted text or `original` on failure.
pub async fn run(
    call: FormatCall,
    original: &str,
    module: &str,
    reporter: &dyn StatusReporter,
) -> String {
    match run_outcome(call, original, module, reporter).await {
        FormattingOutcome::Formatted(text) | FormattingOutcome::Unchanged(text) => text,
        _ => original.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::status::LogReporter;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn success_returns_text_and_reports_success() {
        let reporter = LogReporter::new();
        let call = FormatCall::ready(Ok("const x = 1;\n".to_string()));

        let text = run(call, "const x=1", "prettier", &reporter).await;

        assert_eq!(text, "const x = 1;\n");
        assert_eq!(reporter.last_status(), Some(FormatStatus::Success));
    }

    #[tokio::test]
    async fn synchronous_failure_returns_original() {
        let reporter = LogReporter::new();
        let call = FormatCall::deferred(|| Err(FormatError::backend("prettier", "SyntaxError")));

        let text = run(call, "const x=", "prettier", &reporter).await;

        assert_eq!(text, "const x=");
        assert_eq!(reporter.last_status(), Some(FormatStatus::Error));
    }

    #[tokio::test]
    async fn asynchronous_failure_returns_original() {
        let reporter = LogReporter::new();
        let call = FormatCall::pending(async {
            tokio::task::yield_now().await;
            Err(FormatError::backend("prettier-eslint", "rejected"))
        });

        let outcome = run_outcome(call, "let a", "prettier-eslint", &reporter).await;

        assert_eq!(outcome, FormattingOutcome::Error(Some("let a".to_string())));
        assert_eq!(reporter.last_status(), Some(FormatStatus::Error));
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let reporter = LogReporter::new();
        let call = FormatCall::deferred(|| panic!("backend exploded"));

        let result = execute(call, "prettier").await;

        assert!(matches!(result, Err(FormatError::Panicked { .. })));

        let call = FormatCall::deferred(|| panic!("backend exploded"));
        let text = run(call, "original", "prettier", &reporter).await;
        assert_eq!(text, "original");
        assert_eq!(reporter.last_status(), Some(FormatStatus::Error));
    }

    #[tokio::test]
    async fn identical_output_is_unchanged() {
        let reporter = LogReporter::new();
        let call = FormatCall::ready(Ok("a;\n".to_string()));

        let outcome = run_outcome(call, "a;\n", "prettier", &reporter).await;

        assert_eq!(outcome, FormattingOutcome::Unchanged("a;\n".to_string()));
    }

    #[tokio::test]
    async fn dropped_run_publishes_no_status() {
        let reporter = Arc::new(LogReporter::new());
        let call = FormatCall::pending(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".to_string())
        });

        let task_reporter = Arc::clone(&reporter);
        let result = tokio::time::timeout(Duration::from_millis(20), async move {
            run(call, "original", "prettier", task_reporter.as_ref()).await
        })
        .await;

        assert!(result.is_err());
        assert_eq!(reporter.last_status(), None);
    }
}
