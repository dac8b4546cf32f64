//! The formatting pipeline.
//!
//! [`Orchestrator::format`] runs, in order: legacy-settings warning, engine
//! lookup, disabled-language check, ignore-file check, parser resolution,
//! `requireConfig` check, option resolution, backend selection and safe
//! execution. Every early exit leaves the document untouched.

use std::path::Path;
use std::sync::Arc;

use crate::error::FormatError;

use super::capabilities::{CapabilityResolver, SupportTable};
use super::config_provider::{ConfigProvider, FsConfigProvider, OptionsRequest};
use super::executor::{self, FormatCall};
use super::ignore::{IgnoreResolver, RootIgnoreResolver};
use super::modules::{CliModuleProvider, Engine, FileInfo, FormatterModule, LintModule, ModuleProvider};
use super::options::EngineOptions;
use super::request::{FormattingOutcome, FormattingRequest};
use super::status::{FormatStatus, StatusReporter};
use super::workspace::WorkspaceView;

/// Lint-integrated backends in priority order. The first tier whose
/// predicate holds and whose module is installed handles the request.
const LINT_TIERS: &[LintModule] = &[LintModule::Tslint, LintModule::Eslint, LintModule::Stylelint];

/// Everything the pipeline consults.
#[derive(Clone)]
pub struct Collaborators {
    pub workspace: Arc<dyn WorkspaceView>,
    pub config: Arc<dyn ConfigProvider>,
    pub capabilities: Arc<dyn CapabilityResolver>,
    pub ignore: Arc<dyn IgnoreResolver>,
    pub modules: Arc<dyn ModuleProvider>,
    pub reporter: Arc<dyn StatusReporter>,
}

impl Collaborators {
    /// Filesystem-backed collaborators around `workspace`.
    pub fn with_defaults(
        workspace: Arc<dyn WorkspaceView>,
        reporter: Arc<dyn StatusReporter>,
        capabilities: Arc<SupportTable>,
    ) -> Self {
        Self {
            config: Arc::new(FsConfigProvider::new()),
            capabilities,
            ignore: Arc::new(RootIgnoreResolver::new(Arc::clone(&workspace))),
            modules: Arc::new(CliModuleProvider::new(
                Arc::clone(&workspace),
                Arc::clone(&reporter),
            )),
            workspace,
            reporter,
        }
    }
}

/// Decides whether and how to format a document, then does it.
#[derive(Clone)]
pub struct Orchestrator {
    collaborators: Collaborators,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Orchestrator with the filesystem-backed collaborators.
    pub fn with_defaults(
        workspace: Arc<dyn WorkspaceView>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        let capabilities = Arc::new(SupportTable::new(Arc::clone(&workspace)));
        Self::new(Collaborators::with_defaults(workspace, reporter, capabilities))
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Format `request`, returning the text to apply or `None` to defer.
    ///
    /// When the chosen backend fails the original text comes back unchanged.
    pub async fn format(&self, request: &FormattingRequest) -> Option<String> {
        self.format_outcome(request).await.into_text()
    }

    pub async fn format_outcome(&self, request: &FormattingRequest) -> FormattingOutcome {
        let Collaborators {
            workspace,
            config,
            capabilities,
            modules,
            reporter,
            ..
        } = &self.collaborators;
        let file = request.file_path.as_deref();
        let settings = workspace.settings();

        if !settings.legacy_keys.is_empty() {
            reporter.warn_once(
                &format!("legacy:{}", request.uri),
                &format!(
                    "Settings {} are no longer used. Install prettier-eslint, prettier-tslint or prettier-stylelint locally instead.",
                    settings.legacy_keys.join(", ")
                ),
            );
        }

        // A missing engine never overrides a disabled language
        let engine = modules.prettier_instance(file, true).await;

        if settings.is_language_disabled(&request.language_id) {
            log::debug!(
                target: "prettier_ls::orchestrator",
                "Language {} is disabled",
                request.language_id
            );
            return self.skip();
        }

        let engine = match engine {
            Ok(engine) => engine,
            Err(err) => return self.fail(&request.uri, err),
        };

        let file_info = match file {
            Some(file) => self.file_info(engine.as_ref(), file).await,
            None => FileInfo::default(),
        };
        if file_info.ignored {
            log::debug!(
                target: "prettier_ls::orchestrator",
                "{} is ignored",
                request.uri
            );
            return self.skip();
        }

        let parser = match file_info.inferred_parser.or_else(|| {
            capabilities
                .parsers_for_language(file, &request.language_id)
                .into_iter()
                .next()
        }) {
            Some(parser) => parser,
            None => {
                return self.fail(
                    &request.uri,
                    FormatError::parser_not_found(&request.language_id),
                );
            }
        };

        // requireConfig only applies to documents with a path
        if settings.require_config
            && let Some(file) = file
            && !config.has_config(file)
        {
            log::debug!(
                target: "prettier_ls::orchestrator",
                "No prettier config for {} and requireConfig is set",
                file.display()
            );
            return self.skip();
        }

        let options = match config.resolve_options(OptionsRequest {
            file_path: file,
            parser: &parser,
            use_editorconfig: settings.use_editor_config,
            config_path: settings
                .config_path
                .as_deref()
                .map(|configured| workspace.resolve_configured_path(file, configured)),
            fallback: &settings.options,
            range: request.range,
        }) {
            Ok(options) => options,
            Err(message) => return self.fail(&request.uri, FormatError::options(message)),
        };

        let backend = self.select_backend(file, &request.language_id, &parser, engine);
        log::debug!(
            target: "prettier_ls::orchestrator",
            "Formatting {} with {} (parser {})",
            request.uri,
            backend.name(),
            parser
        );
        let call = backend.invoke(&request.text, &options);
        executor::run_outcome(call, &request.text, backend.name(), reporter.as_ref()).await
    }

    /// First lint tier that applies, else the engine itself.
    fn select_backend(
        &self,
        file: Option<&Path>,
        language_id: &str,
        parser: &str,
        engine: Arc<dyn Engine>,
    ) -> Backend {
        let capabilities = &self.collaborators.capabilities;
        for tier in LINT_TIERS {
            let applies = match tier {
                LintModule::Tslint => parser == "typescript",
                LintModule::Eslint => capabilities.supports_eslint(language_id),
                LintModule::Stylelint => capabilities.parser_supports_stylelint(parser),
            };
            if !applies {
                continue;
            }
            if let Some(module) = self.collaborators.modules.module_instance(file, *tier) {
                return Backend::Lint(module);
            }
        }
        Backend::Engine(engine)
    }

    async fn file_info(&self, engine: &dyn Engine, file: &Path) -> FileInfo {
        let ignore_path = self.collaborators.ignore.ignore_path(file);
        match engine.file_info(file, ignore_path.as_deref()).await {
            Ok(info) => info,
            Err(err) => {
                log::warn!(
                    target: "prettier_ls::orchestrator",
                    "Failed to get file info for {}: {}",
                    file.display(),
                    err
                );
                FileInfo::default()
            }
        }
    }

    fn skip(&self) -> FormattingOutcome {
        self.collaborators.reporter.update_status(FormatStatus::Ignore);
        FormattingOutcome::Ignored
    }

    fn fail(&self, uri: &url::Url, err: FormatError) -> FormattingOutcome {
        log::error!(target: "prettier_ls::orchestrator", "{}: {}", uri, err);
        self.collaborators.reporter.update_status(FormatStatus::Error);
        FormattingOutcome::Error(None)
    }
}

/// The selected backend, whichever tier it came from.
enum Backend {
    Engine(Arc<dyn Engine>),
    Lint(Arc<dyn FormatterModule>),
}

impl Backend {
    fn name(&self) -> &str {
        match self {
            Backend::Engine(engine) => engine.name(),
            Backend::Lint(module) => module.name(),
        }
    }

    fn invoke(&self, text: &str, options: &EngineOptions) -> FormatCall {
        match self {
            Backend::Engine(engine) => engine.invoke(text, options),
            Backend::Lint(module) => module.invoke(text, options),
        }
    }
}
