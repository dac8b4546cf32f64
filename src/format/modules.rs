//! Locating and invoking the external formatter executables.
//!
//! The base engine is `prettier`; the lint-integrated formatters are
//! `prettier-tslint`, `prettier-eslint` and `prettier-stylelint`. All of them
//! run as child processes reading the document from stdin.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::error::FormatError;

use super::BoxFuture;
use super::executor::FormatCall;
use super::options::EngineOptions;
use super::status::StatusReporter;
use super::workspace::WorkspaceView;

/// Oldest engine release whose CLI and options this server relies on.
pub const MIN_ENGINE_VERSION: (u64, u64, u64) = (1, 13, 0);

const ENGINE_NAME: &str = "prettier";

/// Lint-integrated siblings of the base engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LintModule {
    Tslint,
    Eslint,
    Stylelint,
}

impl LintModule {
    pub fn module_name(&self) -> &'static str {
        match self {
            LintModule::Tslint => "prettier-tslint",
            LintModule::Eslint => "prettier-eslint",
            LintModule::Stylelint => "prettier-stylelint",
        }
    }
}

/// Anything that can turn text plus options into a [`FormatCall`].
pub trait FormatterModule: Send + Sync {
    fn name(&self) -> &str;

    fn invoke(&self, text: &str, options: &EngineOptions) -> FormatCall;
}

/// What the engine knows about a file before formatting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub inferred_parser: Option<String>,
}

/// The base engine: a formatter that can also classify files.
pub trait Engine: FormatterModule {
    fn file_info<'a>(
        &'a self,
        file: &'a Path,
        ignore_path: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<FileInfo, FormatError>>;
}

/// Supplies engine and lint module instances for a file.
pub trait ModuleProvider: Send + Sync {
    /// Engine applicable to `file`. With `warn_if_outdated`, an old engine
    /// triggers a one-time warning (it is still returned).
    fn prettier_instance<'a>(
        &'a self,
        file: Option<&'a Path>,
        warn_if_outdated: bool,
    ) -> BoxFuture<'a, Result<Arc<dyn Engine>, FormatError>>;

    /// Lint module applicable to `file`, or `None` if it is not installed.
    fn module_instance(
        &self,
        file: Option<&Path>,
        module: LintModule,
    ) -> Option<Arc<dyn FormatterModule>>;

    /// Forget every cached resolution.
    fn dispose(&self);
}

/// Where an engine executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineSource {
    Setting,
    Local,
    Global,
}

/// Resolves executables from `node_modules/.bin`, the `prettierPath`
/// setting and, for the engine only, `PATH`.
pub struct CliModuleProvider {
    workspace: Arc<dyn WorkspaceView>,
    reporter: Arc<dyn StatusReporter>,
    engines: DashMap<PathBuf, Arc<PrettierCli>>,
    lint_modules: DashMap<(PathBuf, LintModule), Option<Arc<LintCli>>>,
}

impl CliModuleProvider {
    pub fn new(workspace: Arc<dyn WorkspaceView>, reporter: Arc<dyn StatusReporter>) -> Self {
        Self {
            workspace,
            reporter,
            engines: DashMap::new(),
            lint_modules: DashMap::new(),
        }
    }

    /// Directory the local `node_modules` search starts from.
    fn search_start(&self, file: Option<&Path>) -> Option<PathBuf> {
        match file.and_then(Path::parent) {
            Some(dir) => Some(dir.to_path_buf()),
            None => self.workspace.folder_for(None),
        }
    }

    fn locate_engine(&self, file: Option<&Path>) -> Option<(PathBuf, EngineSource)> {
        if let Some(configured) = self.workspace.settings().prettier_path.as_deref() {
            let path = self.workspace.resolve_configured_path(file, configured);
            if path.is_file() {
                return Some((path, EngineSource::Setting));
            }
            log::warn!(
                target: "prettier_ls::modules",
                "prettierPath {} does not exist, falling back to discovery",
                path.display()
            );
        }

        if let Some(local) = self
            .search_start(file)
            .and_then(|start| find_local_bin(&start, ENGINE_NAME))
        {
            return Some((local, EngineSource::Local));
        }

        which::which(bin_name(ENGINE_NAME))
            .ok()
            .map(|global| (global, EngineSource::Global))
    }

    async fn load_engine(
        &self,
        file: Option<&Path>,
        warn_if_outdated: bool,
    ) -> Result<Arc<dyn Engine>, FormatError> {
        let (path, source) = self.locate_engine(file).ok_or_else(|| {
            FormatError::engine_not_found(
                "install prettier in the project or set prettierPath",
            )
        })?;

        if source == EngineSource::Global {
            self.reporter.warn_once(
                "global-prettier",
                &format!(
                    "Using globally installed prettier at {}. Install it locally to pin the version.",
                    path.display()
                ),
            );
        }

        let cached = self.engines.get(&path).map(|entry| Arc::clone(entry.value()));
        let engine = match cached {
            Some(engine) => engine,
            None => {
                let engine = Arc::new(PrettierCli::new(path.clone()));
                self.engines.insert(path.clone(), Arc::clone(&engine));
                engine
            }
        };

        if warn_if_outdated
            && let Some(version) = engine.version().await
            && version < MIN_ENGINE_VERSION
        {
            self.reporter.warn_once(
                &format!("outdated:{}", path.display()),
                &format!(
                    "prettier {}.{}.{} at {} is outdated; version {}.{}.{} or newer is required.",
                    version.0,
                    version.1,
                    version.2,
                    path.display(),
                    MIN_ENGINE_VERSION.0,
                    MIN_ENGINE_VERSION.1,
                    MIN_ENGINE_VERSION.2
                ),
            );
        }

        log::debug!(
            target: "prettier_ls::modules",
            "Using {:?} prettier at {}",
            source,
            path.display()
        );
        Ok(engine as Arc<dyn Engine>)
    }
}

impl std::fmt::Debug for CliModuleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliModuleProvider")
            .field("engines", &self.engines.len())
            .field("lint_modules", &self.lint_modules.len())
            .finish_non_exhaustive()
    }
}

impl ModuleProvider for CliModuleProvider {
    fn prettier_instance<'a>(
        &'a self,
        file: Option<&'a Path>,
        warn_if_outdated: bool,
    ) -> BoxFuture<'a, Result<Arc<dyn Engine>, FormatError>> {
        Box::pin(self.load_engine(file, warn_if_outdated))
    }

    fn module_instance(
        &self,
        file: Option<&Path>,
        module: LintModule,
    ) -> Option<Arc<dyn FormatterModule>> {
        let start = self.search_start(file)?;
        let key = (start, module);

        let cached = self.lint_modules.get(&key).map(|entry| entry.value().clone());
        let resolved = match cached {
            Some(resolved) => resolved,
            None => {
                let resolved = find_local_bin(&key.0, module.module_name())
                    .map(|path| Arc::new(LintCli::new(module, path)));
                self.lint_modules.insert(key, resolved.clone());
                resolved
            }
        };

        resolved.map(|cli| cli as Arc<dyn FormatterModule>)
    }

    fn dispose(&self) {
        self.engines.clear();
        self.lint_modules.clear();
    }
}

/// `prettier` driven through its CLI.
#[derive(Debug)]
pub struct PrettierCli {
    path: PathBuf,
    version: OnceCell<Option<(u64, u64, u64)>>,
}

impl PrettierCli {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            version: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `prettier --version`, queried once per executable.
    pub async fn version(&self) -> Option<(u64, u64, u64)> {
        *self
            .version
            .get_or_init(|| async {
                match run_with_stdin(&self.path, &["--version".to_string()], None, None, ENGINE_NAME)
                    .await
                {
                    Ok(output) => parse_version(&output),
                    Err(err) => {
                        log::warn!(
                            target: "prettier_ls::modules",
                            "Failed to query version of {}: {}",
                            self.path.display(),
                            err
                        );
                        None
                    }
                }
            })
            .await
    }
}

impl FormatterModule for PrettierCli {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn invoke(&self, text: &str, options: &EngineOptions) -> FormatCall {
        let program = self.path.clone();
        let args = options.engine_args();
        let cwd = working_dir(options);
        let input = text.to_string();
        FormatCall::pending(async move {
            run_with_stdin(&program, &args, cwd.as_deref(), Some(&input), ENGINE_NAME).await
        })
    }
}

impl Engine for PrettierCli {
    fn file_info<'a>(
        &'a self,
        file: &'a Path,
        ignore_path: Option<&'a Path>,
    ) -> BoxFuture<'a, Result<FileInfo, FormatError>> {
        Box::pin(async move {
            let mut args = vec!["--file-info".to_string(), file.display().to_string()];
            if let Some(ignore_path) = ignore_path {
                args.push("--ignore-path".to_string());
                args.push(ignore_path.display().to_string());
            }
            let output = run_with_stdin(&self.path, &args, file.parent(), None, ENGINE_NAME).await?;
            serde_json::from_str(&output)
                .map_err(|err| FormatError::invalid_output(ENGINE_NAME, err.to_string()))
        })
    }
}

/// A lint-integrated formatter driven through its CLI.
#[derive(Debug)]
pub struct LintCli {
    module: LintModule,
    path: PathBuf,
}

impl LintCli {
    pub fn new(module: LintModule, path: PathBuf) -> Self {
        Self { module, path }
    }

    fn args(options: &EngineOptions) -> Vec<String> {
        let mut args = vec!["--stdin".to_string()];
        if let Some(path) = &options.file_path {
            args.push(format!("--stdin-filepath={}", path.display()));
        }
        args.push(format!("--parser={}", options.parser));
        args.extend(options.style_args());
        args
    }
}

impl FormatterModule for LintCli {
    fn name(&self) -> &str {
        self.module.module_name()
    }

    fn invoke(&self, text: &str, options: &EngineOptions) -> FormatCall {
        let program = self.path.clone();
        let args = Self::args(options);
        let cwd = working_dir(options);
        let input = text.to_string();
        let module = self.module.module_name();
        FormatCall::pending(async move {
            run_with_stdin(&program, &args, cwd.as_deref(), Some(&input), module).await
        })
    }
}

fn working_dir(options: &EngineOptions) -> Option<PathBuf> {
    options
        .file_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
}

fn bin_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.cmd", name)
    } else {
        name.to_string()
    }
}

/// Nearest `node_modules/.bin/<name>` at or above `start`.
pub fn find_local_bin(start: &Path, name: &str) -> Option<PathBuf> {
    let bin = bin_name(name);
    start
        .ancestors()
        .map(|dir| dir.join("node_modules").join(".bin").join(&bin))
        .find(|candidate| candidate.is_file())
}

/// Parse `3.3.3`, `v2.8.0` or `3.0.0-alpha.1` into a comparable triple.
pub fn parse_version(raw: &str) -> Option<(u64, u64, u64)> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let core = raw.split(['-', '+']).next()?;
    let mut parts = core.split('.').map(|part| part.parse::<u64>().ok());
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some((major, minor, patch))
}

/// Spawn `program`, feed `input` on stdin and collect stdout.
///
/// A non-zero exit becomes [`FormatError::Backend`] carrying stderr.
async fn run_with_stdin(
    program: &Path,
    args: &[String],
    cwd: Option<&Path>,
    input: Option<&str>,
    module: &str,
) -> Result<String, FormatError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd.filter(|dir| dir.is_dir()) {
        command.current_dir(cwd);
    }

    log::trace!(
        target: "prettier_ls::modules",
        "Spawning {} {:?}",
        program.display(),
        args
    );
    let mut child = command.spawn()?;
    let stdin = child.stdin.take();
    let input = input.unwrap_or_default().as_bytes();

    let write = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(input).await?;
            stdin.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FormatError::backend(module, stderr.trim()));
    }
    // The process may exit before reading all input (e.g. `--version`)
    if let Err(err) = written
        && err.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(err.into());
    }

    String::from_utf8(output.stdout)
        .map_err(|err| FormatError::invalid_output(module, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrettierOptions, WorkspaceSettings};
    use crate::format::executor::execute;
    use crate::format::status::LogReporter;
    use crate::format::workspace::StaticWorkspace;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn provider(root: &Path, settings: WorkspaceSettings) -> CliModuleProvider {
        CliModuleProvider::new(
            Arc::new(StaticWorkspace::new(settings, Some(root.to_path_buf()))),
            Arc::new(LogReporter::new()),
        )
    }

    fn install_bin(dir: &Path, name: &str, script: &str) -> PathBuf {
        let bin_dir = dir.join("node_modules").join(".bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let path = bin_dir.join(bin_name(name));
        fs::write(&path, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    fn options(file: Option<PathBuf>) -> EngineOptions {
        EngineOptions {
            parser: "babel".to_string(),
            file_path: file,
            config_file: None,
            use_editorconfig: true,
            fallback: PrettierOptions::default(),
            range: None,
        }
    }

    #[rstest]
    #[case("3.3.3\n", Some((3, 3, 3)))]
    #[case("v2.8.0", Some((2, 8, 0)))]
    #[case("3.0.0-alpha.1", Some((3, 0, 0)))]
    #[case("1.12", Some((1, 12, 0)))]
    #[case("not a version", None)]
    fn parses_engine_versions(#[case] raw: &str, #[case] expected: Option<(u64, u64, u64)>) {
        assert_eq!(parse_version(raw), expected);
    }

    #[test]
    fn version_threshold_compares_lexicographically() {
        assert!((1, 12, 9) < MIN_ENGINE_VERSION);
        assert!((1, 13, 0) >= MIN_ENGINE_VERSION);
        assert!((2, 0, 0) >= MIN_ENGINE_VERSION);
    }

    #[test]
    fn file_info_deserializes_engine_json() {
        let info: FileInfo =
            serde_json::from_str(r#"{"ignored":false,"inferredParser":"babel"}"#).unwrap();
        assert_eq!(info.inferred_parser.as_deref(), Some("babel"));

        let info: FileInfo =
            serde_json::from_str(r#"{"ignored":true,"inferredParser":null}"#).unwrap();
        assert!(info.ignored);
        assert_eq!(info.inferred_parser, None);
    }

    #[test]
    fn local_bin_is_found_walking_up() {
        let dir = TempDir::new().unwrap();
        let installed = install_bin(dir.path(), "prettier-eslint", "");
        let nested = dir.path().join("src/components");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_local_bin(&nested, "prettier-eslint"), Some(installed));
        assert_eq!(find_local_bin(&nested, "prettier-tslint"), None);
    }

    #[test]
    fn lint_modules_are_only_loaded_locally() {
        let dir = TempDir::new().unwrap();
        install_bin(dir.path(), "prettier-stylelint", "");
        let provider = provider(dir.path(), WorkspaceSettings::default());
        let file = dir.path().join("style.css");

        let stylelint = provider.module_instance(Some(&file), LintModule::Stylelint);
        assert_eq!(stylelint.map(|m| m.name().to_string()).as_deref(), Some("prettier-stylelint"));
        assert!(provider.module_instance(Some(&file), LintModule::Eslint).is_none());
    }

    #[test]
    fn dispose_forgets_missing_modules() {
        let dir = TempDir::new().unwrap();
        let provider = provider(dir.path(), WorkspaceSettings::default());
        let file = dir.path().join("a.ts");

        assert!(provider.module_instance(Some(&file), LintModule::Tslint).is_none());
        install_bin(dir.path(), "prettier-tslint", "");
        // Cached miss until the provider is disposed
        assert!(provider.module_instance(Some(&file), LintModule::Tslint).is_none());

        provider.dispose();

        assert!(provider.module_instance(Some(&file), LintModule::Tslint).is_some());
    }

    #[test]
    fn lint_args_carry_stdin_path_and_parser() {
        let args = LintCli::args(&options(Some(PathBuf::from("/ws/a.ts"))));
        assert_eq!(
            args,
            vec![
                "--stdin".to_string(),
                "--stdin-filepath=/ws/a.ts".to_string(),
                "--parser=babel".to_string(),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial_test::serial(spawn)]
    async fn local_engine_formats_through_stdin() {
        let dir = TempDir::new().unwrap();
        install_bin(
            dir.path(),
            "prettier",
            "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 3.3.3; exit 0; fi\ncat\necho ';'\n",
        );
        let provider = provider(dir.path(), WorkspaceSettings::default());
        let file = dir.path().join("a.js");

        let engine = provider.prettier_instance(Some(&file), true).await.unwrap();
        let call = engine.invoke("x", &options(Some(file.clone())));
        let output = execute(call, "prettier").await.unwrap();

        assert_eq!(output, "x;\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial_test::serial(spawn)]
    async fn failing_engine_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let path = install_bin(
            dir.path(),
            "prettier",
            "#!/bin/sh\necho 'SyntaxError: Unexpected token' >&2\nexit 2\n",
        );
        let engine = PrettierCli::new(path);

        let result = execute(engine.invoke("const x=", &options(None)), "prettier").await;

        match result {
            Err(FormatError::Backend { module, message }) => {
                assert_eq!(module, "prettier");
                assert!(message.contains("SyntaxError"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial_test::serial(spawn)]
    async fn file_info_is_parsed_from_engine_output() {
        let dir = TempDir::new().unwrap();
        let path = install_bin(
            dir.path(),
            "prettier",
            "#!/bin/sh\necho '{ \"ignored\": true, \"inferredParser\": null }'\n",
        );
        let engine = PrettierCli::new(path);

        let info = engine
            .file_info(&dir.path().join("dist/a.js"), Some(&dir.path().join(".prettierignore")))
            .await
            .unwrap();

        assert!(info.ignored);
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial_test::serial(spawn)]
    async fn prettier_path_setting_takes_precedence() {
        let dir = TempDir::new().unwrap();
        install_bin(dir.path(), "prettier", "#!/bin/sh\necho 3.0.0\n");
        let custom = dir.path().join("tools/prettier");
        fs::create_dir_all(custom.parent().unwrap()).unwrap();
        fs::write(&custom, "#!/bin/sh\necho 3.0.0\n").unwrap();
        let settings = WorkspaceSettings {
            prettier_path: Some("tools/prettier".to_string()),
            ..Default::default()
        };
        let provider = provider(dir.path(), settings);

        let located = provider.locate_engine(Some(&dir.path().join("a.js")));

        assert_eq!(located, Some((custom, EngineSource::Setting)));
    }
}
