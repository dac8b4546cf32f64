use clap::{Parser, Subcommand};
use prettier_ls::format::{
    FormatStatus, FormattingRequest, LogReporter, Orchestrator, StaticWorkspace, SupportTable,
};
use prettier_ls::lsp::{PrettierLs, SettingsEventKind, load_settings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, stdin, stdout};
use tower_lsp_server::{LspService, Server};
use url::Url;

/// A Language Server Protocol (LSP) server formatting documents with Prettier
#[derive(Parser)]
#[command(name = "prettier-ls")]
#[command(version)]
#[command(about = "A Language Server Protocol (LSP) server formatting documents with Prettier")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a single file and print the result to stdout
    Format {
        /// The file to format (its path also drives config and ignore lookup)
        file: PathBuf,

        /// LSP language id (default: guessed from the file name)
        #[arg(long)]
        language_id: Option<String>,

        /// Read the text from stdin instead of the file
        #[arg(long)]
        stdin: bool,
    },
}

#[tokio::main]
async fn main() {
    // stdout is the LSP channel
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Format {
            file,
            language_id,
            stdin: from_stdin,
        }) => {
            if let Err(message) = format_file(&file, language_id, from_stdin).await {
                eprintln!("Error: {}", message);
                std::process::exit(1);
            }
        }
        None => {
            let (service, socket) = LspService::new(PrettierLs::new);
            Server::new(stdin(), stdout(), socket).serve(service).await;
        }
    }
}

async fn format_file(
    file: &Path,
    language_id: Option<String>,
    from_stdin: bool,
) -> Result<(), String> {
    let file = std::path::absolute(file).map_err(|e| format!("{}: {}", file.display(), e))?;

    let text = if from_stdin {
        let mut text = String::new();
        stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        text
    } else {
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| format!("{}: {}", file.display(), e))?
    };

    let language_id = language_id
        .or_else(|| SupportTable::language_for_path(&file).map(str::to_string))
        .ok_or_else(|| {
            format!(
                "Cannot infer a language for {}; pass --language-id",
                file.display()
            )
        })?;

    let root = std::env::current_dir().ok();
    let outcome = load_settings(root.as_deref(), None);
    for event in &outcome.events {
        match event.kind {
            SettingsEventKind::Info => log::info!(target: "prettier_ls::cli", "{}", event.message),
            SettingsEventKind::Warning => {
                log::warn!(target: "prettier_ls::cli", "{}", event.message)
            }
        }
    }
    let settings = outcome.settings.unwrap_or_default();

    let uri = Url::from_file_path(&file)
        .map_err(|_| format!("{} is not an absolute path", file.display()))?;
    let reporter = Arc::new(LogReporter::new());
    let orchestrator = Orchestrator::with_defaults(
        Arc::new(StaticWorkspace::new(settings, root)),
        reporter.clone(),
    );

    let request = FormattingRequest::new(uri, language_id, text.clone());
    let formatted = orchestrator.format(&request).await;
    print!("{}", formatted.as_deref().unwrap_or(&text));

    match reporter.last_status() {
        Some(FormatStatus::Error) => Err(format!("Failed to format {}", file.display())),
        Some(FormatStatus::Ignore) => {
            eprintln!("Skipped {}", file.display());
            Ok(())
        }
        _ => Ok(()),
    }
}
