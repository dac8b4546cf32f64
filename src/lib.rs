pub mod config;
pub mod error;
pub mod format;
pub mod lsp;
pub mod text;
pub mod workspace;

// Re-export the main server implementation
pub use lsp::PrettierLs;
