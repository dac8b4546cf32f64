//! Resolved options handed to a formatting backend.

use std::path::PathBuf;

use crate::config::PrettierOptions;

/// Span to format, in UTF-16 code units from the start of the document.
///
/// Prettier's `rangeStart`/`rangeEnd` are JavaScript string indices, hence
/// UTF-16 rather than bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptions {
    pub start: usize,
    pub end: usize,
}

/// Everything a backend needs besides the text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub parser: String,
    pub file_path: Option<PathBuf>,
    /// Prettier config file that applies to the document, if any
    pub config_file: Option<PathBuf>,
    pub use_editorconfig: bool,
    /// Editor-level options, used only when `config_file` is `None`
    pub fallback: PrettierOptions,
    pub range: Option<RangeOptions>,
}

impl EngineOptions {
    /// Style flags derived from the editor-level fallback options.
    ///
    /// Empty when a config file applies: the project's config is authoritative.
    pub fn style_args(&self) -> Vec<String> {
        if self.config_file.is_some() {
            return Vec::new();
        }
        let options = &self.fallback;
        let mut args = Vec::new();

        if let Some(width) = options.print_width {
            args.push(format!("--print-width={}", width));
        }
        if let Some(width) = options.tab_width {
            args.push(format!("--tab-width={}", width));
        }
        if options.use_tabs == Some(true) {
            args.push("--use-tabs".to_string());
        }
        if options.semi == Some(false) {
            args.push("--no-semi".to_string());
        }
        if options.single_quote == Some(true) {
            args.push("--single-quote".to_string());
        }
        if options.jsx_single_quote == Some(true) {
            args.push("--jsx-single-quote".to_string());
        }
        if let Some(value) = &options.trailing_comma {
            args.push(format!("--trailing-comma={}", value));
        }
        if options.bracket_spacing == Some(false) {
            args.push("--no-bracket-spacing".to_string());
        }
        if let Some(value) = &options.arrow_parens {
            args.push(format!("--arrow-parens={}", value));
        }
        if let Some(value) = &options.prose_wrap {
            args.push(format!("--prose-wrap={}", value));
        }
        if let Some(value) = &options.end_of_line {
            args.push(format!("--end-of-line={}", value));
        }
        if let Some(value) = &options.quote_props {
            args.push(format!("--quote-props={}", value));
        }
        args
    }

    /// Full argument list for `prettier` reading the document from stdin.
    pub fn engine_args(&self) -> Vec<String> {
        let mut args = vec![format!("--parser={}", self.parser)];

        match &self.config_file {
            Some(config) => args.push(format!("--config={}", config.display())),
            None => args.push("--no-config".to_string()),
        }
        if !self.use_editorconfig {
            args.push("--no-editorconfig".to_string());
        }
        args.extend(self.style_args());
        if let Some(range) = self.range {
            args.push(format!("--range-start={}", range.start));
            args.push(format!("--range-end={}", range.end));
        }
        if let Some(path) = &self.file_path {
            args.push(format!("--stdin-filepath={}", path.display()));
        }
        args
    }
}
