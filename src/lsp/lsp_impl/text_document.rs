//! Text document related LSP methods.

mod formatting;
