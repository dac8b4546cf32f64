//! Text utilities for the LSP boundary.
//!
//! - Position mapping between LSP positions and UTF-16 document offsets
//! - Whole-document edits from formatter output

pub mod edits;
pub mod position;

pub use edits::{full_document_edit, range_to_options};
pub use position::LineIndex;
