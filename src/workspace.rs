//! Open-document state.

pub mod documents;

pub use documents::{Document, DocumentStore};
