mod client;
mod lsp_impl;
pub mod registration;
mod settings;
mod settings_manager;

pub use lsp_impl::PrettierLs;
pub use settings::{
    SETTINGS_SECTION, SettingsEvent, SettingsEventKind, SettingsLoadOutcome, SettingsSource,
    load_folder_languages, load_settings, prettier_section,
};
