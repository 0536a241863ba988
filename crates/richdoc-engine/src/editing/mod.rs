//! Editing layer: commands, history, image geometry, slash menu.

pub mod commands;
pub mod history;
pub mod image;
pub mod patch;
pub mod slash;

pub use commands::{BlockType, Cmd, normalize_url};
pub use history::{HistoryEntry, HistoryStack};
pub use image::{DragState, ResizeConstraints, ResizeHandle, resize_dimensions};
pub use patch::Patch;
pub use slash::{CATALOG, SlashCommand, SlashCommandId, SlashMenu, filter_from_line};
