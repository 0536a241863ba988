//! richdoc-engine: content, selection, and formatting engine for a
//! WYSIWYG rich-text editor.
//!
//! The engine owns an explicit block tree (`model`), speaks an HTML
//! fragment at its serialization boundary (`markup`), and exposes all
//! mutation through commands (`editing`) behind the [`Editor`] facade.
//! Rendering, keyboard handling, and dialogs belong to the host, which
//! plugs in through the capability traits in [`host`].

pub mod editing;
pub mod editor;
pub mod error;
pub mod format_state;
pub mod host;
pub mod markup;
pub mod model;
pub mod selection;

pub use editing::{
    BlockType, CATALOG, Cmd, DragState, HistoryStack, Patch, ResizeConstraints, ResizeHandle,
    SlashCommand, SlashCommandId, SlashMenu, normalize_url, resize_dimensions,
};
pub use editor::{Editor, SlashOutcome};
pub use error::{EditorError, MediaError};
pub use format_state::FormatState;
pub use host::{HostEnvironment, MediaCollaborator, NullHost};
pub use model::{
    Alignment, Block, BlockId, Document, HeadingLevel, ImageAlign, ImageBlock, ImageSize, Inline,
    InlineStyle, ListKind, StyleSet, TableBlock, TextRun,
};
pub use selection::{Position, Rect, SavedSelection, Selection};
