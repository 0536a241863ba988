//! Document tree model.
//!
//! The document is an explicit tagged-node tree: a flat sequence of block
//! variants (paragraph, heading, blockquote, list, divider, table, image
//! figure) whose textual blocks hold styled inline runs. The tree is owned
//! by [`Document`] and mutated only through the editing layer, never by
//! whatever renders it.

pub mod document;
pub mod node;
pub mod segment;

pub use document::Document;
pub use node::{
    Alignment, Block, BlockId, HeadingLevel, ImageAlign, ImageBlock, ImageSize, Inline,
    InlineStyle, ListKind, StyleSet, TableBlock, TextRun, inline_len, inline_text,
};
