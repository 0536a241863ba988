//! Formatting state of the current selection.
//!
//! Derived fresh from the tree on every query and never cached, so it can
//! never go stale against the document. Drives toolbar button highlighting
//! at the surface level.

use serde::Serialize;

use crate::model::{Alignment, Block, Document, HeadingLevel, InlineStyle, ListKind};
use crate::model::segment::{flatten, range_all};
use crate::selection::Selection;

/// Snapshot of the formatting active at the selection.
///
/// Inline flags report true only when the style covers the entire selected
/// range; for a collapsed caret they report the typing state, so a toggle
/// with nothing selected still lights up the toolbar.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub heading: Option<HeadingLevel>,
    pub blockquote: bool,
    pub alignment: Alignment,
    pub list: Option<ListKind>,
    pub link: Option<String>,
}

impl FormatState {
    /// Derive the state for the document's current selection.
    pub fn at_selection(doc: &Document) -> Self {
        let sel = doc.selection().clone().normalized();
        let mut state = Self::default();

        state.bold = style_active(doc, &sel, InlineStyle::Bold);
        state.italic = style_active(doc, &sel, InlineStyle::Italic);
        state.underline = style_active(doc, &sel, InlineStyle::Underline);
        state.strikethrough = style_active(doc, &sel, InlineStyle::Strikethrough);

        // Block-level facts come from the block holding the selection start
        if let Some(block) = doc.blocks().get(sel.start.block()) {
            match block {
                Block::Heading { level, align, .. } => {
                    state.heading = Some(*level);
                    state.alignment = *align;
                }
                Block::Blockquote { align, .. } => {
                    state.blockquote = true;
                    state.alignment = *align;
                }
                Block::Paragraph { align, .. } => state.alignment = *align,
                Block::List { kind, .. } => state.list = Some(*kind),
                _ => {}
            }
        }

        state.link = doc.link_at(&sel.start);
        state
    }
}

fn style_active(doc: &Document, sel: &Selection, style: InlineStyle) -> bool {
    if sel.is_caret() {
        return doc.typing_styles.contains(style);
    }
    // Active only when every selected container's span carries the style
    let mut any = false;
    for c in crate::editing::commands::selected_containers(doc, sel) {
        if c.range.is_empty() {
            continue;
        }
        let pos = match c.item {
            Some(item) => crate::selection::Position::in_item(c.block, item, 0),
            None => crate::selection::Position::new(c.block, 0),
        };
        let Some(content) = doc.container(&pos) else {
            continue;
        };
        any = true;
        if !range_all(&flatten(content), c.range.start, c.range.end, |s| {
            s.styles.contains(style)
        }) {
            return false;
        }
    }
    any
}
