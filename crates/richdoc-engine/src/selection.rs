//! Cursor and selection addressing.
//!
//! Positions address a point in the document tree as a node path plus a
//! character offset, recomputed against the live tree rather than held as
//! references into it. A path is one index for plain textual blocks
//! (`[block]`) and two for list items (`[block, item]`).

use serde::Serialize;

use crate::model::{Document, inline_len};

/// A point in the document: node path + character offset within the
/// addressed inline container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self {
            path: vec![block],
            offset,
        }
    }

    pub fn in_item(block: usize, item: usize, offset: usize) -> Self {
        Self {
            path: vec![block, item],
            offset,
        }
    }

    pub fn block(&self) -> usize {
        self.path.first().copied().unwrap_or(0)
    }

    pub fn item(&self) -> Option<usize> {
        self.path.get(1).copied()
    }

    /// Ordering key for normalizing start/end of a selection
    fn sort_key(&self) -> (usize, usize, usize) {
        (self.block(), self.item().unwrap_or(0), self.offset)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// An ephemeral selection: two positions plus the cached screen rectangle
/// reported by the host for the current range (when non-collapsed).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    pub fn range(start: Position, end: Position) -> Self {
        Self { start, end }.normalized()
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Returns the selection with start <= end in document order
    pub fn normalized(self) -> Self {
        if self.start.sort_key() <= self.end.sort_key() {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

/// Screen-space rectangle, in the host's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Express this rect relative to another rect's origin (used to anchor
    /// overlays against the editor's own bounding box).
    pub fn relative_to(&self, origin: Rect) -> Rect {
        Rect {
            x: self.x - origin.x,
            y: self.y - origin.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A selection cloned before a focus-stealing interaction (e.g. opening a
/// dialog) so the operation can be replayed at the original cursor.
///
/// Must be revalidated against the live document before reuse; documents
/// are replaced wholesale by loads, so a save from a previous document
/// generation is always stale.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSelection {
    selection: Selection,
}

impl SavedSelection {
    pub fn capture(doc: &Document) -> Self {
        Self {
            selection: doc.selection().clone(),
        }
    }

    /// Re-anchor the saved selection against the live document. Returns
    /// `None` when the anchor no longer resolves (block gone, offset past
    /// the container, container shape changed) so callers can fall back to
    /// document-end insertion.
    pub fn revalidate(&self, doc: &Document) -> Option<Selection> {
        let sel = self.selection.clone().normalized();
        if position_resolves(doc, &sel.start) && position_resolves(doc, &sel.end) {
            Some(sel)
        } else {
            None
        }
    }
}

fn position_resolves(doc: &Document, pos: &Position) -> bool {
    let Some(block) = doc.blocks().get(pos.block()) else {
        return false;
    };
    match (pos.item(), block.content()) {
        (None, Some(content)) => pos.offset <= inline_len(content),
        (None, None) => {
            // Non-textual block (divider/table/image): only offset 0 is a
            // meaningful anchor.
            match block {
                crate::model::Block::List { .. } => false,
                _ => pos.offset == 0,
            }
        }
        (Some(item), None) => match block {
            crate::model::Block::List { items, .. } => items
                .get(item)
                .is_some_and(|content| pos.offset <= inline_len(content)),
            _ => false,
        },
        (Some(_), Some(_)) => false,
    }
}
