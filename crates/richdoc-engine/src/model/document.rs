use crate::editing::{Cmd, Patch};
use crate::model::node::{Block, Inline, StyleSet, inline_len};
use crate::selection::{Position, Selection};

/// The canonical document: an ordered sequence of block nodes plus the
/// current selection.
///
/// The document is the single shared mutable resource of the engine. It is
/// mutated only through [`Document::apply`] (formatting / structural
/// commands), the image lifecycle methods, or wholesale replacement via
/// [`Document::load`]. Every mutation bumps the version counter so change
/// detection stays cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    pub(crate) selection: Selection,
    /// Styles applied to subsequently typed characters while the caret is
    /// collapsed (the "typing state" of inline toggles).
    pub(crate) typing_styles: StyleSet,
    pub(crate) version: u64,
}

impl Document {
    /// Empty document: no blocks, caret at origin.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            selection: Selection::default(),
            typing_styles: StyleSet::default(),
            version: 0,
        }
    }

    /// Parse a markup fragment into a document. Fails soft: unparseable or
    /// empty input yields an empty document, never an error. The caret
    /// starts at document end so appends go after existing content.
    pub fn load(markup: &str) -> Self {
        let blocks = match crate::markup::parse_fragment(markup) {
            Ok(blocks) => blocks,
            Err(_) => Vec::new(),
        };
        let mut doc = Self {
            blocks,
            selection: Selection::default(),
            typing_styles: StyleSet::default(),
            version: 0,
        };
        doc.selection = Selection::caret(doc.end_position());
        doc
    }

    /// Serialize the document to a markup fragment. An empty document
    /// serializes to the empty string.
    pub fn serialize(&self) -> String {
        crate::markup::serialize_fragment(&self.blocks)
    }

    /// True when the document holds no meaningful content (drives the
    /// placeholder display at the surface level).
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_content_empty)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Move the selection. Clamps out-of-range positions to the document
    /// and resets the typing style state to the styles at the new caret.
    pub fn set_selection(&mut self, selection: Selection) {
        let mut sel = selection.normalized();
        sel.start = self.clamp_position(sel.start);
        sel.end = self.clamp_position(sel.end);
        self.typing_styles = self.styles_before(&sel.start);
        self.selection = sel;
    }

    /// Apply a command, returning a patch describing what changed. See
    /// `editing::commands` for the per-command contracts.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        crate::editing::commands::apply(self, cmd)
    }

    /// Position after the last character of the document, used as the
    /// fallback insertion point when a saved selection went stale.
    pub fn end_position(&self) -> Position {
        match self.blocks.last() {
            None => Position::new(0, 0),
            Some(block) => {
                let index = self.blocks.len() - 1;
                match block {
                    Block::List { items, .. } => {
                        let item = items.len().saturating_sub(1);
                        let len = items.last().map(|c| inline_len(c)).unwrap_or(0);
                        Position::in_item(index, item, len)
                    }
                    _ => match block.content() {
                        Some(content) => Position::new(index, inline_len(content)),
                        None => Position::new(index, 0),
                    },
                }
            }
        }
    }

    /// Inline content addressed by a position path, if the path resolves
    /// to a textual container.
    pub(crate) fn container(&self, pos: &Position) -> Option<&Vec<Inline>> {
        let block = self.blocks.get(pos.block())?;
        match (pos.item(), block) {
            (Some(item), Block::List { items, .. }) => items.get(item),
            (None, _) => block.content(),
            _ => None,
        }
    }

    pub(crate) fn container_mut(&mut self, pos: &Position) -> Option<&mut Vec<Inline>> {
        let block = self.blocks.get_mut(pos.block())?;
        match (pos.item(), block) {
            (Some(item), Block::List { items, .. }) => items.get_mut(item),
            (None, block) => block.content_mut(),
            _ => None,
        }
    }

    /// Clamp a position to the nearest valid location in this document.
    pub(crate) fn clamp_position(&self, pos: Position) -> Position {
        if self.blocks.is_empty() {
            return Position::new(0, 0);
        }
        let block_index = pos.block().min(self.blocks.len() - 1);
        let block = &self.blocks[block_index];
        match block {
            Block::List { items, .. } => {
                if items.is_empty() {
                    return Position::in_item(block_index, 0, 0);
                }
                let item = pos.item().unwrap_or(0).min(items.len() - 1);
                let len = inline_len(&items[item]);
                Position::in_item(block_index, item, pos.offset.min(len))
            }
            _ => match block.content() {
                Some(content) => Position::new(block_index, pos.offset.min(inline_len(content))),
                None => Position::new(block_index, 0),
            },
        }
    }

    /// Styles of the character immediately before the position (or of the
    /// first run when at offset zero). Used to seed the typing state when
    /// the caret moves.
    pub(crate) fn styles_before(&self, pos: &Position) -> StyleSet {
        let Some(content) = self.container(pos) else {
            return StyleSet::default();
        };
        let segments = crate::model::segment::flatten(content);
        if segments.is_empty() {
            return StyleSet::default();
        }
        let probe = if pos.offset == 0 { 0 } else { pos.offset - 1 };
        let mut cursor = 0;
        for segment in &segments {
            let len = segment.text.chars().count();
            if probe < cursor + len {
                return segment.styles;
            }
            cursor += len;
        }
        segments.last().map(|s| s.styles).unwrap_or_default()
    }

    /// Href of the link enclosing the position, if any. Walks the inline
    /// ancestry only; block ancestors cannot be links in this model.
    pub fn link_at(&self, pos: &Position) -> Option<String> {
        let content = self.container(pos)?;
        let segments = crate::model::segment::flatten(content);
        let mut cursor = 0;
        for segment in &segments {
            let len = segment.text.chars().count();
            // A caret at either edge of a link counts as inside it
            if pos.offset >= cursor && pos.offset <= cursor + len {
                if let Some(href) = &segment.link {
                    return Some(href.clone());
                }
            }
            cursor += len;
        }
        None
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
