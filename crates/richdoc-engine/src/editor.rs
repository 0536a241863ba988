//! Host-facing editor facade.
//!
//! Owns the document, the undo/redo stack, the image interaction state,
//! and the change notification hook. Hosts drive it with commands and the
//! image/slash/link methods; it pushes serialized markup back out through
//! `on_change` after every committed mutation.

use crate::editing::image::{DragState, ResizeConstraints, ResizeHandle, resize_dimensions};
use crate::editing::slash::{SlashCommandId, SlashMenu, filter_from_line};
use crate::editing::{BlockType, Cmd, HistoryEntry, HistoryStack, Patch};
use crate::error::EditorError;
use crate::host::{HostEnvironment, MediaCollaborator};
use crate::model::{
    Block, BlockId, Document, HeadingLevel, ImageAlign, ImageBlock, ImageSize, ListKind,
};
use crate::selection::{Position, Rect, SavedSelection, Selection};

type ChangeCallback = Box<dyn FnMut(&str)>;

/// The editor: document + history + host plumbing.
pub struct Editor<H: HostEnvironment> {
    doc: Document,
    history: HistoryStack,
    host: H,
    on_change: Option<ChangeCallback>,
    saved_selection: Option<SavedSelection>,
    selected_image: Option<BlockId>,
    drag: Option<(BlockId, DragState)>,
    /// Block index of the last committed text insertion, for coalescing
    /// consecutive typing into one undo step.
    last_typed_block: Option<usize>,
    pub slash_menu: SlashMenu,
}

impl<H: HostEnvironment> Editor<H> {
    pub fn new(host: H) -> Self {
        Self::with_value(host, "")
    }

    /// Build an editor over existing markup. The initial state becomes
    /// the undo baseline, so undoing everything returns here.
    pub fn with_value(host: H, markup: &str) -> Self {
        let doc = Document::load(markup);
        let mut history = HistoryStack::new();
        history.push(HistoryEntry {
            markup: doc.serialize(),
            selection: Some(doc.selection().clone()),
        });
        Self {
            doc,
            history,
            host,
            on_change: None,
            saved_selection: None,
            selected_image: None,
            drag: None,
            last_typed_block: None,
            slash_menu: SlashMenu::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Current serialized markup.
    pub fn value(&self) -> String {
        self.doc.serialize()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Replace the whole document, resetting history to a new baseline.
    /// Does not fire `on_change`; the host initiated this value.
    pub fn set_value(&mut self, markup: &str) {
        self.doc = Document::load(markup);
        self.history.reset(HistoryEntry {
            markup: self.doc.serialize(),
            selection: Some(self.doc.selection().clone()),
        });
        self.saved_selection = None;
        self.selected_image = None;
        self.drag = None;
        self.last_typed_block = None;
        self.slash_menu.close();
    }

    /// Change notification: called with the serialized markup after every
    /// committed mutation.
    pub fn set_on_change(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.doc.set_selection(selection);
        // Moving the caret ends any typing burst
        self.last_typed_block = None;
    }

    pub fn selection(&self) -> &Selection {
        self.doc.selection()
    }

    /// Apply a command, committing a history entry when the tree changed.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let coalesce = self.coalesces(&cmd);
        let typed = matches!(cmd, Cmd::InsertText { .. });
        let patch = self.doc.apply(cmd);
        if patch.mutated() {
            self.commit(coalesce);
            self.last_typed_block = typed.then(|| self.doc.selection().start.block());
        }
        patch
    }

    /// Run several commands as one undo step. The closure drives the
    /// editor's document directly; one history entry is committed at the
    /// end if anything changed.
    pub fn transact(&mut self, f: impl FnOnce(&mut Document)) {
        let before = self.doc.version();
        f(&mut self.doc);
        if self.doc.version() != before {
            self.last_typed_block = None;
            self.commit(false);
        }
    }

    fn coalesces(&self, cmd: &Cmd) -> bool {
        match cmd {
            Cmd::InsertText { .. } => {
                self.last_typed_block == Some(self.doc.selection().start.block())
            }
            _ => false,
        }
    }

    fn commit(&mut self, coalesce: bool) {
        let entry = HistoryEntry {
            markup: self.doc.serialize(),
            selection: Some(self.doc.selection().clone()),
        };
        if coalesce {
            self.history.replace_top(entry);
        } else {
            self.history.push(entry);
        }
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(callback) = &mut self.on_change {
            let markup = self.doc.serialize();
            callback(&markup);
        }
    }

    // ---- history ----

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(entry);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(entry);
        true
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.doc = Document::load(&entry.markup);
        if let Some(selection) = entry.selection {
            self.doc.set_selection(selection);
        }
        self.selected_image = None;
        self.drag = None;
        self.last_typed_block = None;
        self.notify();
    }

    // ---- saved selection ----

    /// Capture the selection before a focus-stealing interaction (dialog,
    /// file picker) so the edit can land where the user was.
    pub fn save_selection(&mut self) {
        self.saved_selection = Some(SavedSelection::capture(&self.doc));
    }

    /// Restore the saved selection if it still resolves; fall back to the
    /// document end when the save went stale. Without a save the current
    /// selection stands. Consumes the save either way.
    pub fn restore_selection(&mut self) {
        if let Some(saved) = self.saved_selection.take() {
            let target = saved
                .revalidate(&self.doc)
                .unwrap_or_else(|| Selection::caret(self.doc.end_position()));
            self.doc.set_selection(target);
        }
        self.host.focus();
    }

    /// Insert externally produced markup at the saved (or current)
    /// cursor as one undo step.
    pub fn insert_content_at_cursor(&mut self, markup: &str) {
        self.restore_selection();
        let text = Document::load(markup)
            .blocks()
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return;
        }
        self.apply(Cmd::InsertText { text });
        self.last_typed_block = None;
    }

    pub fn focus(&self) {
        self.host.focus();
    }

    /// Anchor rect for the floating toolbar, relative to the editor's own
    /// bounding box. `None` while the selection is collapsed; the toolbar
    /// only appears over a real range.
    pub fn toolbar_anchor(&self) -> Option<Rect> {
        if self.doc.selection().is_caret() {
            return None;
        }
        let rect = self.host.selection_rect()?;
        Some(rect.relative_to(self.host.editor_bounds()))
    }

    // ---- images ----

    /// Insert an image block at the saved (or current) cursor with default
    /// presentation (full width, centered).
    pub fn insert_image(&mut self, src: &str, alt: &str) -> BlockId {
        self.restore_selection();
        let image = ImageBlock::new(src, alt);
        let id = image.id;
        let at = self.doc.selection().start.block();
        let insert_at = if self.doc.blocks().is_empty() {
            self.doc.blocks.push(Block::Image(image));
            0
        } else {
            self.doc.blocks.insert(at + 1, Block::Image(image));
            at + 1
        };
        // Keep an editable paragraph after the figure
        if !self
            .doc
            .blocks()
            .get(insert_at + 1)
            .is_some_and(Block::is_textual)
        {
            self.doc
                .blocks
                .insert(insert_at + 1, Block::empty_paragraph());
        }
        self.doc.selection = Selection::caret(Position::new(insert_at + 1, 0));
        self.doc.bump_version();
        self.last_typed_block = None;
        self.commit(false);
        id
    }

    /// Upload bytes through the media collaborator, then insert the image
    /// the host now serves. On failure nothing is committed.
    pub fn insert_image_from_upload(
        &mut self,
        media: &dyn MediaCollaborator,
        filename: &str,
        bytes: &[u8],
    ) -> Result<BlockId, EditorError> {
        let src = media.upload(filename, bytes).map_err(EditorError::Media)?;
        Ok(self.insert_image(&src, filename))
    }

    pub fn select_image(&mut self, id: BlockId) {
        if self.image_index(id).is_some() {
            self.selected_image = Some(id);
        }
    }

    pub fn deselect_image(&mut self) {
        self.selected_image = None;
        self.drag = None;
    }

    pub fn selected_image(&self) -> Option<BlockId> {
        self.selected_image
    }

    fn image_index(&self, id: BlockId) -> Option<usize> {
        self.doc.blocks().iter().position(
            |block| matches!(block, Block::Image(image) if image.id == id),
        )
    }

    fn with_image(&mut self, id: BlockId, f: impl FnOnce(&mut ImageBlock)) -> bool {
        let Some(index) = self.image_index(id) else {
            return false;
        };
        if let Block::Image(image) = &mut self.doc.blocks[index] {
            f(image);
            self.doc.bump_version();
            true
        } else {
            false
        }
    }

    /// Switch the image to a preset width. Any custom pixel dimensions
    /// from a previous drag are discarded with the preset.
    pub fn set_image_size(&mut self, id: BlockId, size: ImageSize) {
        if self.with_image(id, |image| image.size = size) {
            self.last_typed_block = None;
            self.commit(false);
        }
    }

    pub fn set_image_align(&mut self, id: BlockId, align: ImageAlign) {
        if self.with_image(id, |image| image.align = align) {
            self.last_typed_block = None;
            self.commit(false);
        }
    }

    pub fn set_image_caption(&mut self, id: BlockId, caption: Option<String>) {
        let caption = caption.filter(|c| !c.is_empty());
        if self.with_image(id, |image| image.caption = caption) {
            self.last_typed_block = None;
            self.commit(false);
        }
    }

    /// Begin an interactive resize from the image's current rendered size.
    pub fn begin_image_resize(&mut self, id: BlockId, width: f64, height: f64) {
        if self.image_index(id).is_some() {
            self.drag = Some((id, DragState::begin(width, height)));
        }
    }

    /// One pointer-move step of an active drag. Overwrites the image's
    /// custom dimensions in place without committing history; the whole
    /// drag becomes a single undo step at [`end_image_resize`].
    ///
    /// [`end_image_resize`]: Self::end_image_resize
    pub fn resize_image(&mut self, handle: ResizeHandle, dx: f64, dy: f64) {
        let Some((id, drag)) = self.drag else {
            return;
        };
        let constraints = ResizeConstraints {
            max_width: match self.host.editor_bounds().width {
                w if w > 0.0 => Some(w),
                _ => None,
            },
            ..ResizeConstraints::default()
        };
        let (width, height) = resize_dimensions(drag, handle, dx, dy, &constraints);
        self.with_image(id, |image| {
            image.size = ImageSize::Custom {
                width: width.round() as u32,
                height: height.round() as u32,
            };
        });
    }

    /// Finish the drag and commit the final size as one history entry.
    pub fn end_image_resize(&mut self) {
        if self.drag.take().is_some() {
            self.last_typed_block = None;
            self.commit(false);
        }
    }

    pub fn delete_image(&mut self, id: BlockId) {
        let Some(index) = self.image_index(id) else {
            return;
        };
        self.doc.blocks.remove(index);
        if self.selected_image == Some(id) {
            self.selected_image = None;
        }
        self.drag = None;
        let sel = self.doc.selection().clone();
        self.doc.selection = Selection {
            start: self.doc.clamp_position(sel.start),
            end: self.doc.clamp_position(sel.end),
        };
        self.doc.bump_version();
        self.last_typed_block = None;
        self.commit(false);
    }

    // ---- links ----

    /// Open the link under the caret through the host.
    pub fn open_link(&self) -> bool {
        let Some(href) = self.doc.link_at(&self.doc.selection().start) else {
            return false;
        };
        self.host.open_url(&href);
        true
    }

    // ---- slash commands ----

    /// Feed the text of the caret's line; opens/filters/hides the menu.
    pub fn update_slash_menu(&mut self, line: &str) {
        match filter_from_line(line) {
            Some(filter) => {
                if !self.slash_menu.is_open() {
                    self.slash_menu.open();
                }
                self.slash_menu.set_filter(filter);
            }
            None => self.slash_menu.close(),
        }
    }

    /// Execute a chosen slash command: remove the trigger text (the slash
    /// plus the filter) before the caret, then perform the block change,
    /// all as one undo step. `Image` performs no edit; the host prompts
    /// for a file and calls back into the image methods.
    pub fn execute_slash_command(&mut self, id: SlashCommandId) -> SlashOutcome {
        let trigger_len = 1 + self.slash_menu.filter().chars().count();
        self.slash_menu.close();

        if id == SlashCommandId::Image {
            self.remove_trigger_text(trigger_len);
            return SlashOutcome::PromptForImage;
        }

        let cmd = match id {
            SlashCommandId::Text => Cmd::SetBlockType(BlockType::Paragraph),
            SlashCommandId::Heading1 => Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H1)),
            SlashCommandId::Heading2 => Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H2)),
            SlashCommandId::Heading3 => Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H3)),
            SlashCommandId::Heading4 => Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H4)),
            SlashCommandId::BulletList => Cmd::SetListType(Some(ListKind::Bullet)),
            SlashCommandId::NumberedList => Cmd::SetListType(Some(ListKind::Ordered)),
            SlashCommandId::Quote => Cmd::SetBlockType(BlockType::Blockquote),
            SlashCommandId::Divider => Cmd::InsertDivider,
            SlashCommandId::Table => Cmd::InsertTable { rows: 3, cols: 3 },
            SlashCommandId::Image => unreachable!(),
        };
        self.transact(|doc| {
            remove_before_caret(doc, trigger_len);
            doc.apply(cmd);
        });
        SlashOutcome::Applied
    }

    fn remove_trigger_text(&mut self, chars: usize) {
        self.transact(|doc| remove_before_caret(doc, chars));
    }
}

/// What happened when a slash command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashOutcome {
    /// The block change was applied in place.
    Applied,
    /// The host must prompt for an image and call `insert_image` /
    /// `insert_image_from_upload` itself.
    PromptForImage,
}

/// Delete `chars` characters immediately before the caret, staying inside
/// the caret's container.
fn remove_before_caret(doc: &mut Document, chars: usize) {
    if chars == 0 {
        return;
    }
    let pos = doc.selection().start.clone();
    let from = pos.offset.saturating_sub(chars);
    if from == pos.offset {
        return;
    }
    let start = match pos.item() {
        Some(item) => Position::in_item(pos.block(), item, from),
        None => Position::new(pos.block(), from),
    };
    doc.apply(Cmd::DeleteRange {
        range: Selection::range(start, pos),
    });
}
