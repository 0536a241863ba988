//! Formatting engine: atomic commands over the current selection.
//!
//! Every command is compiled against the live tree and applied in place;
//! the caller receives a [`Patch`] naming the touched blocks. Commands
//! never panic on out-of-range selections; positions are clamped, and
//! commands that cannot apply (empty URL, no link to remove) leave the
//! tree untouched and report no changed blocks.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::editing::Patch;
use crate::model::segment::{self, Segment};
use crate::model::{
    Alignment, Block, Document, HeadingLevel, Inline, InlineStyle, ListKind, TableBlock,
    inline_len,
};
use crate::selection::{Position, Selection};

/// Block-level wrapper kinds reachable through `SetBlockType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
    Blockquote,
}

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Insert text at the caret, replacing the selection if one is open.
    /// Inserted characters carry the current typing styles.
    InsertText { text: String },
    /// Delete the given range
    DeleteRange { range: Selection },
    /// Replace the given range with plain text
    ReplaceRange { range: Selection, text: String },
    /// Toggle an inline style over the selection, or flip the typing
    /// state when the caret is collapsed
    ToggleInline(InlineStyle),
    /// Change the block-level wrapper of the selected block(s)
    SetBlockType(BlockType),
    /// Wrap/unwrap the selected block(s) in a list; `None` or the
    /// currently-active kind unwraps
    SetListType(Option<ListKind>),
    /// Set block-level text alignment of the selected block(s)
    SetAlignment(Alignment),
    /// Insert a horizontal rule at the caret, splitting the current block
    /// when the caret is mid-block
    InsertDivider,
    /// Wrap the selection in a link, or insert new link text at the caret
    CreateLink { url: String, text: Option<String> },
    /// Unwrap the link enclosing the selection back to plain text
    RemoveLink,
    /// Insert a rows x cols table (first row is the header) after the
    /// current block
    InsertTable { rows: usize, cols: usize },
}

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern compiles"));

/// Normalize a user-entered link target. Empty input (after trimming) is
/// rejected; scheme-less input defaults to https.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if URL_SCHEME.is_match(trimmed) || trimmed.starts_with('/') || trimmed.starts_with('#') {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

pub(crate) fn apply(doc: &mut Document, cmd: Cmd) -> Patch {
    let changed = match cmd {
        Cmd::InsertText { text } => insert_text(doc, &text),
        Cmd::DeleteRange { range } => delete_range_contents(doc, &range),
        Cmd::ReplaceRange { range, text } => {
            let mut changed = delete_range_contents(doc, &range);
            changed.extend(insert_text(doc, &text));
            changed.sort_unstable();
            changed.dedup();
            changed
        }
        Cmd::ToggleInline(style) => toggle_inline(doc, style),
        Cmd::SetBlockType(target) => set_block_type(doc, target),
        Cmd::SetListType(kind) => set_list_type(doc, kind),
        Cmd::SetAlignment(align) => set_alignment(doc, align),
        Cmd::InsertDivider => insert_divider(doc),
        Cmd::CreateLink { url, text } => create_link(doc, &url, text.as_deref()),
        Cmd::RemoveLink => remove_link(doc),
        Cmd::InsertTable { rows, cols } => insert_table(doc, rows, cols),
    };

    if !changed.is_empty() {
        doc.bump_version();
    }
    // Re-clamp without resetting the typing state
    let sel = doc.selection.clone().normalized();
    doc.selection = Selection {
        start: doc.clamp_position(sel.start),
        end: doc.clamp_position(sel.end),
    };

    Patch {
        changed,
        new_selection: doc.selection.clone(),
        version: doc.version(),
    }
}

/// A textual container touched by the selection: a textual block or one
/// list item, with the selected local character range.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ContainerRef {
    pub(crate) block: usize,
    pub(crate) item: Option<usize>,
    pub(crate) range: Range<usize>,
    pub(crate) len: usize,
}

fn position_of(block: usize, item: Option<usize>, offset: usize) -> Position {
    match item {
        Some(item) => Position::in_item(block, item, offset),
        None => Position::new(block, offset),
    }
}

pub(crate) fn selected_containers(doc: &Document, sel: &Selection) -> Vec<ContainerRef> {
    let mut out = Vec::new();
    if doc.blocks().is_empty() {
        return out;
    }
    let sel = sel.clone().normalized();
    let last_block = doc.blocks().len() - 1;
    let start_b = sel.start.block().min(last_block);
    let end_b = sel.end.block().min(last_block);

    for b in start_b..=end_b {
        match &doc.blocks()[b] {
            Block::List { items, .. } => {
                if items.is_empty() {
                    continue;
                }
                let first = if b == start_b {
                    sel.start.item().unwrap_or(0).min(items.len() - 1)
                } else {
                    0
                };
                let last = if b == end_b {
                    sel.end.item().unwrap_or(items.len() - 1).min(items.len() - 1)
                } else {
                    items.len() - 1
                };
                for j in first..=last {
                    let len = inline_len(&items[j]);
                    let from = if b == start_b && j == first {
                        sel.start.offset.min(len)
                    } else {
                        0
                    };
                    let to = if b == end_b && j == last {
                        sel.end.offset.min(len)
                    } else {
                        len
                    };
                    out.push(ContainerRef {
                        block: b,
                        item: Some(j),
                        range: from..to,
                        len,
                    });
                }
            }
            block => {
                let Some(content) = block.content() else {
                    continue;
                };
                let len = inline_len(content);
                let from = if b == start_b {
                    sel.start.offset.min(len)
                } else {
                    0
                };
                let to = if b == end_b { sel.end.offset.min(len) } else { len };
                out.push(ContainerRef {
                    block: b,
                    item: None,
                    range: from..to,
                    len,
                });
            }
        }
    }
    out
}

fn edit_container(
    doc: &mut Document,
    block: usize,
    item: Option<usize>,
    f: impl FnOnce(Vec<Segment>) -> Vec<Segment>,
) {
    let pos = position_of(block, item, 0);
    if let Some(content) = doc.container_mut(&pos) {
        let segments = segment::flatten(content);
        *content = segment::rebuild(f(segments));
    }
}

// ---- inline styles ----

fn toggle_inline(doc: &mut Document, style: InlineStyle) -> Vec<usize> {
    let sel = doc.selection().clone().normalized();
    if sel.is_caret() {
        // Collapsed: flip the typing state so future input inherits it
        doc.typing_styles.toggle(style);
        return Vec::new();
    }

    let containers = selected_containers(doc, &sel);
    let mut any = false;
    let mut active = true;
    for c in &containers {
        if c.range.is_empty() {
            continue;
        }
        any = true;
        let content = doc
            .container(&position_of(c.block, c.item, 0))
            .cloned()
            .unwrap_or_default();
        let segments = segment::flatten(&content);
        if !segment::range_all(&segments, c.range.start, c.range.end, |s| {
            s.styles.contains(style)
        }) {
            active = false;
        }
    }
    if !any {
        return Vec::new();
    }

    let on = !active;
    let mut changed = Vec::new();
    for c in &containers {
        if c.range.is_empty() {
            continue;
        }
        let range = c.range.clone();
        edit_container(doc, c.block, c.item, |segments| {
            segment::map_range(segments, range.start, range.end, |s| s.styles.set(style, on))
        });
        changed.push(c.block);
    }
    changed.dedup();
    changed
}

// ---- block types ----

fn new_block(target: BlockType, align: Alignment, content: Vec<Inline>) -> Block {
    match target {
        BlockType::Paragraph => Block::Paragraph { align, content },
        BlockType::Heading(level) => Block::Heading {
            level,
            align,
            content,
        },
        BlockType::Blockquote => Block::Blockquote { align, content },
    }
}

fn block_matches(block: &Block, target: BlockType) -> bool {
    matches!(
        (block, target),
        (Block::Paragraph { .. }, BlockType::Paragraph) | (Block::Blockquote { .. }, BlockType::Blockquote)
    ) || matches!((block, target), (Block::Heading { level, .. }, BlockType::Heading(want)) if *level == want)
}

fn set_block_type(doc: &mut Document, target: BlockType) -> Vec<usize> {
    if doc.blocks().is_empty() {
        doc.blocks.push(new_block(target, Alignment::Left, Vec::new()));
        doc.selection = Selection::caret(Position::new(0, 0));
        return vec![0];
    }

    let sel = doc.selection().clone().normalized();
    let last_block = doc.blocks().len() - 1;
    let start_b = sel.start.block().min(last_block);

    if sel.is_caret() {
        let block = &doc.blocks()[start_b];
        let after_structural = matches!(block, Block::Divider | Block::Table(_) | Block::Image(_));
        let at_end_of_other = sel.start.item().is_none()
            && block
                .content()
                .is_some_and(|c| inline_len(c) == sel.start.offset && !c.is_empty())
            && !block_matches(block, target);
        if after_structural || at_end_of_other {
            // Start a fresh block of the requested kind instead of
            // rewrapping what was just written
            doc.blocks
                .insert(start_b + 1, new_block(target, Alignment::Left, Vec::new()));
            doc.selection = Selection::caret(Position::new(start_b + 1, 0));
            return vec![start_b + 1];
        }
    }

    let mut end_b = sel.end.block().min(last_block);
    let mut changed = Vec::new();
    let mut i = start_b;
    while i <= end_b {
        match &mut doc.blocks[i] {
            Block::Paragraph { align, content }
            | Block::Heading { align, content, .. }
            | Block::Blockquote { align, content } => {
                let align = *align;
                let content = std::mem::take(content);
                doc.blocks[i] = new_block(target, align, content);
                changed.push(i);
                i += 1;
            }
            Block::List { items, .. } => {
                // Unwrap the list: one block of the target kind per item
                let items = std::mem::take(items);
                let count = items.len().max(1);
                let replacement: Vec<Block> = if items.is_empty() {
                    vec![new_block(target, Alignment::Left, Vec::new())]
                } else {
                    items
                        .into_iter()
                        .map(|content| new_block(target, Alignment::Left, content))
                        .collect()
                };
                doc.blocks.splice(i..=i, replacement);
                changed.extend(i..i + count);
                end_b += count - 1;
                i += count;
            }
            _ => i += 1,
        }
    }
    changed
}

fn set_alignment(doc: &mut Document, align: Alignment) -> Vec<usize> {
    let sel = doc.selection().clone().normalized();
    if doc.blocks().is_empty() {
        return Vec::new();
    }
    let last_block = doc.blocks().len() - 1;
    let mut changed = Vec::new();
    for i in sel.start.block().min(last_block)..=sel.end.block().min(last_block) {
        match &mut doc.blocks[i] {
            Block::Paragraph { align: a, .. }
            | Block::Heading { align: a, .. }
            | Block::Blockquote { align: a, .. } => {
                if *a != align {
                    *a = align;
                    changed.push(i);
                }
            }
            _ => {}
        }
    }
    changed
}

// ---- lists ----

fn set_list_type(doc: &mut Document, kind: Option<ListKind>) -> Vec<usize> {
    if doc.blocks().is_empty() {
        return match kind {
            Some(kind) => {
                doc.blocks.push(Block::List {
                    kind,
                    items: vec![Vec::new()],
                });
                doc.selection = Selection::caret(Position::in_item(0, 0, 0));
                vec![0]
            }
            None => Vec::new(),
        };
    }

    let sel = doc.selection().clone().normalized();
    let last_block = doc.blocks().len() - 1;
    let start_b = sel.start.block().min(last_block);
    let end_b = sel.end.block().min(last_block);

    // Toggle-off cases: active list of the same kind, or explicit None
    if let Block::List {
        kind: current,
        items,
    } = &mut doc.blocks[start_b]
        && (kind.is_none() || kind == Some(*current))
    {
        let items = std::mem::take(items);
        let count = items.len().max(1);
        let replacement: Vec<Block> = if items.is_empty() {
            vec![Block::empty_paragraph()]
        } else {
            items
                .into_iter()
                .map(|content| Block::Paragraph {
                    align: Alignment::Left,
                    content,
                })
                .collect()
        };
        doc.blocks.splice(start_b..=start_b, replacement);
        let item = sel.start.item().unwrap_or(0).min(count - 1);
        doc.selection =
            Selection::caret(Position::new(start_b + item, sel.start.offset));
        return (start_b..start_b + count).collect();
    }

    let Some(kind) = kind else {
        return Vec::new();
    };

    // Re-kind any lists in the selection, and wrap contiguous textual
    // runs into new lists. Runs are collected first, then spliced in
    // reverse so indices stay valid.
    let mut changed = Vec::new();
    let mut runs: Vec<Range<usize>> = Vec::new();
    let mut run_start: Option<usize> = None;
    for i in start_b..=end_b {
        match &mut doc.blocks[i] {
            Block::List { kind: k, .. } => {
                if *k != kind {
                    *k = kind;
                    changed.push(i);
                }
                if let Some(s) = run_start.take() {
                    runs.push(s..i);
                }
            }
            block if block.is_textual() => {
                run_start.get_or_insert(i);
            }
            _ => {
                if let Some(s) = run_start.take() {
                    runs.push(s..i);
                }
            }
        }
    }
    if let Some(s) = run_start {
        runs.push(s..end_b + 1);
    }

    for run in runs.iter().rev() {
        let items: Vec<Vec<Inline>> = doc
            .blocks
            .splice(
                run.clone(),
                std::iter::once(Block::List {
                    kind,
                    items: Vec::new(),
                }),
            )
            .map(|block| match block {
                Block::Paragraph { content, .. }
                | Block::Heading { content, .. }
                | Block::Blockquote { content, .. } => content,
                _ => Vec::new(),
            })
            .collect();
        if let Block::List { items: slot, .. } = &mut doc.blocks[run.start] {
            *slot = items;
        }
        changed.push(run.start);
    }

    // Map the caret into the wrapped list when the start block was part
    // of a converted run
    if let Some(run) = runs.iter().find(|r| r.contains(&start_b)) {
        doc.selection = Selection::caret(Position::in_item(
            run.start,
            start_b - run.start,
            sel.start.offset,
        ));
    }

    changed.sort_unstable();
    changed.dedup();
    changed
}

// ---- structural insertions ----

/// Make sure a textual block follows `index`, inserting an empty
/// paragraph when needed; returns the index of that block.
fn ensure_trailing_paragraph(doc: &mut Document, index: usize) -> usize {
    let next = index + 1;
    if doc
        .blocks()
        .get(next)
        .is_some_and(|block| block.is_textual())
    {
        next
    } else {
        doc.blocks.insert(next, Block::empty_paragraph());
        next
    }
}

fn insert_divider(doc: &mut Document) -> Vec<usize> {
    if doc.blocks().is_empty() {
        doc.blocks.push(Block::Divider);
        let after = ensure_trailing_paragraph(doc, 0);
        doc.selection = Selection::caret(Position::new(after, 0));
        return vec![0, after];
    }

    let sel = doc.selection().clone().normalized();
    let b = sel.start.block().min(doc.blocks().len() - 1);
    let block = &doc.blocks()[b];

    match block.content() {
        Some(content) if sel.start.item().is_none() => {
            let len = inline_len(content);
            let offset = sel.start.offset.min(len);
            if offset == 0 {
                doc.blocks.insert(b, Block::Divider);
                doc.selection = Selection::caret(Position::new(b + 1, 0));
                vec![b, b + 1]
            } else if offset == len {
                doc.blocks.insert(b + 1, Block::Divider);
                let after = ensure_trailing_paragraph(doc, b + 1);
                doc.selection = Selection::caret(Position::new(after, 0));
                vec![b + 1, after]
            } else {
                // Split the block at the caret
                let segments = segment::flatten(content);
                let before = segment::delete_range(segments.clone(), offset, usize::MAX);
                let after = segment::delete_range(segments, 0, offset);
                let tail = match &doc.blocks()[b] {
                    Block::Paragraph { align, .. } => Block::Paragraph {
                        align: *align,
                        content: segment::rebuild(after),
                    },
                    Block::Heading { level, align, .. } => Block::Heading {
                        level: *level,
                        align: *align,
                        content: segment::rebuild(after),
                    },
                    Block::Blockquote { align, .. } => Block::Blockquote {
                        align: *align,
                        content: segment::rebuild(after),
                    },
                    _ => Block::empty_paragraph(),
                };
                if let Some(content) = doc.blocks[b].content_mut() {
                    *content = segment::rebuild(before);
                }
                doc.blocks.insert(b + 1, Block::Divider);
                doc.blocks.insert(b + 2, tail);
                doc.selection = Selection::caret(Position::new(b + 2, 0));
                vec![b, b + 1, b + 2]
            }
        }
        _ => {
            // Inside a list or a structural block: place the rule after it
            doc.blocks.insert(b + 1, Block::Divider);
            let after = ensure_trailing_paragraph(doc, b + 1);
            doc.selection = Selection::caret(Position::new(after, 0));
            vec![b + 1, after]
        }
    }
}

fn insert_table(doc: &mut Document, rows: usize, cols: usize) -> Vec<usize> {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let table = TableBlock {
        header: vec!["Header".to_string(); cols],
        body: vec![vec![String::new(); cols]; rows - 1],
    };

    let at = if doc.blocks().is_empty() {
        doc.blocks.push(Block::Table(table));
        0
    } else {
        let b = doc
            .selection()
            .start
            .block()
            .min(doc.blocks().len() - 1);
        doc.blocks.insert(b + 1, Block::Table(table));
        b + 1
    };
    let after = ensure_trailing_paragraph(doc, at);
    doc.selection = Selection::caret(Position::new(after, 0));
    vec![at, after]
}

// ---- links ----

fn link_strictly_inside(doc: &Document, pos: &Position) -> Option<String> {
    let content = doc.container(pos)?;
    let segments = segment::flatten(content);
    let mut cursor = 0;
    for seg in &segments {
        let len = seg.char_len();
        if pos.offset > cursor && pos.offset < cursor + len {
            return seg.link.clone();
        }
        cursor += len;
    }
    None
}

fn create_link(doc: &mut Document, url: &str, text: Option<&str>) -> Vec<usize> {
    let Some(href) = normalize_url(url) else {
        return Vec::new();
    };

    let sel = doc.selection().clone().normalized();
    if !sel.is_caret() {
        let containers = selected_containers(doc, &sel);
        let mut changed = Vec::new();
        for c in &containers {
            if c.range.is_empty() {
                continue;
            }
            let range = c.range.clone();
            let href = href.clone();
            edit_container(doc, c.block, c.item, move |segments| {
                segment::map_range(segments, range.start, range.end, |s| {
                    s.link = Some(href.clone())
                })
            });
            changed.push(c.block);
        }
        changed.dedup();
        return changed;
    }

    // Collapsed: insert new link text at the caret, if any was given
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    let mut changed = Vec::new();
    if doc.blocks().is_empty() {
        doc.blocks.push(Block::empty_paragraph());
        doc.selection = Selection::caret(Position::new(0, 0));
        changed.push(0);
    }
    let pos = doc.clamp_position(doc.selection().start.clone());
    if doc.container(&pos).is_none() {
        // Caret on a structural block: link text starts a new paragraph
        let after = ensure_trailing_paragraph(doc, pos.block());
        doc.selection = Selection::caret(Position::new(after, 0));
        changed.push(after);
    }
    let pos = doc.clamp_position(doc.selection().start.clone());
    let styles = doc.typing_styles;
    let inserted = Segment {
        text: text.to_string(),
        styles,
        link: Some(href),
    };
    let offset = pos.offset;
    edit_container(doc, pos.block(), pos.item(), move |segments| {
        segment::insert_at(segments, offset, inserted)
    });
    let end = offset + text.chars().count();
    doc.selection = Selection::caret(position_of(pos.block(), pos.item(), end));
    changed.push(pos.block());
    changed.dedup();
    changed
}

fn remove_link(doc: &mut Document) -> Vec<usize> {
    let sel = doc.selection().clone().normalized();
    let pos = doc.clamp_position(sel.start.clone());
    let Some(content) = doc.container(&pos) else {
        return Vec::new();
    };

    // Find the contiguous span of segments sharing the link under the
    // caret, then clear it
    let segments = segment::flatten(content);
    let mut cursor = 0;
    let mut span: Option<(usize, usize, String)> = None;
    let mut spans: Vec<(usize, usize, String)> = Vec::new();
    for seg in &segments {
        let len = seg.char_len();
        match (&seg.link, &mut span) {
            (Some(href), Some((_, end, current))) if href == current => *end = cursor + len,
            (Some(href), _) => {
                if let Some(done) = span.take() {
                    spans.push(done);
                }
                span = Some((cursor, cursor + len, href.clone()));
            }
            (None, _) => {
                if let Some(done) = span.take() {
                    spans.push(done);
                }
            }
        }
        cursor += len;
    }
    if let Some(done) = span.take() {
        spans.push(done);
    }

    let hit = spans
        .into_iter()
        .find(|(start, end, _)| pos.offset >= *start && pos.offset <= *end);
    let Some((start, end, _)) = hit else {
        return Vec::new();
    };

    edit_container(doc, pos.block(), pos.item(), move |segments| {
        segment::map_range(segments, start, end, |s| s.link = None)
    });
    vec![pos.block()]
}

// ---- text editing ----

fn insert_text(doc: &mut Document, text: &str) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut changed = Vec::new();
    let sel = doc.selection().clone().normalized();
    if !sel.is_caret() {
        changed.extend(delete_range_contents(doc, &sel));
    }
    if doc.blocks().is_empty() {
        doc.blocks.push(Block::empty_paragraph());
        doc.selection = Selection::caret(Position::new(0, 0));
        changed.push(0);
    }
    let pos = doc.clamp_position(doc.selection().start.clone());
    if doc.container(&pos).is_none() {
        // Typing while a structural block is current starts a paragraph
        let after = ensure_trailing_paragraph(doc, pos.block());
        doc.selection = Selection::caret(Position::new(after, 0));
        changed.push(after);
    }
    let pos = doc.clamp_position(doc.selection().start.clone());
    let inserted = Segment {
        text: text.to_string(),
        styles: doc.typing_styles,
        link: link_strictly_inside(doc, &pos),
    };
    let offset = pos.offset;
    edit_container(doc, pos.block(), pos.item(), move |segments| {
        segment::insert_at(segments, offset, inserted)
    });
    doc.selection = Selection::caret(position_of(
        pos.block(),
        pos.item(),
        offset + text.chars().count(),
    ));
    changed.push(pos.block());
    changed.sort_unstable();
    changed.dedup();
    changed
}

fn delete_range_contents(doc: &mut Document, range: &Selection) -> Vec<usize> {
    let sel = range.clone().normalized();
    if sel.is_caret() {
        return Vec::new();
    }
    let containers = selected_containers(doc, &sel);
    if containers.is_empty() {
        return Vec::new();
    }
    let mut changed: Vec<usize> = containers.iter().map(|c| c.block).collect();
    changed.dedup();

    if containers.len() == 1 {
        let c = containers[0].clone();
        edit_container(doc, c.block, c.item, |segments| {
            segment::delete_range(segments, c.range.start, c.range.end)
        });
        doc.selection = Selection::caret(position_of(c.block, c.item, c.range.start));
        return changed;
    }

    let first = containers[0].clone();
    let last = containers[containers.len() - 1].clone();
    let merge_textual_blocks = first.item.is_none()
        && last.item.is_none()
        && first.block != last.block
        && doc.blocks()[first.block].is_textual()
        && doc.blocks()[last.block].is_textual()
        && last.range.end < last.len;

    // Trim / remove each container, back to front so indices hold
    let mut item_removals: Vec<(usize, usize)> = Vec::new();
    let mut block_removals: Vec<usize> = Vec::new();
    for c in containers.iter().rev() {
        let is_first = c == &first;
        let fully_covered = c.range.start == 0 && c.range.end == c.len;
        if fully_covered && !is_first {
            match c.item {
                Some(item) => item_removals.push((c.block, item)),
                None => block_removals.push(c.block),
            }
        } else {
            let range = c.range.clone();
            edit_container(doc, c.block, c.item, |segments| {
                segment::delete_range(segments, range.start, range.end)
            });
        }
    }

    if merge_textual_blocks && !block_removals.contains(&last.block) {
        // Pull the trimmed remainder of the end block up into the start
        // block, then drop the end block
        if let Some(tail) = doc.blocks[last.block].content_mut() {
            let tail = std::mem::take(tail);
            if let Some(head) = doc.blocks[first.block].content_mut() {
                let mut segments = segment::flatten(head);
                segments.extend(segment::flatten(&tail));
                *head = segment::rebuild(segments);
            }
        }
        block_removals.push(last.block);
    }

    // Item removals are already in descending order (reverse walk)
    for (block, item) in &item_removals {
        if let Block::List { items, .. } = &mut doc.blocks[*block] {
            if *item < items.len() {
                items.remove(*item);
            }
            if items.is_empty() {
                block_removals.push(*block);
            }
        }
    }
    block_removals.sort_unstable();
    block_removals.dedup();
    for block in block_removals.iter().rev() {
        doc.blocks.remove(*block);
    }

    doc.selection = Selection::caret(position_of(first.block, first.item, first.range.start));
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageSize, inline_text};
    use pretty_assertions::assert_eq;

    fn doc_with(markup: &str) -> Document {
        Document::load(markup)
    }

    fn select(doc: &mut Document, start: Position, end: Position) {
        doc.set_selection(Selection::range(start, end));
    }

    // ============ inline styles ============

    #[test]
    fn toggle_bold_over_range_styles_exact_span() {
        let mut doc = doc_with("<p>hello world</p>");
        select(&mut doc, Position::new(0, 6), Position::new(0, 11));

        let patch = doc.apply(Cmd::ToggleInline(InlineStyle::Bold));
        assert!(patch.mutated());
        assert_eq!(doc.serialize(), "<p>hello <strong>world</strong></p>");
    }

    #[test]
    fn toggle_bold_twice_restores_plain_text() {
        let mut doc = doc_with("<p>hello world</p>");
        select(&mut doc, Position::new(0, 0), Position::new(0, 5));

        doc.apply(Cmd::ToggleInline(InlineStyle::Bold));
        doc.apply(Cmd::ToggleInline(InlineStyle::Bold));
        assert_eq!(doc.serialize(), "<p>hello world</p>");
    }

    #[test]
    fn partially_styled_range_becomes_fully_styled() {
        let mut doc = doc_with("<p><strong>he</strong>llo</p>");
        select(&mut doc, Position::new(0, 0), Position::new(0, 5));

        doc.apply(Cmd::ToggleInline(InlineStyle::Bold));
        assert_eq!(doc.serialize(), "<p><strong>hello</strong></p>");
    }

    #[test]
    fn caret_toggle_sets_typing_state_without_mutation() {
        let mut doc = doc_with("<p>ab</p>");
        doc.set_selection(Selection::caret(Position::new(0, 2)));

        let patch = doc.apply(Cmd::ToggleInline(InlineStyle::Italic));
        assert!(!patch.mutated());
        assert_eq!(doc.serialize(), "<p>ab</p>");

        doc.apply(Cmd::InsertText {
            text: "cd".to_string(),
        });
        assert_eq!(doc.serialize(), "<p>ab<em>cd</em></p>");
    }

    #[test]
    fn toggle_spans_multiple_blocks() {
        let mut doc = doc_with("<p>one</p><p>two</p>");
        select(&mut doc, Position::new(0, 0), Position::new(1, 3));

        doc.apply(Cmd::ToggleInline(InlineStyle::Underline));
        assert_eq!(doc.serialize(), "<p><u>one</u></p><p><u>two</u></p>");
    }

    // ============ block types ============

    #[test]
    fn set_block_type_on_empty_document_creates_block() {
        let mut doc = Document::new();
        let patch = doc.apply(Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H1)));
        assert!(patch.mutated());
        assert!(matches!(doc.blocks()[0], Block::Heading { .. }));
    }

    #[test]
    fn set_block_type_converts_block_under_selection() {
        let mut doc = doc_with("<p>words</p>");
        select(&mut doc, Position::new(0, 1), Position::new(0, 3));

        doc.apply(Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H2)));
        assert_eq!(doc.serialize(), "<h2>words</h2>");
    }

    #[test]
    fn set_block_type_at_end_of_block_starts_fresh_block() {
        let mut doc = doc_with("<h1>Title</h1>");
        doc.set_selection(Selection::caret(Position::new(0, 5)));

        doc.apply(Cmd::SetBlockType(BlockType::Paragraph));
        assert_eq!(doc.blocks().len(), 2);
        assert!(matches!(doc.blocks()[1], Block::Paragraph { .. }));
        assert_eq!(doc.selection().start, Position::new(1, 0));
        // The heading written so far is untouched
        assert_eq!(doc.blocks()[0].plain_text(), "Title");
    }

    #[test]
    fn set_block_type_preserves_alignment_and_inline_content() {
        let mut doc = doc_with("<p style=\"text-align: center\"><strong>x</strong></p>");
        doc.set_selection(Selection::caret(Position::new(0, 0)));

        doc.apply(Cmd::SetBlockType(BlockType::Blockquote));
        assert_eq!(
            doc.serialize(),
            "<blockquote style=\"text-align: center\"><strong>x</strong></blockquote>"
        );
    }

    #[test]
    fn set_block_type_unwraps_list_items() {
        let mut doc = doc_with("<ul><li>a</li><li>b</li></ul>");
        doc.set_selection(Selection::caret(Position::in_item(0, 0, 0)));

        doc.apply(Cmd::SetBlockType(BlockType::Paragraph));
        assert_eq!(doc.serialize(), "<p>a</p><p>b</p>");
    }

    // ============ lists ============

    #[test]
    fn set_list_type_wraps_selected_paragraphs() {
        let mut doc = doc_with("<p>one</p><p>two</p>");
        select(&mut doc, Position::new(0, 0), Position::new(1, 3));

        doc.apply(Cmd::SetListType(Some(ListKind::Bullet)));
        assert_eq!(doc.serialize(), "<ul><li>one</li><li>two</li></ul>");
        assert_eq!(doc.selection().start, Position::in_item(0, 0, 0));
    }

    #[test]
    fn same_kind_toggles_list_off() {
        let mut doc = doc_with("<ul><li>one</li><li>two</li></ul>");
        doc.set_selection(Selection::caret(Position::in_item(0, 1, 2)));

        doc.apply(Cmd::SetListType(Some(ListKind::Bullet)));
        assert_eq!(doc.serialize(), "<p>one</p><p>two</p>");
        assert_eq!(doc.selection().start, Position::new(1, 2));
    }

    #[test]
    fn different_kind_rekinds_list_in_place() {
        let mut doc = doc_with("<ul><li>one</li></ul>");
        doc.set_selection(Selection::caret(Position::in_item(0, 0, 0)));

        doc.apply(Cmd::SetListType(Some(ListKind::Ordered)));
        assert_eq!(doc.serialize(), "<ol><li>one</li></ol>");
    }

    #[test]
    fn set_list_type_none_unwraps() {
        let mut doc = doc_with("<ol><li>one</li></ol>");
        doc.set_selection(Selection::caret(Position::in_item(0, 0, 1)));

        doc.apply(Cmd::SetListType(None));
        assert_eq!(doc.serialize(), "<p>one</p>");
    }

    // ============ alignment ============

    #[test]
    fn set_alignment_updates_selected_blocks() {
        let mut doc = doc_with("<p>a</p><p>b</p>");
        select(&mut doc, Position::new(0, 0), Position::new(1, 1));

        doc.apply(Cmd::SetAlignment(Alignment::Right));
        assert_eq!(
            doc.serialize(),
            "<p style=\"text-align: right\">a</p><p style=\"text-align: right\">b</p>"
        );
    }

    #[test]
    fn realigning_to_current_value_is_a_no_op() {
        let mut doc = doc_with("<p>a</p>");
        doc.set_selection(Selection::caret(Position::new(0, 0)));
        let patch = doc.apply(Cmd::SetAlignment(Alignment::Left));
        assert!(!patch.mutated());
    }

    // ============ divider ============

    #[test]
    fn divider_mid_block_splits_the_block() {
        let mut doc = doc_with("<p>onetwo</p>");
        doc.set_selection(Selection::caret(Position::new(0, 3)));

        doc.apply(Cmd::InsertDivider);
        assert_eq!(doc.serialize(), "<p>one</p><hr><p>two</p>");
        assert_eq!(doc.selection().start, Position::new(2, 0));
    }

    #[test]
    fn divider_at_end_of_document_keeps_an_editable_paragraph_after() {
        let mut doc = doc_with("<p>text</p>");
        doc.set_selection(Selection::caret(Position::new(0, 4)));

        doc.apply(Cmd::InsertDivider);
        assert_eq!(doc.serialize(), "<p>text</p><hr><p></p>");
    }

    #[test]
    fn divider_at_start_goes_before_the_block() {
        let mut doc = doc_with("<p>text</p>");
        doc.set_selection(Selection::caret(Position::new(0, 0)));

        doc.apply(Cmd::InsertDivider);
        assert_eq!(doc.serialize(), "<hr><p>text</p>");
    }

    // ============ links ============

    #[test]
    fn create_link_wraps_selection() {
        let mut doc = doc_with("<p>see docs now</p>");
        select(&mut doc, Position::new(0, 4), Position::new(0, 8));

        doc.apply(Cmd::CreateLink {
            url: "https://example.com".to_string(),
            text: None,
        });
        assert_eq!(
            doc.serialize(),
            "<p>see <a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">docs</a> now</p>"
        );
    }

    #[test]
    fn create_link_defaults_scheme_to_https() {
        let mut doc = doc_with("<p>site</p>");
        select(&mut doc, Position::new(0, 0), Position::new(0, 4));

        doc.apply(Cmd::CreateLink {
            url: "example.com".to_string(),
            text: None,
        });
        assert_eq!(
            doc.link_at(&Position::new(0, 2)),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn create_link_with_blank_url_is_a_no_op() {
        let mut doc = doc_with("<p>site</p>");
        select(&mut doc, Position::new(0, 0), Position::new(0, 4));

        let patch = doc.apply(Cmd::CreateLink {
            url: "   ".to_string(),
            text: None,
        });
        assert!(!patch.mutated());
        assert_eq!(doc.serialize(), "<p>site</p>");
    }

    #[test]
    fn collapsed_create_link_inserts_display_text() {
        let mut doc = doc_with("<p>go </p>");
        doc.set_selection(Selection::caret(Position::new(0, 3)));

        doc.apply(Cmd::CreateLink {
            url: "example.com/a".to_string(),
            text: Some("here".to_string()),
        });
        assert_eq!(doc.blocks()[0].plain_text(), "go here");
        assert_eq!(
            doc.link_at(&Position::new(0, 5)),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(doc.selection().start, Position::new(0, 7));
    }

    #[test]
    fn collapsed_create_link_without_text_is_a_no_op() {
        let mut doc = doc_with("<p>go</p>");
        doc.set_selection(Selection::caret(Position::new(0, 1)));
        let patch = doc.apply(Cmd::CreateLink {
            url: "example.com".to_string(),
            text: None,
        });
        assert!(!patch.mutated());
    }

    #[test]
    fn remove_link_unwraps_whole_link() {
        let mut doc = doc_with(
            "<p>a <a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">linked text</a> b</p>",
        );
        doc.set_selection(Selection::caret(Position::new(0, 5)));

        doc.apply(Cmd::RemoveLink);
        assert_eq!(doc.serialize(), "<p>a linked text b</p>");
    }

    #[test]
    fn remove_link_outside_any_link_is_a_no_op() {
        let mut doc = doc_with("<p>plain</p>");
        doc.set_selection(Selection::caret(Position::new(0, 2)));
        let patch = doc.apply(Cmd::RemoveLink);
        assert!(!patch.mutated());
    }

    // ============ tables ============

    #[test]
    fn insert_table_builds_header_plus_body_grid() {
        let mut doc = doc_with("<p>before</p>");
        doc.set_selection(Selection::caret(Position::new(0, 6)));

        doc.apply(Cmd::InsertTable { rows: 3, cols: 3 });
        match &doc.blocks()[1] {
            Block::Table(table) => {
                assert_eq!(table.row_count(), 3);
                assert_eq!(table.col_count(), 3);
                assert_eq!(table.header, vec!["Header"; 3]);
                assert_eq!(table.body, vec![vec![String::new(); 3]; 2]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn insert_table_clamps_degenerate_dimensions() {
        let mut doc = Document::new();
        doc.apply(Cmd::InsertTable { rows: 0, cols: 0 });
        match &doc.blocks()[0] {
            Block::Table(table) => {
                assert_eq!(table.row_count(), 1);
                assert_eq!(table.col_count(), 1);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    // ============ text editing ============

    #[test]
    fn insert_text_into_empty_document_creates_paragraph() {
        let mut doc = Document::new();
        doc.apply(Cmd::InsertText {
            text: "hi".to_string(),
        });
        assert_eq!(doc.serialize(), "<p>hi</p>");
        assert_eq!(doc.selection().start, Position::new(0, 2));
    }

    #[test]
    fn insert_text_replaces_open_selection() {
        let mut doc = doc_with("<p>hello world</p>");
        select(&mut doc, Position::new(0, 6), Position::new(0, 11));

        doc.apply(Cmd::InsertText {
            text: "there".to_string(),
        });
        assert_eq!(doc.serialize(), "<p>hello there</p>");
    }

    #[test]
    fn delete_range_within_one_block() {
        let mut doc = doc_with("<p>abcdef</p>");
        let range = Selection::range(Position::new(0, 2), Position::new(0, 4));
        doc.apply(Cmd::DeleteRange { range });
        assert_eq!(doc.serialize(), "<p>abef</p>");
        assert_eq!(doc.selection().start, Position::new(0, 2));
    }

    #[test]
    fn delete_range_across_blocks_merges_remainders() {
        let mut doc = doc_with("<p>hello</p><p>skip me</p><p>world</p>");
        let range = Selection::range(Position::new(0, 3), Position::new(2, 3));
        doc.apply(Cmd::DeleteRange { range });
        assert_eq!(doc.serialize(), "<p>helld</p>");
    }

    #[test]
    fn replace_range_swaps_text() {
        let mut doc = doc_with("<p>hello world</p>");
        let range = Selection::range(Position::new(0, 0), Position::new(0, 5));
        doc.apply(Cmd::ReplaceRange {
            range,
            text: "goodbye".to_string(),
        });
        assert_eq!(doc.serialize(), "<p>goodbye world</p>");
    }

    // ============ url normalization ============

    #[test]
    fn normalize_url_cases() {
        assert_eq!(
            normalize_url("example.com"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            normalize_url("  https://example.com  "),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            normalize_url("mailto:a@b.c"),
            Some("mailto:a@b.c".to_string())
        );
        assert_eq!(normalize_url("/docs/page"), Some("/docs/page".to_string()));
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
    }

    // ============ structural no-ops ============

    #[test]
    fn commands_on_structural_blocks_do_not_corrupt_them() {
        let mut doc = doc_with("<p>x</p><hr><p>y</p>");
        select(&mut doc, Position::new(0, 0), Position::new(2, 1));

        doc.apply(Cmd::ToggleInline(InlineStyle::Bold));
        // The divider survives; both paragraphs got the style
        assert_eq!(
            doc.serialize(),
            "<p><strong>x</strong></p><hr><p><strong>y</strong></p>"
        );
    }

    #[test]
    fn version_only_bumps_on_mutation() {
        let mut doc = doc_with("<p>x</p>");
        let v0 = doc.version();
        doc.set_selection(Selection::caret(Position::new(0, 1)));
        doc.apply(Cmd::RemoveLink); // no link: no-op
        assert_eq!(doc.version(), v0);
        doc.apply(Cmd::InsertText {
            text: "y".to_string(),
        });
        assert_eq!(doc.version(), v0 + 1);
    }

    #[test]
    fn image_size_survives_unrelated_commands() {
        let mut doc = doc_with(
            "<figure data-size=\"half\" data-align=\"center\"><img src=\"u\" alt=\"\"></figure><p>text</p>",
        );
        doc.set_selection(Selection::caret(Position::new(1, 4)));
        doc.apply(Cmd::InsertText {
            text: "!".to_string(),
        });
        match &doc.blocks()[0] {
            Block::Image(image) => assert_eq!(image.size, ImageSize::Half),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn delete_range_removes_fully_selected_list_items() {
        let mut doc = doc_with("<ul><li>alpha</li><li>beta</li><li>gamma</li></ul>");
        let range = Selection::range(Position::in_item(0, 0, 3), Position::in_item(0, 2, 5));
        doc.apply(Cmd::DeleteRange { range });
        match &doc.blocks()[0] {
            Block::List { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(inline_text(&items[0]), "alp");
            }
            other => panic!("expected list, got {other:?}"),
        }
        assert_eq!(doc.selection().start, Position::in_item(0, 0, 3));
    }

    #[test]
    fn delete_range_partially_covering_last_item_trims_it() {
        let mut doc = doc_with("<ul><li>alpha</li><li>gamma</li></ul>");
        let range = Selection::range(Position::in_item(0, 0, 3), Position::in_item(0, 1, 3));
        doc.apply(Cmd::DeleteRange { range });
        match &doc.blocks()[0] {
            Block::List { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(inline_text(&items[0]), "alp");
                assert_eq!(inline_text(&items[1]), "ma");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }
}
