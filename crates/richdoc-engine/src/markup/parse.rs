//! Tolerant reader from an HTML fragment into the block tree.
//!
//! Input markup comes from hosts and from paste paths, so it may be
//! partial or malformed. The reader recovers wherever a reasonable
//! interpretation exists: unknown tags are dropped but their text kept,
//! unclosed elements are closed at end of input, stray closes are ignored.
//! It only reports an error for input that cannot be tokenized at all
//! (e.g. a tag that never terminates); `Document::load` maps that to the
//! empty document.

use anyhow::{Context, Result, bail};
use html_escape::decode_html_entities;

use crate::model::segment::{Segment, rebuild};
use crate::model::{
    Alignment, Block, HeadingLevel, ImageAlign, ImageBlock, ImageSize, Inline, ListKind, StyleSet,
    TableBlock,
};

/// Parse a markup fragment into blocks.
pub fn parse_fragment(markup: &str) -> Result<Vec<Block>> {
    let tokens = tokenize(markup).context("markup fragment is not tokenizable")?;
    Ok(Builder::default().build(tokens))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Close(String),
    Text(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '<' {
            let start = i;
            while i < chars.len() && chars[i] != '<' {
                i += 1;
            }
            let raw: String = chars[start..i].iter().collect();
            tokens.push(Token::Text(decode_html_entities(&raw).into_owned()));
            continue;
        }

        // At a '<': decide what kind of markup follows
        let next = chars.get(i + 1).copied();
        match next {
            Some('/') => {
                let start = i + 2;
                let Some(end) = find_char(&chars, start, '>') else {
                    bail!("unterminated close tag at offset {i}");
                };
                let name: String = chars[start..end].iter().collect();
                tokens.push(Token::Close(name.trim().to_ascii_lowercase()));
                i = end + 1;
            }
            Some('!') | Some('?') => {
                // Comment / doctype / processing instruction: skip it
                let Some(end) = find_char(&chars, i + 1, '>') else {
                    bail!("unterminated declaration at offset {i}");
                };
                i = end + 1;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let (raw, end) = scan_tag(&chars, i + 1)
                    .with_context(|| format!("unterminated tag at offset {i}"))?;
                let (name, attrs) = parse_tag(&raw)?;
                tokens.push(Token::Open { name, attrs });
                i = end + 1;
            }
            _ => {
                // Stray '<' that starts no tag: literal text
                tokens.push(Token::Text("<".to_string()));
                i += 1;
            }
        }
    }

    Ok(tokens)
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == needle)
}

/// Scan the inside of an open tag up to its closing '>', honoring quoted
/// attribute values. Returns the raw tag text and the index of the '>'.
fn scan_tag(chars: &[char], from: usize) -> Result<(String, usize)> {
    let mut quote: Option<char> = None;
    for j in from..chars.len() {
        let c = chars[j];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Ok((chars[from..j].iter().collect(), j)),
            None => {}
        }
    }
    bail!("reached end of input inside a tag");
}

/// Split `name attr="value" ...` into the lowercase tag name and its
/// attribute pairs. Attribute values are entity-decoded.
fn parse_tag(raw: &str) -> Result<(String, Vec<(String, String)>)> {
    let raw = raw.trim().trim_end_matches('/').trim();
    let name_end = raw
        .find(|c: char| c.is_whitespace())
        .unwrap_or(raw.len());
    let name = raw[..name_end].to_ascii_lowercase();
    if name.is_empty() {
        bail!("tag with empty name");
    }

    let mut attrs = Vec::new();
    let rest: Vec<char> = raw[name_end..].chars().collect();
    let mut i = 0;
    while i < rest.len() {
        while i < rest.len() && (rest[i].is_whitespace() || rest[i] == '/') {
            i += 1;
        }
        if i >= rest.len() {
            break;
        }
        let key_start = i;
        while i < rest.len() && !rest[i].is_whitespace() && rest[i] != '=' {
            i += 1;
        }
        let key: String = rest[key_start..i].iter().collect::<String>().to_ascii_lowercase();
        while i < rest.len() && rest[i].is_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < rest.len() && rest[i] == '=' {
            i += 1;
            while i < rest.len() && rest[i].is_whitespace() {
                i += 1;
            }
            if i < rest.len() && (rest[i] == '"' || rest[i] == '\'') {
                let q = rest[i];
                i += 1;
                let val_start = i;
                while i < rest.len() && rest[i] != q {
                    i += 1;
                }
                value = rest[val_start..i].iter().collect();
                if i < rest.len() {
                    i += 1; // closing quote
                }
            } else {
                let val_start = i;
                while i < rest.len() && !rest[i].is_whitespace() {
                    i += 1;
                }
                value = rest[val_start..i].iter().collect();
            }
        }
        if !key.is_empty() {
            attrs.push((key, decode_html_entities(&value).into_owned()));
        }
    }

    Ok((name, attrs))
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Pull a `text-align` value out of an inline style attribute.
fn align_from_attrs(attrs: &[(String, String)]) -> Alignment {
    let Some(style) = attr(attrs, "style") else {
        return Alignment::Left;
    };
    for decl in style.split(';') {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        if prop.eq_ignore_ascii_case("text-align")
            && let Some(align) = Alignment::from_css(value)
        {
            return align;
        }
    }
    Alignment::Left
}

#[derive(Debug, Clone, Copy)]
enum TextualKind {
    Paragraph,
    Heading(HeadingLevel),
    Blockquote,
}

#[derive(Debug)]
enum OpenBlock {
    Textual {
        kind: TextualKind,
        align: Alignment,
        segments: Vec<Segment>,
    },
    List {
        kind: ListKind,
        items: Vec<Vec<Inline>>,
        current: Option<Vec<Segment>>,
    },
    Table {
        rows: Vec<(bool, Vec<String>)>,
        in_head: bool,
        row: Option<Vec<String>>,
        row_is_header: bool,
        cell: Option<String>,
        cell_is_header: bool,
    },
    Figure {
        size: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        align: ImageAlign,
        src: String,
        alt: String,
        caption: Option<String>,
        in_caption: bool,
    },
}

/// Running inline context: nesting depth per style tag plus the link
/// stack. Depth counters make stray extra closes harmless.
#[derive(Debug, Default)]
struct InlineState {
    bold: u32,
    italic: u32,
    underline: u32,
    strike: u32,
    links: Vec<String>,
}

impl InlineState {
    fn styles(&self) -> StyleSet {
        StyleSet {
            bold: self.bold > 0,
            italic: self.italic > 0,
            underline: self.underline > 0,
            strikethrough: self.strike > 0,
        }
    }

    fn link(&self) -> Option<String> {
        self.links.last().filter(|h| !h.is_empty()).cloned()
    }
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    open: Option<OpenBlock>,
    inline: InlineState,
}

impl Builder {
    fn build(mut self, tokens: Vec<Token>) -> Vec<Block> {
        for token in tokens {
            match token {
                Token::Open { name, attrs } => self.handle_open(&name, &attrs),
                Token::Close(name) => self.handle_close(&name),
                Token::Text(text) => self.append_text(&text),
            }
        }
        self.finish_open();
        self.blocks
    }

    fn handle_open(&mut self, name: &str, attrs: &[(String, String)]) {
        match name {
            "p" => self.open_textual(TextualKind::Paragraph, attrs),
            "h1" => self.open_textual(TextualKind::Heading(HeadingLevel::H1), attrs),
            "h2" => self.open_textual(TextualKind::Heading(HeadingLevel::H2), attrs),
            "h3" => self.open_textual(TextualKind::Heading(HeadingLevel::H3), attrs),
            "h4" => self.open_textual(TextualKind::Heading(HeadingLevel::H4), attrs),
            // Deeper headings clamp to the smallest supported level
            "h5" | "h6" => self.open_textual(TextualKind::Heading(HeadingLevel::H4), attrs),
            "blockquote" => self.open_textual(TextualKind::Blockquote, attrs),
            "ul" => self.open_list(ListKind::Bullet),
            "ol" => self.open_list(ListKind::Ordered),
            "li" => {
                if let Some(OpenBlock::List { items, current, .. }) = &mut self.open {
                    if let Some(segments) = current.take() {
                        items.push(rebuild(segments));
                    }
                    *current = Some(Vec::new());
                }
            }
            "hr" => {
                self.finish_open();
                self.blocks.push(Block::Divider);
            }
            "br" => self.append_text("\n"),
            "table" => {
                self.finish_open();
                self.open = Some(OpenBlock::Table {
                    rows: Vec::new(),
                    in_head: false,
                    row: None,
                    row_is_header: false,
                    cell: None,
                    cell_is_header: false,
                });
            }
            "thead" => {
                if let Some(OpenBlock::Table { in_head, .. }) = &mut self.open {
                    *in_head = true;
                }
            }
            "tr" => {
                self.finish_cell();
                self.finish_row();
                if let Some(OpenBlock::Table {
                    in_head,
                    row,
                    row_is_header,
                    ..
                }) = &mut self.open
                {
                    *row = Some(Vec::new());
                    *row_is_header = *in_head;
                }
            }
            "th" | "td" => {
                self.finish_cell();
                if let Some(OpenBlock::Table {
                    cell,
                    cell_is_header,
                    row,
                    ..
                }) = &mut self.open
                {
                    if row.is_none() {
                        *row = Some(Vec::new());
                    }
                    *cell = Some(String::new());
                    *cell_is_header = name == "th";
                }
            }
            "figure" => {
                self.finish_open();
                self.open = Some(OpenBlock::Figure {
                    size: attr(attrs, "data-size").map(str::to_string),
                    width: attr(attrs, "data-width").and_then(|v| v.parse().ok()),
                    height: attr(attrs, "data-height").and_then(|v| v.parse().ok()),
                    align: attr(attrs, "data-align")
                        .and_then(ImageAlign::from_str_opt)
                        .unwrap_or_default(),
                    src: String::new(),
                    alt: String::new(),
                    caption: None,
                    in_caption: false,
                });
            }
            "img" => match &mut self.open {
                Some(OpenBlock::Figure { src, alt, .. }) => {
                    *src = attr(attrs, "src").unwrap_or("").to_string();
                    *alt = attr(attrs, "alt").unwrap_or("").to_string();
                }
                _ => {
                    // Bare image outside a figure: adopt it with defaults
                    let src = attr(attrs, "src").unwrap_or("").to_string();
                    if !src.is_empty() {
                        self.finish_open();
                        let image = ImageBlock::new(src, attr(attrs, "alt").unwrap_or(""));
                        self.blocks.push(Block::Image(image));
                    }
                }
            },
            "figcaption" => {
                if let Some(OpenBlock::Figure { in_caption, .. }) = &mut self.open {
                    *in_caption = true;
                }
            }
            "a" => self
                .inline
                .links
                .push(attr(attrs, "href").unwrap_or("").to_string()),
            "strong" | "b" => self.inline.bold += 1,
            "em" | "i" => self.inline.italic += 1,
            "u" => self.inline.underline += 1,
            "s" | "strike" | "del" => self.inline.strike += 1,
            // Unknown or purely presentational tags: contents flow through
            _ => {}
        }
    }

    fn handle_close(&mut self, name: &str) {
        match name {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" => {
                if matches!(self.open, Some(OpenBlock::Textual { .. })) {
                    self.finish_open();
                }
            }
            "li" => {
                if let Some(OpenBlock::List { items, current, .. }) = &mut self.open
                    && let Some(segments) = current.take()
                {
                    items.push(rebuild(segments));
                }
            }
            "ul" | "ol" => {
                if matches!(self.open, Some(OpenBlock::List { .. })) {
                    self.finish_open();
                }
            }
            "thead" => {
                if let Some(OpenBlock::Table { in_head, .. }) = &mut self.open {
                    *in_head = false;
                }
            }
            "th" | "td" => self.finish_cell(),
            "tr" => {
                self.finish_cell();
                self.finish_row();
            }
            "table" => {
                if matches!(self.open, Some(OpenBlock::Table { .. })) {
                    self.finish_open();
                }
            }
            "figcaption" => {
                if let Some(OpenBlock::Figure { in_caption, .. }) = &mut self.open {
                    *in_caption = false;
                }
            }
            "figure" => {
                if matches!(self.open, Some(OpenBlock::Figure { .. })) {
                    self.finish_open();
                }
            }
            "a" => {
                self.inline.links.pop();
            }
            "strong" | "b" => self.inline.bold = self.inline.bold.saturating_sub(1),
            "em" | "i" => self.inline.italic = self.inline.italic.saturating_sub(1),
            "u" => self.inline.underline = self.inline.underline.saturating_sub(1),
            "s" | "strike" | "del" => self.inline.strike = self.inline.strike.saturating_sub(1),
            _ => {}
        }
    }

    fn append_text(&mut self, text: &str) {
        match &mut self.open {
            Some(OpenBlock::Textual { segments, .. }) => segments.push(Segment {
                text: text.to_string(),
                styles: self.inline.styles(),
                link: self.inline.link(),
            }),
            Some(OpenBlock::List { current, .. }) => match current {
                Some(segments) => segments.push(Segment {
                    text: text.to_string(),
                    styles: self.inline.styles(),
                    link: self.inline.link(),
                }),
                None => {
                    // Text directly inside ul/ol without an li: start one
                    if !text.trim().is_empty() {
                        *current = Some(vec![Segment {
                            text: text.trim().to_string(),
                            styles: self.inline.styles(),
                            link: self.inline.link(),
                        }]);
                    }
                }
            },
            Some(OpenBlock::Table { cell, .. }) => {
                if let Some(cell) = cell {
                    cell.push_str(text);
                }
            }
            Some(OpenBlock::Figure {
                caption,
                in_caption,
                ..
            }) => {
                if *in_caption && !text.trim().is_empty() {
                    caption.get_or_insert_with(String::new).push_str(text);
                }
            }
            None => {
                // Stray text between blocks becomes an implicit paragraph
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.open = Some(OpenBlock::Textual {
                        kind: TextualKind::Paragraph,
                        align: Alignment::Left,
                        segments: vec![Segment {
                            text: trimmed.to_string(),
                            styles: self.inline.styles(),
                            link: self.inline.link(),
                        }],
                    });
                }
            }
        }
    }

    fn open_textual(&mut self, kind: TextualKind, attrs: &[(String, String)]) {
        self.finish_open();
        self.open = Some(OpenBlock::Textual {
            kind,
            align: align_from_attrs(attrs),
            segments: Vec::new(),
        });
    }

    fn open_list(&mut self, kind: ListKind) {
        self.finish_open();
        self.open = Some(OpenBlock::List {
            kind,
            items: Vec::new(),
            current: None,
        });
    }

    fn finish_cell(&mut self) {
        if let Some(OpenBlock::Table {
            cell,
            cell_is_header,
            row,
            row_is_header,
            ..
        }) = &mut self.open
            && let Some(text) = cell.take()
        {
            if *cell_is_header {
                *row_is_header = true;
            }
            *cell_is_header = false;
            row.get_or_insert_with(Vec::new)
                .push(text.trim().to_string());
        }
    }

    fn finish_row(&mut self) {
        if let Some(OpenBlock::Table {
            rows,
            row,
            row_is_header,
            ..
        }) = &mut self.open
            && let Some(cells) = row.take()
        {
            if !cells.is_empty() {
                rows.push((*row_is_header, cells));
            }
            *row_is_header = false;
        }
    }

    fn finish_open(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        match open {
            OpenBlock::Textual {
                kind,
                align,
                segments,
            } => {
                let content = rebuild(segments);
                let block = match kind {
                    TextualKind::Paragraph => Block::Paragraph { align, content },
                    TextualKind::Heading(level) => Block::Heading {
                        level,
                        align,
                        content,
                    },
                    TextualKind::Blockquote => Block::Blockquote { align, content },
                };
                self.blocks.push(block);
            }
            OpenBlock::List {
                kind,
                mut items,
                current,
            } => {
                if let Some(segments) = current {
                    items.push(rebuild(segments));
                }
                if !items.is_empty() {
                    self.blocks.push(Block::List { kind, items });
                }
            }
            OpenBlock::Table {
                mut rows,
                row,
                row_is_header,
                cell,
                ..
            } => {
                // Close any dangling cell/row at end of table
                if let Some(mut cells) = row {
                    if let Some(text) = cell {
                        cells.push(text.trim().to_string());
                    }
                    if !cells.is_empty() {
                        rows.push((row_is_header, cells));
                    }
                }
                if rows.is_empty() {
                    return;
                }
                // Explicit header row wins; otherwise the first row is
                // promoted so the invariant "tables have a header" holds
                let header_index = rows.iter().position(|(h, _)| *h).unwrap_or(0);
                let (_, header) = rows.remove(header_index);
                let body = rows.into_iter().map(|(_, cells)| cells).collect();
                self.blocks.push(Block::Table(TableBlock { header, body }));
            }
            OpenBlock::Figure {
                size,
                width,
                height,
                align,
                src,
                alt,
                caption,
                ..
            } => {
                // A figure without an image source is not representable
                if src.is_empty() {
                    return;
                }
                let size = match size.as_deref() {
                    Some("custom") => match (width, height) {
                        (Some(width), Some(height)) => ImageSize::Custom { width, height },
                        // Malformed custom size coerces to the default preset
                        _ => ImageSize::Full,
                    },
                    Some(name) => ImageSize::from_preset_name(name).unwrap_or(ImageSize::Full),
                    None => ImageSize::Full,
                };
                let mut image = ImageBlock::new(src, alt);
                image.size = size;
                image.align = align;
                image.caption = caption.map(|c| c.trim().to_string());
                self.blocks.push(Block::Image(image));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextRun, inline_text};
    use pretty_assertions::assert_eq;

    fn parse(markup: &str) -> Vec<Block> {
        parse_fragment(markup).expect("fragment should parse")
    }

    #[test]
    fn parses_basic_paragraphs_and_headings() {
        let blocks = parse("<h1>Title</h1><p>Body text</p>");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            &blocks[0],
            Block::Heading {
                level: HeadingLevel::H1,
                ..
            }
        ));
        assert_eq!(blocks[0].plain_text(), "Title");
        assert_eq!(blocks[1].plain_text(), "Body text");
    }

    #[test]
    fn parses_inline_styles_including_legacy_tags() {
        let blocks = parse("<p><b>bold</b> and <i>italic</i> and <del>gone</del></p>");
        let content = blocks[0].content().unwrap();
        let segments = crate::model::segment::flatten(content);
        assert!(segments[0].styles.bold);
        assert!(segments.iter().any(|s| s.styles.italic));
        assert!(segments.iter().any(|s| s.styles.strikethrough));
    }

    #[test]
    fn parses_alignment_from_style_attribute() {
        let blocks = parse("<p style=\"text-align: center\">x</p>");
        assert_eq!(blocks[0].align(), Some(Alignment::Center));
    }

    #[test]
    fn parses_lists_with_kind() {
        let blocks = parse("<ol><li>one</li><li>two</li></ol>");
        match &blocks[0] {
            Block::List { kind, items } => {
                assert_eq!(*kind, ListKind::Ordered);
                assert_eq!(items.len(), 2);
                assert_eq!(inline_text(&items[1]), "two");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn parses_links() {
        let blocks = parse("<p><a href=\"https://example.com\">docs</a></p>");
        let content = blocks[0].content().unwrap();
        assert_eq!(
            content,
            &vec![Inline::Link {
                href: "https://example.com".to_string(),
                runs: vec![TextRun::plain("docs")],
            }]
        );
    }

    #[test]
    fn anchor_without_href_is_plain_text() {
        let blocks = parse("<p><a>docs</a></p>");
        assert_eq!(
            blocks[0].content().unwrap(),
            &vec![Inline::Run(TextRun::plain("docs"))]
        );
    }

    #[test]
    fn parses_table_with_thead() {
        let blocks =
            parse("<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>");
        match &blocks[0] {
            Block::Table(table) => {
                assert_eq!(table.header, vec!["A", "B"]);
                assert_eq!(table.body, vec![vec!["1".to_string(), "2".to_string()]]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn table_without_thead_promotes_first_row() {
        let blocks = parse("<table><tr><td>A</td></tr><tr><td>1</td></tr></table>");
        match &blocks[0] {
            Block::Table(table) => {
                assert_eq!(table.header, vec!["A"]);
                assert_eq!(table.body, vec![vec!["1".to_string()]]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn parses_image_figure_with_metadata() {
        let blocks = parse(
            "<figure data-size=\"half\" data-align=\"right\"><img src=\"https://cdn.example.com/a.png\" alt=\"pic\"><figcaption>A caption</figcaption></figure>",
        );
        match &blocks[0] {
            Block::Image(image) => {
                assert_eq!(image.size, ImageSize::Half);
                assert_eq!(image.align, ImageAlign::Right);
                assert_eq!(image.src, "https://cdn.example.com/a.png");
                assert_eq!(image.alt, "pic");
                assert_eq!(image.caption.as_deref(), Some("A caption"));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn custom_size_requires_both_dimensions() {
        let blocks = parse(
            "<figure data-size=\"custom\" data-width=\"320\" data-height=\"200\"><img src=\"u\"></figure>",
        );
        match &blocks[0] {
            Block::Image(image) => assert_eq!(
                image.size,
                ImageSize::Custom {
                    width: 320,
                    height: 200
                }
            ),
            other => panic!("expected image, got {other:?}"),
        }

        // Missing height: coerce to the default preset, never panic
        let blocks =
            parse("<figure data-size=\"custom\" data-width=\"320\"><img src=\"u\"></figure>");
        match &blocks[0] {
            Block::Image(image) => assert_eq!(image.size, ImageSize::Full),
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn figure_without_src_is_dropped() {
        assert_eq!(parse("<figure data-size=\"half\"></figure>"), vec![]);
    }

    #[test]
    fn unknown_tags_are_skipped_but_text_kept() {
        let blocks = parse("<p><span class=\"x\">kept</span></p>");
        assert_eq!(blocks[0].plain_text(), "kept");
    }

    #[test]
    fn unclosed_blocks_are_closed_at_end_of_input() {
        let blocks = parse("<p>dangling");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].plain_text(), "dangling");
    }

    #[test]
    fn stray_close_tags_are_ignored() {
        let blocks = parse("</strong><p>ok</p></div>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].plain_text(), "ok");
    }

    #[test]
    fn stray_text_becomes_a_paragraph() {
        let blocks = parse("just text");
        assert_eq!(blocks, vec![Block::paragraph_with_text("just text")]);
    }

    #[test]
    fn entities_are_decoded() {
        let blocks = parse("<p>a &lt; b &amp; c</p>");
        assert_eq!(blocks[0].plain_text(), "a < b & c");
    }

    #[test]
    fn br_becomes_newline_in_run_text() {
        let blocks = parse("<p>one<br>two</p>");
        assert_eq!(blocks[0].plain_text(), "one\ntwo");
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let blocks = parse("<!-- note --><p>x</p>");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert!(parse_fragment("<p hello").is_err());
    }

    #[test]
    fn interblock_whitespace_is_ignored() {
        let blocks = parse("<p>a</p>\n  <p>b</p>\n");
        assert_eq!(blocks.len(), 2);
    }
}
