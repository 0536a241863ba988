use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a block, used by hosts to reference embedded
/// image figures across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Heading levels supported by the block model (h1..h4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }

    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            4 => Some(HeadingLevel::H4),
            _ => None,
        }
    }
}

/// Block-level text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// List variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// Character-level formatting attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

/// The set of inline styles carried by a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl StyleSet {
    pub fn contains(&self, style: InlineStyle) -> bool {
        match style {
            InlineStyle::Bold => self.bold,
            InlineStyle::Italic => self.italic,
            InlineStyle::Underline => self.underline,
            InlineStyle::Strikethrough => self.strikethrough,
        }
    }

    pub fn set(&mut self, style: InlineStyle, on: bool) {
        match style {
            InlineStyle::Bold => self.bold = on,
            InlineStyle::Italic => self.italic = on,
            InlineStyle::Underline => self.underline = on,
            InlineStyle::Strikethrough => self.strikethrough = on,
        }
    }

    pub fn toggle(&mut self, style: InlineStyle) {
        let current = self.contains(style);
        self.set(style, !current);
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline && !self.strikethrough
    }
}

/// A run of text sharing one style set
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub styles: StyleSet,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: StyleSet::default(),
        }
    }

    pub fn styled(text: impl Into<String>, styles: StyleSet) -> Self {
        Self {
            text: text.into(),
            styles,
        }
    }

    /// Length in characters (not bytes); all cursor offsets in the model
    /// are character offsets.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Inline content: either a styled run or a hyperlink wrapping runs
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(TextRun),
    Link { href: String, runs: Vec<TextRun> },
}

impl Inline {
    pub fn char_len(&self) -> usize {
        match self {
            Inline::Run(run) => run.char_len(),
            Inline::Link { runs, .. } => runs.iter().map(TextRun::char_len).sum(),
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            Inline::Run(run) => run.text.clone(),
            Inline::Link { runs, .. } => runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

/// Character length of a sequence of inlines
pub fn inline_len(content: &[Inline]) -> usize {
    content.iter().map(Inline::char_len).sum()
}

/// Concatenated text of a sequence of inlines
pub fn inline_text(content: &[Inline]) -> String {
    content.iter().map(|i| i.plain_text()).collect()
}

/// Image width presets. `Custom` is the only variant carrying explicit
/// pixel dimensions, so "custom width/height present iff size is custom"
/// holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "preset")]
pub enum ImageSize {
    Quarter,
    Half,
    ThreeQuarter,
    Full,
    Custom { width: u32, height: u32 },
}

impl ImageSize {
    pub fn preset_name(&self) -> &'static str {
        match self {
            ImageSize::Quarter => "quarter",
            ImageSize::Half => "half",
            ImageSize::ThreeQuarter => "three-quarter",
            ImageSize::Full => "full",
            ImageSize::Custom { .. } => "custom",
        }
    }

    pub fn from_preset_name(name: &str) -> Option<Self> {
        match name {
            "quarter" => Some(ImageSize::Quarter),
            "half" => Some(ImageSize::Half),
            "three-quarter" => Some(ImageSize::ThreeQuarter),
            "full" => Some(ImageSize::Full),
            _ => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ImageSize::Custom { .. })
    }
}

/// Horizontal placement of an image figure, independent of its size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl ImageAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageAlign::Left => "left",
            ImageAlign::Center => "center",
            ImageAlign::Right => "right",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "left" => Some(ImageAlign::Left),
            "center" => Some(ImageAlign::Center),
            "right" => Some(ImageAlign::Right),
            _ => None,
        }
    }
}

/// An embedded image figure with layout metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub id: BlockId,
    pub src: String,
    pub alt: String,
    pub caption: Option<String>,
    pub size: ImageSize,
    pub align: ImageAlign,
}

impl ImageBlock {
    /// New image with the default layout: full width, centered.
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            id: BlockId::new(),
            src: src.into(),
            alt: alt.into(),
            caption: None,
            size: ImageSize::Full,
            align: ImageAlign::Center,
        }
    }
}

/// A table with a header row and zero or more body rows. Cells hold plain
/// placeholder-style text; rich content inside cells is out of scope.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub header: Vec<String>,
    pub body: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn row_count(&self) -> usize {
        1 + self.body.len()
    }

    pub fn col_count(&self) -> usize {
        self.header.len()
    }
}

/// Block-level node of the document tree (tagged variant type)
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph {
        align: Alignment,
        content: Vec<Inline>,
    },
    Heading {
        level: HeadingLevel,
        align: Alignment,
        content: Vec<Inline>,
    },
    Blockquote {
        align: Alignment,
        content: Vec<Inline>,
    },
    List {
        kind: ListKind,
        items: Vec<Vec<Inline>>,
    },
    Divider,
    Table(TableBlock),
    Image(ImageBlock),
}

impl Block {
    pub fn empty_paragraph() -> Self {
        Block::Paragraph {
            align: Alignment::Left,
            content: Vec::new(),
        }
    }

    pub fn paragraph_with_text(text: impl Into<String>) -> Self {
        Block::Paragraph {
            align: Alignment::Left,
            content: vec![Inline::Run(TextRun::plain(text))],
        }
    }

    /// True for blocks whose content is a flat inline sequence the cursor
    /// can sit in directly (lists address their items separately).
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Block::Paragraph { .. } | Block::Heading { .. } | Block::Blockquote { .. }
        )
    }

    pub fn content(&self) -> Option<&Vec<Inline>> {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::Blockquote { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::Blockquote { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn align(&self) -> Option<Alignment> {
        match self {
            Block::Paragraph { align, .. }
            | Block::Heading { align, .. }
            | Block::Blockquote { align, .. } => Some(*align),
            _ => None,
        }
    }

    /// Visible text of the block, item/cell texts concatenated
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::Blockquote { content, .. } => inline_text(content),
            Block::List { items, .. } => items
                .iter()
                .map(|item| inline_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Divider => String::new(),
            Block::Table(table) => {
                let mut parts: Vec<&str> = table.header.iter().map(String::as_str).collect();
                for row in &table.body {
                    parts.extend(row.iter().map(String::as_str));
                }
                parts.join("\n")
            }
            Block::Image(image) => image.alt.clone(),
        }
    }

    /// True when the block carries no user-visible content. Dividers,
    /// tables and images always count as content.
    pub fn is_content_empty(&self) -> bool {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::Blockquote { content, .. } => inline_text(content).trim().is_empty(),
            Block::List { items, .. } => items
                .iter()
                .all(|item| inline_text(item).trim().is_empty()),
            Block::Divider | Block::Table(_) | Block::Image(_) => false,
        }
    }
}
