//! Writer from the block tree to an HTML fragment.
//!
//! The fragment is what `onChange` hands to the host and what the host
//! persists. Round-tripping through `parse` is render-equivalent, not
//! byte-identical: the writer always emits the canonical nesting order for
//! inline styles regardless of how the input was nested.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{
    Alignment, Block, ImageSize, Inline, ListKind, StyleSet, TableBlock, TextRun,
};

/// Serialize blocks to a markup fragment. The empty document serializes
/// to the empty string.
pub fn serialize_fragment(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { align, content } => write_textual(out, "p", *align, content),
        Block::Heading {
            level,
            align,
            content,
        } => {
            let tag = match level.as_u8() {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                _ => "h4",
            };
            write_textual(out, tag, *align, content);
        }
        Block::Blockquote { align, content } => write_textual(out, "blockquote", *align, content),
        Block::List { kind, items } => {
            let tag = match kind {
                ListKind::Bullet => "ul",
                ListKind::Ordered => "ol",
            };
            out.push('<');
            out.push_str(tag);
            out.push('>');
            for item in items {
                out.push_str("<li>");
                write_inlines(out, item);
                out.push_str("</li>");
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Block::Divider => out.push_str("<hr>"),
        Block::Table(table) => write_table(out, table),
        Block::Image(image) => {
            out.push_str("<figure data-size=\"");
            out.push_str(image.size.preset_name());
            out.push('"');
            if let ImageSize::Custom { width, height } = image.size {
                out.push_str(&format!(
                    " data-width=\"{}\" data-height=\"{}\"",
                    width, height
                ));
            }
            out.push_str(" data-align=\"");
            out.push_str(image.align.as_str());
            out.push_str("\"><img src=\"");
            out.push_str(&encode_double_quoted_attribute(&image.src));
            out.push_str("\" alt=\"");
            out.push_str(&encode_double_quoted_attribute(&image.alt));
            out.push_str("\">");
            if let Some(caption) = &image.caption {
                out.push_str("<figcaption>");
                write_text(out, caption);
                out.push_str("</figcaption>");
            }
            out.push_str("</figure>");
        }
    }
}

fn write_textual(out: &mut String, tag: &str, align: Alignment, content: &[Inline]) {
    out.push('<');
    out.push_str(tag);
    if align != Alignment::Left {
        out.push_str(" style=\"text-align: ");
        out.push_str(align.as_css());
        out.push('"');
    }
    out.push('>');
    write_inlines(out, content);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_table(out: &mut String, table: &TableBlock) {
    out.push_str("<table><thead><tr>");
    for cell in &table.header {
        out.push_str("<th>");
        write_text(out, cell);
        out.push_str("</th>");
    }
    out.push_str("</tr></thead>");
    if !table.body.is_empty() {
        out.push_str("<tbody>");
        for row in &table.body {
            out.push_str("<tr>");
            for cell in row {
                out.push_str("<td>");
                write_text(out, cell);
                out.push_str("</td>");
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody>");
    }
    out.push_str("</table>");
}

fn write_inlines(out: &mut String, content: &[Inline]) {
    for inline in content {
        match inline {
            Inline::Run(run) => write_run(out, run),
            Inline::Link { href, runs } => {
                out.push_str("<a href=\"");
                out.push_str(&encode_double_quoted_attribute(href));
                // Links open in a new context with no referrer/opener leak
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                for run in runs {
                    write_run(out, run);
                }
                out.push_str("</a>");
            }
        }
    }
}

/// Canonical style nesting: strong > em > u > s
fn write_run(out: &mut String, run: &TextRun) {
    let StyleSet {
        bold,
        italic,
        underline,
        strikethrough,
    } = run.styles;
    if bold {
        out.push_str("<strong>");
    }
    if italic {
        out.push_str("<em>");
    }
    if underline {
        out.push_str("<u>");
    }
    if strikethrough {
        out.push_str("<s>");
    }
    write_text(out, &run.text);
    if strikethrough {
        out.push_str("</s>");
    }
    if underline {
        out.push_str("</u>");
    }
    if italic {
        out.push_str("</em>");
    }
    if bold {
        out.push_str("</strong>");
    }
}

/// Escape text content; model newlines become line breaks.
fn write_text(out: &mut String, text: &str) {
    let escaped = encode_text(text);
    out.push_str(&escaped.replace('\n', "<br>"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingLevel, ImageAlign, ImageBlock, InlineStyle};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_serializes_to_empty_string() {
        assert_eq!(serialize_fragment(&[]), "");
    }

    #[test]
    fn paragraph_with_alignment() {
        let blocks = vec![Block::Paragraph {
            align: Alignment::Center,
            content: vec![Inline::Run(TextRun::plain("hi"))],
        }];
        assert_eq!(
            serialize_fragment(&blocks),
            "<p style=\"text-align: center\">hi</p>"
        );
    }

    #[test]
    fn left_alignment_is_omitted() {
        let blocks = vec![Block::paragraph_with_text("hi")];
        assert_eq!(serialize_fragment(&blocks), "<p>hi</p>");
    }

    #[test]
    fn styled_runs_use_canonical_nesting() {
        let mut styles = StyleSet::default();
        styles.set(InlineStyle::Bold, true);
        styles.set(InlineStyle::Italic, true);
        let blocks = vec![Block::Paragraph {
            align: Alignment::Left,
            content: vec![Inline::Run(TextRun::styled("x", styles))],
        }];
        assert_eq!(
            serialize_fragment(&blocks),
            "<p><strong><em>x</em></strong></p>"
        );
    }

    #[test]
    fn text_is_entity_escaped() {
        let blocks = vec![Block::paragraph_with_text("a < b & c")];
        assert_eq!(serialize_fragment(&blocks), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn link_declares_new_context_and_no_referrer() {
        let blocks = vec![Block::Paragraph {
            align: Alignment::Left,
            content: vec![Inline::Link {
                href: "https://example.com".to_string(),
                runs: vec![TextRun::plain("docs")],
            }],
        }];
        assert_eq!(
            serialize_fragment(&blocks),
            "<p><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">docs</a></p>"
        );
    }

    #[test]
    fn heading_levels_map_to_tags() {
        let blocks = vec![Block::Heading {
            level: HeadingLevel::H3,
            align: Alignment::Left,
            content: vec![Inline::Run(TextRun::plain("t"))],
        }];
        assert_eq!(serialize_fragment(&blocks), "<h3>t</h3>");
    }

    #[test]
    fn image_preset_has_no_pixel_dimensions() {
        let mut image = ImageBlock::new("https://cdn.example.com/pic.png", "pic");
        image.size = ImageSize::Half;
        image.align = ImageAlign::Left;
        let markup = serialize_fragment(&[Block::Image(image)]);
        assert_eq!(
            markup,
            "<figure data-size=\"half\" data-align=\"left\"><img src=\"https://cdn.example.com/pic.png\" alt=\"pic\"></figure>"
        );
    }

    #[test]
    fn image_custom_size_carries_dimensions() {
        let mut image = ImageBlock::new("u", "");
        image.size = ImageSize::Custom {
            width: 320,
            height: 200,
        };
        let markup = serialize_fragment(&[Block::Image(image)]);
        assert!(markup.contains("data-size=\"custom\""));
        assert!(markup.contains("data-width=\"320\""));
        assert!(markup.contains("data-height=\"200\""));
    }

    #[test]
    fn table_serializes_header_and_body() {
        let table = TableBlock {
            header: vec!["H1".to_string(), "H2".to_string()],
            body: vec![vec!["a".to_string(), "b".to_string()]],
        };
        assert_eq!(
            serialize_fragment(&[Block::Table(table)]),
            "<table><thead><tr><th>H1</th><th>H2</th></tr></thead><tbody><tr><td>a</td><td>b</td></tr></tbody></table>"
        );
    }
}
