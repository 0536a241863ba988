//! Slash command menu: the typeahead block palette.
//!
//! Typing `/` in an empty context opens the menu; everything typed after
//! the slash filters the catalog. The menu itself is pure state (open,
//! filter, highlight). Executing a chosen command is the editor's job,
//! which also removes the trigger text from the document.

/// Stable identifiers for the catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommandId {
    Text,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    BulletList,
    NumberedList,
    Quote,
    Divider,
    Table,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashCommand {
    pub id: SlashCommandId,
    pub label: &'static str,
    pub description: &'static str,
    keywords: &'static [&'static str],
}

/// The fixed catalog, in display order.
pub const CATALOG: &[SlashCommand] = &[
    SlashCommand {
        id: SlashCommandId::Text,
        label: "Text",
        description: "Plain paragraph text",
        keywords: &["paragraph", "plain", "body"],
    },
    SlashCommand {
        id: SlashCommandId::Heading1,
        label: "Heading 1",
        description: "Large section heading",
        keywords: &["h1", "title"],
    },
    SlashCommand {
        id: SlashCommandId::Heading2,
        label: "Heading 2",
        description: "Medium section heading",
        keywords: &["h2", "subtitle"],
    },
    SlashCommand {
        id: SlashCommandId::Heading3,
        label: "Heading 3",
        description: "Small section heading",
        keywords: &["h3"],
    },
    SlashCommand {
        id: SlashCommandId::Heading4,
        label: "Heading 4",
        description: "Smallest section heading",
        keywords: &["h4"],
    },
    SlashCommand {
        id: SlashCommandId::BulletList,
        label: "Bullet List",
        description: "Unordered list with bullets",
        keywords: &["ul", "unordered", "bullets"],
    },
    SlashCommand {
        id: SlashCommandId::NumberedList,
        label: "Numbered List",
        description: "Ordered list with numbers",
        keywords: &["ol", "ordered", "numbers"],
    },
    SlashCommand {
        id: SlashCommandId::Quote,
        label: "Quote",
        description: "Block quotation",
        keywords: &["blockquote", "citation"],
    },
    SlashCommand {
        id: SlashCommandId::Divider,
        label: "Divider",
        description: "Horizontal rule",
        keywords: &["hr", "rule", "separator", "line"],
    },
    SlashCommand {
        id: SlashCommandId::Table,
        label: "Table",
        description: "Rows and columns",
        keywords: &["grid", "cells"],
    },
    SlashCommand {
        id: SlashCommandId::Image,
        label: "Image",
        description: "Upload or embed a picture",
        keywords: &["photo", "picture", "figure", "upload"],
    },
];

fn matches(command: &SlashCommand, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    command.label.to_lowercase().contains(&needle)
        || command.description.to_lowercase().contains(&needle)
        || command
            .keywords
            .iter()
            .any(|k| k.to_lowercase().contains(&needle))
}

/// Text after the last `/` on the line, when the line ends in an active
/// trigger. `None` when there is no slash, or whitespace follows it (a
/// space cancels the trigger).
pub fn filter_from_line(line: &str) -> Option<&str> {
    let slash = line.rfind('/')?;
    let after = &line[slash + 1..];
    if after.chars().any(char::is_whitespace) {
        return None;
    }
    Some(after)
}

/// Menu state: open flag, live filter, highlighted row.
#[derive(Debug, Clone, Default)]
pub struct SlashMenu {
    open: bool,
    filter: String,
    highlight: usize,
}

impl SlashMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn open(&mut self) {
        self.open = true;
        self.filter.clear();
        self.highlight = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.filter.clear();
        self.highlight = 0;
    }

    /// Update the filter from the text typed after the slash. Resets the
    /// highlight to the first match.
    pub fn set_filter(&mut self, filter: &str) {
        self.filter.clear();
        self.filter.push_str(filter);
        self.highlight = 0;
    }

    /// Catalog entries matching the current filter, in catalog order.
    pub fn filtered(&self) -> Vec<&'static SlashCommand> {
        CATALOG
            .iter()
            .filter(|c| matches(c, &self.filter))
            .collect()
    }

    /// The menu hides itself (without closing) when the filter matches
    /// nothing, so stray typing does not pin an empty popup open.
    pub fn should_display(&self) -> bool {
        self.open && !self.filtered().is_empty()
    }

    pub fn highlighted(&self) -> Option<&'static SlashCommand> {
        self.filtered().get(self.highlight).copied()
    }

    pub fn highlight_next(&mut self) {
        let count = self.filtered().len();
        if count > 0 {
            self.highlight = (self.highlight + 1) % count;
        }
    }

    pub fn highlight_prev(&mut self) {
        let count = self.filtered().len();
        if count > 0 {
            self.highlight = (self.highlight + count - 1) % count;
        }
    }

    /// Confirm the highlighted entry, closing the menu.
    pub fn confirm(&mut self) -> Option<SlashCommandId> {
        let chosen = self.highlighted().map(|c| c.id);
        if chosen.is_some() {
            self.close();
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(menu: &SlashMenu) -> Vec<&'static str> {
        menu.filtered().iter().map(|c| c.label).collect()
    }

    #[test]
    fn open_menu_shows_full_catalog_in_order() {
        let mut menu = SlashMenu::new();
        menu.open();
        assert_eq!(
            labels(&menu),
            vec![
                "Text",
                "Heading 1",
                "Heading 2",
                "Heading 3",
                "Heading 4",
                "Bullet List",
                "Numbered List",
                "Quote",
                "Divider",
                "Table",
                "Image",
            ]
        );
    }

    #[test]
    fn head_filter_matches_exactly_the_four_headings() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.set_filter("head");
        assert_eq!(
            labels(&menu),
            vec!["Heading 1", "Heading 2", "Heading 3", "Heading 4"]
        );
    }

    #[test]
    fn filter_is_case_insensitive_and_checks_keywords() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.set_filter("HR");
        assert_eq!(labels(&menu), vec!["Divider"]);

        menu.set_filter("piCTure");
        assert_eq!(labels(&menu), vec!["Image"]);
    }

    #[test]
    fn empty_result_hides_menu_without_closing_it() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.set_filter("zzzz");
        assert!(menu.is_open());
        assert!(!menu.should_display());

        menu.set_filter("quo");
        assert!(menu.should_display());
    }

    #[test]
    fn highlight_wraps_in_both_directions() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.set_filter("head");

        menu.highlight_prev();
        assert_eq!(menu.highlighted().map(|c| c.label), Some("Heading 4"));
        menu.highlight_next();
        assert_eq!(menu.highlighted().map(|c| c.label), Some("Heading 1"));
        menu.highlight_next();
        assert_eq!(menu.highlighted().map(|c| c.label), Some("Heading 2"));
    }

    #[test]
    fn changing_filter_resets_highlight() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.highlight_next();
        menu.highlight_next();
        menu.set_filter("list");
        assert_eq!(menu.highlighted().map(|c| c.label), Some("Bullet List"));
    }

    #[test]
    fn confirm_returns_id_and_closes() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.set_filter("divider");
        assert_eq!(menu.confirm(), Some(SlashCommandId::Divider));
        assert!(!menu.is_open());
    }

    #[test]
    fn confirm_with_no_matches_keeps_menu_open() {
        let mut menu = SlashMenu::new();
        menu.open();
        menu.set_filter("zzz");
        assert_eq!(menu.confirm(), None);
        assert!(menu.is_open());
    }

    #[test]
    fn filter_from_line_takes_text_after_last_slash() {
        assert_eq!(filter_from_line("some /he"), Some("he"));
        assert_eq!(filter_from_line("/"), Some(""));
        assert_eq!(filter_from_line("a/b/ta"), Some("ta"));
        assert_eq!(filter_from_line("no trigger"), None);
        assert_eq!(filter_from_line("/head stop"), None);
    }
}
