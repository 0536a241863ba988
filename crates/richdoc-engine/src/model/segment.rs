//! Flat segment view of inline content.
//!
//! Inline editing (style toggles, link wrap/unwrap) is much easier over a
//! flat run of character segments than over the nested inline tree, so the
//! editing layer flattens a container's inlines into segments, splits and
//! rewrites them, and rebuilds the tree. Rebuilding merges adjacent
//! segments with identical style/link attributes, which keeps the tree
//! canonical no matter how many times a range was split.

use crate::model::node::{Inline, StyleSet, TextRun};

/// One stretch of text with uniform styling and link target.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub styles: StyleSet,
    pub link: Option<String>,
}

impl Segment {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Flatten inline content into segments, one per (run, link) combination.
pub fn flatten(content: &[Inline]) -> Vec<Segment> {
    let mut segments = Vec::new();
    for inline in content {
        match inline {
            Inline::Run(run) => segments.push(Segment {
                text: run.text.clone(),
                styles: run.styles,
                link: None,
            }),
            Inline::Link { href, runs } => {
                for run in runs {
                    segments.push(Segment {
                        text: run.text.clone(),
                        styles: run.styles,
                        link: Some(href.clone()),
                    });
                }
            }
        }
    }
    segments
}

/// Rebuild the inline tree from segments. Empty segments are dropped and
/// adjacent segments with the same attributes are merged; consecutive
/// segments sharing a link target collapse into one link node.
pub fn rebuild(segments: Vec<Segment>) -> Vec<Inline> {
    let mut content: Vec<Inline> = Vec::new();
    for segment in segments {
        if segment.text.is_empty() {
            continue;
        }
        match (&segment.link, content.last_mut()) {
            (Some(href), Some(Inline::Link { href: last, runs })) if href == last => {
                match runs.last_mut() {
                    Some(run) if run.styles == segment.styles => run.text.push_str(&segment.text),
                    _ => runs.push(TextRun::styled(segment.text, segment.styles)),
                }
            }
            (Some(href), _) => content.push(Inline::Link {
                href: href.clone(),
                runs: vec![TextRun::styled(segment.text, segment.styles)],
            }),
            (None, Some(Inline::Run(run))) if run.styles == segment.styles => {
                run.text.push_str(&segment.text);
            }
            (None, _) => content.push(Inline::Run(TextRun::styled(segment.text, segment.styles))),
        }
    }
    content
}

/// Split segments so that `start` and `end` (character offsets over the
/// whole sequence) both fall on segment boundaries, then apply `f` to
/// every segment inside the range.
pub fn map_range(
    segments: Vec<Segment>,
    start: usize,
    end: usize,
    mut f: impl FnMut(&mut Segment),
) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut cursor = 0;
    for segment in segments {
        let len = segment.char_len();
        let seg_start = cursor;
        let seg_end = cursor + len;
        cursor = seg_end;

        if seg_end <= start || seg_start >= end {
            result.push(segment);
            continue;
        }

        // Overlap: split into before / inside / after
        let cut_from = start.saturating_sub(seg_start).min(len);
        let cut_to = (end - seg_start).min(len);
        let chars: Vec<char> = segment.text.chars().collect();

        if cut_from > 0 {
            result.push(Segment {
                text: chars[..cut_from].iter().collect(),
                ..segment.clone()
            });
        }
        let mut inside = Segment {
            text: chars[cut_from..cut_to].iter().collect(),
            ..segment.clone()
        };
        f(&mut inside);
        result.push(inside);
        if cut_to < len {
            result.push(Segment {
                text: chars[cut_to..].iter().collect(),
                ..segment
            });
        }
    }
    result
}

/// True when every character in the range satisfies the predicate. An
/// empty range reports false.
pub fn range_all(
    segments: &[Segment],
    start: usize,
    end: usize,
    pred: impl Fn(&Segment) -> bool,
) -> bool {
    if start >= end {
        return false;
    }
    let mut cursor = 0;
    let mut covered = false;
    for segment in segments {
        let len = segment.char_len();
        let seg_start = cursor;
        let seg_end = cursor + len;
        cursor = seg_end;
        if seg_end <= start || seg_start >= end {
            continue;
        }
        covered = true;
        if !pred(segment) {
            return false;
        }
    }
    covered
}

/// Remove the character range, returning the remaining segments.
pub fn delete_range(segments: Vec<Segment>, start: usize, end: usize) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut cursor = 0;
    for segment in segments {
        let len = segment.char_len();
        let seg_start = cursor;
        let seg_end = cursor + len;
        cursor = seg_end;

        if seg_end <= start || seg_start >= end {
            result.push(segment);
            continue;
        }
        let chars: Vec<char> = segment.text.chars().collect();
        let cut_from = start.saturating_sub(seg_start).min(len);
        let cut_to = (end - seg_start).min(len);
        if cut_from > 0 {
            result.push(Segment {
                text: chars[..cut_from].iter().collect(),
                ..segment.clone()
            });
        }
        if cut_to < len {
            result.push(Segment {
                text: chars[cut_to..].iter().collect(),
                ..segment
            });
        }
    }
    result
}

/// Insert a segment at the character offset, splitting as needed.
pub fn insert_at(segments: Vec<Segment>, offset: usize, inserted: Segment) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut cursor = 0;
    let mut placed = false;
    for segment in segments {
        let len = segment.char_len();
        let seg_start = cursor;
        let seg_end = cursor + len;
        cursor = seg_end;

        if !placed && offset <= seg_start {
            result.push(inserted.clone());
            placed = true;
        }
        if !placed && offset > seg_start && offset < seg_end {
            let chars: Vec<char> = segment.text.chars().collect();
            let cut = offset - seg_start;
            result.push(Segment {
                text: chars[..cut].iter().collect(),
                ..segment.clone()
            });
            result.push(inserted.clone());
            placed = true;
            result.push(Segment {
                text: chars[cut..].iter().collect(),
                ..segment
            });
            continue;
        }
        result.push(segment);
    }
    if !placed {
        result.push(inserted);
    }
    result
}
