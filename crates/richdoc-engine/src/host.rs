//! Host capability traits.
//!
//! The engine never reaches for ambient globals. Everything it needs from
//! the embedding surface (selection geometry, navigation, focus, media
//! upload) comes in through these traits, which also makes the editor
//! fully testable without a rendering surface.

use crate::error::MediaError;
use crate::selection::Rect;

/// What the embedding surface provides to the engine.
pub trait HostEnvironment {
    /// Screen rect of the current selection, when the host can measure
    /// one. `None` for collapsed or unmeasurable selections.
    fn selection_rect(&self) -> Option<Rect>;

    /// Bounding box of the editing surface, in the same coordinate space
    /// as [`selection_rect`](Self::selection_rect).
    fn editor_bounds(&self) -> Rect;

    /// Navigate to a URL in a new browsing context.
    fn open_url(&self, url: &str);

    /// Return keyboard focus to the editing surface.
    fn focus(&self);
}

/// Host-provided media pipeline: turns raw bytes into a hosted URL the
/// document can reference.
pub trait MediaCollaborator {
    fn upload(&self, filename: &str, bytes: &[u8]) -> Result<String, MediaError>;
}

/// Host that provides no geometry and swallows navigation. Used when the
/// editor runs headless and as the default in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl HostEnvironment for NullHost {
    fn selection_rect(&self) -> Option<Rect> {
        None
    }

    fn editor_bounds(&self) -> Rect {
        Rect::default()
    }

    fn open_url(&self, _url: &str) {}

    fn focus(&self) {}
}
