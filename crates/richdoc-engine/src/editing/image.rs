//! Interactive image resize geometry.
//!
//! A drag captures the image's dimensions and aspect ratio once at the
//! start, then every pointer move maps the cumulative delta to new
//! dimensions. Edge handles move a single axis; corner handles preserve
//! the captured aspect ratio, letting whichever axis moved further drive.

/// The eight resize handles around a selected image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomRight | Self::BottomLeft
        )
    }

    /// Sign applied to the horizontal delta: dragging a left-side handle
    /// outward means a negative dx grows the image.
    fn dx_sign(self) -> f64 {
        match self {
            Self::TopLeft | Self::Left | Self::BottomLeft => -1.0,
            Self::Top | Self::Bottom => 0.0,
            _ => 1.0,
        }
    }

    fn dy_sign(self) -> f64 {
        match self {
            Self::TopLeft | Self::Top | Self::TopRight => -1.0,
            Self::Left | Self::Right => 0.0,
            _ => 1.0,
        }
    }
}

/// Bounds applied to every computed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeConstraints {
    pub min_width: f64,
    pub min_height: f64,
    /// Width of the editing surface, when known. Corners rescale height
    /// to keep the ratio after a max-width clamp; edges just clamp.
    pub max_width: Option<f64>,
}

impl Default for ResizeConstraints {
    fn default() -> Self {
        Self {
            min_width: 50.0,
            min_height: 50.0,
            max_width: None,
        }
    }
}

/// Dimensions and ratio captured when a drag begins. The ratio is fixed
/// for the whole drag even though intermediate sizes drift from it after
/// clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub start_width: f64,
    pub start_height: f64,
    pub aspect: f64,
}

impl DragState {
    pub fn begin(width: f64, height: f64) -> Self {
        let aspect = if height > 0.0 && width.is_finite() && height.is_finite() {
            width / height
        } else {
            1.0
        };
        Self {
            start_width: width.max(0.0),
            start_height: height.max(0.0),
            aspect,
        }
    }
}

/// Map a cumulative pointer delta to new image dimensions.
pub fn resize_dimensions(
    drag: DragState,
    handle: ResizeHandle,
    dx: f64,
    dy: f64,
    constraints: &ResizeConstraints,
) -> (f64, f64) {
    let dx = if dx.is_finite() { dx } else { 0.0 };
    let dy = if dy.is_finite() { dy } else { 0.0 };
    let sx = dx * handle.dx_sign();
    let sy = dy * handle.dy_sign();

    let (mut width, mut height) = if handle.is_corner() {
        // Whichever axis the pointer moved further on drives; the other
        // follows the captured ratio
        if sx.abs() >= sy.abs() {
            let w = drag.start_width + sx;
            (w, w / drag.aspect)
        } else {
            let h = drag.start_height + sy;
            (h * drag.aspect, h)
        }
    } else {
        (drag.start_width + sx, drag.start_height + sy)
    };

    width = width.max(constraints.min_width);
    height = height.max(constraints.min_height);

    if let Some(max_width) = constraints.max_width
        && width > max_width
    {
        width = max_width;
        if handle.is_corner() {
            height = (width / drag.aspect).max(constraints.min_height);
        }
    }

    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn drag_200x100() -> DragState {
        DragState::begin(200.0, 100.0)
    }

    #[rstest]
    #[case(ResizeHandle::Right, 50.0, 999.0, 250.0, 100.0)]
    #[case(ResizeHandle::Left, -50.0, 0.0, 250.0, 100.0)]
    #[case(ResizeHandle::Bottom, 999.0, 30.0, 200.0, 130.0)]
    #[case(ResizeHandle::Top, 0.0, -30.0, 200.0, 130.0)]
    fn edge_handles_move_one_axis_only(
        #[case] handle: ResizeHandle,
        #[case] dx: f64,
        #[case] dy: f64,
        #[case] want_w: f64,
        #[case] want_h: f64,
    ) {
        let (w, h) = resize_dimensions(
            drag_200x100(),
            handle,
            dx,
            dy,
            &ResizeConstraints::default(),
        );
        assert_eq!((w, h), (want_w, want_h));
    }

    #[rstest]
    #[case(ResizeHandle::BottomRight, 40.0, 10.0, 240.0, 120.0)]
    #[case(ResizeHandle::BottomRight, 10.0, 40.0, 280.0, 140.0)]
    #[case(ResizeHandle::TopLeft, -40.0, -10.0, 240.0, 120.0)]
    #[case(ResizeHandle::TopRight, 40.0, 10.0, 240.0, 120.0)]
    #[case(ResizeHandle::BottomLeft, -40.0, 10.0, 240.0, 120.0)]
    fn corner_handles_preserve_aspect_with_dominant_axis(
        #[case] handle: ResizeHandle,
        #[case] dx: f64,
        #[case] dy: f64,
        #[case] want_w: f64,
        #[case] want_h: f64,
    ) {
        let (w, h) = resize_dimensions(
            drag_200x100(),
            handle,
            dx,
            dy,
            &ResizeConstraints::default(),
        );
        assert_eq!((w, h), (want_w, want_h));
    }

    #[test]
    fn shrinking_clamps_to_minimum() {
        let (w, h) = resize_dimensions(
            drag_200x100(),
            ResizeHandle::Right,
            -500.0,
            0.0,
            &ResizeConstraints::default(),
        );
        assert_eq!(w, 50.0);
        assert_eq!(h, 100.0);
    }

    #[test]
    fn corner_shrink_clamps_both_axes_to_minimum() {
        let (w, h) = resize_dimensions(
            drag_200x100(),
            ResizeHandle::BottomRight,
            -500.0,
            -10.0,
            &ResizeConstraints::default(),
        );
        assert_eq!(w, 50.0);
        assert_eq!(h, 50.0);
    }

    #[test]
    fn max_width_clamps_and_rescales_corner_height() {
        let constraints = ResizeConstraints {
            max_width: Some(300.0),
            ..ResizeConstraints::default()
        };
        let (w, h) = resize_dimensions(
            drag_200x100(),
            ResizeHandle::BottomRight,
            500.0,
            0.0,
            &constraints,
        );
        assert_eq!(w, 300.0);
        assert_eq!(h, 150.0);
    }

    #[test]
    fn max_width_on_edge_handle_leaves_height_alone() {
        let constraints = ResizeConstraints {
            max_width: Some(300.0),
            ..ResizeConstraints::default()
        };
        let (w, h) = resize_dimensions(
            drag_200x100(),
            ResizeHandle::Right,
            500.0,
            0.0,
            &constraints,
        );
        assert_eq!(w, 300.0);
        assert_eq!(h, 100.0);
    }

    #[test]
    fn degenerate_start_height_falls_back_to_square_aspect() {
        let drag = DragState::begin(120.0, 0.0);
        assert_eq!(drag.aspect, 1.0);
        let (w, h) = resize_dimensions(
            drag,
            ResizeHandle::BottomRight,
            30.0,
            0.0,
            &ResizeConstraints::default(),
        );
        assert_eq!(w, 150.0);
        assert_eq!(h, 150.0);
    }

    #[test]
    fn non_finite_deltas_are_ignored() {
        let (w, h) = resize_dimensions(
            drag_200x100(),
            ResizeHandle::Right,
            f64::NAN,
            f64::INFINITY,
            &ResizeConstraints::default(),
        );
        assert_eq!((w, h), (200.0, 100.0));
    }
}
