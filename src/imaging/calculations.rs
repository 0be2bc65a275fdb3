//! Pure calculation functions for conversion geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Scaled dimensions use `f64::round` (half away from zero); centering
//! offsets use integer division (floor for non-negative values).

use super::params::{Fit, Resize};

/// Scale percent bounds for [`Resize::Scale`].
const MIN_SCALE_PERCENT: f64 = 1.0;
const MAX_SCALE_PERCENT: f64 = 1000.0;

/// A single composite draw: a source sub-rectangle onto a destination
/// sub-rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRect {
    pub sx: u32,
    pub sy: u32,
    pub sw: u32,
    pub sh: u32,
    pub dx: u32,
    pub dy: u32,
    pub dw: u32,
    pub dh: u32,
}

impl DrawRect {
    /// Identity draw of a `width` x `height` source at the origin.
    pub fn identity(width: u32, height: u32) -> Self {
        Self::new((0, 0, width, height), (0, 0, width, height))
    }

    fn new(src: (u32, u32, u32, u32), dst: (u32, u32, u32, u32)) -> Self {
        Self {
            sx: src.0,
            sy: src.1,
            sw: src.2,
            sh: src.3,
            dx: dst.0,
            dy: dst.1,
            dw: dst.2,
            dh: dst.3,
        }
    }

    /// True when either rectangle has no area, so drawing it is a no-op.
    pub fn is_empty(&self) -> bool {
        self.sw == 0 || self.sh == 0 || self.dw == 0 || self.dh == 0
    }
}

fn scaled(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

/// Resolve target dimensions from the source size and resize mode.
///
/// Never fails and never returns a zero dimension: out-of-range inputs are
/// clamped rather than rejected.
///
/// # Examples
/// ```
/// # use reframe::imaging::{Resize, resolve_dimensions};
/// // 5000% is clamped to 1000%
/// assert_eq!(resolve_dimensions((100, 100), &Resize::Scale { percent: 5000.0 }), (1000, 1000));
///
/// // Width only: height follows the source aspect ratio
/// let resize = Resize::Pixels { width: Some(150), height: None };
/// assert_eq!(resolve_dimensions((200, 100), &resize), (150, 75));
/// ```
pub fn resolve_dimensions(source: (u32, u32), resize: &Resize) -> (u32, u32) {
    let (src_w, src_h) = source;

    match *resize {
        Resize::None => source,
        Resize::Scale { percent } => {
            let percent = if percent.is_nan() {
                MIN_SCALE_PERCENT
            } else {
                percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT)
            };
            let w = scaled(src_w as f64 * percent / 100.0).max(1);
            let h = scaled(src_h as f64 * percent / 100.0).max(1);
            (w, h)
        }
        Resize::Pixels { width, height } => {
            let aspect = src_w as f64 / src_h as f64;
            match (width.filter(|&w| w > 0), height.filter(|&h| h > 0)) {
                (Some(w), Some(h)) => (w, h),
                // Width given: height follows the source aspect ratio
                (Some(w), None) => (w, scaled(w as f64 / aspect).max(1)),
                // Height given: width follows the source aspect ratio
                (None, Some(h)) => (scaled(h as f64 * aspect).max(1), h),
                (None, None) => source,
            }
        }
    }
}

/// Compute the draw rectangle for compositing `source` onto a `target` canvas.
///
/// A zero target dimension yields an identity draw at source resolution.
/// [`Fit::Keep`] with a target that differs from the source is drawn as
/// [`Fit::Stretch`].
pub fn calculate_draw_rect(source: (u32, u32), target: (u32, u32), fit: Fit) -> DrawRect {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if tgt_w == 0 || tgt_h == 0 {
        return DrawRect::identity(src_w, src_h);
    }

    let fit = match fit {
        Fit::Keep if source != target => Fit::Stretch,
        other => other,
    };

    let full_source = (0, 0, src_w, src_h);
    let full_target = (0, 0, tgt_w, tgt_h);

    let src_aspect = src_w as f64 / src_h as f64;
    let dst_aspect = tgt_w as f64 / tgt_h as f64;

    match fit {
        Fit::Keep => DrawRect::identity(src_w, src_h),
        Fit::Stretch => DrawRect::new(full_source, full_target),
        Fit::Contain => {
            let (dw, dh) = if src_aspect > dst_aspect {
                // Source is wider: width matches, bars above and below
                (tgt_w, scaled(tgt_w as f64 / src_aspect))
            } else {
                // Source is taller: height matches, bars left and right
                (scaled(tgt_h as f64 * src_aspect), tgt_h)
            };
            let dx = tgt_w.saturating_sub(dw) / 2;
            let dy = tgt_h.saturating_sub(dh) / 2;
            DrawRect::new(full_source, (dx, dy, dw, dh))
        }
        Fit::Cover => {
            let (sw, sh) = if src_aspect > dst_aspect {
                // Source is wider: crop the sides
                (scaled(src_h as f64 * dst_aspect), src_h)
            } else {
                // Source is taller: crop top and bottom
                (src_w, scaled(src_w as f64 / dst_aspect))
            };
            let sx = src_w.saturating_sub(sw) / 2;
            let sy = src_h.saturating_sub(sh) / 2;
            DrawRect::new((sx, sy, sw, sh), full_target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels(width: Option<u32>, height: Option<u32>) -> Resize {
        Resize::Pixels { width, height }
    }

    // =========================================================================
    // resolve_dimensions tests
    // =========================================================================

    #[test]
    fn none_keeps_source() {
        assert_eq!(resolve_dimensions((640, 480), &Resize::None), (640, 480));
    }

    #[test]
    fn scale_halves() {
        let resize = Resize::Scale { percent: 50.0 };
        assert_eq!(resolve_dimensions((640, 480), &resize), (320, 240));
    }

    #[test]
    fn scale_clamps_above_1000_percent() {
        let resize = Resize::Scale { percent: 5000.0 };
        assert_eq!(resolve_dimensions((100, 100), &resize), (1000, 1000));
    }

    #[test]
    fn scale_clamps_below_1_percent() {
        let resize = Resize::Scale { percent: 0.5 };
        assert_eq!(resolve_dimensions((100, 100), &resize), (1, 1));
    }

    #[test]
    fn scale_never_yields_zero() {
        // 1% of 10 rounds to 0 and is floored at 1
        let resize = Resize::Scale { percent: 1.0 };
        assert_eq!(resolve_dimensions((10, 30), &resize), (1, 1));
    }

    #[test]
    fn scale_rounds_half_away_from_zero() {
        // 15 * 0.5 = 7.5 → 8
        let resize = Resize::Scale { percent: 50.0 };
        assert_eq!(resolve_dimensions((15, 15), &resize), (8, 8));
    }

    #[test]
    fn pixels_both_sides_exact() {
        assert_eq!(
            resolve_dimensions((640, 480), &pixels(Some(100), Some(300))),
            (100, 300)
        );
    }

    #[test]
    fn pixels_width_only_square() {
        assert_eq!(
            resolve_dimensions((100, 100), &pixels(Some(200), None)),
            (200, 200)
        );
    }

    #[test]
    fn pixels_width_only_landscape() {
        assert_eq!(
            resolve_dimensions((200, 100), &pixels(Some(150), None)),
            (150, 75)
        );
    }

    #[test]
    fn pixels_height_only_landscape() {
        assert_eq!(
            resolve_dimensions((200, 100), &pixels(None, Some(50))),
            (100, 50)
        );
    }

    #[test]
    fn pixels_zero_side_counts_as_missing() {
        assert_eq!(
            resolve_dimensions((200, 100), &pixels(Some(150), Some(0))),
            (150, 75)
        );
    }

    #[test]
    fn pixels_neither_side_keeps_source() {
        assert_eq!(resolve_dimensions((640, 480), &pixels(None, None)), (640, 480));
    }

    #[test]
    fn pixels_extreme_aspect_floors_at_one() {
        assert_eq!(
            resolve_dimensions((10_000, 1), &pixels(Some(10), None)),
            (10, 1)
        );
    }

    // =========================================================================
    // calculate_draw_rect tests
    // =========================================================================

    #[test]
    fn zero_target_is_identity() {
        let rect = calculate_draw_rect((300, 200), (0, 100), Fit::Contain);
        assert_eq!(rect, DrawRect::identity(300, 200));
    }

    #[test]
    fn keep_same_size_is_identity() {
        let rect = calculate_draw_rect((300, 200), (300, 200), Fit::Keep);
        assert_eq!(rect, DrawRect::identity(300, 200));
    }

    #[test]
    fn keep_with_resize_degrades_to_stretch() {
        let keep = calculate_draw_rect((300, 200), (100, 100), Fit::Keep);
        let stretch = calculate_draw_rect((300, 200), (100, 100), Fit::Stretch);
        assert_eq!(keep, stretch);
    }

    #[test]
    fn stretch_maps_full_source_to_full_target() {
        let rect = calculate_draw_rect((300, 200), (50, 400), Fit::Stretch);
        assert_eq!(rect, DrawRect::new((0, 0, 300, 200), (0, 0, 50, 400)));
    }

    #[test]
    fn contain_wide_source_letterboxes_vertically() {
        // 400x200 (2:1) into 100x100: 100x50 box at y=25
        let rect = calculate_draw_rect((400, 200), (100, 100), Fit::Contain);
        assert_eq!(rect, DrawRect::new((0, 0, 400, 200), (0, 25, 100, 50)));
    }

    #[test]
    fn contain_tall_source_letterboxes_horizontally() {
        // 200x400 (1:2) into 100x100: 50x100 box at x=25
        let rect = calculate_draw_rect((200, 400), (100, 100), Fit::Contain);
        assert_eq!(rect, DrawRect::new((0, 0, 200, 400), (25, 0, 50, 100)));
    }

    #[test]
    fn contain_floors_odd_offsets() {
        // 300x200 (1.5) into 101x101: dh = round(101 / 1.5) = 67, dy = floor(34 / 2) = 17
        let rect = calculate_draw_rect((300, 200), (101, 101), Fit::Contain);
        assert_eq!(rect, DrawRect::new((0, 0, 300, 200), (0, 17, 101, 67)));
    }

    #[test]
    fn contain_equal_aspect_fills_target() {
        let rect = calculate_draw_rect((800, 600), (400, 300), Fit::Contain);
        assert_eq!(rect, DrawRect::new((0, 0, 800, 600), (0, 0, 400, 300)));
    }

    #[test]
    fn contain_never_crops() {
        for &(source, target) in &[
            ((1920, 1080), (500, 500)),
            ((1080, 1920), (500, 300)),
            ((7, 3), (1000, 13)),
            ((1, 1), (3, 7)),
        ] {
            let rect = calculate_draw_rect(source, target, Fit::Contain);
            assert_eq!((rect.sx, rect.sy, rect.sw, rect.sh), (0, 0, source.0, source.1));
            assert!(rect.dx + rect.dw <= target.0, "{source:?} → {target:?}: {rect:?}");
            assert!(rect.dy + rect.dh <= target.1, "{source:?} → {target:?}: {rect:?}");
        }
    }

    #[test]
    fn cover_wide_source_crops_sides() {
        // 400x200 into 100x100: crop to 200x200 at x=100
        let rect = calculate_draw_rect((400, 200), (100, 100), Fit::Cover);
        assert_eq!(rect, DrawRect::new((100, 0, 200, 200), (0, 0, 100, 100)));
    }

    #[test]
    fn cover_tall_source_crops_top_and_bottom() {
        // 200x400 into 100x100: crop to 200x200 at y=100
        let rect = calculate_draw_rect((200, 400), (100, 100), Fit::Cover);
        assert_eq!(rect, DrawRect::new((0, 100, 200, 200), (0, 0, 100, 100)));
    }

    #[test]
    fn cover_floors_odd_offsets() {
        // 301x100 into 100x100: sw = 100, sx = floor(201 / 2) = 100
        let rect = calculate_draw_rect((301, 100), (100, 100), Fit::Cover);
        assert_eq!(rect, DrawRect::new((100, 0, 100, 100), (0, 0, 100, 100)));
    }

    #[test]
    fn cover_never_letterboxes() {
        for &(source, target) in &[
            ((1920, 1080), (500, 500)),
            ((1080, 1920), (500, 300)),
            ((7, 3), (1000, 13)),
            ((1, 1), (3, 7)),
        ] {
            let rect = calculate_draw_rect(source, target, Fit::Cover);
            assert_eq!((rect.dx, rect.dy, rect.dw, rect.dh), (0, 0, target.0, target.1));
            assert!(rect.sx + rect.sw <= source.0, "{source:?} → {target:?}: {rect:?}");
            assert!(rect.sy + rect.sh <= source.1, "{source:?} → {target:?}: {rect:?}");
        }
    }

    #[test]
    fn empty_rect_detection() {
        assert!(DrawRect::identity(0, 10).is_empty());
        assert!(!DrawRect::identity(1, 1).is_empty());
    }
}
