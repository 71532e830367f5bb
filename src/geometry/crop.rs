use crate::foundation::core::{Affine, Fps, PixelSize, Point, Rect, Size};
use crate::foundation::error::{ReframeError, ReframeResult};

/// Output aspect ratio policy: landscape 16:9.
pub const TARGET_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Fixed render target size (HD, 16:9).
pub const RENDER_SIZE: PixelSize = PixelSize {
    width: 1920,
    height: 1080,
};

/// Fixed output frame cadence. Source frames are resampled to this rate by
/// the renderer regardless of the source frame rate.
pub const OUTPUT_FPS: Fps = Fps { num: 30, den: 1 };

/// x264 preset for the highest-quality output policy.
pub const X264_PRESET: &str = "slow";

/// x264 constant rate factor for the highest-quality output policy.
pub const X264_CRF: u32 = 18;

/// Crop rectangle and output transform satisfying the 16:9 policy.
///
/// The crop rectangle lives in *oriented* space: the source frame after the
/// preferred transform has been applied and its bounding box translated back
/// to the origin, so the frame occupies `[0, actual_size.width] x
/// [0, actual_size.height]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropGeometry {
    /// Crop rectangle origin in oriented space.
    pub crop_origin: Point,
    /// Crop rectangle size; aspect ratio is exactly 16:9 by construction.
    pub crop_size: Size,
    /// Orientation-corrected presentation size of the source frame.
    pub actual_size: Size,
    /// Fixed output render size.
    pub render_size: PixelSize,
    /// Preferred transform with the bounding-box normalization folded in;
    /// maps natural-space points into oriented space.
    pub oriented_transform: Affine,
    /// Combined transform: uniform scale after translating the crop origin
    /// to zero, composed onto [`CropGeometry::oriented_transform`]. Maps
    /// natural-space points onto the render target.
    pub transform: Affine,
}

impl CropGeometry {
    /// Crop rectangle in oriented space.
    pub fn crop_rect(&self) -> Rect {
        Rect::from_origin_size(self.crop_origin, self.crop_size)
    }

    /// Crop rectangle snapped to whole pixels, clamped inside the oriented
    /// frame. Returned as `(width, height, x, y)` in encoder argument order.
    pub fn pixel_crop(&self) -> (u32, u32, u32, u32) {
        let frame_w = self.actual_size.width.floor().max(1.0);
        let frame_h = self.actual_size.height.floor().max(1.0);
        let w = self.crop_size.width.round().clamp(1.0, frame_w);
        let h = self.crop_size.height.round().clamp(1.0, frame_h);
        let x = self.crop_origin.x.round().clamp(0.0, frame_w - w);
        let y = self.crop_origin.y.round().clamp(0.0, frame_h - h);
        (w as u32, h as u32, x as u32, y as u32)
    }
}

/// Compute the centered 16:9 crop and output transform for a source frame.
///
/// The crop is bound by the limiting dimension and centered on the other:
/// `crop_width = min(actual_width, actual_height * 16/9)`, height derived
/// from the fixed aspect ratio. The result is maximal (no artificial
/// downscale) while staying fully inside the oriented frame.
///
/// Fails with [`ReframeError::InvalidFrameGeometry`] when the source
/// dimensions or transform yield a degenerate (zero-area) crop.
pub fn compute_crop_geometry(
    natural_size: Size,
    preferred_transform: Affine,
) -> ReframeResult<CropGeometry> {
    if !natural_size.width.is_finite() || !natural_size.height.is_finite() {
        return Err(ReframeError::invalid_frame_geometry(
            "source natural size must be finite",
        ));
    }
    if natural_size.width <= 0.0 || natural_size.height <= 0.0 {
        return Err(ReframeError::invalid_frame_geometry(format!(
            "source natural size {}x{} has no area",
            natural_size.width, natural_size.height
        )));
    }

    let frame = Rect::from_origin_size(Point::ORIGIN, natural_size);
    let mapped = preferred_transform.transform_rect_bbox(frame);
    let actual_w = mapped.width();
    let actual_h = mapped.height();
    if !actual_w.is_finite() || !actual_h.is_finite() || actual_w <= 0.0 || actual_h <= 0.0 {
        return Err(ReframeError::invalid_frame_geometry(format!(
            "preferred transform collapses the frame to {actual_w}x{actual_h}"
        )));
    }

    // Fold the bounding-box normalization into the transform so oriented
    // space starts at the origin.
    let oriented = Affine::translate((-mapped.x0, -mapped.y0)) * preferred_transform;

    let crop_w = actual_w.min(actual_h * TARGET_ASPECT_RATIO);
    let crop_h = crop_w / TARGET_ASPECT_RATIO;
    if crop_w <= 0.0 || crop_h <= 0.0 {
        return Err(ReframeError::invalid_frame_geometry(
            "computed crop rectangle has no area",
        ));
    }

    let crop_x = (actual_w - crop_w) / 2.0;
    let crop_y = (actual_h - crop_h) / 2.0;

    let scale = (f64::from(RENDER_SIZE.width) / crop_w).min(f64::from(RENDER_SIZE.height) / crop_h);
    let transform = Affine::scale(scale) * Affine::translate((-crop_x, -crop_y)) * oriented;

    Ok(CropGeometry {
        crop_origin: Point::new(crop_x, crop_y),
        crop_size: Size::new(crop_w, crop_h),
        actual_size: Size::new(actual_w, actual_h),
        render_size: RENDER_SIZE,
        oriented_transform: oriented,
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{a} !~ {b}");
    }

    #[test]
    fn portrait_identity_matches_expected_slice() {
        let g = compute_crop_geometry(Size::new(1080.0, 1920.0), Affine::IDENTITY).unwrap();
        assert_close(g.actual_size.width, 1080.0);
        assert_close(g.actual_size.height, 1920.0);
        assert_close(g.crop_size.width, 1080.0);
        assert_close(g.crop_size.height, 607.5);
        assert_close(g.crop_origin.x, 0.0);
        assert_close(g.crop_origin.y, 656.25);
    }

    #[test]
    fn crop_aspect_is_exactly_target() {
        for (w, h) in [(1080.0, 1920.0), (640.0, 480.0), (4000.0, 1000.0)] {
            let g = compute_crop_geometry(Size::new(w, h), Affine::IDENTITY).unwrap();
            assert_close(g.crop_size.width / g.crop_size.height, TARGET_ASPECT_RATIO);
        }
    }

    #[test]
    fn crop_stays_inside_oriented_frame() {
        let g = compute_crop_geometry(Size::new(1080.0, 1920.0), Affine::IDENTITY).unwrap();
        let crop = g.crop_rect();
        assert!(crop.x0 >= -EPS && crop.y0 >= -EPS);
        assert!(crop.x1 <= g.actual_size.width + EPS);
        assert!(crop.y1 <= g.actual_size.height + EPS);
    }

    #[test]
    fn width_bound_source_pins_x_to_zero() {
        // Tall frame: the width is the limiting dimension.
        let g = compute_crop_geometry(Size::new(720.0, 4000.0), Affine::IDENTITY).unwrap();
        assert_close(g.crop_size.width, 720.0);
        assert_close(g.crop_origin.x, 0.0);
        assert!(g.crop_origin.y > 0.0);
    }

    #[test]
    fn height_bound_source_pins_y_to_zero() {
        // Ultra-wide frame: the height is the limiting dimension.
        let g = compute_crop_geometry(Size::new(4000.0, 1000.0), Affine::IDENTITY).unwrap();
        assert_close(g.crop_size.height, 1000.0);
        assert_close(g.crop_origin.y, 0.0);
        assert!(g.crop_origin.x > 0.0);
    }

    #[test]
    fn exact_16_9_source_crops_the_full_frame() {
        let g = compute_crop_geometry(Size::new(1920.0, 1080.0), Affine::IDENTITY).unwrap();
        assert_close(g.crop_origin.x, 0.0);
        assert_close(g.crop_origin.y, 0.0);
        assert_close(g.crop_size.width, 1920.0);
        assert_close(g.crop_size.height, 1080.0);
    }

    #[test]
    fn quarter_turn_swaps_presentation_dimensions() {
        // A landscape recording carrying the 90-degree correction a portrait
        // capture writes: presentation becomes 1080x1920.
        let rot = Affine::rotate(std::f64::consts::FRAC_PI_2);
        let g = compute_crop_geometry(Size::new(1920.0, 1080.0), rot).unwrap();
        assert_close(g.actual_size.width, 1080.0);
        assert_close(g.actual_size.height, 1920.0);
        assert_close(g.crop_size.width, 1080.0);
        assert_close(g.crop_size.height, 607.5);
    }

    #[test]
    fn combined_transform_maps_crop_corners_onto_render_target() {
        let g = compute_crop_geometry(Size::new(1080.0, 1920.0), Affine::IDENTITY).unwrap();
        let crop = g.crop_rect();
        let inv = g.oriented_transform.inverse();
        let corners = [
            Point::new(crop.x0, crop.y0),
            Point::new(crop.x1, crop.y0),
            Point::new(crop.x1, crop.y1),
            Point::new(crop.x0, crop.y1),
        ];
        let mapped: Vec<Point> = corners.iter().map(|&c| g.transform * (inv * c)).collect();
        assert_close(mapped[0].x, 0.0);
        assert_close(mapped[0].y, 0.0);
        assert_close(mapped[2].x, f64::from(RENDER_SIZE.width));
        assert_close(mapped[2].y, f64::from(RENDER_SIZE.height));
    }

    #[test]
    fn geometry_is_deterministic() {
        let size = Size::new(1080.0, 1920.0);
        let rot = Affine::rotate(std::f64::consts::FRAC_PI_2);
        let a = compute_crop_geometry(size, rot).unwrap();
        let b = compute_crop_geometry(size, rot).unwrap();
        assert_eq!(a.transform.as_coeffs(), b.transform.as_coeffs());
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let err = compute_crop_geometry(Size::new(0.0, 1920.0), Affine::IDENTITY).unwrap_err();
        assert!(matches!(
            err,
            crate::foundation::error::ReframeError::InvalidFrameGeometry(_)
        ));

        let err =
            compute_crop_geometry(Size::new(1080.0, 1920.0), Affine::scale(0.0)).unwrap_err();
        assert!(matches!(
            err,
            crate::foundation::error::ReframeError::InvalidFrameGeometry(_)
        ));
    }

    #[test]
    fn pixel_crop_rounds_and_stays_in_bounds() {
        let g = compute_crop_geometry(Size::new(1080.0, 1920.0), Affine::IDENTITY).unwrap();
        let (w, h, x, y) = g.pixel_crop();
        assert_eq!((w, h, x), (1080, 608, 0));
        assert_eq!(y, 656);
        assert!(x + w <= 1080);
        assert!(y + h <= 1920);
    }
}
