//! Pan clamping and crop-region math.
//!
//! Everything here is pure and total: any finite input yields a valid offset
//! or region. Display sizes are in on-screen pixels; crop regions are in
//! source (natural) pixels.

use serde::{Deserialize, Serialize};

/// Width and height, in whatever unit the caller is working in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a decoded image, as floats.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}

/// A pointer position in on-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How far the image is translated inside its container, in on-screen pixels.
///
/// Both components are always `<= 0`: the image only ever moves left or up
/// from its resting top-left position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    pub const ZERO: PanOffset = PanOffset { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// CSS transform for the preview element.
    pub fn css_transform(&self) -> String {
        format!("translate({}px, {}px)", self.x, self.y)
    }
}

/// The single axis along which panning is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragAxis {
    Horizontal,
    Vertical,
    #[default]
    None,
}

impl DragAxis {
    /// Landscape pans horizontally, portrait vertically, square not at all.
    pub fn from_natural(natural: Size) -> Self {
        if natural.width > natural.height {
            DragAxis::Horizontal
        } else if natural.height > natural.width {
            DragAxis::Vertical
        } else {
            DragAxis::None
        }
    }
}

impl std::fmt::Display for DragAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DragAxis::Horizontal => write!(f, "horizontal"),
            DragAxis::Vertical => write!(f, "vertical"),
            DragAxis::None => write!(f, "none"),
        }
    }
}

/// Rendered size of the preview image and of the clipping container.
///
/// Must be measured after layout settles: it depends on the final rendered
/// size, not the natural size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportGeometry {
    /// On-screen size of the image element
    pub image: Size,
    /// On-screen size of the clipping container
    pub container: Size,
}

/// Result of [`clamp_pan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamped {
    /// The valid offset
    pub offset: PanOffset,
    /// The free x component had to be pulled back into range
    pub clamped_x: bool,
    /// The free y component had to be pulled back into range
    pub clamped_y: bool,
}

/// Clamp a single free component into `[-(image - container), 0]`.
fn clamp_component(requested: f64, image: f64, container: f64) -> f64 {
    let min = -(image - container);
    // f64::max ignores a NaN operand, so a NaN request lands on a bound
    let value = requested.max(min).min(0.0);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Clamp a requested pan offset to what the image can actually show.
///
/// The locked axis is always 0. The free axis may never reveal space beyond
/// the image's own edge, and may never move right/down past its resting
/// position.
pub fn clamp_pan(
    requested: PanOffset,
    axis: DragAxis,
    image_display: Size,
    container: Size,
) -> Clamped {
    match axis {
        DragAxis::Horizontal => {
            let x = clamp_component(requested.x, image_display.width, container.width);
            Clamped {
                offset: PanOffset::new(x, 0.0),
                clamped_x: x != requested.x,
                clamped_y: false,
            }
        }
        DragAxis::Vertical => {
            let y = clamp_component(requested.y, image_display.height, container.height);
            Clamped {
                offset: PanOffset::new(0.0, y),
                clamped_x: false,
                clamped_y: y != requested.y,
            }
        }
        DragAxis::None => Clamped {
            offset: PanOffset::ZERO,
            clamped_x: false,
            clamped_y: false,
        },
    }
}

/// Source-pixel rectangle of the original image that ends up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer version of a [`CropRegion`], guaranteed inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Round to whole source pixels and clamp into `natural_width x natural_height`.
    ///
    /// A non-empty image always yields at least a 1x1 rectangle.
    pub fn to_pixel_rect(&self, natural_width: u32, natural_height: u32) -> PixelRect {
        let (x, width) = round_span(self.x, self.width, natural_width);
        let (y, height) = round_span(self.y, self.height, natural_height);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

fn round_span(origin: f64, length: f64, limit: u32) -> (u32, u32) {
    if limit == 0 {
        return (0, 0);
    }
    let limit_f = f64::from(limit);
    let start = if origin.is_finite() {
        origin.round().clamp(0.0, limit_f - 1.0)
    } else {
        0.0
    };
    let len = if length.is_finite() {
        length.round().clamp(1.0, limit_f - start)
    } else {
        limit_f - start
    };
    (start as u32, len as u32)
}

/// natural / display, or 0 when the display size is unusable.
fn axis_scale(natural: f64, display: f64) -> f64 {
    let scale = natural / display;
    if display > 0.0 && scale.is_finite() {
        scale
    } else {
        0.0
    }
}

/// Map the visible part of the preview back to source pixels.
///
/// `scale = natural / display` per axis, so non-uniform scaling is handled.
/// The crop covers the part of the container the image actually fills, so a
/// container larger than the image on one axis never reaches past the image.
pub fn compute_crop_region(
    pan: PanOffset,
    container: Size,
    natural: Size,
    display: Size,
) -> CropRegion {
    let scale_x = axis_scale(natural.width, display.width);
    let scale_y = axis_scale(natural.height, display.height);

    let visible_w = container.width.min(display.width).max(0.0);
    let visible_h = container.height.min(display.height).max(0.0);

    CropRegion {
        x: -pan.x * scale_x + 0.0,
        y: -pan.y * scale_y + 0.0,
        width: visible_w * scale_x,
        height: visible_h * scale_y,
    }
}

/// Display size of the preview image inside `container`.
///
/// Mirrors how the preview is styled: landscape images take the container's
/// height, portrait images take its width, square images cover it.
pub fn cover_layout(natural: Size, container: Size) -> ViewportGeometry {
    let image = if natural.width <= 0.0 || natural.height <= 0.0 {
        container
    } else {
        match DragAxis::from_natural(natural) {
            DragAxis::Horizontal => Size::new(
                natural.width * container.height / natural.height,
                container.height,
            ),
            DragAxis::Vertical => Size::new(
                container.width,
                natural.height * container.width / natural.width,
            ),
            DragAxis::None => {
                let side = container.width.max(container.height);
                Size::new(side, side)
            }
        }
    };
    ViewportGeometry { image, container }
}

/// Positions of the inner lines of the 3x3 alignment grid: (vertical, horizontal).
pub fn alignment_grid(container: Size) -> ([f64; 2], [f64; 2]) {
    let third_w = container.width / 3.0;
    let third_h = container.height / 3.0;
    (
        [third_w, 2.0 * third_w],
        [third_h, 2.0 * third_h],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const IMG: Size = Size::new(1137.0, 640.0);
    const CONT: Size = Size::new(640.0, 640.0);

    fn random_axis(rng: &mut StdRng) -> DragAxis {
        match rng.gen_range(0..3) {
            0 => DragAxis::Horizontal,
            1 => DragAxis::Vertical,
            _ => DragAxis::None,
        }
    }

    #[test]
    fn test_axis_from_natural() {
        assert_eq!(DragAxis::from_natural(Size::new(1920.0, 1080.0)), DragAxis::Horizontal);
        assert_eq!(DragAxis::from_natural(Size::new(1080.0, 1920.0)), DragAxis::Vertical);
        assert_eq!(DragAxis::from_natural(Size::new(800.0, 800.0)), DragAxis::None);
    }

    #[test]
    fn test_clamp_within_range_untouched() {
        let c = clamp_pan(PanOffset::new(-200.0, 35.0), DragAxis::Horizontal, IMG, CONT);
        assert_eq!(c.offset, PanOffset::new(-200.0, 0.0));
        assert!(!c.clamped_x);
    }

    #[test]
    fn test_clamp_pulls_back_both_edges() {
        let right = clamp_pan(PanOffset::new(50.0, 0.0), DragAxis::Horizontal, IMG, CONT);
        assert_eq!(right.offset.x, 0.0);
        assert!(right.clamped_x);

        let left = clamp_pan(PanOffset::new(-9000.0, 0.0), DragAxis::Horizontal, IMG, CONT);
        assert_eq!(left.offset.x, -(1137.0 - 640.0));
        assert!(left.clamped_x);
    }

    #[test]
    fn test_clamp_image_smaller_than_container_pins_zero() {
        let c = clamp_pan(
            PanOffset::new(0.0, -10.0),
            DragAxis::Vertical,
            Size::new(640.0, 500.0),
            CONT,
        );
        assert_eq!(c.offset, PanOffset::ZERO);
    }

    #[test]
    fn test_clamp_nan_request_is_total() {
        let c = clamp_pan(PanOffset::new(f64::NAN, 0.0), DragAxis::Horizontal, IMG, CONT);
        assert!(c.offset.x.is_finite());
        assert!(c.offset.x <= 0.0);
    }

    #[test]
    fn test_clamp_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let axis = random_axis(&mut rng);
            let img = Size::new(rng.gen_range(1.0..4000.0), rng.gen_range(1.0..4000.0));
            let cont = Size::new(rng.gen_range(1.0..2000.0), rng.gen_range(1.0..2000.0));
            let v = PanOffset::new(rng.gen_range(-5000.0..5000.0), rng.gen_range(-5000.0..5000.0));

            let once = clamp_pan(v, axis, img, cont).offset;
            let twice = clamp_pan(once, axis, img, cont);
            assert_eq!(twice.offset, once);
            assert!(!twice.clamped_x && !twice.clamped_y);
        }
    }

    #[test]
    fn test_axis_lock() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2000 {
            let v = PanOffset::new(rng.gen_range(-3000.0..3000.0), rng.gen_range(-3000.0..3000.0));
            let img = Size::new(rng.gen_range(1.0..4000.0), rng.gen_range(1.0..4000.0));

            assert_eq!(clamp_pan(v, DragAxis::Horizontal, img, CONT).offset.y, 0.0);
            assert_eq!(clamp_pan(v, DragAxis::Vertical, img, CONT).offset.x, 0.0);
            assert_eq!(clamp_pan(v, DragAxis::None, img, CONT).offset, PanOffset::ZERO);
        }
    }

    #[test]
    fn test_crop_region_scales_offset() {
        // 1920x1080 shown at 1137.78x640 in a 640x640 box: scale 1.6875
        let natural = Size::new(1920.0, 1080.0);
        let geometry = cover_layout(natural, CONT);
        let crop = compute_crop_region(PanOffset::new(-200.0, 0.0), CONT, natural, geometry.image);

        assert!((crop.x - 337.5).abs() < 1e-9);
        assert_eq!(crop.y, 0.0);
        assert!((crop.width - 1080.0).abs() < 1e-9);
        assert!((crop.height - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_region_non_uniform_scale() {
        let crop = compute_crop_region(
            PanOffset::new(0.0, -100.0),
            Size::new(400.0, 400.0),
            Size::new(800.0, 3000.0),
            Size::new(400.0, 1000.0),
        );
        assert_eq!(crop.x, 0.0);
        assert!((crop.y - 300.0).abs() < 1e-9);
        assert!((crop.width - 800.0).abs() < 1e-9);
        assert!((crop.height - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_containment() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..2000 {
            let natural = Size::new(rng.gen_range(1.0..8000.0), rng.gen_range(1.0..8000.0));
            let container = Size::new(rng.gen_range(50.0..1500.0), rng.gen_range(50.0..1500.0));
            let axis = DragAxis::from_natural(natural);
            let display = cover_layout(natural, container).image;
            let requested =
                PanOffset::new(rng.gen_range(-9000.0..9000.0), rng.gen_range(-9000.0..9000.0));
            let pan = clamp_pan(requested, axis, display, container).offset;

            let crop = compute_crop_region(pan, container, natural, display);
            let eps = 1e-6 * natural.width.max(natural.height);
            assert!(crop.x >= -eps && crop.y >= -eps, "{crop:?}");
            assert!(crop.x + crop.width <= natural.width + eps, "{crop:?} {natural:?}");
            assert!(crop.y + crop.height <= natural.height + eps, "{crop:?} {natural:?}");
        }
    }

    #[test]
    fn test_crop_zero_display_is_total() {
        let crop = compute_crop_region(PanOffset::ZERO, CONT, Size::new(100.0, 100.0), Size::default());
        assert_eq!(crop.width, 0.0);
        assert_eq!(crop.height, 0.0);
    }

    #[test]
    fn test_pixel_rect_stays_inside() {
        let crop = CropRegion {
            x: 1919.7,
            y: -0.2,
            width: 300.0,
            height: 1080.4,
        };
        let rect = crop.to_pixel_rect(1920, 1080);
        assert_eq!(rect.x, 1919);
        assert_eq!(rect.y, 0);
        assert_eq!(rect.width, 1);
        assert_eq!(rect.height, 1080);
    }

    #[test]
    fn test_cover_layout_by_orientation() {
        let landscape = cover_layout(Size::new(2000.0, 1000.0), CONT);
        assert_eq!(landscape.image, Size::new(1280.0, 640.0));

        let portrait = cover_layout(Size::new(1000.0, 2000.0), CONT);
        assert_eq!(portrait.image, Size::new(640.0, 1280.0));

        let square = cover_layout(Size::new(900.0, 900.0), CONT);
        assert_eq!(square.image, CONT);
    }

    #[test]
    fn test_alignment_grid_thirds() {
        let (vertical, horizontal) = alignment_grid(Size::new(600.0, 300.0));
        assert_eq!(vertical, [200.0, 400.0]);
        assert_eq!(horizontal, [100.0, 200.0]);
    }

    #[test]
    fn test_css_transform() {
        assert_eq!(PanOffset::new(-12.5, 0.0).css_transform(), "translate(-12.5px, 0px)");
    }
}
