//! The fixed catalog of named visual filters.
//!
//! Each filter is defined once, as an ordered list of [`FilterOp`]s. The live
//! preview (a CSS `filter` value) and the export-time pixel operation are both
//! derived from that list, so the two can never drift apart. Pixel math
//! follows the Filter Effects color-matrix and transfer-function definitions
//! that browsers use for the same CSS functions, clamping after every step.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One primitive color operation, with its CSS amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// Multiplier, 1.0 = unchanged
    Brightness(f32),
    /// Multiplier around mid-gray, 1.0 = unchanged
    Contrast(f32),
    /// Multiplier, 1.0 = unchanged
    Saturate(f32),
    /// 0.0..=1.0
    Grayscale(f32),
    /// 0.0..=1.0
    Sepia(f32),
    /// Degrees
    HueRotate(f32),
}

impl FilterOp {
    /// CSS function form, e.g. `contrast(125%)`.
    pub fn css(&self) -> String {
        let pct = |v: f32| (v * 100.0).round() as i64;
        match *self {
            FilterOp::Brightness(v) => format!("brightness({}%)", pct(v)),
            FilterOp::Contrast(v) => format!("contrast({}%)", pct(v)),
            FilterOp::Saturate(v) => format!("saturate({}%)", pct(v)),
            FilterOp::Grayscale(v) => format!("grayscale({}%)", pct(v)),
            FilterOp::Sepia(v) => format!("sepia({}%)", pct(v)),
            FilterOp::HueRotate(deg) => format!("hue-rotate({}deg)", deg.round() as i64),
        }
    }

    fn step(&self) -> ColorStep {
        match *self {
            FilterOp::Brightness(v) => ColorStep::Linear {
                slope: v,
                intercept: 0.0,
            },
            FilterOp::Contrast(v) => ColorStep::Linear {
                slope: v,
                intercept: 0.5 - 0.5 * v,
            },
            FilterOp::Saturate(s) => ColorStep::Matrix([
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
            ]),
            FilterOp::Grayscale(a) => {
                let r = 1.0 - a.clamp(0.0, 1.0);
                ColorStep::Matrix([
                    [0.2126 + 0.7874 * r, 0.7152 - 0.7152 * r, 0.0722 - 0.0722 * r],
                    [0.2126 - 0.2126 * r, 0.7152 + 0.2848 * r, 0.0722 - 0.0722 * r],
                    [0.2126 - 0.2126 * r, 0.7152 - 0.7152 * r, 0.0722 + 0.9278 * r],
                ])
            }
            FilterOp::Sepia(a) => {
                let r = 1.0 - a.clamp(0.0, 1.0);
                ColorStep::Matrix([
                    [0.393 + 0.607 * r, 0.769 - 0.769 * r, 0.189 - 0.189 * r],
                    [0.349 - 0.349 * r, 0.686 + 0.314 * r, 0.168 - 0.168 * r],
                    [0.272 - 0.272 * r, 0.534 - 0.534 * r, 0.131 + 0.869 * r],
                ])
            }
            FilterOp::HueRotate(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                ColorStep::Matrix([
                    [
                        0.213 + cos * 0.787 - sin * 0.213,
                        0.715 - cos * 0.715 - sin * 0.715,
                        0.072 - cos * 0.072 + sin * 0.928,
                    ],
                    [
                        0.213 - cos * 0.213 + sin * 0.143,
                        0.715 + cos * 0.285 + sin * 0.140,
                        0.072 - cos * 0.072 - sin * 0.283,
                    ],
                    [
                        0.213 - cos * 0.213 - sin * 0.787,
                        0.715 - cos * 0.715 + sin * 0.715,
                        0.072 + cos * 0.928 + sin * 0.072,
                    ],
                ])
            }
        }
    }
}

/// A filter op lowered to per-pixel math on normalized RGB.
#[derive(Debug, Clone, Copy)]
enum ColorStep {
    Linear { slope: f32, intercept: f32 },
    Matrix([[f32; 3]; 3]),
}

impl ColorStep {
    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let out = match self {
            ColorStep::Linear { slope, intercept } => rgb.map(|c| c * slope + intercept),
            ColorStep::Matrix(m) => [
                m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
                m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
                m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
            ],
        };
        out.map(|c| c.clamp(0.0, 1.0))
    }
}

/// A named entry of the filter catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    Original,
    Aden,
    Clarendon,
    Crema,
    Gingham,
    Juno,
    Lark,
    Ludwig,
    Moon,
    Perpetua,
    Reyes,
    Slumber,
}

impl Filter {
    /// The catalog, in display order. `Original` is first and is the default.
    pub const ALL: [Filter; 12] = [
        Filter::Original,
        Filter::Aden,
        Filter::Clarendon,
        Filter::Crema,
        Filter::Gingham,
        Filter::Juno,
        Filter::Lark,
        Filter::Ludwig,
        Filter::Moon,
        Filter::Perpetua,
        Filter::Reyes,
        Filter::Slumber,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Filter::Original => "Original",
            Filter::Aden => "Aden",
            Filter::Clarendon => "Clarendon",
            Filter::Crema => "Crema",
            Filter::Gingham => "Gingham",
            Filter::Juno => "Juno",
            Filter::Lark => "Lark",
            Filter::Ludwig => "Ludwig",
            Filter::Moon => "Moon",
            Filter::Perpetua => "Perpetua",
            Filter::Reyes => "Reyes",
            Filter::Slumber => "Slumber",
        }
    }

    /// The single definition both preview and export are derived from.
    pub fn ops(&self) -> &'static [FilterOp] {
        use FilterOp::*;
        match self {
            Filter::Original => &[],
            Filter::Aden => &[Brightness(1.10), Sepia(1.0)],
            Filter::Clarendon => &[Contrast(1.25), HueRotate(15.0)],
            Filter::Crema => &[Grayscale(0.10), Brightness(1.05)],
            Filter::Gingham => &[Brightness(1.05), Contrast(0.90)],
            Filter::Juno => &[Saturate(1.50), Contrast(1.10)],
            Filter::Lark => &[Brightness(1.05), Contrast(1.05), Saturate(1.20)],
            Filter::Ludwig => &[Brightness(1.20), Contrast(0.85)],
            Filter::Moon => &[Grayscale(1.0)],
            Filter::Perpetua => &[HueRotate(180.0), Contrast(0.90)],
            Filter::Reyes => &[Sepia(1.0), Brightness(1.10)],
            Filter::Slumber => &[Brightness(0.95), Saturate(0.80), Sepia(1.0)],
        }
    }

    /// True for the no-op entry.
    pub fn is_identity(&self) -> bool {
        self.ops().is_empty()
    }

    /// Live-preview form: a CSS `filter` property value.
    pub fn css(&self) -> String {
        if self.is_identity() {
            return "none".to_string();
        }
        self.ops()
            .iter()
            .map(FilterOp::css)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Export form: apply the same operations to every pixel, in order.
    ///
    /// Alpha is left untouched. `Original` does not touch the buffer at all.
    pub fn apply(&self, image: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        let steps: Vec<ColorStep> = self.ops().iter().map(FilterOp::step).collect();

        for pixel in image.pixels_mut() {
            let mut rgb = [
                f32::from(pixel[0]) / 255.0,
                f32::from(pixel[1]) / 255.0,
                f32::from(pixel[2]) / 255.0,
            ];
            for step in &steps {
                rgb = step.apply(rgb);
            }
            pixel[0] = (rgb[0] * 255.0).round() as u8;
            pixel[1] = (rgb[1] * 255.0).round() as u8;
            pixel[2] = (rgb[2] * 255.0).round() as u8;
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("clarendron") {
            return Ok(Filter::Clarendon);
        }
        Filter::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Filter::ALL.iter().map(Filter::name).collect();
                format!("Unknown filter '{wanted}'. Available: {}", names.join(", "))
            })
    }
}
