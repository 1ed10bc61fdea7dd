//! Device colour conversions.
//!
//! Both the vector interpreter (fill/stroke operators) and the embedded image
//! decoder funnel every colour model into 8-bit RGB through these helpers, so
//! a CMYK fill and a CMYK bitmap come out identical.

use serde::{Deserialize, Serialize};

/// An opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Gray level in `[0, 1]`.
    pub fn from_gray(g: f64) -> Self {
        let v = unit_to_u8(g);
        Self { r: v, g: v, b: v }
    }

    /// RGB components in `[0, 1]`.
    pub fn from_rgb(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: unit_to_u8(r),
            g: unit_to_u8(g),
            b: unit_to_u8(b),
        }
    }

    /// CMYK components in `[0, 1]`, naive subtractive conversion.
    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        let k = k.clamp(0.0, 1.0);
        Self::from_rgb(
            (1.0 - c.clamp(0.0, 1.0)) * (1.0 - k),
            (1.0 - m.clamp(0.0, 1.0)) * (1.0 - k),
            (1.0 - y.clamp(0.0, 1.0)) * (1.0 - k),
        )
    }

    /// Interpret 1, 3 or 4 components as gray, RGB or CMYK.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match *components {
            [g] => Some(Self::from_gray(g)),
            [r, g, b] => Some(Self::from_rgb(r, g, b)),
            [c, m, y, k] => Some(Self::from_cmyk(c, m, y, k)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// 8-bit CMYK sample to RGB, same formula as [`Rgb::from_cmyk`].
pub fn cmyk8_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u32;
    let ch = |v: u8| (((255 - v as u32) * k + 127) / 255) as u8;
    [ch(c), ch(m), ch(y)]
}

fn unit_to_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
