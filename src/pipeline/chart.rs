//! "Chart" variants: an extracted image with a labelled pixel grid.
//!
//! The variant is a reading aid for whoever looks at the image later (a
//! person or a prompt builder): the bitmap is copied onto a canvas with a
//! label margin on the top and left, gridlines are drawn every "nice" step
//! (1, 2 or 5 × 10ᵏ pixels) and each line is labelled with its pixel
//! coordinate using a tiny built-in digit font.

use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Tick intervals on the long axis at density 1.0.
const BASE_INTERVALS: f64 = 5.0;

const GRID_COLOR: Rgb<u8> = Rgb([230, 40, 40]);
const LABEL_COLOR: Rgb<u8> = Rgb([40, 40, 40]);

/// 3×5 bitmaps for 0–9, one row per byte, bit 2 = left column.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Gridline spacing in pixels for an axis of `long` pixels.
pub fn grid_step(long: u32, density: f64) -> u32 {
    let intervals = (BASE_INTERVALS * density.max(0.1)).max(1.0);
    let raw = long.max(1) as f64 / intervals;
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction < 1.5 {
        1.0
    } else if fraction < 3.5 {
        2.0
    } else if fraction < 7.5 {
        5.0
    } else {
        10.0
    };
    ((nice * magnitude).round() as u32).max(1)
}

/// Build the chart variant of `img`.
///
/// `density` multiplies the default tick count; 2.0 gives roughly ten
/// intervals along the longer side.
pub fn chart_variant(img: &RgbImage, density: f64) -> RgbImage {
    let (w, h) = img.dimensions();
    let step = grid_step(w.max(h), density);
    let scale = if w.max(h) > 800 { 2 } else { 1 };

    let glyph_w = 4 * scale;
    let label_digits = digit_count(h.saturating_sub(1));
    let left = label_digits * glyph_w + 4;
    let top = 5 * scale + 4;

    let mut canvas = RgbImage::from_pixel(w + left, h + top, Rgb([255, 255, 255]));
    imageops::replace(&mut canvas, img, left as i64, top as i64);

    let right = (w + left - 1) as f32;
    let bottom = (h + top - 1) as f32;

    // labels that would collide with the previous one are skipped
    let (mut x, mut free_x) = (0, 0);
    while x < w {
        let cx = (left + x) as f32;
        draw_line_segment_mut(&mut canvas, (cx, top as f32 - 2.0), (cx, bottom), GRID_COLOR);
        if left + x >= free_x {
            draw_number(&mut canvas, x, left + x, 1, scale);
            free_x = left + x + digit_count(x) * glyph_w + scale;
        }
        x += step;
    }

    let (mut y, mut free_y) = (0, 0);
    while y < h {
        let cy = (top + y) as f32;
        draw_line_segment_mut(&mut canvas, (left as f32 - 2.0, cy), (right, cy), GRID_COLOR);
        if top + y >= free_y {
            draw_number(&mut canvas, y, 1, top + y, scale);
            free_y = top + y + 6 * scale;
        }
        y += step;
    }

    canvas
}

fn digit_count(mut v: u32) -> u32 {
    let mut n = 1;
    while v >= 10 {
        v /= 10;
        n += 1;
    }
    n
}

/// Draw `value` with its top-left corner at `(x, y)`, clipped to the canvas.
fn draw_number(canvas: &mut RgbImage, value: u32, x: u32, y: u32, scale: u32) {
    let (cw, ch) = canvas.dimensions();
    for (i, digit) in value.to_string().bytes().enumerate() {
        let glyph = &DIGITS[(digit - b'0') as usize];
        let gx = x + i as u32 * 4 * scale;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let px = gx + col * scale;
                let py = y + row as u32 * scale;
                if px + scale <= cw && py + scale <= ch {
                    draw_filled_rect_mut(
                        canvas,
                        Rect::at(px as i32, py as i32).of_size(scale, scale),
                        LABEL_COLOR,
                    );
                }
            }
        }
    }
}
