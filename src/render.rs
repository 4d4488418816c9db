use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::annotation::Rectangle;
use crate::matrix::Matrix;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorRamp {
    /// Normalized value drives the red channel only.
    #[default]
    Red,
    Grayscale,
    /// Black -> red -> yellow -> white.
    Heat,
}

impl ColorRamp {
    pub const ALL: [ColorRamp; 3] = [ColorRamp::Red, ColorRamp::Grayscale, ColorRamp::Heat];

    pub fn label(self) -> &'static str {
        match self {
            ColorRamp::Red => "Red",
            ColorRamp::Grayscale => "Grayscale",
            ColorRamp::Heat => "Heat",
        }
    }

    /// Maps `t` in [0, 1] to a color. Every channel is non-decreasing in `t`.
    pub fn color(self, t: f64) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self {
            ColorRamp::Red => [byte(t), 0, 0],
            ColorRamp::Grayscale => [byte(t), byte(t), byte(t)],
            ColorRamp::Heat => [byte(t * 3.0), byte(t * 3.0 - 1.0), byte(t * 3.0 - 2.0)],
        }
    }
}

/// Rasterizes the matrix at one pixel per cell after min-max normalization.
/// A constant matrix maps every cell to the ramp's minimum color.
pub fn render(matrix: &Matrix, ramp: ColorRamp) -> RgbImage {
    let (lo, hi) = matrix.range();
    let span = hi - lo;
    let width = matrix.cols() as u32;
    let height = matrix.rows() as u32;

    let mut img = RgbImage::new(width, height);
    for (i, &value) in matrix.values().iter().enumerate() {
        let t = if span > 0.0 { (value - lo) / span } else { 0.0 };
        let x = (i % matrix.cols()) as u32;
        let y = (i / matrix.cols()) as u32;
        img.put_pixel(x, y, Rgb(ramp.color(t)));
    }
    img
}

/// Copy of `bitmap` with each rectangle outlined. Outlines sit on the border
/// cells of the region, so the right and bottom edges are drawn at `br - 1`.
/// `thickness` counts cells.
pub fn burn_rectangles(
    bitmap: &RgbImage,
    rects: &[Rectangle],
    color: [u8; 3],
    thickness: f32,
) -> RgbImage {
    let mut img = bitmap.clone();
    for rect in rects {
        let (l, t) = (rect.top_left.x, rect.top_left.y);
        let r = (rect.bottom_right.x - 1.0).max(l);
        let b = (rect.bottom_right.y - 1.0).max(t);
        draw_line_on_image(&mut img, l, t, r, t, thickness, color);
        draw_line_on_image(&mut img, r, t, r, b, thickness, color);
        draw_line_on_image(&mut img, r, b, l, b, thickness, color);
        draw_line_on_image(&mut img, l, b, l, t, thickness, color);
    }
    img
}

fn draw_line_on_image(
    img: &mut RgbImage,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    thickness: f32,
    color: [u8; 3],
) {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0) as i32;
    let half_t = ((thickness - 1.0) / 2.0).floor().max(0.0) as i32;
    let (w, h) = (img.width() as i32, img.height() as i32);

    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        let cx = (x0 + dx * t) as i32;
        let cy = (y0 + dy * t) as i32;
        for oy in -half_t..=half_t {
            for ox in -half_t..=half_t {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    img.put_pixel(px as u32, py as u32, Rgb(color));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn sample() -> Matrix {
        Matrix::parse("0 1 2\n3 4 5\n").unwrap()
    }

    #[test]
    fn one_pixel_per_cell() {
        let img = render(&sample(), ColorRamp::Red);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(2, 1).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 1).0, [204, 0, 0]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let m = sample();
        for ramp in ColorRamp::ALL {
            assert_eq!(render(&m, ramp), render(&m, ramp));
        }
    }

    #[test]
    fn ramps_are_monotonic() {
        for ramp in ColorRamp::ALL {
            let mut prev = ramp.color(0.0);
            for step in 1..=100 {
                let next = ramp.color(step as f64 / 100.0);
                for c in 0..3 {
                    assert!(next[c] >= prev[c], "{ramp:?} decreases at step {step}");
                }
                prev = next;
            }
            assert_ne!(ramp.color(0.0), ramp.color(1.0));
        }
    }

    #[test]
    fn constant_matrix_renders_minimum_color() {
        let m = Matrix::parse("7 7\n7 7\n").unwrap();
        let img = render(&m, ColorRamp::Grayscale);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn burned_outline_stays_on_region_border() {
        let m = Matrix::parse(&"0 0 0 0 0 0\n".repeat(6)).unwrap();
        let bitmap = render(&m, ColorRamp::Red);
        let rect = Rectangle::from_corners(pos2(1.0, 1.0), pos2(4.0, 4.0));
        let img = burn_rectangles(&bitmap, &[rect], [0, 0, 255], 2.0);
        for (x, y) in [(1, 1), (3, 1), (3, 3), (1, 3), (2, 1), (3, 2)] {
            assert_eq!(img.get_pixel(x, y).0, [0, 0, 255], "({x}, {y})");
        }
        for (x, y) in [(2, 2), (4, 2), (2, 4), (0, 1), (5, 5)] {
            assert_eq!(img.get_pixel(x, y).0, [0, 0, 0], "({x}, {y})");
        }
        assert_eq!(bitmap.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn thicker_outline_widens_around_edge() {
        let m = Matrix::parse(&"0 0 0 0 0 0 0 0 0 0\n".repeat(10)).unwrap();
        let bitmap = render(&m, ColorRamp::Red);
        let rect = Rectangle::from_corners(pos2(2.0, 2.0), pos2(9.0, 9.0));
        let img = burn_rectangles(&bitmap, &[rect], [0, 0, 255], 3.0);
        assert_eq!(img.get_pixel(1, 5).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(3, 5).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(9, 5).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(0, 5).0, [0, 0, 0]);
    }
}
