use egui::{Pos2, Vec2};

/// Affine view transform: `screen = image * zoom + pan`.
///
/// Screen coordinates are relative to the canvas origin. Conversions are always
/// recomputed from the current zoom and pan, never accumulated.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    zoom: f32,
    pan: Vec2,
    zoom_min: f32,
    zoom_max: f32,
    zoom_step: f32,
}

impl Viewport {
    pub const DEFAULT_ZOOM: f32 = 1.0;

    /// Bounds are expected to be validated already (`0 < min <= max`, `step > 1`).
    pub fn new(zoom_min: f32, zoom_max: f32, zoom_step: f32) -> Self {
        Self {
            zoom: Self::DEFAULT_ZOOM.clamp(zoom_min, zoom_max),
            pan: Vec2::ZERO,
            zoom_min,
            zoom_max,
            zoom_step,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom_bounds(&self) -> (f32, f32) {
        (self.zoom_min, self.zoom_max)
    }

    pub fn reset(&mut self) {
        self.zoom = Self::DEFAULT_ZOOM.clamp(self.zoom_min, self.zoom_max);
        self.pan = Vec2::ZERO;
    }

    pub fn to_image_coords(&self, screen: Pos2) -> Pos2 {
        ((screen - self.pan).to_vec2() / self.zoom).to_pos2()
    }

    pub fn to_screen_coords(&self, image: Pos2) -> Pos2 {
        (image.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Sets the zoom (clamped) keeping the image point under `anchor` fixed on screen.
    pub fn set_zoom(&mut self, zoom: f32, anchor: Pos2) {
        let new_zoom = zoom.clamp(self.zoom_min, self.zoom_max);
        let image_anchor = self.to_image_coords(anchor);
        self.zoom = new_zoom;
        self.pan = anchor.to_vec2() - image_anchor.to_vec2() * new_zoom;
    }

    pub fn zoom_in(&mut self, anchor: Pos2) {
        self.set_zoom(self.zoom * self.zoom_step, anchor);
    }

    pub fn zoom_out(&mut self, anchor: Pos2) {
        self.set_zoom(self.zoom / self.zoom_step, anchor);
    }

    /// One zoom step per wheel event: up zooms in, down zooms out.
    pub fn scroll(&mut self, delta: f32, anchor: Pos2) {
        if delta > 0.0 {
            self.zoom_in(anchor);
        } else if delta < 0.0 {
            self.zoom_out(anchor);
        }
    }

    /// Largest zoom that shows the whole image inside `view`, centered.
    pub fn fit(&mut self, image_size: Vec2, view: Vec2) {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return;
        }
        let zoom = (view.x / image_size.x)
            .min(view.y / image_size.y)
            .clamp(self.zoom_min, self.zoom_max);
        self.zoom = zoom;
        self.pan = (view - image_size * zoom) * 0.5;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.1, 20.0, 1.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    const EPS: f32 = 1e-3;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn forward_and_inverse_transforms() {
        let mut vp = Viewport::default();
        vp.set_zoom(2.0, Pos2::ZERO);
        vp.pan(vec2(10.0, -4.0));
        assert_eq!(vp.to_screen_coords(pos2(5.0, 5.0)), pos2(20.0, 6.0));
        assert_eq!(vp.to_image_coords(pos2(20.0, 6.0)), pos2(5.0, 5.0));
    }

    #[test]
    fn round_trip_across_states() {
        let mut vp = Viewport::default();
        let points = [pos2(0.0, 0.0), pos2(13.5, -7.25), pos2(640.0, 480.0)];
        let states = [
            (0.1, vec2(0.0, 0.0)),
            (1.0, vec2(-300.0, 42.0)),
            (3.7, vec2(12.5, 999.0)),
            (20.0, vec2(-1.0, -1.0)),
        ];
        for (zoom, pan) in states {
            vp.reset();
            vp.set_zoom(zoom, Pos2::ZERO);
            vp.pan(pan);
            for p in points {
                assert!(close(vp.to_screen_coords(vp.to_image_coords(p)), p));
                assert!(close(vp.to_image_coords(vp.to_screen_coords(p)), p));
            }
        }
    }

    #[test]
    fn repeated_conversion_does_not_drift() {
        let mut vp = Viewport::default();
        vp.set_zoom(1.7, pos2(33.0, 21.0));
        let start = pos2(101.0, 57.0);
        let mut p = start;
        for _ in 0..1000 {
            p = vp.to_screen_coords(vp.to_image_coords(p));
        }
        assert!(close(p, start));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::new(0.5, 2.0, 2.0);
        for _ in 0..10 {
            vp.zoom_in(Pos2::ZERO);
        }
        assert_eq!(vp.zoom(), 2.0);
        for _ in 0..10 {
            vp.zoom_out(Pos2::ZERO);
        }
        assert_eq!(vp.zoom(), 0.5);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::default();
        vp.pan(vec2(15.0, 5.0));
        let anchor = pos2(200.0, 120.0);
        let before = vp.to_image_coords(anchor);
        vp.zoom_in(anchor);
        assert!((vp.zoom() - 1.25).abs() < EPS);
        assert!(close(vp.to_image_coords(anchor), before));
        vp.zoom_out(anchor);
        assert!(close(vp.to_image_coords(anchor), before));
    }

    #[test]
    fn wheel_moves_by_fixed_steps() {
        let mut vp = Viewport::new(0.1, 20.0, 2.0);
        let anchor = pos2(50.0, 40.0);
        let before = vp.to_image_coords(anchor);
        vp.scroll(0.3, anchor);
        assert_eq!(vp.zoom(), 2.0);
        vp.scroll(120.0, anchor);
        assert_eq!(vp.zoom(), 4.0);
        vp.scroll(0.0, anchor);
        assert_eq!(vp.zoom(), 4.0);
        vp.scroll(-1.0, anchor);
        assert_eq!(vp.zoom(), 2.0);
        assert!(close(vp.to_image_coords(anchor), before));
    }

    #[test]
    fn pan_is_unbounded() {
        let mut vp = Viewport::default();
        vp.pan(vec2(-1.0e6, 1.0e6));
        assert_eq!(vp.pan_offset(), vec2(-1.0e6, 1.0e6));
    }

    #[test]
    fn fit_centers_image() {
        let mut vp = Viewport::default();
        vp.fit(vec2(100.0, 50.0), vec2(400.0, 400.0));
        assert_eq!(vp.zoom(), 4.0);
        assert_eq!(vp.pan_offset(), vec2(0.0, 100.0));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut vp = Viewport::default();
        vp.zoom_in(pos2(3.0, 3.0));
        vp.pan(vec2(8.0, 8.0));
        vp.reset();
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.pan_offset(), Vec2::ZERO);
    }
}
