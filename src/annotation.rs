use egui::{pos2, Pos2, Vec2};

use crate::settings::Settings;
use crate::viewport::Viewport;

/// Axis-aligned region in image space. `top_left <= bottom_right` on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    pub top_left: Pos2,
    pub bottom_right: Pos2,
}

impl Rectangle {
    /// Normalizes two arbitrary corners, whatever direction the drag went.
    pub fn from_corners(a: Pos2, b: Pos2) -> Self {
        Self {
            top_left: pos2(a.x.min(b.x), a.y.min(b.y)),
            bottom_right: pos2(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f32 {
        self.bottom_right.y - self.top_left.y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawState {
    Idle,
    Drawing { anchor: Pos2, current: Pos2 },
}

#[derive(Clone, Copy, Debug)]
pub struct StorePolicy {
    /// Rectangles must have an area strictly greater than this.
    pub min_area: f32,
    pub snap_to_pixel: bool,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Settings::default().store_policy()
    }
}

/// Ordered rectangles in creation order plus the drag-in-progress.
#[derive(Clone, Debug)]
pub struct AnnotationStore {
    rects: Vec<Rectangle>,
    state: DrawState,
    bounds: Option<Vec2>,
    policy: StorePolicy,
}

impl AnnotationStore {
    pub fn new(policy: StorePolicy) -> Self {
        Self {
            rects: Vec::new(),
            state: DrawState::Idle,
            bounds: None,
            policy,
        }
    }

    /// Clears everything and sets the image extent used for clamping.
    pub fn reset(&mut self, bounds: Option<Vec2>) {
        self.rects.clear();
        self.state = DrawState::Idle;
        self.bounds = bounds;
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    pub fn list(&self) -> &[Rectangle] {
        &self.rects
    }

    /// Image-space point for `screen` after clamping and snapping.
    pub fn image_point(&self, viewport: &Viewport, screen: Pos2) -> Pos2 {
        let mut p = viewport.to_image_coords(screen);
        if let Some(bounds) = self.bounds {
            p = pos2(p.x.clamp(0.0, bounds.x), p.y.clamp(0.0, bounds.y));
        }
        if self.policy.snap_to_pixel {
            p = pos2(p.x.round(), p.y.round());
        }
        p
    }

    pub fn begin_rectangle(&mut self, viewport: &Viewport, screen: Pos2) -> Pos2 {
        let anchor = self.image_point(viewport, screen);
        self.state = DrawState::Drawing {
            anchor,
            current: anchor,
        };
        anchor
    }

    /// Tracks the pointer while drawing; ignored when idle.
    pub fn update_rectangle(&mut self, viewport: &Viewport, screen: Pos2) {
        if let DrawState::Drawing { anchor, .. } = self.state {
            let current = self.image_point(viewport, screen);
            self.state = DrawState::Drawing { anchor, current };
        }
    }

    /// In-progress rectangle for previewing.
    pub fn pending(&self) -> Option<Rectangle> {
        match self.state {
            DrawState::Drawing { anchor, current } => Some(Rectangle::from_corners(anchor, current)),
            DrawState::Idle => None,
        }
    }

    /// Finishes the drag. Returns the appended rectangle, or `None` when idle or
    /// when the rectangle was too small to keep.
    pub fn complete_rectangle(&mut self, viewport: &Viewport, screen: Pos2) -> Option<Rectangle> {
        let DrawState::Drawing { anchor, .. } = self.state else {
            return None;
        };
        self.state = DrawState::Idle;

        let end = self.image_point(viewport, screen);
        let rect = Rectangle::from_corners(anchor, end);
        if rect.width() <= 0.0 || rect.height() <= 0.0 || rect.area() <= self.policy.min_area {
            log::debug!("discarding {}x{} rectangle", rect.width(), rect.height());
            return None;
        }
        self.rects.push(rect);
        Some(rect)
    }

    pub fn cancel(&mut self) {
        self.state = DrawState::Idle;
    }

    /// Drops the newest rectangle. Does nothing mid-drag or when empty.
    pub fn undo(&mut self) -> Option<Rectangle> {
        if self.is_drawing() {
            return None;
        }
        self.rects.pop()
    }

    #[cfg(test)]
    pub fn push(&mut self, rect: Rectangle) {
        self.rects.push(rect);
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(StorePolicy::default())
    }
}
