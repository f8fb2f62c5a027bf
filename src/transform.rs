//! Pan/zoom transform between screen space and graph space.
//!
//! Screen coordinates are canvas-local pixels. The mapping is
//! `screen = (graph + offset) * scale`, so panning adds to `offset` in graph
//! units and zooming only touches `scale` (plus an offset correction that keeps
//! a pivot fixed).

use crate::geometry::{vec2, Rect, Vector2};
use serde::{Deserialize, Serialize};

/// Rounds to 12 decimal places so float results can be compared for equality.
pub fn fix_float(n: f64) -> f64 {
    ((n + f64::EPSILON) * 1e12).round() / 1e12
}

/// Current pan offset and zoom scale of a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Pan offset in graph units
    pub offset: Vector2,
    /// Zoom factor; always positive
    scale: f64,
    /// Lower zoom bound
    pub min_scale: f64,
    /// Upper zoom bound
    pub max_scale: f64,
    /// Canvas-local rectangle that receives pointer input, if restricted
    #[serde(skip)]
    pub viewport: Option<Rect>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: Vector2::ZERO,
            scale: 1.0,
            min_scale: 0.1,
            max_scale: 10.0,
            viewport: None,
        }
    }
}

impl Transform {
    /// Creates a transform with the given zoom bounds.
    pub fn with_limits(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// Current zoom factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Converts a screen point to graph space.
    pub fn to_graph(&self, screen: Vector2) -> Vector2 {
        screen / self.scale - self.offset
    }

    /// Converts a graph point to screen space.
    pub fn to_screen(&self, graph: Vector2) -> Vector2 {
        (graph + self.offset) * self.scale
    }

    /// Converts a graph-space rectangle to screen space.
    pub fn rect_to_screen(&self, rect: &Rect) -> Rect {
        let min = self.to_screen(rect.min());
        Rect::new(min.x, min.y, rect.width * self.scale, rect.height * self.scale)
    }

    /// Whether a screen point falls inside the input viewport.
    pub fn is_inside(&self, screen: Vector2) -> bool {
        match self.viewport {
            None => true,
            Some(vp) => {
                screen.x >= vp.x
                    && screen.x < vp.x + vp.width
                    && screen.y >= vp.y
                    && screen.y < vp.y + vp.height
            }
        }
    }

    /// Pans by a screen-space delta.
    pub fn pan_by(&mut self, screen_delta: Vector2) {
        self.offset += screen_delta / self.scale;
    }

    /// Sets the zoom to `new_scale` (clamped), keeping `pivot` fixed on screen.
    pub fn change_scale(&mut self, new_scale: f64, pivot: Vector2) {
        if self.min_scale.is_nan() || self.max_scale.is_nan() || self.min_scale > self.max_scale {
            log::warn!("ignoring zoom, limits {} > {}", self.min_scale, self.max_scale);
            return;
        }
        let clamped = new_scale.clamp(self.min_scale, self.max_scale);
        if !clamped.is_finite() || clamped <= 0.0 || clamped == self.scale {
            return;
        }
        let before = self.to_graph(pivot);
        self.scale = clamped;
        let after = self.to_graph(pivot);
        self.offset += after - before;
    }

    /// Multiplies the zoom by `factor`, keeping `pivot` fixed on screen.
    pub fn change_delta_scale(&mut self, factor: f64, pivot: Vector2) {
        self.change_scale(self.scale * factor, pivot);
    }

    /// Graph-space area visible through a canvas of the given screen size.
    pub fn visible_area(&self, canvas_size: Vector2) -> Rect {
        let min = self.to_graph(Vector2::ZERO);
        let max = self.to_graph(canvas_size);
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Restores the identity view.
    pub fn reset(&mut self) {
        self.offset = Vector2::ZERO;
        self.scale = 1.0;
    }

    /// Centers the view on a graph point for a canvas of the given size.
    pub fn center_on(&mut self, graph: Vector2, canvas_size: Vector2) {
        self.offset = vec2(
            canvas_size.x * 0.5 / self.scale - graph.x,
            canvas_size.y * 0.5 / self.scale - graph.y,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector2, b: Vector2) {
        assert!((a.x - b.x).abs() < 1e-9, "x differs: {a:?} vs {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "y differs: {a:?} vs {b:?}");
    }

    #[test]
    fn round_trip_is_identity() {
        let mut t = Transform::default();
        t.offset = vec2(-312.25, 48.5);
        t.change_scale(1.7, vec2(400.0, 300.0));

        for p in [
            vec2(0.0, 0.0),
            vec2(123.456, -789.012),
            vec2(-5000.5, 2500.25),
            vec2(0.1, 0.2),
        ] {
            assert_close(t.to_graph(t.to_screen(p)), p);
            assert_close(t.to_screen(t.to_graph(p)), p);
        }
    }

    #[test]
    fn small_round_trip_is_exact_after_fix_float() {
        let mut t = Transform::default();
        t.change_scale(1.1, vec2(200.0, 200.0));
        let p = vec2(0.1, 0.2);
        let back = t.to_graph(t.to_screen(p));
        assert_eq!(fix_float(back.x), fix_float(p.x));
        assert_eq!(fix_float(back.y), fix_float(p.y));
        assert_eq!(fix_float(0.1 + 0.2), 0.3);
    }

    #[test]
    fn pan_moves_offset_by_inverse_scale() {
        let mut t = Transform::default();
        t.pan_by(vec2(50.0, 30.0));
        assert_eq!(t.offset, vec2(50.0, 30.0));

        t.change_scale(2.0, Vector2::ZERO);
        let before = t.offset;
        t.pan_by(vec2(10.0, 10.0));
        assert_close(t.offset - before, vec2(5.0, 5.0));
    }

    #[test]
    fn zoom_keeps_pivot_fixed() {
        let mut t = Transform::default();
        let pivot = vec2(200.0, 200.0);
        let under = t.to_graph(pivot);
        t.change_delta_scale(1.1, pivot);
        assert_eq!(t.scale(), 1.1);
        assert_close(t.to_screen(under), pivot);
    }

    #[test]
    fn scale_is_clamped_and_stays_positive() {
        let mut t = Transform::with_limits(0.5, 2.0);
        t.change_scale(10.0, Vector2::ZERO);
        assert_eq!(t.scale(), 2.0);
        t.change_scale(-1.0, Vector2::ZERO);
        assert_eq!(t.scale(), 0.5);
        t.change_scale(f64::NAN, Vector2::ZERO);
        assert_eq!(t.scale(), 0.5);
    }

    #[test]
    fn viewport_bounds_are_half_open() {
        let mut t = Transform::default();
        t.viewport = Some(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(t.is_inside(vec2(0.0, 0.0)));
        assert!(t.is_inside(vec2(99.9, 49.9)));
        assert!(!t.is_inside(vec2(100.0, 10.0)));
        assert!(!t.is_inside(vec2(-1.0, 10.0)));
    }

    #[test]
    fn visible_area_tracks_pan_and_zoom() {
        let mut t = Transform::default();
        t.offset = vec2(-100.0, -50.0);
        t.change_scale(2.0, Vector2::ZERO);
        let area = t.visible_area(vec2(800.0, 600.0));
        assert_close(area.min(), vec2(100.0, 50.0));
        assert_close(area.size(), vec2(400.0, 300.0));
    }
}
