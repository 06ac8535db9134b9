//! Pan/zoom transform between table and canvas coordinates.
//!
//! `canvas = table * scale + translation`

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// The local view onto the table. Never synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Canvas position of the table origin.
    pub translation: Vec2,
    /// Canvas pixels per table unit.
    pub scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: 1.0,
            min_scale: 0.01,
            max_scale: 100.0,
        }
    }
}

impl ViewTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// Affine transform from table to canvas coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.translation) * Affine::scale(self.scale)
    }

    /// Affine transform from canvas to table coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.translation)
    }

    pub fn to_canvas(&self, table_point: Point) -> Point {
        self.transform() * table_point
    }

    pub fn to_table(&self, canvas_point: Point) -> Point {
        self.inverse_transform() * canvas_point
    }

    /// Move the camera so the table follows a drag of `table_delta`.
    pub fn pan_by_table_delta(&mut self, table_delta: Vec2) {
        self.translation += table_delta * self.scale;
    }

    /// Zoom by `factor`, keeping the table point `reference` where it is on
    /// the canvas.
    pub fn zoom_about(&mut self, reference: Point, factor: f64) {
        let old_scale = self.scale;
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - old_scale).abs() < f64::EPSILON {
            return;
        }
        self.scale = new_scale;
        self.translation += reference.to_vec2() * (old_scale - new_scale);
    }

    /// Put the table point `p` at the center of a canvas of size `viewport`.
    pub fn center_on(&mut self, p: Point, viewport: Size) {
        self.translation = Vec2::new(
            viewport.width / 2.0 - p.x * self.scale,
            viewport.height / 2.0 - p.y * self.scale,
        );
    }

    /// Keep the table point at the canvas center fixed across a resize.
    pub fn resize(&mut self, old_viewport: Size, new_viewport: Size) {
        let old_center = self.to_table(Point::new(
            old_viewport.width / 2.0,
            old_viewport.height / 2.0,
        ));
        self.center_on(old_center, new_viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_identity_by_default() {
        let view = ViewTransform::new();
        let p = Point::new(100.0, 200.0);
        assert_close(view.to_table(p), p);
        assert_close(view.to_canvas(p), p);
    }

    #[test]
    fn test_to_canvas_formula() {
        let view = ViewTransform {
            translation: Vec2::new(50.0, -10.0),
            scale: 2.0,
            ..ViewTransform::default()
        };
        assert_close(view.to_canvas(Point::new(3.0, 4.0)), Point::new(56.0, -2.0));
        assert_close(view.to_table(Point::new(56.0, -2.0)), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        for scale in [0.05, 0.7, 1.0, 3.3, 42.0] {
            let view = ViewTransform {
                translation: Vec2::new(30.0, -20.0),
                scale,
                ..ViewTransform::default()
            };
            let p = Point::new(123.0, -456.5);
            assert_close(view.to_table(view.to_canvas(p)), p);
            assert_close(view.to_canvas(view.to_table(p)), p);
        }
    }

    #[test]
    fn test_zoom_keeps_reference_fixed() {
        let mut view = ViewTransform {
            translation: Vec2::new(40.0, 15.0),
            scale: 1.5,
            ..ViewTransform::default()
        };
        let reference = Point::new(-12.0, 33.0);
        let before = view.to_canvas(reference);
        view.zoom_about(reference, 1.05f64.powi(3));
        assert!((view.scale - 1.5 * 1.05f64.powi(3)).abs() < 1e-12);
        assert_close(view.to_canvas(reference), before);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut view = ViewTransform::with_limits(0.5, 2.0);
        view.zoom_about(Point::ZERO, 0.001);
        assert!((view.scale - 0.5).abs() < f64::EPSILON);
        view.zoom_about(Point::ZERO, 1000.0);
        assert!((view.scale - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_keeps_grabbed_point_under_pointer() {
        let mut view = ViewTransform {
            scale: 2.0,
            ..ViewTransform::default()
        };
        let grabbed = view.to_table(Point::new(100.0, 100.0));
        // Pointer moves 10px right: table delta under the old transform.
        let moved = view.to_table(Point::new(110.0, 100.0));
        view.pan_by_table_delta(moved - grabbed);
        assert_close(view.to_canvas(grabbed), Point::new(110.0, 100.0));
    }

    #[test]
    fn test_center_on_and_resize() {
        let mut view = ViewTransform::new();
        view.center_on(Point::ZERO, Size::new(800.0, 600.0));
        assert_close(view.to_canvas(Point::ZERO), Point::new(400.0, 300.0));

        view.pan_by_table_delta(Vec2::new(25.0, 0.0));
        let centered = view.to_table(Point::new(400.0, 300.0));
        view.resize(Size::new(800.0, 600.0), Size::new(1000.0, 500.0));
        assert_close(view.to_canvas(centered), Point::new(500.0, 250.0));
    }
}
