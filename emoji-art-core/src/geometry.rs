//! Coordinate transform between screen space and emoji space.
//!
//! Screen space is the continuous coordinate system of the rendered viewport.
//! Emoji space is an integer grid centered on the canvas that does not move
//! when the user pans or zooms.

use serde::{Deserialize, Serialize};

/// Smallest zoom scale ever used for division.
pub const MIN_ZOOM_SCALE: f64 = 1e-3;

/// Distance from an integer below which a coordinate snaps to it.
const SNAP_EPSILON: f64 = 1e-6;

/// A point in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal position in screen units.
    pub x: f64,
    /// Vertical position in screen units.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A translation in screen units (drag translation, pan offset).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    /// Horizontal component.
    pub dx: f64,
    /// Vertical component.
    pub dy: f64,
}

impl Vector {
    /// The zero vector.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create a vector.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.dx * factor, self.dy * factor)
    }
}

impl std::ops::Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

/// A point in emoji space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EmojiPoint {
    /// Horizontal offset from the canvas center.
    pub x: i32,
    /// Vertical offset from the canvas center.
    pub y: i32,
}

impl EmojiPoint {
    /// The canvas center.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create an emoji-space point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Clamp a zoom scale so it can safely be divided by.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() && zoom > MIN_ZOOM_SCALE {
        zoom
    } else if zoom.is_infinite() && zoom > 0.0 {
        f64::MAX
    } else {
        MIN_ZOOM_SCALE
    }
}

/// Truncate toward zero, snapping values within floating-point noise of an
/// integer onto that integer first.
#[allow(clippy::cast_possible_truncation)] // saturating float-to-int cast is intended
fn truncate(value: f64) -> i32 {
    let nearest = value.round();
    if (value - nearest).abs() < SNAP_EPSILON {
        nearest as i32
    } else {
        value.trunc() as i32
    }
}

/// Snapshot of the parameters that map emoji space onto the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Midpoint of the visible canvas.
    pub center: ScreenPoint,
    /// Zoom multiplier (always at least [`MIN_ZOOM_SCALE`]).
    pub zoom_scale: f64,
    /// Pan offset in screen units.
    pub pan_offset: Vector,
}

impl ViewTransform {
    /// Create a transform; the zoom scale is clamped.
    #[must_use]
    pub fn new(center: ScreenPoint, zoom_scale: f64, pan_offset: Vector) -> Self {
        Self {
            center,
            zoom_scale: clamp_zoom(zoom_scale),
            pan_offset,
        }
    }

    /// Map an emoji-space point to screen space.
    #[must_use]
    pub fn to_screen(&self, point: EmojiPoint) -> ScreenPoint {
        ScreenPoint::new(
            self.center.x + f64::from(point.x) * self.zoom_scale + self.pan_offset.dx,
            self.center.y + f64::from(point.y) * self.zoom_scale + self.pan_offset.dy,
        )
    }

    /// Map a screen point to emoji space, truncating toward zero.
    #[must_use]
    pub fn to_emoji(&self, point: ScreenPoint) -> EmojiPoint {
        let zoom = clamp_zoom(self.zoom_scale);
        EmojiPoint::new(
            truncate((point.x - self.center.x - self.pan_offset.dx) / zoom),
            truncate((point.y - self.center.y - self.pan_offset.dy) / zoom),
        )
    }

    /// Convert a screen translation into an emoji-space delta.
    ///
    /// The division by zoom and the truncation happen exactly once per call.
    #[must_use]
    pub fn to_emoji_delta(&self, translation: Vector) -> (i32, i32) {
        let zoom = clamp_zoom(self.zoom_scale);
        (truncate(translation.dx / zoom), truncate(translation.dy / zoom))
    }
}

/// Pan and zoom state of the visible canvas, including in-flight gestures.
///
/// Pan is stored unscaled; the screen pan offset is the stored pan multiplied
/// by the current zoom scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Visible canvas width in screen units.
    pub width: f64,
    /// Visible canvas height in screen units.
    pub height: f64,
    steady_zoom: f64,
    #[serde(skip, default = "Viewport::identity_zoom")]
    gesture_zoom: f64,
    steady_pan: Vector,
    #[serde(skip)]
    gesture_pan: Vector,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Viewport {
    const fn identity_zoom() -> f64 {
        1.0
    }

    /// Create a viewport of the given size with no pan and unit zoom.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            steady_zoom: 1.0,
            gesture_zoom: 1.0,
            steady_pan: Vector::ZERO,
            gesture_pan: Vector::ZERO,
        }
    }

    /// Resize the visible canvas.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Midpoint of the visible canvas.
    #[must_use]
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }

    /// Current zoom scale (steady zoom times gesture zoom, clamped).
    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        clamp_zoom(self.steady_zoom * self.gesture_zoom)
    }

    /// Set the steady zoom scale directly.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.steady_zoom = clamp_zoom(zoom);
    }

    /// Current pan offset in screen units.
    #[must_use]
    pub fn pan_offset(&self) -> Vector {
        (self.steady_pan + self.gesture_pan).scaled(self.zoom_scale())
    }

    /// Snapshot the transform for the current state.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(self.center(), self.zoom_scale(), self.pan_offset())
    }

    /// Track an in-flight pan drag.
    pub fn update_pan_gesture(&mut self, translation: Vector) {
        self.gesture_pan = translation.scaled(1.0 / self.zoom_scale());
    }

    /// Commit a finished pan drag.
    pub fn end_pan_gesture(&mut self, translation: Vector) {
        self.steady_pan = self.steady_pan + translation.scaled(1.0 / self.zoom_scale());
        self.gesture_pan = Vector::ZERO;
    }

    /// Track an in-flight pinch.
    pub fn update_zoom_gesture(&mut self, scale: f64) {
        self.gesture_zoom = clamp_zoom(scale);
    }

    /// Commit a finished pinch.
    pub fn end_zoom_gesture(&mut self, scale: f64) {
        self.steady_zoom = clamp_zoom(self.steady_zoom * clamp_zoom(scale));
        self.gesture_zoom = 1.0;
    }

    /// Abandon any in-flight gestures.
    pub fn cancel_gestures(&mut self) {
        self.gesture_zoom = 1.0;
        self.gesture_pan = Vector::ZERO;
    }

    /// Zoom so an image of the given size fits the canvas, and recenter.
    ///
    /// Returns `false` and leaves the viewport alone when either size is empty.
    pub fn zoom_to_fit(&mut self, image_width: f64, image_height: f64) -> bool {
        if image_width <= 0.0 || image_height <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        let horizontal = self.width / image_width;
        let vertical = self.height / image_height;
        self.steady_zoom = clamp_zoom(horizontal.min(vertical));
        self.steady_pan = Vector::ZERO;
        self.cancel_gestures();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(zoom: f64, pan: Vector) -> ViewTransform {
        ViewTransform::new(ScreenPoint::new(400.0, 300.0), zoom, pan)
    }

    #[test]
    fn test_to_screen_applies_zoom_and_pan() {
        let t = transform(2.0, Vector::new(10.0, -20.0));
        let p = t.to_screen(EmojiPoint::new(5, -3));
        assert!((p.x - 420.0).abs() < f64::EPSILON);
        assert!((p.y - 274.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_emoji_truncates_toward_zero() {
        let t = transform(2.0, Vector::ZERO);
        assert_eq!(t.to_emoji(ScreenPoint::new(403.9, 296.1)), EmojiPoint::new(1, -1));
        assert_eq!(t.to_emoji(ScreenPoint::new(401.0, 299.0)), EmojiPoint::new(0, 0));
    }

    #[test]
    fn test_zero_zoom_is_clamped() {
        let t = transform(0.0, Vector::ZERO);
        assert!(t.zoom_scale >= MIN_ZOOM_SCALE);
        let p = t.to_emoji(ScreenPoint::new(401.0, 300.0));
        assert_eq!(p.y, 0);
        assert!(p.x > 0);
    }

    #[test]
    fn test_round_trip_with_awkward_zoom() {
        let t = transform(0.1, Vector::new(0.3, 0.7));
        for x in [-1000, -7, -1, 0, 1, 3, 999] {
            let p = EmojiPoint::new(x, -x);
            assert_eq!(t.to_emoji(t.to_screen(p)), p);
        }
    }

    #[test]
    fn test_emoji_delta_divides_once() {
        let t = transform(3.0, Vector::new(50.0, 50.0));
        assert_eq!(t.to_emoji_delta(Vector::new(10.0, -10.0)), (3, -3));
    }

    #[test]
    fn test_pan_gesture_is_unscaled_until_rendered() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.set_zoom(2.0);
        viewport.update_pan_gesture(Vector::new(40.0, 0.0));
        assert!((viewport.pan_offset().dx - 40.0).abs() < 1e-9);

        viewport.end_pan_gesture(Vector::new(40.0, 0.0));
        assert!((viewport.pan_offset().dx - 40.0).abs() < 1e-9);

        viewport.set_zoom(4.0);
        assert!((viewport.pan_offset().dx - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_gesture_multiplies_on_end() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.update_zoom_gesture(2.0);
        assert!((viewport.zoom_scale() - 2.0).abs() < 1e-9);
        viewport.end_zoom_gesture(2.0);
        viewport.update_zoom_gesture(1.5);
        assert!((viewport.zoom_scale() - 3.0).abs() < 1e-9);
        viewport.cancel_gestures();
        assert!((viewport.zoom_scale() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_fit() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.end_pan_gesture(Vector::new(100.0, 100.0));
        assert!(viewport.zoom_to_fit(1600.0, 600.0));
        assert!((viewport.zoom_scale() - 0.5).abs() < 1e-9);
        assert_eq!(viewport.pan_offset(), Vector::ZERO);

        assert!(!viewport.zoom_to_fit(0.0, 600.0));
        assert!((viewport.zoom_scale() - 0.5).abs() < 1e-9);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_emoji_screen_round_trip(
                x in -100_000i32..100_000,
                y in -100_000i32..100_000,
                zoom in 0.01f64..50.0,
                pan_x in -5_000.0f64..5_000.0,
                pan_y in -5_000.0f64..5_000.0,
            ) {
                let t = ViewTransform::new(ScreenPoint::new(512.0, 384.0), zoom, Vector::new(pan_x, pan_y));
                let p = EmojiPoint::new(x, y);
                prop_assert_eq!(t.to_emoji(t.to_screen(p)), p);
            }
        }
    }
}
