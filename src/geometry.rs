//! Plain 2D geometry in `f64`.
//!
//! Graph-space math stays in double precision so that pan/zoom round trips are
//! exact to well below a pixel; the egui layer converts to `f32` only when it
//! paints.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A point or displacement in 2D.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
}

/// Shorthand constructor for [`Vector2`].
pub const fn vec2(x: f64, y: f64) -> Vector2 {
    Vector2 { x, y }
}

impl Vector2 {
    /// The origin.
    pub const ZERO: Vector2 = vec2(0.0, 0.0);

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Distance between two points.
    pub fn distance(self, other: Vector2) -> f64 {
        (self - other).length()
    }

    /// Component-wise maximum.
    pub fn max(self, other: Vector2) -> Vector2 {
        vec2(self.x.max(other.x), self.y.max(other.y))
    }

    /// Rounds both components to the nearest integer.
    pub fn round(self) -> Vector2 {
        vec2(self.x.round(), self.y.round())
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        vec2(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        vec2(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Vector2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, rhs: f64) -> Vector2 {
        vec2(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;
    fn div(self, rhs: f64) -> Vector2 {
        vec2(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 {
        vec2(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle stored as origin plus extent.
///
/// Width and height may be negative while a rectangle is being dragged out;
/// [`Rect::normalized`] flips it into canonical form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from origin and extent.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle from its top-left corner and size.
    pub fn from_pos_size(pos: Vector2, size: Vector2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Top-left corner.
    pub fn min(&self) -> Vector2 {
        vec2(self.x, self.y)
    }

    /// Bottom-right corner.
    pub fn max(&self) -> Vector2 {
        vec2(self.x + self.width, self.y + self.height)
    }

    /// Extent as a vector.
    pub fn size(&self) -> Vector2 {
        vec2(self.width, self.height)
    }

    /// Center point.
    pub fn center(&self) -> Vector2 {
        vec2(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Returns the same area with non-negative width and height.
    pub fn normalized(&self) -> Rect {
        let w = self.width.abs();
        let h = self.height.abs();
        let x = if self.width < 0.0 { self.x - w } else { self.x };
        let y = if self.height < 0.0 { self.y - h } else { self.y };
        Rect::new(x, y, w, h)
    }

    /// Strict containment test: points on the border are outside.
    pub fn contains(&self, p: Vector2) -> bool {
        p.x > self.x && p.x < self.x + self.width && p.y > self.y && p.y < self.y + self.height
    }

    /// Whether two (normalized) rectangles share any area or border.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x > other.x + other.width
            || self.y > other.y + other.height
            || self.x + self.width < other.x
            || self.y + self.height < other.y)
    }

    /// Intersection with positive area, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Area of a normalized rectangle.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_flips_negative_extent() {
        let r = Rect::new(100.0, 50.0, -40.0, -20.0).normalized();
        assert_eq!(r, Rect::new(60.0, 30.0, 40.0, 20.0));
    }

    #[test]
    fn contains_excludes_border() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(vec2(5.0, 5.0)));
        assert!(!r.contains(vec2(0.0, 5.0)));
        assert!(!r.contains(vec2(10.0, 5.0)));
    }

    #[test]
    fn intersection_requires_positive_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));

        let touching = Rect::new(10.0, 0.0, 5.0, 5.0);
        assert!(a.intersection(&touching).is_none());
        assert!(a.overlaps(&touching));
    }

    #[test]
    fn inflate_grows_every_side() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0).inflate(7.0);
        assert_eq!(r, Rect::new(3.0, 3.0, 34.0, 34.0));
    }
}
