//! Pixel-space geometry primitives for the preview container.
//!
//! Unlike [`crate::transform::Transform`], these are absolute container
//! pixels with the origin at the container's top-left corner.

use serde::{Deserialize, Serialize};

/// Measured size of the preview container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides are finite and strictly positive.
    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// An axis-aligned rectangle in container pixels.
///
/// Used both for the contain-fitted placement of the media and for the
/// box a user drags around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// The contain placement of media inside a container.
pub type FittedRect = Rect;

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rectangle of the given size centered at `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Whether `other` lies entirely inside this rectangle, allowing
    /// `epsilon` of floating slack on each edge.
    pub fn contains_rect(&self, other: &Rect, epsilon: f64) -> bool {
        other.left >= self.left - epsilon
            && other.top >= self.top - epsilon
            && other.right() <= self.right() + epsilon
            && other.bottom() <= self.bottom() + epsilon
    }
}

/// A point in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise `self - origin`.
    pub fn delta_from(&self, origin: &Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmeasured_sizes() {
        assert!(!Size::new(0.0, 100.0).is_measured());
        assert!(!Size::new(100.0, -1.0).is_measured());
        assert!(!Size::new(f64::NAN, 100.0).is_measured());
        assert!(Size::new(640.0, 360.0).is_measured());
    }

    #[test]
    fn test_centered_rect() {
        let rect = Rect::centered(Point::new(50.0, 40.0), 20.0, 10.0);
        assert_eq!(rect.left, 40.0);
        assert_eq!(rect.top, 35.0);
        assert_eq!(rect.right(), 60.0);
        assert_eq!(rect.bottom(), 45.0);
        assert_eq!(rect.center(), Point::new(50.0, 40.0));
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 80.0, 80.0), 0.0));
        assert!(!outer.contains_rect(&Rect::new(-1.0, 10.0, 80.0, 80.0), 0.0));
        assert!(outer.contains_rect(&Rect::new(-1e-9, 0.0, 100.0, 100.0), 1e-6));
    }

    #[test]
    fn test_point_delta() {
        let d = Point::new(15.0, 5.0).delta_from(&Point::new(10.0, 10.0));
        assert_eq!(d, Point::new(5.0, -5.0));
        assert!((Point::new(0.0, 0.0).distance_to(&Point::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
