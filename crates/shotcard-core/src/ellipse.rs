use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Rotated ellipse in rotated-rectangle form.
///
/// `axes` are the FULL axis lengths `(width, height)` in pixels. `width` lies
/// along `rotation`, measured in degrees from +x towards +y (image space,
/// y down) and kept in `[0, 180)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2<f64>,
    pub axes: (f64, f64),
    pub rotation: f64,
}

impl Ellipse {
    pub fn new(center: Point2<f64>, axes: (f64, f64), rotation: f64) -> Self {
        Self {
            center,
            axes,
            rotation: rotation.rem_euclid(180.0),
        }
    }

    /// Circle of the given radius.
    pub fn circle(center: Point2<f64>, radius: f64) -> Self {
        Self::new(center, (2.0 * radius, 2.0 * radius), 0.0)
    }

    /// `min(axis) / max(axis)`, in `(0, 1]` for a valid ellipse.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.axes;
        let max = w.max(h);
        if max <= 0.0 {
            return 0.0;
        }
        w.min(h) / max
    }

    pub fn is_finite(&self) -> bool {
        self.center.x.is_finite()
            && self.center.y.is_finite()
            && self.axes.0.is_finite()
            && self.axes.1.is_finite()
            && self.rotation.is_finite()
    }

    /// Same center and rotation, both axes multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            axes: (self.axes.0 * factor, self.axes.1 * factor),
            ..*self
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            center: self.center + Vector2::new(dx, dy),
            ..*self
        }
    }

    /// Inside-or-on test for a point in the ellipse's frame.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let a = 0.5 * self.axes.0;
        let b = 0.5 * self.axes.1;
        if a <= 0.0 || b <= 0.0 {
            return false;
        }
        let (s, c) = self.rotation.to_radians().sin_cos();
        let dx = x - self.center.x;
        let dy = y - self.center.y;
        let u = (dx * c + dy * s) / a;
        let v = (-dx * s + dy * c) / b;
        u * u + v * v <= 1.0
    }

    /// Axis-aligned bounding box `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let a = 0.5 * self.axes.0;
        let b = 0.5 * self.axes.1;
        let (s, c) = self.rotation.to_radians().sin_cos();
        let ex = ((a * c).powi(2) + (b * s).powi(2)).sqrt();
        let ey = ((a * s).powi(2) + (b * c).powi(2)).sqrt();
        (
            self.center.x - ex,
            self.center.y - ey,
            self.center.x + ex,
            self.center.y + ey,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_is_normalized() {
        let e = Ellipse::new(Point2::new(0.0, 0.0), (4.0, 2.0), -30.0);
        assert_relative_eq!(e.rotation, 150.0);
    }

    #[test]
    fn aspect_ratio_is_symmetric() {
        let a = Ellipse::new(Point2::new(0.0, 0.0), (100.0, 50.0), 0.0);
        let b = Ellipse::new(Point2::new(0.0, 0.0), (50.0, 100.0), 0.0);
        assert_relative_eq!(a.aspect_ratio(), 0.5);
        assert_relative_eq!(b.aspect_ratio(), 0.5);
    }

    #[test]
    fn contains_respects_rotation() {
        let e = Ellipse::new(Point2::new(10.0, 10.0), (20.0, 4.0), 90.0);
        assert!(e.contains(10.0, 19.0));
        assert!(!e.contains(19.0, 10.0));
    }

    #[test]
    fn scaled_and_translated_keep_shape() {
        let e = Ellipse::new(Point2::new(1.0, 2.0), (10.0, 8.0), 20.0);
        let g = e.scaled(2.0).translated(5.0, -2.0);
        assert_relative_eq!(g.center.x, 6.0);
        assert_relative_eq!(g.center.y, 0.0);
        assert_relative_eq!(g.axes.0, 20.0);
        assert_relative_eq!(g.axes.1, 16.0);
        assert_relative_eq!(g.rotation, 20.0);
    }

    #[test]
    fn bounds_of_rotated_ellipse() {
        let e = Ellipse::new(Point2::new(0.0, 0.0), (20.0, 4.0), 90.0);
        let (x0, y0, x1, y1) = e.bounds();
        assert_relative_eq!(x0, -2.0, epsilon = 1e-9);
        assert_relative_eq!(x1, 2.0, epsilon = 1e-9);
        assert_relative_eq!(y0, -10.0, epsilon = 1e-9);
        assert_relative_eq!(y1, 10.0, epsilon = 1e-9);
    }
}
