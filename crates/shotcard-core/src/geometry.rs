//! Planar helpers shared by the sheet, ring and scoring stages.
//!
//! Angles are radians unless a name says otherwise. Image space is y-down, so
//! a positive angle turns from +x towards +y.

use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use nalgebra::Point2;

use crate::Ellipse;

#[inline]
pub fn distance(a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a - b).norm()
}

/// Direction from `from` towards `to`.
#[inline]
pub fn angle(from: Point2<f64>, to: Point2<f64>) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Rotate `point` about `center` by `angle`.
pub fn rotate_point(center: Point2<f64>, point: Point2<f64>, angle: f64) -> Point2<f64> {
    let (s, c) = angle.sin_cos();
    let tx = point.x - center.x;
    let ty = point.y - center.y;
    Point2::new(tx * c - ty * s + center.x, tx * s + ty * c + center.y)
}

/// Boundary point at parameter `angle` of the ellipse's axis-aligned frame.
///
/// The ellipse rotation is NOT applied; callers rotate the result themselves.
pub fn point_on_ellipse(ellipse: &Ellipse, angle: f64) -> Point2<f64> {
    Point2::new(
        ellipse.center.x + angle.cos() * ellipse.axes.0 * 0.5,
        ellipse.center.y + angle.sin() * ellipse.axes.1 * 0.5,
    )
}

/// Interior angle at each vertex of a quadrilateral, in degrees.
///
/// Entry `i` is the angle at vertex `i + 1` between its two neighbours.
pub fn quad_angles_deg(quad: &[Point2<f64>; 4]) -> [f64; 4] {
    std::array::from_fn(|i| {
        let p1 = quad[i];
        let p2 = quad[(i + 1) % 4];
        let p3 = quad[(i + 2) % 4];
        let u = p1 - p2;
        let v = p3 - p2;
        let denom = u.norm() * v.norm();
        if denom <= f64::EPSILON {
            return 0.0;
        }
        (u.dot(&v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
    })
}

/// Douglas-Peucker simplification of a closed pixel contour.
///
/// The contour is split at two mutually distant points and each half is
/// simplified as an open chain, so the result does not depend on where
/// tracing happened to start.
pub fn approximate_closed_contour(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 || epsilon.is_nan() || epsilon <= 0.0 {
        return points.to_vec();
    }

    let sq_dist = |p: Point<i32>, q: Point<i32>| {
        let (dx, dy) = ((p.x - q.x) as i64, (p.y - q.y) as i64);
        dx * dx + dy * dy
    };
    let farthest_from = |origin: Point<i32>| {
        (0..n)
            .max_by_key(|&i| sq_dist(origin, points[i]))
            .unwrap_or(0)
    };
    let a = farthest_from(points[0]);
    let b = farthest_from(points[a]);
    if sq_dist(points[a], points[b]) == 0 {
        return vec![points[a]];
    }

    let chain = |from: usize, to: usize| {
        let mut out = Vec::new();
        let mut i = from;
        loop {
            out.push(points[i]);
            if i == to {
                break;
            }
            i = (i + 1) % n;
        }
        out
    };

    let mut out = approximate_polygon_dp(&chain(a, b), epsilon, false);
    let back = approximate_polygon_dp(&chain(b, a), epsilon, false);
    out.pop();
    out.extend_from_slice(&back[..back.len().saturating_sub(1)]);
    out
}

#[inline]
pub fn to_point2(p: Point<i32>) -> Point2<f64> {
    Point2::new(p.x as f64, p.y as f64)
}

/// Reorder four corners as top-left, top-right, bottom-right, bottom-left.
///
/// Corners are sorted clockwise (in y-down image space) about their centroid,
/// then rotated so the corner with the smallest `x + y` comes first.
pub fn order_corners(quad: [Point2<f64>; 4]) -> [Point2<f64>; 4] {
    let cx = quad.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = quad.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let centroid = Point2::new(cx, cy);

    let mut sorted = quad;
    sorted.sort_by(|p, q| angle(centroid, *p).total_cmp(&angle(centroid, *q)));

    let start = (0..4)
        .min_by(|&i, &j| (sorted[i].x + sorted[i].y).total_cmp(&(sorted[j].x + sorted[j].y)))
        .unwrap_or(0);
    std::array::from_fn(|k| sorted[(start + k) % 4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn angle_points_from_first_to_second() {
        let o = Point2::new(0.0, 0.0);
        assert_relative_eq!(angle(o, Point2::new(1.0, 0.0)), 0.0);
        assert_relative_eq!(angle(o, Point2::new(0.0, 1.0)), FRAC_PI_2);
        assert_relative_eq!(angle(o, Point2::new(-1.0, 0.0)), PI);
    }

    #[test]
    fn rotate_quarter_turn() {
        let p = rotate_point(Point2::new(1.0, 1.0), Point2::new(2.0, 1.0), FRAC_PI_2);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn point_on_ellipse_uses_half_axes() {
        let e = Ellipse::new(Point2::new(10.0, 20.0), (8.0, 4.0), 45.0);
        let p = point_on_ellipse(&e, 0.0);
        assert_relative_eq!(p.x, 14.0);
        assert_relative_eq!(p.y, 20.0);
        let q = point_on_ellipse(&e, FRAC_PI_2);
        assert_relative_eq!(q.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 22.0);
    }

    #[test]
    fn square_has_right_angles() {
        let sq = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        for a in quad_angles_deg(&sq) {
            assert_relative_eq!(a, 90.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn dense_square_outline_simplifies_to_corners() {
        let mut outline = Vec::new();
        for i in 0..100 {
            outline.push(Point::new(i, 0));
        }
        for i in 0..100 {
            outline.push(Point::new(100, i));
        }
        for i in 0..100 {
            outline.push(Point::new(100 - i, 100));
        }
        for i in 0..100 {
            outline.push(Point::new(0, 100 - i));
        }
        // start tracing mid-edge
        outline.rotate_left(37);

        let approx = approximate_closed_contour(&outline, 4.0);
        assert_eq!(approx.len(), 4, "{approx:?}");
        let ordered = order_corners(std::array::from_fn(|i| to_point2(approx[i])));
        assert_eq!(ordered[0], Point2::new(0.0, 0.0));
        assert_eq!(ordered[1], Point2::new(100.0, 0.0));
        assert_eq!(ordered[2], Point2::new(100.0, 100.0));
        assert_eq!(ordered[3], Point2::new(0.0, 100.0));
    }

    #[test]
    fn degenerate_contours_pass_through() {
        let dot = vec![Point::new(3, 4); 5];
        assert_eq!(approximate_closed_contour(&dot, 1.0), vec![Point::new(3, 4)]);
        let pair = [Point::new(0, 0), Point::new(5, 0)];
        assert_eq!(approximate_closed_contour(&pair, 1.0), pair.to_vec());
    }

    #[test]
    fn order_corners_handles_any_winding() {
        let ccw = [
            Point2::new(12.0, 88.0),
            Point2::new(91.0, 95.0),
            Point2::new(85.0, 9.0),
            Point2::new(5.0, 14.0),
        ];
        let ordered = order_corners(ccw);
        assert_eq!(ordered[0], Point2::new(5.0, 14.0));
        assert_eq!(ordered[1], Point2::new(85.0, 9.0));
        assert_eq!(ordered[2], Point2::new(91.0, 95.0));
        assert_eq!(ordered[3], Point2::new(12.0, 88.0));
    }
}
