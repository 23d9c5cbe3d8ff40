//! Direct least-squares ellipse fit (Fitzgibbon, Pilu & Fisher, 1999).
//!
//! Points are normalised to their centroid with mean distance √2, the conic is
//! solved through the reduced 3×3 eigenproblem, converted to a geometric
//! ellipse in normalised coordinates and mapped back. Contour pixels are
//! treated as pixel centres, so a rasterised circle of radius `r` fits to
//! roughly `r - 0.5`.

use nalgebra::{DMatrix, Matrix3, Point2, Vector3};

use crate::Ellipse;

/// Fit an ellipse to at least five points.
///
/// Returns `None` for degenerate input (too few or collinear points) or when
/// the best conic is not a real ellipse.
pub fn fit_ellipse(points: &[Point2<f64>]) -> Option<Ellipse> {
    let n = points.len();
    if n < 5 {
        return None;
    }

    let (mx, my, scale) = normalization(points);

    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, p) in points.iter().enumerate() {
        let x = (p.x - mx) * scale;
        let y = (p.y - my) * scale;
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }
    let s = d.transpose() * &d;

    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    let s22_inv = s22.try_inverse()?;
    let m = s11 - s12 * s22_inv * s12.transpose();

    // C1 encodes 4AC - B^2 = 1; its inverse is applied on the left.
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);
    let system = c1.try_inverse()? * m;

    let a1 = constrained_eigenvector(&system)?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let normalized = conic_to_ellipse([a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]])?;
    let ellipse = Ellipse::new(
        Point2::new(
            normalized.center.x / scale + mx,
            normalized.center.y / scale + my,
        ),
        (normalized.axes.0 / scale, normalized.axes.1 / scale),
        normalized.rotation,
    );
    ellipse.is_finite().then_some(ellipse)
}

/// Centroid and the scale that brings the mean centroid distance to √2.
fn normalization(points: &[Point2<f64>]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let my = points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p.x - mx).powi(2) + (p.y - my).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let scale = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    (mx, my, scale)
}

/// Eigenvector of the reduced system that satisfies `4AC - B^2 > 0`.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let tr = a.trace();
    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in real_cubic_roots(-tr, minor_sum, -det) {
        let shifted = system - Matrix3::identity() * ev;
        let Some(v) = null_vector(&shifted) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.map_or(true, |(b, _)| ev.abs() < b) {
            best = Some((ev.abs(), v));
        }
    }
    best.map(|(_, v)| v)
}

/// Null vector of a rank-2 matrix: the adjugate row with the largest norm.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        m.row(1).transpose().cross(&m.row(2).transpose()),
        m.row(2).transpose().cross(&m.row(0).transpose()),
        m.row(0).transpose().cross(&m.row(1).transpose()),
    ];
    let best = rows
        .iter()
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))?;
    let norm = best.norm();
    if norm < 1e-15 {
        return None;
    }
    Some(best / norm)
}

/// Real roots of `x^3 + b x^2 + c x + d`.
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;
    let disc = -4.0 * p * p * p - 27.0 * q * q;

    if disc >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| {
                2.0 * r * ((theta + 2.0 * std::f64::consts::PI * k as f64) / 3.0).cos() + shift
            })
            .collect()
    } else {
        let root = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        vec![(-q / 2.0 + root).cbrt() + (-q / 2.0 - root).cbrt() + shift]
    }
}

/// Geometric form of `A x^2 + B xy + C y^2 + D x + E y + F = 0`.
fn conic_to_ellipse(coeffs: [f64; 6]) -> Option<Ellipse> {
    let sign = if coeffs[0] + coeffs[2] < 0.0 { -1.0 } else { 1.0 };
    let [a, b, c, d, e, f] = coeffs.map(|v| v * sign);

    let denom = 4.0 * a * c - b * b;
    if denom <= 0.0 {
        return None;
    }
    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;
    let f0 = f + 0.5 * (d * cx + e * cy);
    if f0 >= 0.0 {
        return None;
    }

    let mean = 0.5 * (a + c);
    let half_diff = 0.5 * ((a - c).powi(2) + b * b).sqrt();
    let lambda_max = mean + half_diff;
    let lambda_min = mean - half_diff;
    if lambda_min <= 0.0 {
        return None;
    }

    // The major eigen-direction of the quadratic form carries the short axis.
    let theta = 0.5 * b.atan2(a - c);
    let short = 2.0 * (-f0 / lambda_max).sqrt();
    let long = 2.0 * (-f0 / lambda_min).sqrt();

    Some(Ellipse::new(
        Point2::new(cx, cy),
        (short, long),
        theta.to_degrees(),
    ))
}
