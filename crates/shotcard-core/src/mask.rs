//! Binary-mask algebra on `image::GrayImage`.
//!
//! Masks are 0 / 255 images. Every operation returns a fresh buffer; inputs
//! are never modified in place.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::geometry::contour_area;
use imageproc::morphology;
use imageproc::point::Point;

use crate::Ellipse;

pub const ON: u8 = 255;
pub const OFF: u8 = 0;

#[inline]
fn bit(v: bool) -> Luma<u8> {
    Luma([if v { ON } else { OFF }])
}

/// `(min, max)` of `channel`, restricted to pixels where `within` is set.
///
/// Returns `None` when no pixel is selected.
pub fn min_max(channel: &GrayImage, within: Option<&GrayImage>) -> Option<(u8, u8)> {
    let mut range: Option<(u8, u8)> = None;
    for (x, y, p) in channel.enumerate_pixels() {
        if let Some(roi) = within {
            if roi.get_pixel(x, y)[0] == OFF {
                continue;
            }
        }
        let v = p[0];
        range = Some(match range {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    range
}

/// Pixels whose value lies in `[low, high]`.
pub fn in_range(channel: &GrayImage, low: f64, high: f64) -> GrayImage {
    GrayImage::from_fn(channel.width(), channel.height(), |x, y| {
        let v = channel.get_pixel(x, y)[0] as f64;
        bit(v >= low && v <= high)
    })
}

/// Pixels strictly brighter than `threshold`.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        bit(image.get_pixel(x, y)[0] > threshold)
    })
}

/// Photometric inversion, `255 - v`.
pub fn invert(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([255 - image.get_pixel(x, y)[0]])
    })
}

fn combine(a: &GrayImage, b: &GrayImage, op: impl Fn(bool, bool) -> bool) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y)[0] != OFF;
        let pb = b.get_pixel_checked(x, y).is_some_and(|p| p[0] != OFF);
        bit(op(pa, pb))
    })
}

pub fn and(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine(a, b, |p, q| p && q)
}

pub fn or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine(a, b, |p, q| p || q)
}

pub fn xor(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine(a, b, |p, q| p != q)
}

/// `a` with every pixel of `b` cleared.
pub fn and_not(a: &GrayImage, b: &GrayImage) -> GrayImage {
    combine(a, b, |p, q| p && !q)
}

/// Morphological opening with a diamond element of radius `radius`.
pub fn open(mask: &GrayImage, radius: u8) -> GrayImage {
    morphology::open(mask, Norm::L1, radius)
}

/// Morphological closing with a diamond element of radius `radius`.
pub fn close(mask: &GrayImage, radius: u8) -> GrayImage {
    morphology::close(mask, Norm::L1, radius)
}

pub fn count_on(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != OFF).count()
}

/// Outer borders of the top-level blobs, in tracing order.
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Contour enclosing the largest area; first one wins on ties.
pub fn largest_contour(contours: &[Vec<Point<i32>>]) -> Option<&[Point<i32>]> {
    let mut best: Option<(f64, &[Point<i32>])> = None;
    for c in contours {
        let area = contour_area(c);
        if best.map_or(true, |(a, _)| area > a) {
            best = Some((area, c.as_slice()));
        }
    }
    best.map(|(_, c)| c)
}

/// Draw `ellipse` filled into `mask`; pixel centres inside or on the boundary
/// are set.
pub fn fill_ellipse_mut(mask: &mut GrayImage, ellipse: &Ellipse) {
    if !ellipse.is_finite() || mask.width() == 0 || mask.height() == 0 {
        return;
    }
    let (x0, y0, x1, y1) = ellipse.bounds();
    let max_x = mask.width() as f64 - 1.0;
    let max_y = mask.height() as f64 - 1.0;
    if x0 > max_x || y0 > max_y || x1 < 0.0 || y1 < 0.0 {
        return;
    }
    let (xa, xb) = (x0.floor().max(0.0) as u32, x1.ceil().min(max_x) as u32);
    let (ya, yb) = (y0.floor().max(0.0) as u32, y1.ceil().min(max_y) as u32);
    for y in ya..=yb {
        for x in xa..=xb {
            if ellipse.contains(x as f64, y as f64) {
                mask.put_pixel(x, y, Luma([ON]));
            }
        }
    }
}

/// Fresh `width × height` mask holding only the filled ellipse.
pub fn filled_ellipse(width: u32, height: u32, ellipse: &Ellipse) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    fill_ellipse_mut(&mut mask, ellipse);
    mask
}
