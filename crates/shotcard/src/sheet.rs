//! Sheet localisation and perspective rectification.
//!
//! A segmenter proposes sheet masks for the photo resized to a fixed square.
//! The best proposal is traced, each outer contour is simplified to a polygon,
//! and the largest convex-looking quadrilateral is taken as the sheet. Its
//! corners are returned as fractions of the frame so they apply to the
//! full-resolution photo.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use log::{debug, info};
use nalgebra::Point2;
use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use shotcard_core::geometry::{
    approximate_closed_contour, order_corners, quad_angles_deg, to_point2,
};
use shotcard_core::{homography_from_4pt, mask, warp_perspective_rgb};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ScoreError, SegmenterError, SheetParams};

/// One "this is the sheet" hypothesis.
#[derive(Clone, Debug)]
pub struct SheetProposal {
    pub confidence: f32,
    /// Sheet mask; ideally the size of the image given to the segmenter.
    pub mask: GrayImage,
}

/// Produces sheet mask proposals for a photo resized to a fixed square.
pub trait SheetSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError>;
}

impl<T: SheetSegmenter + ?Sized> SheetSegmenter for &T {
    fn segment(&self, image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
        (**self).segment(image)
    }
}

impl<T: SheetSegmenter + ?Sized> SheetSegmenter for Box<T> {
    fn segment(&self, image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
        (**self).segment(image)
    }
}

/// Segmenter backed by a precomputed mask, e.g. one exported by an external
/// model.
#[derive(Clone, Debug)]
pub struct StaticMaskSegmenter {
    mask: GrayImage,
    confidence: f32,
}

impl StaticMaskSegmenter {
    pub fn new(mask: GrayImage) -> Self {
        Self {
            mask,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

impl SheetSegmenter for StaticMaskSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
        let mask = resize_mask(&self.mask, image.width(), image.height());
        Ok(vec![SheetProposal {
            confidence: self.confidence,
            mask,
        }])
    }
}

/// Sheet corners as fractions of the image size, ordered top-left,
/// top-right, bottom-right, bottom-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetCorners {
    pub corners: [Point2<f64>; 4],
}

impl SheetCorners {
    /// Corners in the pixel frame of a `width × height` image.
    pub fn to_pixels(&self, width: u32, height: u32) -> [Point2<f64>; 4] {
        self.corners
            .map(|p| Point2::new(p.x * width as f64, p.y * height as f64))
    }
}

/// Locates the sheet in a photo from the proposals of a [`SheetSegmenter`].
///
/// The photo is resized to `segment_size` squared before segmentation; the
/// returned corners are fractions of the frame.
pub struct SheetLocator<S> {
    segmenter: S,
    params: SheetParams,
}

impl<S: SheetSegmenter> SheetLocator<S> {
    pub fn new(segmenter: S, params: SheetParams) -> Self {
        Self { segmenter, params }
    }

    #[inline]
    pub fn params(&self) -> &SheetParams {
        &self.params
    }

    /// Find the sheet in `image`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn locate(&self, image: &RgbImage) -> Result<SheetCorners, ScoreError> {
        let size = self.params.segment_size;
        let resized = if image.dimensions() == (size, size) {
            image.clone()
        } else {
            imageops::resize(image, size, size, FilterType::Triangle)
        };

        let proposals = self
            .segmenter
            .segment(&resized)
            .map_err(ScoreError::Segmentation)?;
        let best = proposals
            .into_iter()
            .filter(|p| p.confidence.is_finite())
            .reduce(|best, p| if p.confidence > best.confidence { p } else { best })
            .ok_or(ScoreError::SheetNotDetected {
                reason: "no segmentation proposal",
            })?;
        debug!("best sheet proposal confidence {:.3}", best.confidence);

        let sheet_mask = mask::binarize(
            &resize_mask(&best.mask, size, size),
            self.params.mask_threshold,
        );
        let quad = find_sheet_quad(&sheet_mask, &self.params).ok_or(
            ScoreError::SheetNotDetected {
                reason: "no valid quadrilateral",
            },
        )?;

        let ordered = order_corners(quad);
        info!(
            "sheet quad area {:.0} px² in {size}×{size}",
            contour_area(&ordered.map(|p| Point::new(p.x, p.y)))
        );
        let scale = size as f64;
        Ok(SheetCorners {
            corners: ordered.map(|p| Point2::new(p.x / scale, p.y / scale)),
        })
    }
}

/// Largest quadrilateral outline in a binary mask that passes the corner
/// angle and area checks, in mask pixel coordinates.
pub fn find_sheet_quad(binary: &GrayImage, params: &SheetParams) -> Option<[Point2<f64>; 4]> {
    let frame_area = binary.width() as f64 * binary.height() as f64;
    if frame_area <= 0.0 {
        return None;
    }

    let mut best: Option<(f64, [Point2<f64>; 4])> = None;
    for contour in mask::external_contours(binary) {
        let epsilon = arc_length(&contour, true) * params.polygon_epsilon_rel;
        let mut poly = approximate_closed_contour(&contour, epsilon);
        poly.dedup();
        if poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() != 4 {
            continue;
        }
        let area = contour_area(&poly);
        let quad: [Point2<f64>; 4] = std::array::from_fn(|i| to_point2(poly[i]));

        let angles = quad_angles_deg(&quad);
        if angles
            .iter()
            .any(|a| *a < params.min_corner_angle_deg || *a > params.max_corner_angle_deg)
        {
            debug!("quad rejected, corner angles {angles:?}");
            continue;
        }

        let frac = area / frame_area;
        if frac < params.min_area_frac || frac > params.max_area_frac {
            debug!("quad rejected, area fraction {frac:.3}");
            continue;
        }

        if best.map_or(true, |(a, _)| area > a) {
            best = Some((area, quad));
        }
    }
    best.map(|(_, quad)| quad)
}

/// Warp the sheet bounded by `corners` into a `size × size` image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, corners), fields(width = image.width(), height = image.height()))
)]
pub fn rectify_sheet(
    image: &RgbImage,
    corners: &SheetCorners,
    size: u32,
) -> Result<RgbImage, ScoreError> {
    let s = size as f64;
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(s, 0.0),
        Point2::new(s, s),
        Point2::new(0.0, s),
    ];
    let src = corners.to_pixels(image.width(), image.height());
    let h_src_from_sheet =
        homography_from_4pt(&square, &src).ok_or(ScoreError::SheetNotDetected {
            reason: "degenerate sheet corners",
        })?;
    Ok(warp_perspective_rgb(image, &h_src_from_sheet, size, size))
}

fn resize_mask(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    if mask.dimensions() == (width, height) {
        mask.clone()
    } else {
        imageops::resize(mask, width, height, FilterType::Nearest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};
    use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};

    fn quad_mask(size: u32, quad: &[(i32, i32); 4]) -> GrayImage {
        let mut m = GrayImage::new(size, size);
        let poly: Vec<Point<i32>> = quad.iter().map(|&(x, y)| Point::new(x, y)).collect();
        draw_polygon_mut(&mut m, &poly, Luma([255]));
        m
    }

    fn assert_near(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        assert!((a - b).norm() <= tol, "{a:?} vs {b:?}");
    }

    struct NoSheet;

    impl SheetSegmenter for NoSheet {
        fn segment(&self, _image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
            Ok(Vec::new())
        }
    }

    struct Ranked(Vec<SheetProposal>);

    impl SheetSegmenter for Ranked {
        fn segment(&self, _image: &RgbImage) -> Result<Vec<SheetProposal>, SegmenterError> {
            Ok(self.0.clone())
        }
    }

    const TILTED: [(i32, i32); 4] = [(180, 140), (820, 110), (860, 880), (150, 840)];

    #[test]
    fn finds_tilted_quad() {
        let m = quad_mask(1000, &TILTED);
        let quad = find_sheet_quad(&m, &SheetParams::default()).expect("quad");
        let ordered = order_corners(quad);
        for (got, &(x, y)) in ordered.iter().zip(TILTED.iter()) {
            assert_near(*got, Point2::new(x as f64, y as f64), 3.0);
        }
    }

    #[test]
    fn rejects_triangles_and_small_quads() {
        let params = SheetParams::default();
        let mut tri = GrayImage::new(1000, 1000);
        let poly = [Point::new(100, 100), Point::new(900, 150), Point::new(500, 900)];
        draw_polygon_mut(&mut tri, &poly, Luma([255]));
        assert!(find_sheet_quad(&tri, &params).is_none());

        let small = quad_mask(1000, &[(100, 100), (300, 100), (300, 300), (100, 300)]);
        assert!(find_sheet_quad(&small, &params).is_none());
    }

    #[test]
    fn rejects_skewed_quad() {
        let skewed = quad_mask(1000, &[(100, 200), (600, 200), (900, 800), (400, 800)]);
        assert!(find_sheet_quad(&skewed, &SheetParams::default()).is_none());
    }

    #[test]
    fn locator_returns_fractions_for_any_photo_size() {
        let photo = RgbImage::from_pixel(1600, 1200, Rgb([90, 90, 90]));
        let segmenter = StaticMaskSegmenter::new(quad_mask(1000, &TILTED));
        let locator = SheetLocator::new(segmenter, SheetParams::default());
        let corners = locator.locate(&photo).expect("sheet");
        for (got, &(x, y)) in corners.corners.iter().zip(TILTED.iter()) {
            assert_near(*got, Point2::new(x as f64 / 1000.0, y as f64 / 1000.0), 0.004);
        }
        let px = corners.to_pixels(1600, 1200);
        assert_near(px[0], Point2::new(288.0, 168.0), 5.0);
    }

    #[test]
    fn highest_confidence_proposal_wins() {
        let good = quad_mask(1000, &TILTED);
        let segmenter = Ranked(vec![
            SheetProposal {
                confidence: 0.4,
                mask: GrayImage::new(1000, 1000),
            },
            SheetProposal {
                confidence: 0.9,
                mask: good,
            },
        ]);
        let locator = SheetLocator::new(segmenter, SheetParams::default());
        let photo = RgbImage::new(1000, 1000);
        assert!(locator.locate(&photo).is_ok());
    }

    #[test]
    fn missing_proposal_is_not_detected() {
        let locator = SheetLocator::new(NoSheet, SheetParams::default());
        let err = locator.locate(&RgbImage::new(64, 64)).unwrap_err();
        assert!(matches!(err, ScoreError::SheetNotDetected { .. }), "{err}");

        let blank = StaticMaskSegmenter::new(GrayImage::new(1000, 1000));
        let locator = SheetLocator::new(&blank, SheetParams::default());
        let err = locator.locate(&RgbImage::new(64, 64)).unwrap_err();
        assert!(matches!(err, ScoreError::SheetNotDetected { .. }), "{err}");
    }

    #[test]
    fn rectification_maps_diagonal_crossing_to_center() {
        let quad: [Point2<f64>; 4] = [
            Point2::new(100.0, 80.0),
            Point2::new(700.0, 120.0),
            Point2::new(650.0, 560.0),
            Point2::new(140.0, 520.0),
        ];
        // diagonals TL-BR and TR-BL cross at the projected sheet centre
        let (p, r) = (quad[0], quad[2] - quad[0]);
        let (q, s) = (quad[1], quad[3] - quad[1]);
        let t = ((q - p).x * s.y - (q - p).y * s.x) / (r.x * s.y - r.y * s.x);
        let cross = p + r * t;

        let mut photo = RgbImage::from_pixel(800, 600, Rgb([250, 250, 250]));
        draw_filled_circle_mut(
            &mut photo,
            (cross.x.round() as i32, cross.y.round() as i32),
            6,
            Rgb([200, 0, 0]),
        );
        let corners = SheetCorners {
            corners: quad.map(|c| Point2::new(c.x / 800.0, c.y / 600.0)),
        };
        let sheet = rectify_sheet(&photo, &corners, 1000).expect("rectify");
        assert_eq!(sheet.dimensions(), (1000, 1000));
        assert!(sheet.get_pixel(500, 500)[0] > 150 && sheet.get_pixel(500, 500)[1] < 60);
        assert!(sheet.get_pixel(100, 100)[1] > 200);
    }
}
