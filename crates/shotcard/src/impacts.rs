//! Impact detection on the saturation channel.
//!
//! Impact marks are assumed to be the most saturated ink on the sheet. The
//! saturation channel is cut to an adaptive band below its maximum, opened to
//! drop speckle, and every surviving blob is replaced by its fitted ellipse.
//! The filled ellipses form the impact mask; their centres are the impacts.

use image::{GrayImage, RgbImage};
use log::debug;
use nalgebra::Point2;
use shotcard_core::geometry::to_point2;
use shotcard_core::{fit_ellipse, mask, saturation_channel, Ellipse};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::ImpactParams;

/// Output of one detection pass.
#[derive(Clone, Debug)]
pub struct ImpactDetection {
    /// Filled impact ellipses, same size as the input image.
    pub mask: GrayImage,
    /// Rounded blob centres, in contour discovery order.
    pub points: Vec<Point2<i32>>,
}

impl ImpactDetection {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Saturation-band impact detector for a rectified sheet.
#[derive(Clone, Debug, Default)]
pub struct ImpactDetector {
    params: ImpactParams,
}

impl ImpactDetector {
    pub fn new(params: ImpactParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ImpactParams {
        &self.params
    }

    /// Detect impact blobs in `image`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn detect(&self, image: &RgbImage) -> ImpactDetection {
        let blob_mask = self.blob_mask(image);
        let points: Vec<Point2<i32>> = self
            .fitted_blobs(&blob_mask)
            .into_iter()
            .map(|e| Point2::new(e.center.x.round() as i32, e.center.y.round() as i32))
            .collect();
        debug!("detected {} impact(s)", points.len());
        ImpactDetection {
            mask: blob_mask,
            points,
        }
    }

    /// Filled ellipses of the saturated blobs in `image`.
    pub fn blob_mask(&self, image: &RgbImage) -> GrayImage {
        let (w, h) = image.dimensions();
        let saturation = saturation_channel(image);
        let Some((lo, hi)) = mask::min_max(&saturation, None) else {
            return GrayImage::new(w, h);
        };
        if lo == hi {
            debug!("flat saturation ({lo}), no impact ink");
            return GrayImage::new(w, h);
        }

        let (lo, hi) = (lo as f64, hi as f64);
        let low = hi - (hi - lo) / self.params.band_divisor;
        let band = mask::in_range(&saturation, low, hi);
        let cleaned = mask::open(&band, self.params.open_radius);

        let mut blobs = GrayImage::new(w, h);
        for e in self.fitted_blobs(&cleaned) {
            mask::fill_ellipse_mut(&mut blobs, &e);
        }
        blobs
    }

    fn fitted_blobs(&self, binary: &GrayImage) -> Vec<Ellipse> {
        mask::external_contours(binary)
            .iter()
            .filter(|c| c.len() >= self.params.min_contour_points)
            .filter_map(|c| {
                let points: Vec<Point2<f64>> = c.iter().map(|&p| to_point2(p)).collect();
                fit_ellipse(&points)
            })
            .filter(|e| e.center.x.is_finite() && e.center.y.is_finite())
            .collect()
    }
}
