//! Ring fitting inside one zone crop.
//!
//! The ring is the darkest ink inside a centred circular ROI. Its band mask is
//! noisy and holed wherever an impact covers it, so the first fit is
//! reconciled with the mask in two phases:
//!
//! 1. fill: pixels inside the fitted ellipse that the mask misses are added,
//!    and the ellipse is refitted;
//! 2. trim: pixels outside the fitted ellipse are removed, and the ellipse is
//!    refitted.
//!
//! Every fit is checked against the minimum aspect ratio; a violation aborts
//! the refinement.

use image::{GrayImage, RgbImage};
use log::debug;
use nalgebra::Point2;
use shotcard_core::geometry::to_point2;
use shotcard_core::{fit_ellipse, mask, value_channel, Ellipse};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{RingFailure, RingParams};

/// Fits one ring per zone crop and reconciles it with the ink mask.
#[derive(Clone, Debug, Default)]
pub struct EllipseRefiner {
    params: RingParams,
}

impl EllipseRefiner {
    pub fn new(params: RingParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &RingParams {
        &self.params
    }

    /// Fit the ring of `crop`, ignoring pixels set in `impact_mask`.
    ///
    /// The ellipse is returned in crop-local coordinates.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, crop, impact_mask), fields(width = crop.width(), height = crop.height()))
    )]
    pub fn refine(&self, crop: &RgbImage, impact_mask: &GrayImage) -> Result<Ellipse, RingFailure> {
        let working = self.initial_mask(crop, impact_mask)?;
        let (ellipse, _) = self.converge(working)?;
        Ok(ellipse)
    }

    /// Filled circle of radius `width / roi_divisor` centred in the crop.
    pub fn roi_mask(&self, width: u32, height: u32) -> GrayImage {
        let radius = (width as f64 / self.params.roi_divisor).floor();
        let center = Point2::new((width / 2) as f64, (height / 2) as f64);
        mask::filled_ellipse(width, height, &Ellipse::circle(center, radius))
    }

    /// Dark-ink band inside the ROI, impacts removed, closed then opened.
    pub fn initial_mask(
        &self,
        crop: &RgbImage,
        impact_mask: &GrayImage,
    ) -> Result<GrayImage, RingFailure> {
        let (w, h) = crop.dimensions();
        let roi = self.roi_mask(w, h);
        let darkness = mask::invert(&value_channel(crop));
        let (lo, hi) = mask::min_max(&darkness, Some(&roi)).ok_or(RingFailure::NoContour)?;

        let (lo, hi) = (lo as f64, hi as f64);
        let low = hi - (hi - lo) / self.params.band_divisor;
        debug!("ring band [{low:.1}, {hi:.1}]");

        let band = mask::and(&mask::in_range(&darkness, low, hi), &roi);
        let band = mask::and_not(&band, impact_mask);
        let closed = mask::close(&band, self.params.morph_radius);
        Ok(mask::open(&closed, self.params.morph_radius))
    }

    /// Run the fill and trim rounds on `working`.
    ///
    /// Returns the final ellipse together with the reconciled mask.
    pub fn converge(&self, mut working: GrayImage) -> Result<(Ellipse, GrayImage), RingFailure> {
        let (w, h) = working.dimensions();
        let mut ellipse = self.fit_checked(&working)?;
        debug!("initial ring fit {ellipse:?}");

        for round in 0..self.params.fill_rounds {
            let model = model_mask(w, h, &ellipse);
            let missing = mask::xor(&model, &working);
            working = mask::or(&working, &missing);
            ellipse = self.fit_checked(&working)?;
            debug!("fill round {round}: {ellipse:?}");
        }

        for round in 0..self.params.trim_rounds {
            let model = model_mask(w, h, &ellipse);
            working = mask::and(&working, &model);
            ellipse = self.fit_checked(&working)?;
            debug!("trim round {round}: {ellipse:?}");
        }

        Ok((ellipse, working))
    }

    fn fit_checked(&self, working: &GrayImage) -> Result<Ellipse, RingFailure> {
        let contours = mask::external_contours(working);
        let contour = mask::largest_contour(&contours).ok_or(RingFailure::NoContour)?;
        let points: Vec<_> = contour.iter().map(|&p| to_point2(p)).collect();
        let ellipse = fit_ellipse(&points).ok_or(RingFailure::FitFailed)?;
        let aspect = ellipse.aspect_ratio();
        if aspect < self.params.min_aspect {
            return Err(RingFailure::AspectRatio(aspect));
        }
        Ok(ellipse)
    }
}

/// Raster of `ellipse` as a blob.
///
/// Contour points are the centres of the blob's boundary pixels, so a fit runs
/// half a pixel inside the blob; the raster is grown by that half pixel.
fn model_mask(width: u32, height: u32, ellipse: &Ellipse) -> GrayImage {
    let grown = Ellipse::new(
        ellipse.center,
        (ellipse.axes.0 + 1.0, ellipse.axes.1 + 1.0),
        ellipse.rotation,
    );
    mask::filled_ellipse(width, height, &grown)
}
