use image::RgbImage;
use log::info;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use shotcard_core::crop_gray;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::impacts::ImpactDetector;
use crate::refine::EllipseRefiner;
use crate::scoring::{Impact, ScoreEngine, TargetSet};
use crate::sheet::{rectify_sheet, SheetCorners, SheetLocator, SheetSegmenter};
use crate::zone::{extract_zones, Zone};
use crate::{ScoreError, ScoreParams};

/// Everything produced for one photo.
#[derive(Clone, Debug)]
pub struct ScoreResult {
    /// Sheet corners in the photo; `None` when the input was already rectified.
    pub corners: Option<SheetCorners>,
    /// The rectified sheet all coordinates below refer to.
    pub sheet: RgbImage,
    pub targets: TargetSet,
    pub impact_points: Vec<Point2<i32>>,
    pub impacts: Vec<Impact>,
}

impl ScoreResult {
    pub fn report(&self) -> ScoreReport {
        ScoreReport {
            corners: self.corners,
            targets: self.targets.clone(),
            impacts: self.impacts.clone(),
        }
    }
}

/// Serializable summary of a [`ScoreResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(default)]
    pub corners: Option<SheetCorners>,
    pub targets: TargetSet,
    pub impacts: Vec<Impact>,
}

/// Photo-to-impacts pipeline around an injected sheet segmenter.
pub struct SheetScorer<S> {
    locator: SheetLocator<S>,
    params: ScoreParams,
}

impl<S: SheetSegmenter> SheetScorer<S> {
    pub fn new(segmenter: S, params: ScoreParams) -> Self {
        Self {
            locator: SheetLocator::new(segmenter, params.sheet.clone()),
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &ScoreParams {
        &self.params
    }

    /// Locate and rectify the sheet in `photo`, then score it.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, photo), fields(width = photo.width(), height = photo.height()))
    )]
    pub fn score(&self, photo: &RgbImage) -> Result<ScoreResult, ScoreError> {
        let corners = self.locator.locate(photo)?;
        let sheet = rectify_sheet(photo, &corners, self.params.canonical_size)?;
        let mut result = score_canonical_sheet(sheet, &self.params)?;
        result.corners = Some(corners);
        Ok(result)
    }
}

/// Score a sheet that is already rectified.
///
/// Ring ellipses are fitted per zone and moved into sheet coordinates; one
/// impact pass covers the whole sheet.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(sheet, params), fields(width = sheet.width(), height = sheet.height()))
)]
pub fn score_canonical_sheet(
    sheet: RgbImage,
    params: &ScoreParams,
) -> Result<ScoreResult, ScoreError> {
    let detection = ImpactDetector::new(params.impacts.clone()).detect(&sheet);
    let refiner = EllipseRefiner::new(params.rings.clone());

    let zones: Vec<Zone> = Zone::ALL
        .into_iter()
        .filter(|z| params.zones.contains(z))
        .collect();

    let mut targets = TargetSet::new();
    for crop in extract_zones(&sheet, &zones) {
        let rect = crop.rect;
        let impact_mask = crop_gray(&detection.mask, rect.x, rect.y, rect.width, rect.height);
        let ring = refiner
            .refine(&crop.image, &impact_mask)
            .map_err(|failure| ScoreError::InvalidRingGeometry {
                zone: crop.zone,
                failure,
            })?;
        let (dx, dy) = rect.origin();
        let ring = ring.translated(dx, dy);
        info!(
            "{} ring at ({:.1}, {:.1}), axes {:.1}×{:.1}",
            crop.zone, ring.center.x, ring.center.y, ring.axes.0, ring.axes.1
        );
        targets.insert(crop.zone, ring);
    }

    let impacts = ScoreEngine::new(params.scoring.clone()).score(&targets, &detection.points)?;
    info!("scored {} impact(s)", impacts.len());

    Ok(ScoreResult {
        corners: None,
        sheet,
        targets,
        impact_points: detection.points,
        impacts,
    })
}
