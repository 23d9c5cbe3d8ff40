use serde::{Deserialize, Serialize};

use crate::Zone;

/// Working resolution of the rectified sheet.
pub const CANONICAL_SIZE: u32 = 1000;

/// Sheet localisation: segmentation proposal to validated quadrilateral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetParams {
    /// Square resolution the segmenter sees and the quad is searched in.
    pub segment_size: u32,
    /// Mask pixels strictly above this value belong to the sheet.
    pub mask_threshold: u8,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub polygon_epsilon_rel: f64,
    pub min_corner_angle_deg: f64,
    pub max_corner_angle_deg: f64,
    /// Accepted quad area as a fraction of the `segment_size²` frame.
    pub min_area_frac: f64,
    pub max_area_frac: f64,
}

impl Default for SheetParams {
    fn default() -> Self {
        Self {
            segment_size: CANONICAL_SIZE,
            mask_threshold: 127,
            polygon_epsilon_rel: 0.01,
            min_corner_angle_deg: 70.0,
            max_corner_angle_deg: 110.0,
            min_area_frac: 0.1,
            max_area_frac: 0.9,
        }
    }
}

/// Impact blob detection on the saturation channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParams {
    /// The saturation band is `[max - (max - min) / band_divisor, max]`.
    pub band_divisor: f64,
    /// Radius of the diamond element used to open the band mask.
    pub open_radius: u8,
    /// Contours with fewer points are dropped before fitting.
    pub min_contour_points: usize,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            band_divisor: 1.4,
            open_radius: kernel_radius(CANONICAL_SIZE),
            min_contour_points: 5,
        }
    }
}

/// Ring refinement inside one zone crop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingParams {
    /// ROI circle radius is `crop_width / roi_divisor`.
    pub roi_divisor: f64,
    /// The inverted-value band is `[max - (max - min) / band_divisor, max]`.
    pub band_divisor: f64,
    /// Radius of the diamond element used for close/open.
    pub morph_radius: u8,
    pub fill_rounds: usize,
    pub trim_rounds: usize,
    /// Smallest accepted `min(axis) / max(axis)`.
    pub min_aspect: f64,
}

impl Default for RingParams {
    fn default() -> Self {
        Self {
            roi_divisor: 2.2,
            band_divisor: 1.5,
            morph_radius: kernel_radius(CANONICAL_SIZE),
            fill_rounds: 5,
            trim_rounds: 5,
            min_aspect: 0.7,
        }
    }
}

/// Pixel to millimetre conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Physical radius of the fitted ring, in millimetres.
    pub ring_radius_mm: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            ring_radius_mm: 25.0,
        }
    }
}

/// Configuration for the whole scoring pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    /// Side of the rectified sheet, in pixels.
    pub canonical_size: u32,
    pub sheet: SheetParams,
    pub impacts: ImpactParams,
    pub rings: RingParams,
    pub scoring: ScoringParams,
    /// Zones that carry a ring. Scoring priority follows `Zone::ALL`
    /// regardless of the order listed here.
    pub zones: Vec<Zone>,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self::for_canonical_size(CANONICAL_SIZE)
    }
}

impl ScoreParams {
    /// Defaults with the morphology kernels scaled to `size`.
    pub fn for_canonical_size(size: u32) -> Self {
        let radius = kernel_radius(size);
        Self {
            canonical_size: size,
            sheet: SheetParams::default(),
            impacts: ImpactParams {
                open_radius: radius,
                ..ImpactParams::default()
            },
            rings: RingParams {
                morph_radius: radius,
                ..RingParams::default()
            },
            scoring: ScoringParams::default(),
            zones: Zone::ALL.to_vec(),
        }
    }
}

/// Diamond radius matching a `size / 200` wide kernel.
fn kernel_radius(size: u32) -> u8 {
    (size / 400).clamp(1, u8::MAX as u32) as u8
}
