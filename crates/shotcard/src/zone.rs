//! The five target zones of a sheet and their crops.

use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use shotcard_core::crop_rgb;

/// One of the five printed rings.
///
/// Variants are declared in scoring priority order, so the derived `Ord` is
/// the tie-break order used when an impact is equidistant from two rings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    TopLeft,
    TopRight,
    Center,
    BottomLeft,
    BottomRight,
}

impl Zone {
    /// Every zone, in priority order.
    pub const ALL: [Zone; 5] = [
        Zone::TopLeft,
        Zone::TopRight,
        Zone::Center,
        Zone::BottomLeft,
        Zone::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::TopLeft => "TOP_LEFT",
            Zone::TopRight => "TOP_RIGHT",
            Zone::Center => "CENTER",
            Zone::BottomLeft => "BOTTOM_LEFT",
            Zone::BottomRight => "BOTTOM_RIGHT",
        }
    }

    /// Crop of a `width × height` sheet that holds this zone's ring.
    ///
    /// Quadrants split each axis at its midpoint; `Center` spans the middle
    /// half of both axes and overlaps all four quadrants.
    pub fn crop_rect(self, width: u32, height: u32) -> ZoneRect {
        let (mx, my) = (width / 2, height / 2);
        match self {
            Zone::TopLeft => ZoneRect::new(0, 0, mx, my),
            Zone::TopRight => ZoneRect::new(mx, 0, width - mx, my),
            Zone::BottomLeft => ZoneRect::new(0, my, mx, height - my),
            Zone::BottomRight => ZoneRect::new(mx, my, width - mx, height - my),
            Zone::Center => {
                let (qx, qy) = (width / 4, height / 4);
                ZoneRect::new(qx, qy, width - 2 * qx, height - 2 * qy)
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned crop in sheet pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ZoneRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Offset that maps crop-local coordinates to sheet coordinates.
    #[inline]
    pub fn origin(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

/// A zone crop cut from the canonical sheet.
#[derive(Clone, Debug)]
pub struct ZoneImage {
    pub zone: Zone,
    pub rect: ZoneRect,
    pub image: RgbImage,
}

/// Cut the requested zones out of `sheet`, in the order given.
pub fn extract_zones(sheet: &RgbImage, zones: &[Zone]) -> Vec<ZoneImage> {
    zones
        .iter()
        .map(|&zone| {
            let rect = zone.crop_rect(sheet.width(), sheet.height());
            ZoneImage {
                zone,
                rect,
                image: crop_rgb(sheet, rect.x, rect.y, rect.width, rect.height),
            }
        })
        .collect()
}
