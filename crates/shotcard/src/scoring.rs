//! Zone assignment, millimetre distance and score for each impact.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use shotcard_core::geometry::{angle, distance, point_on_ellipse, rotate_point};
use shotcard_core::Ellipse;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{ScoreError, ScoringParams, Zone};

/// Highest score, for an impact on the ring centre.
pub const MAX_SCORE: u32 = 570;
/// Impacts farther out than this many millimetres score zero.
pub const MAX_SCORING_DISTANCE_MM: u32 = 48;
const INNER_MM: u32 = 5;
const INNER_STEP: u32 = 6;
const OUTER_STEP: u32 = 3;

/// Scale factors of the printed scoring rings relative to the fitted ring.
pub const OVERLAY_RING_SCALES: [f64; 5] = [0.2, 0.6, 1.0, 1.4, 1.8];
/// Scale factor of the cross-hair tips.
pub const OVERLAY_CROSS_SCALE: f64 = 2.2;

/// One scored impact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Distance to the ring centre, in millimetres.
    pub distance: u32,
    pub score: u32,
    pub zone: Zone,
    /// Direction from the impact to the ring centre plus 180°, in `[0, 360)`.
    pub angle: f64,
    /// Number of impacts this record stands for; always 1.
    pub amount: u32,
}

/// Score for a distance from the ring centre, in millimetres.
///
/// Each of the first 5 mm costs 6 points and every further millimetre up to
/// 48 mm costs 3. Beyond 48 mm the impact scores nothing.
pub fn score_for_distance(distance_mm: u32) -> u32 {
    if distance_mm > MAX_SCORING_DISTANCE_MM {
        return 0;
    }
    let inner = distance_mm.min(INNER_MM);
    let outer = distance_mm.saturating_sub(INNER_MM);
    MAX_SCORE.saturating_sub(INNER_STEP * inner + OUTER_STEP * outer)
}

/// Ring ellipse per zone, in sheet coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet {
    rings: BTreeMap<Zone, Ellipse>,
}

/// Geometry a renderer needs to draw one target.
#[derive(Clone, Debug, PartialEq)]
pub struct RingOverlay {
    /// Scoring rings, innermost first.
    pub rings: [Ellipse; 5],
    /// Vertical then horizontal cross-hair, as `(start, end)` pairs.
    pub cross: [(Point2<f64>, Point2<f64>); 2],
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zone: Zone, ring: Ellipse) -> Option<Ellipse> {
        self.rings.insert(zone, ring)
    }

    pub fn get(&self, zone: Zone) -> Option<&Ellipse> {
        self.rings.get(&zone)
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Rings in zone priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Zone, &Ellipse)> {
        Zone::ALL
            .iter()
            .filter_map(|&z| self.rings.get(&z).map(|e| (z, e)))
    }

    /// Zone whose ring centre is closest to `point`.
    ///
    /// Zones are visited in `Zone::ALL` order and only a strictly closer
    /// centre replaces the current best, so ties go to the earlier zone.
    pub fn nearest_zone(&self, point: Point2<f64>) -> Option<Zone> {
        let mut best: Option<(f64, Zone)> = None;
        for (zone, ring) in self.iter() {
            let d = distance(point, ring.center);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, zone));
            }
        }
        best.map(|(_, zone)| zone)
    }

    /// Scoring rings and cross-hair for `zone`.
    pub fn overlay_rings(&self, zone: Zone) -> Option<RingOverlay> {
        let ring = self.get(zone)?;
        let tip = ring.scaled(OVERLAY_CROSS_SCALE);
        let at = |deg: f64| point_on_ellipse(&tip, deg.to_radians());
        Some(RingOverlay {
            rings: OVERLAY_RING_SCALES.map(|s| ring.scaled(s)),
            cross: [(at(90.0), at(270.0)), (at(180.0), at(0.0))],
        })
    }
}

/// Turns impact points into scored [`Impact`] records against a
/// [`TargetSet`] of fitted rings.
#[derive(Clone, Debug, Default)]
pub struct ScoreEngine {
    params: ScoringParams,
}

impl ScoreEngine {
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Score every impact against the nearest ring.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, targets, impacts), fields(rings = targets.len(), impacts = impacts.len()))
    )]
    pub fn score(
        &self,
        targets: &TargetSet,
        impacts: &[Point2<i32>],
    ) -> Result<Vec<Impact>, ScoreError> {
        impacts
            .iter()
            .map(|p| self.score_impact(targets, Point2::new(p.x as f64, p.y as f64)))
            .collect()
    }

    pub fn score_impact(
        &self,
        targets: &TargetSet,
        impact: Point2<f64>,
    ) -> Result<Impact, ScoreError> {
        let zone = targets
            .nearest_zone(impact)
            .ok_or(ScoreError::NoZoneFound)?;
        let ring = targets.get(zone).ok_or(ScoreError::NoZoneFound)?;

        let raw = angle(impact, ring.center);
        let distance = self.distance_mm(ring, impact);
        let score = score_for_distance(distance);
        debug!(
            "impact ({:.0}, {:.0}) -> {zone} at {distance} mm, score {score}",
            impact.x, impact.y
        );
        Ok(Impact {
            distance,
            score,
            zone,
            angle: (raw.to_degrees() + 180.0).rem_euclid(360.0),
            amount: 1,
        })
    }

    /// Distance from the ring centre in millimetres.
    ///
    /// The pixel distance is divided by the ring's own radius in the
    /// impact's direction, so residual ellipticity is compensated.
    pub fn distance_mm(&self, ring: &Ellipse, impact: Point2<f64>) -> u32 {
        let center = ring.center;
        let offset = distance(impact, center);
        if offset == 0.0 {
            return 0;
        }

        let rotation = ring.rotation.to_radians();
        let local = angle(impact, center) - rotation;
        let border = rotate_point(center, point_on_ellipse(ring, local), rotation + PI);
        let radius = distance(border, center);
        if radius <= f64::EPSILON {
            return u32::MAX;
        }
        (self.params.ring_radius_mm * offset / radius).round_ties_even() as u32
    }
}
