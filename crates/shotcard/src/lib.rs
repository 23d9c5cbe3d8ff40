//! Scoring of photographed five-ring shooting-target sheets.
//!
//! ## Quickstart
//!
//! ```no_run
//! use shotcard::{ScoreParams, SheetScorer, StaticMaskSegmenter};
//!
//! let photo = shotcard::io::load_rgb("card.jpg")?;
//! let sheet_mask = shotcard::io::load_mask("card_mask.png")?;
//!
//! let scorer = SheetScorer::new(StaticMaskSegmenter::new(sheet_mask), ScoreParams::default());
//! let result = scorer.score(&photo)?;
//! for impact in &result.impacts {
//!     println!("{} {} mm -> {}", impact.zone, impact.distance, impact.score);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Pipeline:
//! 1. A [`SheetSegmenter`] proposes sheet masks; the [`SheetLocator`] keeps the
//!    largest valid quadrilateral of the best one.
//! 2. The photo is warped onto a square canonical sheet.
//! 3. One [`ImpactDetector`] pass finds the saturated impact blobs.
//! 4. The sheet is cut into zones and the [`EllipseRefiner`] fits each ring,
//!    ignoring impact pixels.
//! 5. The [`ScoreEngine`] assigns each impact to the nearest ring and converts
//!    its offset into millimetres and a score.

mod error;
pub mod impacts;
pub mod io;
mod params;
mod pipeline;
pub mod refine;
pub mod scoring;
pub mod sheet;
mod zone;

pub use error::{RingFailure, ScoreError, SegmenterError};
pub use impacts::{ImpactDetection, ImpactDetector};
pub use params::{
    ImpactParams, RingParams, ScoreParams, ScoringParams, SheetParams, CANONICAL_SIZE,
};
pub use pipeline::{score_canonical_sheet, ScoreReport, ScoreResult, SheetScorer};
pub use refine::EllipseRefiner;
pub use scoring::{score_for_distance, Impact, RingOverlay, ScoreEngine, TargetSet};
pub use sheet::{
    find_sheet_quad, rectify_sheet, SheetCorners, SheetLocator, SheetProposal, SheetSegmenter,
    StaticMaskSegmenter,
};
pub use zone::{extract_zones, Zone, ZoneImage, ZoneRect};

pub use shotcard_core::Ellipse;
