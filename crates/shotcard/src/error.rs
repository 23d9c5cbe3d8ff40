use crate::Zone;

/// Boxed error returned by a sheet segmenter.
pub type SegmenterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a ring could not be fitted inside one zone.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum RingFailure {
    #[error("no ring contour in the zone mask")]
    NoContour,
    #[error("ellipse fit failed")]
    FitFailed,
    #[error("aspect ratio {0:.3} below the accepted minimum")]
    AspectRatio(f64),
}

/// Errors returned by the scoring pipeline. Any of them aborts the image.
#[derive(thiserror::Error, Debug)]
pub enum ScoreError {
    #[error("sheet not detected: {reason}")]
    SheetNotDetected { reason: &'static str },
    #[error("invalid ring geometry in zone {zone}: {failure}")]
    InvalidRingGeometry { zone: Zone, failure: RingFailure },
    #[error("no target zone available for scoring")]
    NoZoneFound,
    #[error("sheet segmentation failed")]
    Segmentation(#[source] SegmenterError),
}
