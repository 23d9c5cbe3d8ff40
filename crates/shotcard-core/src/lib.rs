//! Core types and utilities for shooting-target scoring.
//!
//! This crate is purely geometric: planar helpers, a rotated-ellipse type with
//! a direct least-squares fit, a 4-point homography with an RGB perspective
//! warp, and the binary-mask algebra the pipeline stages are built from. It
//! knows nothing about zones, scores or segmentation models.

mod color;
mod ellipse;
mod fit;
pub mod geometry;
mod homography;
mod logger;
pub mod mask;

pub use color::{crop_gray, crop_rgb, sample_bilinear_rgb, saturation_channel, value_channel};
pub use ellipse::Ellipse;
pub use fit::fit_ellipse;
pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
