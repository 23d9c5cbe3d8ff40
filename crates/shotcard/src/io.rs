//! JSON configuration, report and image file helpers.

use std::fs;
use std::path::Path;

use image::{GrayImage, RgbImage};

use crate::{ScoreParams, ScoreReport};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Load pipeline parameters from JSON; missing fields take their defaults.
pub fn load_params(path: impl AsRef<Path>) -> Result<ScoreParams, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write parameters as pretty JSON.
pub fn write_params(path: impl AsRef<Path>, params: &ScoreParams) -> Result<(), IoError> {
    fs::write(path, serde_json::to_string_pretty(params)?)?;
    Ok(())
}

pub fn load_report(path: impl AsRef<Path>) -> Result<ScoreReport, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a report as pretty JSON.
pub fn write_report(path: impl AsRef<Path>, report: &ScoreReport) -> Result<(), IoError> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, IoError> {
    Ok(image::open(path)?.to_rgb8())
}

pub fn load_mask(path: impl AsRef<Path>) -> Result<GrayImage, IoError> {
    Ok(image::open(path)?.to_luma8())
}
