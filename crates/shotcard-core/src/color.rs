//! Colour channels and crops.
//!
//! Saturation and value follow the 8-bit HSV convention, `S` scaled to
//! `0..=255`.

use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

#[inline]
fn get_rgb(src: &RgbImage, x: i64, y: i64) -> [f64; 3] {
    if x < 0 || y < 0 || x >= src.width() as i64 || y >= src.height() as i64 {
        return [0.0; 3];
    }
    let p = src.get_pixel(x as u32, y as u32).0;
    [p[0] as f64, p[1] as f64, p[2] as f64]
}

/// Bilinear sample of an RGB image; samples outside the image read as black.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_rgb(src, x0, y0);
    let p10 = get_rgb(src, x0 + 1, y0);
    let p01 = get_rgb(src, x0, y0 + 1);
    let p11 = get_rgb(src, x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// HSV saturation on the 0..=255 scale: `(max - min) * 255 / max`, 0 for black.
pub fn saturation_channel(src: &RgbImage) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b] = src.get_pixel(x, y).0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if max == 0 {
            return Luma([0]);
        }
        let s = (max - min) as f64 * 255.0 / max as f64;
        Luma([s.round() as u8])
    })
}

/// HSV value: the brightest of the three channels.
pub fn value_channel(src: &RgbImage) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let [r, g, b] = src.get_pixel(x, y).0;
        Luma([r.max(g).max(b)])
    })
}

/// Owned copy of an axis-aligned region; clipped to the image bounds.
pub fn crop_rgb(src: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    imageops::crop_imm(src, x, y, width, height).to_image()
}

pub fn crop_gray(src: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    imageops::crop_imm(src, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_separates_ink_from_paper() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        img.put_pixel(2, 0, Rgb([255, 0, 0]));
        let s = saturation_channel(&img);
        assert_eq!(s.get_pixel(0, 0)[0], 0);
        assert_eq!(s.get_pixel(1, 0)[0], 0);
        assert_eq!(s.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn value_is_channel_max() {
        let img = RgbImage::from_pixel(1, 1, Rgb([10, 200, 30]));
        assert_eq!(value_channel(&img).get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([100, 200, 50]));
        let p = sample_bilinear_rgb(&img, 0.5, 0.0);
        assert_eq!(p.0, [50, 100, 25]);
    }

    #[test]
    fn crop_keeps_requested_region() {
        let mut img = RgbImage::new(10, 10);
        img.put_pixel(6, 7, Rgb([1, 2, 3]));
        let c = crop_rgb(&img, 5, 5, 5, 5);
        assert_eq!(c.dimensions(), (5, 5));
        assert_eq!(c.get_pixel(1, 2).0, [1, 2, 3]);
    }
}
