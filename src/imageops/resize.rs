use std::fmt;

use clap::ValueEnum;
use fast_image_resize as fr;
use image::RgbaImage;
use serde::Deserialize;

use super::MAX_DIMENSION;

/// Resampling kernel used by the resize stage.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Lanczos,
    Bilinear,
    Bicubic,
    Box,
    Hamming,
}

impl ResizeFilter {
    fn algorithm(self) -> fr::ResizeAlg {
        match self {
            Self::Nearest => fr::ResizeAlg::Nearest,
            Self::Lanczos => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
            Self::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            Self::Bicubic => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            Self::Box => fr::ResizeAlg::Convolution(fr::FilterType::Box),
            Self::Hamming => fr::ResizeAlg::Convolution(fr::FilterType::Hamming),
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nearest => "nearest",
            Self::Lanczos => "lanczos",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Box => "box",
            Self::Hamming => "hamming",
        };
        f.write_str(name)
    }
}

/// Resample `image` to exactly `width x height`.
///
/// The returned error is the resampler's message; callers attach the file path.
pub fn resize(
    image: &RgbaImage,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<RgbaImage, String> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(format!(
            "target {}x{} exceeds the {}px limit",
            width, height, MAX_DIMENSION
        ));
    }
    let (src_width, src_height) = image.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| format!("cannot build source buffer: {}", e))?;

    let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8x4);

    let options = fr::ResizeOptions::new().resize_alg(filter.algorithm());
    fr::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| format!("resampling with {} failed: {}", filter, e))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| "resampled buffer has an unexpected length".to_string())
}
