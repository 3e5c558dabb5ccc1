pub mod border;
pub mod color;
pub mod keying;
pub mod merge;
pub mod resize;

pub use border::add_border;
pub use color::parse_color;
pub use keying::{key_background, key_transparent, key_white, TRANSPARENT};
pub use merge::merge_horizontal;
pub use resize::{resize, ResizeFilter};

use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::errors::{EditError, Result};

/// Largest width or height the editor will allocate for an output image.
pub const MAX_DIMENSION: u32 = 16_384;

/// Decode any supported image and convert it to 8-bit RGBA.
pub fn open_rgba(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.into_rgba8())
        .map_err(|source| EditError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| EditError::Encode {
            path: path.to_path_buf(),
            source,
        })
}
