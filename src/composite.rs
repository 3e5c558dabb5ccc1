use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::catalog::CatalogEntry;
use crate::errors::{EditError, Result};
use crate::imageops::{self, merge_horizontal, TRANSPARENT};

pub const ANIMATION_FILE_NAME: &str = "output.gif";
pub const MERGED_FILE_NAME: &str = "merged_image.png";

/// GIF delays are stored in centiseconds as a u16.
pub const MAX_FRAME_DELAY_MS: u32 = u16::MAX as u32 * 10;

const GIF_ENCODER_SPEED: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSettings {
    pub frame_delay_ms: u32,
    /// `0` loops forever.
    pub loop_count: u16,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            frame_delay_ms: 100,
            loop_count: 0,
        }
    }
}

impl AnimationSettings {
    fn repeat(&self) -> Repeat {
        match self.loop_count {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        }
    }
}

/// Decode every entry, skipping images that cannot be read.
pub fn load_frames(entries: &[CatalogEntry]) -> Vec<RgbaImage> {
    entries
        .iter()
        .filter_map(|entry| match imageops::open_rgba(&entry.path) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("skipping frame {}: {}", entry.path.display(), e);
                None
            }
        })
        .collect()
}

/// Turn images into equally sized animation frames, top-left aligned on a
/// transparent canvas as large as the biggest image. `None` when empty.
pub fn build_animation(images: &[RgbaImage], settings: &AnimationSettings) -> Option<Vec<Frame>> {
    if images.is_empty() {
        return None;
    }

    let width = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let height = images.iter().map(|i| i.height()).max().unwrap_or(0);
    let delay = Delay::from_numer_denom_ms(settings.frame_delay_ms, 1);

    let frames = images
        .iter()
        .map(|source| {
            let mut canvas = RgbaImage::from_pixel(width, height, TRANSPARENT);
            image::imageops::replace(&mut canvas, source, 0, 0);
            Frame::from_parts(canvas, 0, 0, delay)
        })
        .collect();
    Some(frames)
}

/// Encode frames as a GIF. The encoder disposes each frame to the background
/// before drawing the next and maps alpha-0 pixels to a transparent index.
pub fn write_animation(frames: Vec<Frame>, settings: &AnimationSettings, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| EditError::file_system(path, "create GIF", e))?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), GIF_ENCODER_SPEED);

    let encode_error = |source| EditError::Encode {
        path: path.to_path_buf(),
        source,
    };
    encoder.set_repeat(settings.repeat()).map_err(encode_error)?;
    encoder.encode_frames(frames).map_err(encode_error)?;
    Ok(())
}

/// Merge images left to right on a transparent canvas. `None` when empty.
pub fn build_merge(images: &[RgbaImage]) -> Option<RgbaImage> {
    merge_horizontal(images, TRANSPARENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgba};
    use std::io::BufReader;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_build_animation_pads_to_largest_frame() {
        let images = vec![solid(4, 2, [255, 0, 0, 255]), solid(2, 6, [0, 0, 255, 255])];
        let settings = AnimationSettings {
            frame_delay_ms: 250,
            loop_count: 3,
        };

        let frames = build_animation(&images, &settings).unwrap();

        assert_eq!(frames.len(), 2);
        for frame in &frames {
            assert_eq!(frame.buffer().dimensions(), (4, 6));
            let (numer, denom) = frame.delay().numer_denom_ms();
            assert_eq!(numer / denom, 250);
        }
        assert_eq!(*frames[0].buffer().get_pixel(3, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*frames[0].buffer().get_pixel(3, 2), TRANSPARENT);
        assert_eq!(*frames[1].buffer().get_pixel(2, 0), TRANSPARENT);
    }

    #[test]
    fn test_build_animation_empty_is_none() {
        assert!(build_animation(&[], &AnimationSettings::default()).is_none());
    }

    #[test]
    fn test_write_animation_round_trip() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(ANIMATION_FILE_NAME);
        let images = vec![
            solid(3, 3, [255, 0, 0, 255]),
            solid(3, 3, [0, 255, 0, 255]),
            solid(3, 3, [0, 0, 255, 255]),
        ];
        let settings = AnimationSettings {
            frame_delay_ms: 200,
            loop_count: 0,
        };

        let frames = build_animation(&images, &settings).unwrap();
        write_animation(frames, &settings, &path)?;

        let decoder = GifDecoder::new(BufReader::new(File::open(&path)?))?;
        let decoded = decoder.into_frames().collect_frames()?;
        assert_eq!(decoded.len(), 3);
        for frame in &decoded {
            let (numer, denom) = frame.delay().numer_denom_ms();
            assert_eq!(numer / denom, 200);
        }
        Ok(())
    }

    #[test]
    fn test_build_merge_layout() {
        let left = solid(2, 2, [1, 1, 1, 255]);
        let right = RgbaImage::from_fn(3, 4, |x, y| Rgba([x as u8, y as u8, 9, 255]));

        let merged = build_merge(&[left.clone(), right.clone()]).unwrap();

        assert_eq!(merged.dimensions(), (5, 4));
        for (x, y, pixel) in left.enumerate_pixels() {
            assert_eq!(merged.get_pixel(x, y), pixel);
        }
        for (x, y, pixel) in right.enumerate_pixels() {
            assert_eq!(merged.get_pixel(2 + x, y), pixel);
        }
        assert_eq!(*merged.get_pixel(0, 3), TRANSPARENT);
    }

    #[test]
    fn test_repeat_mapping() {
        let forever = AnimationSettings::default();
        assert!(matches!(forever.repeat(), Repeat::Infinite));

        let twice = AnimationSettings {
            loop_count: 2,
            ..Default::default()
        };
        assert!(matches!(twice.repeat(), Repeat::Finite(2)));
    }
}
