use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};

/// Concatenate `frames` left to right on a canvas of `sum(width) x max(height)`
/// filled with `background`. Every frame sits on row 0, so shorter frames leave
/// background below them. Returns `None` for an empty slice.
pub fn merge_horizontal<I, P, S>(frames: &[I], background: P) -> Option<ImageBuffer<P, Vec<S>>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    if frames.is_empty() {
        return None;
    }

    let width = frames.iter().map(|f| f.width()).sum();
    let height = frames.iter().map(|f| f.height()).max().unwrap_or(0);

    let mut canvas = ImageBuffer::from_pixel(width, height, background);
    let mut offset = 0i64;
    for frame in frames {
        imageops::replace(&mut canvas, frame, offset, 0);
        offset += i64::from(frame.width());
    }
    Some(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imageops::TRANSPARENT;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_merge_dimensions_and_offsets() {
        let left = RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255]));
        let right = RgbaImage::from_pixel(4, 1, Rgba([0, 0, 255, 128]));

        let merged = merge_horizontal(&[left, right], TRANSPARENT).unwrap();

        assert_eq!(merged.dimensions(), (6, 3));
        assert_eq!(*merged.get_pixel(1, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*merged.get_pixel(2, 0), Rgba([0, 0, 255, 128]));
        assert_eq!(*merged.get_pixel(5, 0), Rgba([0, 0, 255, 128]));
        // gap under the shorter frame
        assert_eq!(*merged.get_pixel(3, 1), TRANSPARENT);
        assert_eq!(*merged.get_pixel(5, 2), TRANSPARENT);
    }

    #[test]
    fn test_merge_empty_is_none() {
        let frames: Vec<RgbaImage> = Vec::new();
        assert!(merge_horizontal(&frames, TRANSPARENT).is_none());
    }
}
