use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};

use super::MAX_DIMENSION;

/// Grow the canvas by `size` pixels on every side and fill the new frame with
/// `color`. The source is copied unblended at `(size, size)`.
///
/// Returns `None` when the padded canvas would exceed [`MAX_DIMENSION`].
pub fn add_border<I, P, S>(image: &I, size: u32, color: P) -> Option<ImageBuffer<P, Vec<S>>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let (width, height) = image.dimensions();
    let pad_width = size.checked_mul(2)?.checked_add(width)?;
    let pad_height = size.checked_mul(2)?.checked_add(height)?;
    if pad_width > MAX_DIMENSION || pad_height > MAX_DIMENSION {
        return None;
    }

    let mut canvas = ImageBuffer::from_pixel(pad_width, pad_height, color);
    imageops::replace(&mut canvas, image, i64::from(size), i64::from(size));
    Some(canvas)
}
