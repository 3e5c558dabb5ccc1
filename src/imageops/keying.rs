use image::{Rgb, Rgba, RgbaImage};
use rayon::prelude::*;

/// Replacement value for every keyed pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Channels strictly above this value count as white.
pub const WHITE_THRESHOLD: u8 = 240;

/// Key out every pixel whose RGB channels are all within `tolerance` of
/// `reference`. Alpha does not take part in the comparison.
pub fn key_transparent(image: &mut RgbaImage, reference: Rgb<u8>, tolerance: u8) {
    let Rgb([ref_r, ref_g, ref_b]) = reference;
    key_pixels(image, |r, g, b| {
        r.abs_diff(ref_r) <= tolerance
            && g.abs_diff(ref_g) <= tolerance
            && b.abs_diff(ref_b) <= tolerance
    });
}

/// Background keying with the reference color taken from the top-left pixel.
pub fn key_background(image: &mut RgbaImage, tolerance: u8) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let reference = background_color(image);
    key_transparent(image, reference, tolerance);
}

/// Key out near-white pixels, whatever their current alpha.
pub fn key_white(image: &mut RgbaImage) {
    key_pixels(image, |r, g, b| {
        r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD
    });
}

pub fn background_color(image: &RgbaImage) -> Rgb<u8> {
    let Rgba([r, g, b, _]) = *image.get_pixel(0, 0);
    Rgb([r, g, b])
}

fn key_pixels<F>(image: &mut RgbaImage, matches: F)
where
    F: Fn(u8, u8, u8) -> bool + Sync,
{
    let samples: &mut [u8] = image;
    samples.par_chunks_exact_mut(4).for_each(|pixel| {
        if matches(pixel[0], pixel[1], pixel[2]) {
            pixel.copy_from_slice(&TRANSPARENT.0);
        }
    });
}
