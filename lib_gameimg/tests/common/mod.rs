use lib_gameimg::image::format::{Frame, Image};
use lib_gameimg::palette::palette_cga16;

/// Deterministic pseudo-random byte sequence for round-trip exercises.
pub fn pseudo_random_pixels(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        })
        .collect()
}

/// Sprite-like buffer: transparent border, a few solid runs, some noise.
pub fn sprite_pixels(width: usize, height: usize, transparent: u8) -> Vec<u8> {
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                transparent
            } else if y < height / 2 {
                7
            } else {
                ((x * 3 + y) % 16) as u8
            }
        })
        .collect()
}

/// A 16-color test image of the given size with the CGA palette attached.
pub fn indexed_image(width: u16, height: u16) -> Image {
    let pixels = (0..width as usize * height as usize)
        .map(|i| (i % 16) as u8)
        .collect();
    let mut image = Image::with_frames(width, height, vec![Frame::from_pixels(pixels)]);
    image.palette = Some(palette_cga16());
    image
}
