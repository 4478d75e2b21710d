use crate::image::format::{Palette, PaletteEntry};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("no default palette for color depth {0} bpp")]
    UnsupportedDepth(u8),
}

/// Expands a 6-bit DAC channel value to 8-bit precision.
///
/// The top bits are folded back into the low bits so 0x3F maps to 0xFF
/// rather than 0xFC.
pub fn pal6_to_8(value: u8) -> u8 {
    (value << 2) | (value >> 4)
}

/// Reduces an 8-bit channel value to 6-bit DAC precision. Lossy for inputs
/// that are not a multiple of 4; `pal8_to_6(pal6_to_8(x)) == x` holds for
/// all x in 0..=63.
pub fn pal8_to_6(value: u8) -> u8 {
    value >> 2
}

/// Converts a whole palette from 6-bit to 8-bit channel precision. Alpha is
/// carried through untouched.
pub fn palette_6bit_to_8bit(palette: &Palette) -> Palette {
    palette
        .iter()
        .map(|&[r, g, b, a]| [pal6_to_8(r), pal6_to_8(g), pal6_to_8(b), a])
        .collect()
}

/// Converts a whole palette from 8-bit to 6-bit channel precision.
pub fn palette_8bit_to_6bit(palette: &Palette) -> Palette {
    palette
        .iter()
        .map(|&[r, g, b, a]| [pal8_to_6(r), pal8_to_6(g), pal8_to_6(b), a])
        .collect()
}

/// Returns the standard palette for the given color depth in bits per pixel.
///
/// Dispatches 1 -> monochrome, 2 -> CGA 4-color, 4 -> CGA/EGA 16-color,
/// 6 -> EGA 64-color, 8 -> VGA 256-color.
pub fn default_palette(depth: u8) -> Result<Palette, PaletteError> {
    debug!("Generating default palette for depth {}", depth);
    match depth {
        1 => Ok(palette_mono()),
        2 => Ok(palette_cga4()),
        4 => Ok(palette_cga16()),
        6 => Ok(palette_ega64()),
        8 => Ok(palette_vga256()),
        other => Err(PaletteError::UnsupportedDepth(other)),
    }
}

/// Replicates a 2-bit channel pattern `ab` into `abababab`.
fn expand2(n: u8) -> u8 {
    n | (n << 2) | (n << 4) | (n << 6)
}

pub fn palette_mono() -> Palette {
    vec![[0x00, 0x00, 0x00, 0xFF], [0xFF, 0xFF, 0xFF, 0xFF]]
}

/// CGA mode-4 palette 1 at high intensity: black, light cyan, light magenta,
/// white.
pub fn palette_cga4() -> Palette {
    let full = palette_cga16();
    vec![full[0], full[11], full[13], full[15]]
}

/// The 16 fixed CGA colors. Index is the IRGB hardware value.
pub fn palette_cga16() -> Palette {
    let mut palette = Vec::with_capacity(16);
    for i in 0..16u8 {
        let intensity = (i >> 3) & 1;
        let r = expand2(((i >> 2) & 1) << 1 | intensity);
        let g = expand2(((i >> 1) & 1) << 1 | intensity);
        let b = expand2((i & 1) << 1 | intensity);
        palette.push([r, g, b, 0xFF]);
    }
    // Hardware renders color 6 as brown, not the dark yellow the bit
    // expansion produces: the green channel is halved.
    palette[6][1] = 0x55;
    palette
}

/// All 64 colors an EGA DAC can produce. Index bits {5,2}, {4,1} and {3,0}
/// assemble the 2-bit red, green and blue channels.
pub fn palette_ega64() -> Palette {
    let mut palette = Vec::with_capacity(64);
    for i in 0..64u8 {
        let r = expand2(((i >> 2) & 1) << 1 | ((i >> 5) & 1));
        let g = expand2(((i >> 1) & 1) << 1 | ((i >> 4) & 1));
        let b = expand2((i & 1) << 1 | ((i >> 3) & 1));
        palette.push([r, g, b, 0xFF]);
    }
    palette
}

/// Grayscale ramp occupying VGA palette slots 16..32, in 6-bit precision.
const VGA_GRAY_RAMP: [u8; 16] = [
    0x00, 0x05, 0x08, 0x0B, 0x0E, 0x11, 0x14, 0x18, 0x1C, 0x20, 0x24, 0x28, 0x2D, 0x32, 0x38,
    0x3F,
];

/// The 72-entry hue wheel block of the VGA BIOS palette, in 6-bit precision:
/// 24 saturated hues, 24 medium hues, 24 pastel hues, blue first.
const VGA_HUE_WHEEL: [[u8; 3]; 72] = [
    [0x00, 0x00, 0x3F],
    [0x10, 0x00, 0x3F],
    [0x1F, 0x00, 0x3F],
    [0x2F, 0x00, 0x3F],
    [0x3F, 0x00, 0x3F],
    [0x3F, 0x00, 0x2F],
    [0x3F, 0x00, 0x1F],
    [0x3F, 0x00, 0x10],
    [0x3F, 0x00, 0x00],
    [0x3F, 0x10, 0x00],
    [0x3F, 0x1F, 0x00],
    [0x3F, 0x2F, 0x00],
    [0x3F, 0x3F, 0x00],
    [0x2F, 0x3F, 0x00],
    [0x1F, 0x3F, 0x00],
    [0x10, 0x3F, 0x00],
    [0x00, 0x3F, 0x00],
    [0x00, 0x3F, 0x10],
    [0x00, 0x3F, 0x1F],
    [0x00, 0x3F, 0x2F],
    [0x00, 0x3F, 0x3F],
    [0x00, 0x2F, 0x3F],
    [0x00, 0x1F, 0x3F],
    [0x00, 0x10, 0x3F],
    [0x1F, 0x1F, 0x3F],
    [0x27, 0x1F, 0x3F],
    [0x2F, 0x1F, 0x3F],
    [0x37, 0x1F, 0x3F],
    [0x3F, 0x1F, 0x3F],
    [0x3F, 0x1F, 0x37],
    [0x3F, 0x1F, 0x2F],
    [0x3F, 0x1F, 0x27],
    [0x3F, 0x1F, 0x1F],
    [0x3F, 0x27, 0x1F],
    [0x3F, 0x2F, 0x1F],
    [0x3F, 0x37, 0x1F],
    [0x3F, 0x3F, 0x1F],
    [0x37, 0x3F, 0x1F],
    [0x2F, 0x3F, 0x1F],
    [0x27, 0x3F, 0x1F],
    [0x1F, 0x3F, 0x1F],
    [0x1F, 0x3F, 0x27],
    [0x1F, 0x3F, 0x2F],
    [0x1F, 0x3F, 0x37],
    [0x1F, 0x3F, 0x3F],
    [0x1F, 0x37, 0x3F],
    [0x1F, 0x2F, 0x3F],
    [0x1F, 0x27, 0x3F],
    [0x2D, 0x2D, 0x3F],
    [0x31, 0x2D, 0x3F],
    [0x36, 0x2D, 0x3F],
    [0x3A, 0x2D, 0x3F],
    [0x3F, 0x2D, 0x3F],
    [0x3F, 0x2D, 0x3A],
    [0x3F, 0x2D, 0x36],
    [0x3F, 0x2D, 0x31],
    [0x3F, 0x2D, 0x2D],
    [0x3F, 0x31, 0x2D],
    [0x3F, 0x36, 0x2D],
    [0x3F, 0x3A, 0x2D],
    [0x3F, 0x3F, 0x2D],
    [0x3A, 0x3F, 0x2D],
    [0x36, 0x3F, 0x2D],
    [0x31, 0x3F, 0x2D],
    [0x2D, 0x3F, 0x2D],
    [0x2D, 0x3F, 0x31],
    [0x2D, 0x3F, 0x36],
    [0x2D, 0x3F, 0x3A],
    [0x2D, 0x3F, 0x3F],
    [0x2D, 0x3A, 0x3F],
    [0x2D, 0x36, 0x3F],
    [0x2D, 0x31, 0x3F],
];

/// Brightness multipliers for the three repetitions of the hue wheel:
/// normal, dim, very dim.
const VGA_HUE_MULTIPLIERS: [f32; 3] = [1.0, 0.453, 0.259];

/// The standard 256-color VGA BIOS palette.
pub fn palette_vga256() -> Palette {
    let mut palette = palette_cga16();
    palette.reserve(240);

    for &gray in &VGA_GRAY_RAMP {
        palette.push([gray, gray, gray, 0xFF]);
    }

    for &multiplier in &VGA_HUE_MULTIPLIERS {
        for &[r, g, b] in &VGA_HUE_WHEEL {
            palette.push([
                (r as f32 * multiplier) as u8,
                (g as f32 * multiplier) as u8,
                (b as f32 * multiplier) as u8,
                0xFF,
            ]);
        }
    }

    // Slots 16..248 were built in 6-bit DAC precision; bring them up to
    // 8-bit. The CGA block before them is already 8-bit.
    for entry in &mut palette[16..248] {
        *entry = six_to_eight_entry(*entry);
    }

    while palette.len() < 256 {
        palette.push([0x00, 0x00, 0x00, 0xFF]);
    }
    palette
}

fn six_to_eight_entry([r, g, b, a]: PaletteEntry) -> PaletteEntry {
    [pal6_to_8(r), pal6_to_8(g), pal6_to_8(b), a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_dispatch() {
        assert_eq!(default_palette(1).unwrap().len(), 2);
        assert_eq!(default_palette(2).unwrap().len(), 4);
        assert_eq!(default_palette(4).unwrap().len(), 16);
        assert_eq!(default_palette(6).unwrap().len(), 64);
        assert_eq!(default_palette(8).unwrap().len(), 256);
    }

    #[test]
    fn test_default_palette_unsupported_depth() {
        assert!(matches!(
            default_palette(3),
            Err(PaletteError::UnsupportedDepth(3))
        ));
        assert!(matches!(
            default_palette(16),
            Err(PaletteError::UnsupportedDepth(16))
        ));
    }

    #[test]
    fn test_cga16_brown_hand_fix() {
        assert_eq!(palette_cga16()[6], [0xAA, 0x55, 0x00, 0xFF]);
    }

    #[test]
    fn test_cga16_corners() {
        let palette = palette_cga16();
        assert_eq!(palette[0], [0x00, 0x00, 0x00, 0xFF]);
        assert_eq!(palette[7], [0xAA, 0xAA, 0xAA, 0xFF]);
        assert_eq!(palette[8], [0x55, 0x55, 0x55, 0xFF]);
        assert_eq!(palette[15], [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_cga4_is_high_intensity_set() {
        let cga4 = palette_cga4();
        let cga16 = palette_cga16();
        assert_eq!(cga4, vec![cga16[0], cga16[11], cga16[13], cga16[15]]);
    }

    #[test]
    fn test_ega64_channel_assembly() {
        let palette = palette_ega64();
        // Bit 2 alone is the high red bit.
        assert_eq!(palette[0b000100], [0xAA, 0x00, 0x00, 0xFF]);
        // Bit 5 alone is the low red bit.
        assert_eq!(palette[0b100000], [0x55, 0x00, 0x00, 0xFF]);
        assert_eq!(palette[0b111111], [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(palette[0], [0x00, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_vga256_structure() {
        let palette = palette_vga256();
        assert_eq!(palette.len(), 256);
        // CGA block leads.
        assert_eq!(&palette[..16], &palette_cga16()[..]);
        // Grayscale ramp ends at white.
        assert_eq!(palette[16], [0x00, 0x00, 0x00, 0xFF]);
        assert_eq!(palette[31], [0xFF, 0xFF, 0xFF, 0xFF]);
        // First hue wheel entry is saturated blue.
        assert_eq!(palette[32], [0x00, 0x00, 0xFF, 0xFF]);
        // Same hue dimmed: floor(63 * 0.453) = 28 -> expanded 113.
        assert_eq!(palette[104], [0x00, 0x00, 0x71, 0xFF]);
        // And very dim: floor(63 * 0.259) = 16 -> expanded 65.
        assert_eq!(palette[176], [0x00, 0x00, 0x41, 0xFF]);
        // Tail defaults to opaque black.
        assert_eq!(palette[248], [0x00, 0x00, 0x00, 0xFF]);
        assert_eq!(palette[255], [0x00, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_depth_conversion_lossless_direction() {
        for value in 0..=63u8 {
            assert_eq!(pal8_to_6(pal6_to_8(value)), value);
        }
    }

    #[test]
    fn test_depth_conversion_endpoints() {
        assert_eq!(pal6_to_8(0x00), 0x00);
        assert_eq!(pal6_to_8(0x3F), 0xFF);
        assert_eq!(pal8_to_6(0xFF), 0x3F);
    }
}
