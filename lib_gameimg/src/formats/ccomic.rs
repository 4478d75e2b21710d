//! Captain Comic graphics: the RLE-compressed full-screen splash images
//! and the fixed-size map tile / sprite sets.
//!
//! The splash stores one independently compressed 8000-byte block per EGA
//! bitplane. Tiles and sprites are uncompressed 16x16 row-planar rasters;
//! sprites carry a fifth, leading mask plane whose set bits land on the
//! dedicated transparent palette slot at index 16.

use super::{
    check_common_limits, FormatHandler, FormatMetadata, Identification, ReadError, SizeBounds,
    WriteError,
};
use crate::codec::mask::{merge, split};
use crate::codec::planar::{from_planar, to_planar, PlanarLayout};
use crate::codec::rle_ccomic;
use crate::image::format::{Frame, Image, Palette};
use crate::palette::palette_cga16;
use log::debug;

const SCREEN_WIDTH: u16 = 320;
const SCREEN_HEIGHT: u16 = 200;
const TILE_SIZE: u16 = 16;

/// Transparent palette slot used by the masked sprite variant.
pub const TRANSPARENT: u8 = 16;

/// The 16 EGA colors plus the appended transparent slot at index 16.
pub fn masked_palette() -> Palette {
    let mut palette = palette_cga16();
    palette.push([0x00, 0x00, 0x00, 0x00]);
    palette
}

/// Full-screen splash image.
pub struct CComicSplashFormat {
    meta: FormatMetadata,
}

impl Default for CComicSplashFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl CComicSplashFormat {
    pub fn new() -> Self {
        Self {
            meta: FormatMetadata {
                id: "img-ccomic-splash",
                title: "Captain Comic splash screen",
                size: SizeBounds::Fixed {
                    width: SCREEN_WIDTH,
                    height: SCREEN_HEIGHT,
                },
                width_multiple: 8,
                depth: 4,
                has_palette: false,
                palette_depth: 8,
                transparent_index: None,
                min_frames: 1,
                max_frames: 1,
                max_images: 1,
            },
        }
    }

    /// The whole screen is one plane line: every plane covers all 64000
    /// pixels before the next starts.
    fn layout() -> PlanarLayout {
        PlanarLayout::row_planar(
            SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize,
            vec![1, 2, 4, 8],
            true,
        )
    }
}

impl FormatHandler for CComicSplashFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        match rle_ccomic::decode_planes(data, rle_ccomic::PLANE_COUNT) {
            Ok(_) => Identification::valid(
                "four RLE blocks decompress to exactly 8000 bytes each".to_string(),
            ),
            Err(error) => Identification::invalid(error.to_string()),
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let planar = rle_ccomic::decode_planes(data, rle_ccomic::PLANE_COUNT)?;
        let pixels = from_planar(&planar, &Self::layout())?;
        debug!("img-ccomic-splash: decoded {} pixels", pixels.len());

        let mut image = Image::with_frames(
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            vec![Frame::from_pixels(pixels)],
        );
        image.palette = Some(palette_cga16());
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let frame = image.frames.first().ok_or_else(|| {
            WriteError::LimitViolation("splash image needs exactly one frame".into())
        })?;
        let planar = to_planar(&frame.pixels, &Self::layout())?;
        Ok(rle_ccomic::encode_planes(&planar, rle_ccomic::PLANE_COUNT)?)
    }
}

/// Fixed-size 16x16 tile stream, plain (map tiles) or masked (sprites).
pub struct CComicTilesFormat {
    masked: bool,
    meta: FormatMetadata,
}

impl CComicTilesFormat {
    pub fn map_tiles() -> Self {
        Self {
            masked: false,
            meta: Self::meta("tls-ccomic", "Captain Comic map tiles", None),
        }
    }

    pub fn sprites() -> Self {
        Self {
            masked: true,
            meta: Self::meta(
                "tls-ccomic-sprite",
                "Captain Comic sprites",
                Some(TRANSPARENT),
            ),
        }
    }

    fn meta(
        id: &'static str,
        title: &'static str,
        transparent_index: Option<u8>,
    ) -> FormatMetadata {
        FormatMetadata {
            id,
            title,
            size: SizeBounds::Fixed {
                width: TILE_SIZE,
                height: TILE_SIZE,
            },
            width_multiple: 8,
            depth: 4,
            has_palette: false,
            palette_depth: 8,
            transparent_index,
            min_frames: 1,
            max_frames: usize::MAX,
            max_images: 1,
        }
    }

    fn layout(&self) -> PlanarLayout {
        let plane_values = if self.masked {
            vec![16, 1, 2, 4, 8]
        } else {
            vec![1, 2, 4, 8]
        };
        PlanarLayout::row_planar(TILE_SIZE as usize, plane_values, true)
    }

    fn tile_len(&self) -> usize {
        // 2 bytes per plane per row.
        self.layout().group_len() * TILE_SIZE as usize
    }
}

impl FormatHandler for CComicTilesFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        let tile_len = self.tile_len();
        if data.is_empty() || data.len() % tile_len != 0 {
            return Identification::invalid(format!(
                "{} bytes is not a positive multiple of the {}-byte tile",
                data.len(),
                tile_len
            ));
        }
        // Headerless: the right granularity is all there is to check.
        Identification::unknown(format!(
            "{} whole tiles, but any raw data of this length matches",
            data.len() / tile_len
        ))
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let tile_len = self.tile_len();
        if data.is_empty() || data.len() % tile_len != 0 {
            return Err(ReadError::SizeMismatch {
                expected: data.len().next_multiple_of(tile_len).max(tile_len),
                actual: data.len(),
            });
        }

        let layout = self.layout();
        let mut frames = Vec::with_capacity(data.len() / tile_len);
        for tile in data.chunks_exact(tile_len) {
            let mut pixels = from_planar(tile, &layout)?;
            if self.masked {
                // A set mask bit wins over whatever the color planes held.
                let (visible, mask) = split(&pixels, |p| (p & 0x0F, p >> 4));
                pixels = merge(&visible, &mask, |v, m| {
                    if m != 0 {
                        TRANSPARENT
                    } else {
                        v
                    }
                })?;
            }
            frames.push(Frame::from_pixels(pixels));
        }
        debug!("{}: decoded {} tiles", self.meta.id, frames.len());

        let mut image = Image::with_frames(TILE_SIZE, TILE_SIZE, frames);
        image.palette = Some(if self.masked {
            masked_palette()
        } else {
            palette_cga16()
        });
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let layout = self.layout();
        let mut out = Vec::with_capacity(image.frames.len() * self.tile_len());
        for frame in &image.frames {
            out.extend_from_slice(&to_planar(&frame.pixels, &layout)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;

    #[test]
    fn test_splash_round_trip() {
        let format = CComicSplashFormat::new();
        let pixels: Vec<u8> = (0..64000u32).map(|i| ((i / 317) % 16) as u8).collect();
        let image = Image::with_frames(320, 200, vec![Frame::from_pixels(pixels.clone())]);

        let bytes = format.write(&image).unwrap();
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames[0].pixels, pixels);
        assert_eq!(decoded.palette.as_ref().unwrap().len(), 16);
    }

    #[test]
    fn test_splash_identify() {
        let format = CComicSplashFormat::new();
        let image = Image::with_frames(320, 200, vec![Frame::from_pixels(vec![5; 64000])]);
        let bytes = format.write(&image).unwrap();
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);
        assert_eq!(format.identify(&bytes[..100]).verdict, Verdict::Invalid);
    }

    #[test]
    fn test_map_tiles_round_trip() {
        let format = CComicTilesFormat::map_tiles();
        let tile_a: Vec<u8> = (0..256).map(|i| (i % 16) as u8).collect();
        let tile_b = vec![9u8; 256];
        let image = Image::with_frames(
            16,
            16,
            vec![
                Frame::from_pixels(tile_a.clone()),
                Frame::from_pixels(tile_b.clone()),
            ],
        );

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes.len(), 2 * 128);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames[0].pixels, tile_a);
        assert_eq!(decoded.frames[1].pixels, tile_b);
    }

    #[test]
    fn test_sprites_round_trip_with_mask() {
        let format = CComicTilesFormat::sprites();
        let pixels: Vec<u8> = (0..256)
            .map(|i| if i % 5 == 0 { TRANSPARENT } else { (i % 16) as u8 })
            .collect();
        let image = Image::with_frames(16, 16, vec![Frame::from_pixels(pixels.clone())]);

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes.len(), 160);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames[0].pixels, pixels);
        // The transparent slot sits at index 16 with alpha 0.
        assert_eq!(decoded.palette.as_ref().unwrap()[16][3], 0);
    }

    #[test]
    fn test_sprites_mask_bit_wins_over_color() {
        let format = CComicTilesFormat::sprites();
        // Hand-build one tile where the mask plane and a color plane are
        // both fully set.
        let mut tile = vec![0u8; 160];
        for row in 0..16 {
            tile[row * 10] = 0xFF; // mask plane, first byte of the row
            tile[row * 10 + 1] = 0xFF;
            tile[row * 10 + 2] = 0xFF; // blue plane
            tile[row * 10 + 3] = 0xFF;
        }
        let decoded = format.read(&tile).unwrap();
        assert!(decoded.frames[0].pixels.iter().all(|&p| p == TRANSPARENT));
    }

    #[test]
    fn test_tiles_identify_granularity() {
        let format = CComicTilesFormat::map_tiles();
        assert_eq!(format.identify(&[0; 256]).verdict, Verdict::Unknown);
        assert_eq!(format.identify(&[0; 100]).verdict, Verdict::Invalid);
        assert_eq!(format.identify(&[]).verdict, Verdict::Invalid);
    }
}
