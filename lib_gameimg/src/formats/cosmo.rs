//! Cosmo's Cosmic Adventure graphics: 8x8 tile streams (plain and
//! masked) and the actor frame container that stitches masked tiles into
//! variable-sized sprites.

use super::{
    check_common_limits, read_u16le, read_u32le, FormatHandler, FormatMetadata, Identification,
    ReadError, SizeBounds, WriteError,
};
use crate::codec::mask::{merge, split};
use crate::codec::planar::{from_planar, to_planar, PlanarLayout};
use crate::codec::tile::{compose, decompose, TilePlacement};
use crate::image::format::{Frame, Image};
use crate::palette::palette_cga16;
use log::debug;

const TILE_SIZE: u16 = 8;
const ACTOR_RECORD_LEN: usize = 8;
const MAX_ACTOR_TILES: u16 = 64;

/// Transparent palette slot used by the masked variants.
pub const TRANSPARENT: u8 = 16;

fn plain_layout() -> PlanarLayout {
    PlanarLayout::row_planar(TILE_SIZE as usize, vec![1, 2, 4, 8], true)
}

fn masked_layout() -> PlanarLayout {
    PlanarLayout::row_planar(TILE_SIZE as usize, vec![16, 1, 2, 4, 8], true)
}

fn decode_masked_tile(data: &[u8]) -> Result<Vec<u8>, ReadError> {
    let combined = from_planar(data, &masked_layout())?;
    // The mask plane wins over whatever the color planes held: split the
    // two apart and recombine under that rule.
    let (visible, mask) = split(&combined, |p| (p & 0x0F, p >> 4));
    Ok(merge(&visible, &mask, |v, m| {
        if m != 0 {
            TRANSPARENT
        } else {
            v
        }
    })?)
}

/// Fixed 8x8 tile stream, with or without the leading mask plane.
pub struct CosmoTilesFormat {
    masked: bool,
    meta: FormatMetadata,
}

impl CosmoTilesFormat {
    pub fn plain() -> Self {
        Self {
            masked: false,
            meta: Self::meta("tls-cosmo", "Cosmo tileset", None),
        }
    }

    pub fn masked() -> Self {
        Self {
            masked: true,
            meta: Self::meta("tls-cosmo-masked", "Cosmo masked tileset", Some(TRANSPARENT)),
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
        if self.masked {
            masked_layout()
        } else {
            plain_layout()
        }
    }

    fn tile_len(&self) -> usize {
        self.layout().group_len() * TILE_SIZE as usize
    }
}

impl FormatHandler for CosmoTilesFormat {
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

        let mut frames = Vec::with_capacity(data.len() / tile_len);
        for tile in data.chunks_exact(tile_len) {
            let pixels = if self.masked {
                decode_masked_tile(tile)?
            } else {
                from_planar(tile, &plain_layout())?
            };
            frames.push(Frame::from_pixels(pixels));
        }
        debug!("{}: decoded {} tiles", self.meta.id, frames.len());

        let mut image = Image::with_frames(TILE_SIZE, TILE_SIZE, frames);
        let mut palette = palette_cga16();
        if self.masked {
            palette.push([0x00, 0x00, 0x00, 0x00]);
        }
        image.palette = Some(palette);
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

/// Actor frame container: a record table describing each frame's size in
/// tiles and the offset of its masked 8x8 tile data. Frames are stitched
/// together through the tile compositor, so one file carries many
/// independent sprites.
pub struct CosmoActorFormat {
    meta: FormatMetadata,
}

impl Default for CosmoActorFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl CosmoActorFormat {
    pub fn new() -> Self {
        Self {
            meta: FormatMetadata {
                id: "tls-cosmo-actor",
                title: "Cosmo actor frames",
                size: SizeBounds::PerFrame,
                width_multiple: 8,
                depth: 4,
                has_palette: false,
                palette_depth: 8,
                transparent_index: Some(TRANSPARENT),
                min_frames: 1,
                max_frames: u16::MAX as usize,
                max_images: u16::MAX as usize,
            },
        }
    }

    /// Parses the record table into (height, width, offset) tuples, sizes
    /// in tiles.
    fn parse_records(&self, data: &[u8]) -> Result<Vec<(u16, u16, usize)>, ReadError> {
        let count = read_u16le(data, 0).ok_or_else(|| {
            ReadError::MalformedHeader("file too short for a record count".into())
        })? as usize;
        if count == 0 {
            return Err(ReadError::MalformedHeader("record count is zero".into()));
        }

        let tile_len = masked_layout().group_len() * TILE_SIZE as usize;
        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let base = 2 + index * ACTOR_RECORD_LEN;
            let height = read_u16le(data, base);
            let width = read_u16le(data, base + 2);
            let offset = read_u32le(data, base + 4);
            let (Some(height), Some(width), Some(offset)) = (height, width, offset) else {
                return Err(ReadError::MalformedHeader(format!(
                    "record #{} lies past the end of the file",
                    index
                )));
            };
            if height == 0 || width == 0 || height > MAX_ACTOR_TILES || width > MAX_ACTOR_TILES {
                return Err(ReadError::MalformedHeader(format!(
                    "record #{} has implausible size {}x{} tiles",
                    index, width, height
                )));
            }

            let offset = offset as usize;
            let data_len = width as usize * height as usize * tile_len;
            if offset < 2 + count * ACTOR_RECORD_LEN || offset + data_len > data.len() {
                return Err(ReadError::MalformedHeader(format!(
                    "record #{} tile data ({} bytes at {}) does not fit the file",
                    index, data_len, offset
                )));
            }
            records.push((height, width, offset));
        }
        Ok(records)
    }
}

impl FormatHandler for CosmoActorFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        match self.parse_records(data) {
            Ok(records) => Identification::valid(format!(
                "record table with {} consistent actor frames",
                records.len()
            )),
            Err(error) => Identification::invalid(error.to_string()),
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let records = self.parse_records(data)?;
        let tile_len = masked_layout().group_len() * TILE_SIZE as usize;

        let mut frames = Vec::with_capacity(records.len());
        for &(height, width, offset) in &records {
            let tile_count = width as usize * height as usize;
            let mut tiles = Vec::with_capacity(tile_count);
            for tile_index in 0..tile_count {
                let start = offset + tile_index * tile_len;
                tiles.push(decode_masked_tile(&data[start..start + tile_len])?);
            }

            let placements: Vec<TilePlacement> = tiles
                .iter()
                .enumerate()
                .map(|(tile_index, pixels)| TilePlacement {
                    pixels,
                    width: TILE_SIZE as usize,
                    height: TILE_SIZE as usize,
                    offset_x: (tile_index % width as usize) * TILE_SIZE as usize,
                    offset_y: (tile_index / width as usize) * TILE_SIZE as usize,
                })
                .collect();
            let composed = compose(&placements, Some(TRANSPARENT), None)?;
            frames.push(Frame::with_size(
                composed.width as u16,
                composed.height as u16,
                composed.pixels,
            ));
        }
        debug!("tls-cosmo-actor: decoded {} frames", frames.len());

        let mut image = Image::with_frames(0, 0, frames);
        let mut palette = palette_cga16();
        palette.push([0x00, 0x00, 0x00, 0x00]);
        image.palette = Some(palette);
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        let mut problems = check_common_limits(&self.meta, image);
        for (index, frame) in image.frames.iter().enumerate() {
            let (width, height) = frame.size_in(image);
            if height % TILE_SIZE != 0 {
                problems.push(format!(
                    "frame #{} height {} is not a multiple of {}",
                    index, height, TILE_SIZE
                ));
            }
            if width / TILE_SIZE > MAX_ACTOR_TILES || height / TILE_SIZE > MAX_ACTOR_TILES {
                problems.push(format!(
                    "frame #{} spans more than {} tiles per axis",
                    index, MAX_ACTOR_TILES
                ));
            }
        }
        problems
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        if image.frames.is_empty() {
            return Err(WriteError::LimitViolation(
                "actor file needs at least one frame".into(),
            ));
        }

        let layout = masked_layout();
        let header_len = 2 + image.frames.len() * ACTOR_RECORD_LEN;

        let mut records = Vec::with_capacity(header_len);
        records.extend_from_slice(&(image.frames.len() as u16).to_le_bytes());
        let mut body = Vec::new();

        for frame in &image.frames {
            let (width, height) = frame.size_in(image);
            let tiles_wide = width / TILE_SIZE;
            let tiles_high = height / TILE_SIZE;
            let dims =
                vec![(TILE_SIZE as usize, TILE_SIZE as usize); (tiles_wide * tiles_high) as usize];
            let tiles = decompose(&frame.pixels, width as usize, height as usize, &dims)?;

            let offset = header_len + body.len();
            records.extend_from_slice(&tiles_high.to_le_bytes());
            records.extend_from_slice(&tiles_wide.to_le_bytes());
            records.extend_from_slice(&(offset as u32).to_le_bytes());
            for tile in &tiles {
                body.extend_from_slice(&to_planar(tile, &layout)?);
            }
        }

        let mut out = records;
        out.extend_from_slice(&body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;

    #[test]
    fn test_cosmo_plain_round_trip() {
        let format = CosmoTilesFormat::plain();
        let tile: Vec<u8> = (0..64).map(|i| (i % 16) as u8).collect();
        let image = Image::with_frames(8, 8, vec![Frame::from_pixels(tile.clone())]);

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(format.read(&bytes).unwrap().frames[0].pixels, tile);
    }

    #[test]
    fn test_cosmo_masked_round_trip() {
        let format = CosmoTilesFormat::masked();
        let tile: Vec<u8> = (0..64)
            .map(|i| if i % 3 == 0 { TRANSPARENT } else { (i % 16) as u8 })
            .collect();
        let image = Image::with_frames(8, 8, vec![Frame::from_pixels(tile.clone())]);

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes.len(), 40);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames[0].pixels, tile);
        assert_eq!(decoded.palette.as_ref().unwrap().len(), 17);
    }

    #[test]
    fn test_cosmo_identify_granularity() {
        let plain = CosmoTilesFormat::plain();
        assert_eq!(plain.identify(&[0; 96]).verdict, Verdict::Unknown);
        assert_eq!(plain.identify(&[0; 95]).verdict, Verdict::Invalid);
    }

    fn checkerboard(width: usize, height: usize) -> Vec<u8> {
        (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                if (x / 8 + y / 8) % 2 == 0 {
                    TRANSPARENT
                } else {
                    ((x + y) % 16) as u8
                }
            })
            .collect()
    }

    #[test]
    fn test_actor_round_trip() {
        let format = CosmoActorFormat::new();
        // Two frames of different sizes: 16x24 (2x3 tiles) and 8x8.
        let big = Frame::with_size(16, 24, checkerboard(16, 24));
        let small = Frame::with_size(8, 8, checkerboard(8, 8));
        let image = Image::with_frames(0, 0, vec![big.clone(), small.clone()]);

        assert!(format.check_limits(&image).is_empty());
        let bytes = format.write(&image).unwrap();
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.frames[0].pixels, big.pixels);
        assert_eq!(decoded.frames[0].width, Some(16));
        assert_eq!(decoded.frames[0].height, Some(24));
        assert_eq!(decoded.frames[1].pixels, small.pixels);
    }

    #[test]
    fn test_actor_rejects_overflowing_record() {
        let format = CosmoActorFormat::new();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes()); // height in tiles
        bytes.extend_from_slice(&2u16.to_le_bytes()); // width in tiles
        bytes.extend_from_slice(&10u32.to_le_bytes()); // offset
        bytes.extend_from_slice(&[0; 40]); // far less than 4 tiles
        assert_eq!(format.identify(&bytes).verdict, Verdict::Invalid);
        assert!(matches!(
            format.read(&bytes),
            Err(ReadError::MalformedHeader(_))
        ));
    }
}
