//! Dangerous Dave tilesets: a u32le count, a u32le offset FAT, then one
//! tile per entry. The first 53 entries are headerless 16x16 map tiles;
//! every later entry opens with a 4-byte width/height header. The VGA
//! variant stores linear 8bpp pixels, the EGA and CGA variants store
//! row-planar data with the width rounded up to the next multiple of 8.

use super::{
    check_common_limits, read_u16le, read_u32le, FormatHandler, FormatMetadata, Identification,
    ReadError, SizeBounds, WriteError,
};
use crate::codec::planar::{from_planar, to_planar, PlanarLayout};
use crate::image::format::{Frame, Image, Palette};
use crate::palette::{palette_cga16, palette_cga4, palette_vga256};
use log::debug;

/// Entries below this index are fixed 16x16 tiles without a size header.
const FIXED_TILES: usize = 53;
const FIXED_SIZE: u16 = 16;
const MAX_DIMENSION: u16 = 320;
const MAX_TILES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaveVariant {
    Vga,
    Ega,
    Cga,
}

impl DaveVariant {
    fn depth(self) -> u8 {
        match self {
            DaveVariant::Vga => 8,
            DaveVariant::Ega => 4,
            DaveVariant::Cga => 2,
        }
    }

    fn plane_values(self) -> Option<Vec<u8>> {
        match self {
            DaveVariant::Vga => None,
            DaveVariant::Ega => Some(vec![1, 2, 4, 8]),
            DaveVariant::Cga => Some(vec![1, 2]),
        }
    }

    fn default_palette(self) -> Palette {
        match self {
            DaveVariant::Vga => palette_vga256(),
            DaveVariant::Ega => palette_cga16(),
            DaveVariant::Cga => palette_cga4(),
        }
    }

    /// On-disk byte length of a single tile raster.
    fn tile_data_len(self, width: u16, height: u16) -> usize {
        match self {
            DaveVariant::Vga => width as usize * height as usize,
            planar => {
                let padded = width.next_multiple_of(8) as usize;
                let planes = planar.plane_values().map(|v| v.len()).unwrap_or(0);
                padded / 8 * planes * height as usize
            }
        }
    }
}

pub struct DaveTilesFormat {
    variant: DaveVariant,
    meta: FormatMetadata,
}

impl DaveTilesFormat {
    pub fn vga() -> Self {
        Self::new(DaveVariant::Vga, "tls-dave-vga", "Dangerous Dave VGA tileset")
    }

    pub fn ega() -> Self {
        Self::new(DaveVariant::Ega, "tls-dave-ega", "Dangerous Dave EGA tileset")
    }

    pub fn cga() -> Self {
        Self::new(DaveVariant::Cga, "tls-dave-cga", "Dangerous Dave CGA tileset")
    }

    fn new(variant: DaveVariant, id: &'static str, title: &'static str) -> Self {
        Self {
            variant,
            meta: FormatMetadata {
                id,
                title,
                size: SizeBounds::Range {
                    min_width: 1,
                    max_width: MAX_DIMENSION,
                    min_height: 1,
                    max_height: MAX_DIMENSION,
                },
                width_multiple: 1,
                depth: variant.depth(),
                has_palette: false,
                palette_depth: 8,
                transparent_index: None,
                min_frames: 1,
                max_frames: MAX_TILES,
                max_images: 1,
            },
        }
    }

    fn parse_fat(&self, data: &[u8]) -> Result<Vec<usize>, ReadError> {
        let count = read_u32le(data, 0)
            .ok_or_else(|| ReadError::MalformedHeader("file too short for a tile count".into()))?
            as usize;
        if count == 0 || count > MAX_TILES {
            return Err(ReadError::MalformedHeader(format!(
                "implausible tile count {}",
                count
            )));
        }

        let header_len = 4 + count * 4;
        let mut offsets = Vec::with_capacity(count);
        for entry in 0..count {
            let offset = read_u32le(data, 4 + entry * 4).ok_or_else(|| {
                ReadError::MalformedHeader(format!(
                    "offset table entry #{} lies past the end of the file",
                    entry
                ))
            })? as usize;
            if offset < header_len || offset > data.len() {
                return Err(ReadError::MalformedHeader(format!(
                    "entry #{} points to {}, outside the data area",
                    entry, offset
                )));
            }
            if let Some(&previous) = offsets.last() {
                if offset < previous {
                    return Err(ReadError::MalformedHeader(format!(
                        "entry #{} offset {} goes backwards from {}",
                        entry, offset, previous
                    )));
                }
            }
            offsets.push(offset);
        }
        Ok(offsets)
    }

    fn decode_tile(&self, width: u16, height: u16, body: &[u8]) -> Result<Vec<u8>, ReadError> {
        let expected = self.variant.tile_data_len(width, height);
        if body.len() != expected {
            return Err(ReadError::SizeMismatch {
                expected,
                actual: body.len(),
            });
        }

        match self.variant.plane_values() {
            None => Ok(body.to_vec()),
            Some(values) => {
                let padded = width.next_multiple_of(8) as usize;
                let layout = PlanarLayout::row_planar(padded, values, true);
                let pixels = from_planar(body, &layout)?;
                if padded == width as usize {
                    return Ok(pixels);
                }
                // Drop the round-up padding on the right of every row.
                let mut cropped = Vec::with_capacity(width as usize * height as usize);
                for row in pixels.chunks_exact(padded) {
                    cropped.extend_from_slice(&row[..width as usize]);
                }
                Ok(cropped)
            }
        }
    }

    fn encode_tile(&self, width: u16, height: u16, pixels: &[u8]) -> Result<Vec<u8>, WriteError> {
        match self.variant.plane_values() {
            None => Ok(pixels.to_vec()),
            Some(values) => {
                let padded = width.next_multiple_of(8) as usize;
                let layout = PlanarLayout::row_planar(padded, values, true);
                if padded == width as usize {
                    return Ok(to_planar(pixels, &layout)?);
                }
                let mut padded_pixels = Vec::with_capacity(padded * height as usize);
                for row in pixels.chunks_exact(width as usize) {
                    padded_pixels.extend_from_slice(row);
                    padded_pixels.extend(std::iter::repeat(0).take(padded - width as usize));
                }
                Ok(to_planar(&padded_pixels, &layout)?)
            }
        }
    }
}

impl FormatHandler for DaveTilesFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        match self.read(data) {
            Ok(image) => Identification::valid(format!(
                "offset table with {} decodable tiles",
                image.frames.len()
            )),
            Err(error) => Identification::invalid(error.to_string()),
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let offsets = self.parse_fat(data)?;

        let mut frames = Vec::with_capacity(offsets.len());
        for (index, &offset) in offsets.iter().enumerate() {
            let end = offsets.get(index + 1).copied().unwrap_or(data.len());
            let entry = &data[offset..end];

            let (width, height, body) = if index < FIXED_TILES {
                (FIXED_SIZE, FIXED_SIZE, entry)
            } else {
                let width = read_u16le(entry, 0).unwrap_or(0);
                let height = read_u16le(entry, 2).unwrap_or(0);
                if entry.len() < 4
                    || width == 0
                    || height == 0
                    || width > MAX_DIMENSION
                    || height > MAX_DIMENSION
                {
                    return Err(ReadError::MalformedHeader(format!(
                        "tile #{} has implausible size {}x{}",
                        index, width, height
                    )));
                }
                (width, height, &entry[4..])
            };

            let pixels = self.decode_tile(width, height, body)?;
            frames.push(Frame::with_size(width, height, pixels));
        }
        debug!("{}: decoded {} tiles", self.meta.id, frames.len());

        let mut image = Image::with_frames(FIXED_SIZE, FIXED_SIZE, frames);
        image.palette = Some(self.variant.default_palette());
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        let mut problems = check_common_limits(&self.meta, image);
        for (index, frame) in image.frames.iter().enumerate().take(FIXED_TILES) {
            let (width, height) = frame.size_in(image);
            if width != FIXED_SIZE || height != FIXED_SIZE {
                problems.push(format!(
                    "tile #{} is {}x{}, the first {} tiles must be {}x{}",
                    index, width, height, FIXED_TILES, FIXED_SIZE, FIXED_SIZE
                ));
            }
        }
        problems
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        if image.frames.is_empty() {
            return Err(WriteError::LimitViolation(
                "tileset needs at least one tile".into(),
            ));
        }

        let mut bodies = Vec::with_capacity(image.frames.len());
        for (index, frame) in image.frames.iter().enumerate() {
            let (width, height) = frame.size_in(image);
            let mut body = Vec::new();
            if index >= FIXED_TILES {
                body.extend_from_slice(&width.to_le_bytes());
                body.extend_from_slice(&height.to_le_bytes());
            }
            body.extend_from_slice(&self.encode_tile(width, height, &frame.pixels)?);
            bodies.push(body);
        }

        let header_len = 4 + bodies.len() * 4;
        let mut out = Vec::with_capacity(header_len + bodies.iter().map(Vec::len).sum::<usize>());
        out.extend_from_slice(&(bodies.len() as u32).to_le_bytes());
        let mut offset = header_len;
        for body in &bodies {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += body.len();
        }
        for body in &bodies {
            out.extend_from_slice(body);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;

    fn tileset(variant_max: usize, tile_count: usize) -> Image {
        let mut frames = Vec::new();
        for tile in 0..tile_count {
            let pixels = (0..256)
                .map(|i| ((i + tile) % variant_max) as u8)
                .collect();
            frames.push(Frame::with_size(16, 16, pixels));
        }
        Image::with_frames(16, 16, frames)
    }

    #[test]
    fn test_dave_vga_round_trip() {
        let format = DaveTilesFormat::vga();
        let image = tileset(256, 3);
        let bytes = format.write(&image).unwrap();

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames.len(), 3);
        for (frame, original) in decoded.frames.iter().zip(&image.frames) {
            assert_eq!(frame.pixels, original.pixels);
        }
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);
    }

    #[test]
    fn test_dave_ega_round_trip() {
        let format = DaveTilesFormat::ega();
        let image = tileset(16, 2);
        let decoded = format.read(&format.write(&image).unwrap()).unwrap();
        assert_eq!(decoded.frames[1].pixels, image.frames[1].pixels);
    }

    #[test]
    fn test_dave_cga_round_trip() {
        let format = DaveTilesFormat::cga();
        let image = tileset(4, 2);
        let decoded = format.read(&format.write(&image).unwrap()).unwrap();
        assert_eq!(decoded.frames[0].pixels, image.frames[0].pixels);
    }

    #[test]
    fn test_dave_variable_tiles_after_53() {
        let format = DaveTilesFormat::ega();
        let mut image = tileset(16, FIXED_TILES);
        // Entry 53 carries its own header and an uneven width.
        image
            .frames
            .push(Frame::with_size(12, 5, (0..60).map(|i| (i % 16) as u8).collect()));

        assert!(format.check_limits(&image).is_empty());
        let bytes = format.write(&image).unwrap();
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames.len(), FIXED_TILES + 1);
        assert_eq!(decoded.frames[FIXED_TILES].width, Some(12));
        assert_eq!(decoded.frames[FIXED_TILES].pixels, image.frames[FIXED_TILES].pixels);
    }

    #[test]
    fn test_dave_check_limits_guards_fixed_tiles() {
        let format = DaveTilesFormat::vga();
        let image = Image::with_frames(8, 8, vec![Frame::from_pixels(vec![0; 64])]);
        let problems = format.check_limits(&image);
        assert!(problems.iter().any(|p| p.contains("must be 16x16")));
    }

    #[test]
    fn test_dave_identify_rejects_garbage() {
        let format = DaveTilesFormat::vga();
        assert_eq!(format.identify(&[0xFF; 32]).verdict, Verdict::Invalid);
        assert_eq!(format.identify(&[]).verdict, Verdict::Invalid);
    }
}
