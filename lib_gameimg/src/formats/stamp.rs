//! Stamp sprite images and the Stamp Roll multi-sprite container.
//!
//! A Stamp is a single RLE-compressed sprite with a hotspot. Version 2
//! opens with an 8-byte header (width, height, hotspot x/y, all 16-bit
//! little-endian); version 1 prepends a 16-bit marker that is always 1.
//! A Roll is a 4-byte-aligned FAT of u32le offsets, each pointing at a
//! concatenated Stamp of the matching version.

use super::{
    check_common_limits, read_u16le, read_u32le, FormatHandler, FormatMetadata, Identification,
    ReadError, SizeBounds, WriteError,
};
use crate::codec::stamp as stamp_rle;
use crate::image::format::{Frame, Image};
use log::debug;

/// Palette index emitted for transparent pixels.
pub const TRANSPARENT: u8 = 0xFF;

const V1_MARKER: u16 = 1;
const MAX_DIMENSION: u16 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampVersion {
    V1,
    V2,
}

impl StampVersion {
    fn header_len(self) -> usize {
        match self {
            StampVersion::V1 => 10,
            StampVersion::V2 => 8,
        }
    }
}

struct StampHeader {
    width: u16,
    height: u16,
    hotspot: (i16, i16),
}

fn parse_header(version: StampVersion, data: &[u8]) -> Result<StampHeader, ReadError> {
    let header_len = version.header_len();
    if data.len() < header_len {
        return Err(ReadError::MalformedHeader(format!(
            "need {} header bytes, file holds {}",
            header_len,
            data.len()
        )));
    }

    let mut offset = 0;
    if version == StampVersion::V1 {
        let marker = read_u16le(data, 0).unwrap_or(0);
        if marker != V1_MARKER {
            return Err(ReadError::MalformedHeader(format!(
                "version marker is {}, expected {}",
                marker, V1_MARKER
            )));
        }
        offset = 2;
    }

    let width = read_u16le(data, offset).unwrap_or(0);
    let height = read_u16le(data, offset + 2).unwrap_or(0);
    let hotspot_x = read_u16le(data, offset + 4).unwrap_or(0) as i16;
    let hotspot_y = read_u16le(data, offset + 6).unwrap_or(0) as i16;

    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ReadError::MalformedHeader(format!(
            "implausible dimensions {}x{}",
            width, height
        )));
    }

    Ok(StampHeader {
        width,
        height,
        hotspot: (hotspot_x, hotspot_y),
    })
}

fn write_header(version: StampVersion, out: &mut Vec<u8>, header: &StampHeader) {
    if version == StampVersion::V1 {
        out.extend_from_slice(&V1_MARKER.to_le_bytes());
    }
    out.extend_from_slice(&header.width.to_le_bytes());
    out.extend_from_slice(&header.height.to_le_bytes());
    out.extend_from_slice(&header.hotspot.0.to_le_bytes());
    out.extend_from_slice(&header.hotspot.1.to_le_bytes());
}

fn read_stamp(version: StampVersion, data: &[u8]) -> Result<Frame, ReadError> {
    let header = parse_header(version, data)?;
    let pixel_count = header.width as usize * header.height as usize;
    let pixels = stamp_rle::decode(&data[version.header_len()..], pixel_count, TRANSPARENT)?;

    let mut frame = Frame::with_size(header.width, header.height, pixels);
    frame.hotspot = Some(header.hotspot);
    Ok(frame)
}

fn write_stamp(version: StampVersion, image: &Image, frame: &Frame) -> Vec<u8> {
    let (width, height) = frame.size_in(image);
    let header = StampHeader {
        width,
        height,
        hotspot: frame.hotspot.or(image.hotspot).unwrap_or((0, 0)),
    };
    let mut out = Vec::new();
    write_header(version, &mut out, &header);
    out.extend_from_slice(&stamp_rle::encode(&frame.pixels, TRANSPARENT));
    out
}

fn stamp_size_bounds() -> SizeBounds {
    SizeBounds::Range {
        min_width: 1,
        max_width: MAX_DIMENSION,
        min_height: 1,
        max_height: MAX_DIMENSION,
    }
}

/// Single-sprite Stamp image.
pub struct StampFormat {
    version: StampVersion,
    meta: FormatMetadata,
}

impl StampFormat {
    pub fn v1() -> Self {
        Self::new(
            StampVersion::V1,
            "img-stamp-v1",
            "Stamp sprite (version 1)",
        )
    }

    pub fn v2() -> Self {
        Self::new(
            StampVersion::V2,
            "img-stamp-v2",
            "Stamp sprite (version 2)",
        )
    }

    fn new(version: StampVersion, id: &'static str, title: &'static str) -> Self {
        Self {
            version,
            meta: FormatMetadata {
                id,
                title,
                size: stamp_size_bounds(),
                width_multiple: 1,
                depth: 8,
                has_palette: false,
                palette_depth: 8,
                transparent_index: Some(TRANSPARENT),
                min_frames: 1,
                max_frames: 1,
                max_images: 1,
            },
        }
    }
}

impl FormatHandler for StampFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        match read_stamp(self.version, data) {
            Ok(frame) => Identification::valid(format!(
                "header and RLE stream decode to a {}x{} sprite",
                frame.width.unwrap_or(0),
                frame.height.unwrap_or(0)
            )),
            Err(error) => Identification::invalid(error.to_string()),
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let frame = read_stamp(self.version, data)?;
        let (width, height) = (frame.width.unwrap_or(0), frame.height.unwrap_or(0));
        debug!("{}: decoded {}x{} sprite", self.meta.id, width, height);

        let mut image = Image::with_frames(width, height, vec![frame]);
        image.hotspot = image.frames[0].hotspot;
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let frame = image.frames.first().ok_or_else(|| {
            WriteError::LimitViolation("stamp image needs exactly one frame".into())
        })?;
        Ok(write_stamp(self.version, image, frame))
    }
}

/// Multi-sprite Stamp Roll container.
pub struct StampRollFormat {
    version: StampVersion,
    meta: FormatMetadata,
}

impl StampRollFormat {
    pub fn v1() -> Self {
        Self::new(StampVersion::V1, "img-stamp-roll-v1", "Stamp roll (version 1)")
    }

    pub fn v2() -> Self {
        Self::new(StampVersion::V2, "img-stamp-roll-v2", "Stamp roll (version 2)")
    }

    fn new(version: StampVersion, id: &'static str, title: &'static str) -> Self {
        Self {
            version,
            meta: FormatMetadata {
                id,
                title,
                size: stamp_size_bounds(),
                width_multiple: 1,
                depth: 8,
                has_palette: false,
                palette_depth: 8,
                transparent_index: Some(TRANSPARENT),
                min_frames: 1,
                max_frames: usize::MAX,
                max_images: 1,
            },
        }
    }

    /// Reads the offset FAT: the first entry doubles as the header size,
    /// so the sprite count is `first / 4`.
    fn parse_fat(&self, data: &[u8]) -> Result<Vec<usize>, ReadError> {
        let first = read_u32le(data, 0).ok_or_else(|| {
            ReadError::MalformedHeader("file too short for an offset table".into())
        })? as usize;
        if first == 0 || first % 4 != 0 {
            return Err(ReadError::MalformedHeader(format!(
                "first offset {} is not a positive multiple of 4",
                first
            )));
        }

        let count = first / 4;
        let mut offsets = Vec::with_capacity(count);
        for entry in 0..count {
            let offset = read_u32le(data, entry * 4).ok_or_else(|| {
                ReadError::MalformedHeader(format!(
                    "offset table entry #{} lies past the end of the file",
                    entry
                ))
            })? as usize;
            if offset > data.len() {
                return Err(ReadError::MalformedHeader(format!(
                    "entry #{} points to {}, past the {}-byte file",
                    entry,
                    offset,
                    data.len()
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
}

impl FormatHandler for StampRollFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        let offsets = match self.parse_fat(data) {
            Ok(offsets) => offsets,
            Err(error) => return Identification::invalid(error.to_string()),
        };
        // Sub-image headers are cheap to verify; the full RLE check
        // happens at read time.
        for (index, &offset) in offsets.iter().enumerate() {
            if let Err(error) = parse_header(self.version, &data[offset..]) {
                return Identification::invalid(format!("sprite #{}: {}", index, error));
            }
        }
        Identification::valid(format!("offset table with {} decodable sprites", offsets.len()))
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let offsets = self.parse_fat(data)?;
        let mut frames = Vec::with_capacity(offsets.len());
        for (index, &offset) in offsets.iter().enumerate() {
            let end = offsets.get(index + 1).copied().unwrap_or(data.len());
            frames.push(read_stamp(self.version, &data[offset..end])?);
        }
        debug!("{}: decoded {} sprites", self.meta.id, frames.len());

        // Frames carry their own sizes; the image defaults mirror the
        // first sprite.
        let (width, height) = frames
            .first()
            .map(|f| (f.width.unwrap_or(0), f.height.unwrap_or(0)))
            .unwrap_or((0, 0));
        Ok(Image::with_frames(width, height, frames))
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        if image.frames.is_empty() {
            return Err(WriteError::LimitViolation(
                "stamp roll needs at least one frame".into(),
            ));
        }

        let bodies: Vec<Vec<u8>> = image
            .frames
            .iter()
            .map(|frame| write_stamp(self.version, image, frame))
            .collect();

        let fat_len = bodies.len() * 4;
        let mut out = Vec::with_capacity(fat_len + bodies.iter().map(Vec::len).sum::<usize>());
        let mut offset = fat_len;
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
