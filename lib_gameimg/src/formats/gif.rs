//! GIF 87a and 89a.
//!
//! Both versions share the logical screen descriptor, color tables and
//! LZW-compressed rasters; 89a adds extension blocks (graphic control,
//! application, comment, plain text). The 87a handler therefore rejects
//! any extension block outright, both when sniffing and when reading.
//! Transparency arrives as a per-frame alpha-0 palette override, frame
//! delays populate the animation sequence, and a Netscape loop extension
//! is kept in the tag map.

use super::{
    check_common_limits, read_u16le, FormatHandler, FormatMetadata, Identification, ReadError,
    SizeBounds, WriteError,
};
use crate::codec::lzw::{lzw_compression, lzw_decompression};
use crate::image::format::{transparent_index, AnimationStep, Frame, Image, Palette};
use log::{debug, warn};

const TRAILER: u8 = 0x3B;
const IMAGE_SEPARATOR: u8 = 0x2C;
const EXTENSION_INTRODUCER: u8 = 0x21;
const LABEL_GRAPHIC_CONTROL: u8 = 0xF9;
const LABEL_APPLICATION: u8 = 0xFF;

const LSD_LEN: usize = 13;
const NETSCAPE_APP_ID: &[u8] = b"NETSCAPE2.0";

/// Tag key holding the Netscape animation loop count.
pub const LOOP_TAG: &str = "loop-count";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GifVersion {
    Gif87a,
    Gif89a,
}

impl GifVersion {
    fn magic(self) -> &'static [u8; 6] {
        match self {
            GifVersion::Gif87a => b"GIF87a",
            GifVersion::Gif89a => b"GIF89a",
        }
    }

    fn supports_extensions(self) -> bool {
        self == GifVersion::Gif89a
    }
}

/// Pending graphic control state applied to the next raster.
#[derive(Debug, Clone, Copy, Default)]
struct GraphicControl {
    transparent: Option<u8>,
    delay_ms: u16,
}

fn color_table(data: &[u8], pos: &mut usize, entries: usize) -> Result<Palette, ReadError> {
    let len = entries * 3;
    if *pos + len > data.len() {
        return Err(ReadError::MalformedHeader(format!(
            "color table of {} entries lies past the end of the file",
            entries
        )));
    }
    let palette = data[*pos..*pos + len]
        .chunks_exact(3)
        .map(|rgb| [rgb[0], rgb[1], rgb[2], 0xFF])
        .collect();
    *pos += len;
    Ok(palette)
}

/// Concatenates a sub-block chain into one buffer, consuming through the
/// zero terminator.
fn read_sub_blocks(data: &[u8], pos: &mut usize) -> Result<Vec<u8>, ReadError> {
    let mut out = Vec::new();
    loop {
        let len = *data.get(*pos).ok_or_else(|| {
            ReadError::MalformedHeader("sub-block chain runs past the end of the file".into())
        })? as usize;
        *pos += 1;
        if len == 0 {
            return Ok(out);
        }
        if *pos + len > data.len() {
            return Err(ReadError::MalformedHeader(
                "sub-block runs past the end of the file".into(),
            ));
        }
        out.extend_from_slice(&data[*pos..*pos + len]);
        *pos += len;
    }
}

fn write_sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
}

/// Reorders the four interlace passes back into sequential rows.
fn deinterlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; pixels.len()];
    let mut source_row = 0;
    for &(start, step) in &[(0usize, 8usize), (4, 8), (2, 4), (1, 2)] {
        let mut row = start;
        while row < height {
            out[row * width..(row + 1) * width]
                .copy_from_slice(&pixels[source_row * width..(source_row + 1) * width]);
            source_row += 1;
            row += step;
        }
    }
    out
}

/// Smallest legal color table size covering `entries`: a power of two,
/// at least 2.
fn table_size(entries: usize) -> usize {
    entries.next_power_of_two().max(2)
}

/// Size exponent stored in the packed fields: table holds `2^(n+1)`
/// entries.
fn table_size_bits(size: usize) -> u8 {
    (size.trailing_zeros() - 1) as u8
}

pub struct GifFormat {
    version: GifVersion,
    meta: FormatMetadata,
}

impl GifFormat {
    pub fn gif87a() -> Self {
        Self::new(GifVersion::Gif87a, "img-gif87a", "GIF image (87a)")
    }

    pub fn gif89a() -> Self {
        Self::new(GifVersion::Gif89a, "img-gif89a", "GIF image (89a)")
    }

    fn new(version: GifVersion, id: &'static str, title: &'static str) -> Self {
        Self {
            version,
            meta: FormatMetadata {
                id,
                title,
                size: SizeBounds::Range {
                    min_width: 1,
                    max_width: u16::MAX,
                    min_height: 1,
                    max_height: u16::MAX,
                },
                width_multiple: 1,
                depth: 8,
                has_palette: true,
                palette_depth: 8,
                transparent_index: None,
                min_frames: 1,
                max_frames: usize::MAX,
                max_images: 1,
            },
        }
    }

    fn check_magic(&self, data: &[u8]) -> Result<(), ReadError> {
        if data.len() < LSD_LEN {
            return Err(ReadError::MalformedHeader(format!(
                "need {} header bytes, file holds {}",
                LSD_LEN,
                data.len()
            )));
        }
        if &data[..6] != self.version.magic() {
            return Err(ReadError::MalformedHeader(format!(
                "signature {:?} does not match {}",
                &data[..6],
                String::from_utf8_lossy(self.version.magic())
            )));
        }
        Ok(())
    }
}

impl FormatHandler for GifFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    /// Structural walk to the trailer without decompressing any raster.
    fn identify(&self, data: &[u8]) -> Identification {
        if let Err(error) = self.check_magic(data) {
            return Identification::invalid(error.to_string());
        }

        let packed = data[10];
        let mut pos = LSD_LEN;
        if packed & 0x80 != 0 {
            pos += (2 << (packed & 0x07)) * 3;
        }

        let mut rasters = 0usize;
        loop {
            let Some(&block) = data.get(pos) else {
                return Identification::invalid("file ends before the trailer byte".to_string());
            };
            pos += 1;
            match block {
                TRAILER => break,
                EXTENSION_INTRODUCER => {
                    if !self.version.supports_extensions() {
                        return Identification::invalid(
                            "extension blocks are not allowed in GIF87a".to_string(),
                        );
                    }
                    pos += 1; // label
                    if read_sub_blocks(data, &mut pos).is_err() {
                        return Identification::invalid(
                            "extension sub-blocks run past the end of the file".to_string(),
                        );
                    }
                }
                IMAGE_SEPARATOR => {
                    if pos + 9 > data.len() {
                        return Identification::invalid(
                            "image descriptor runs past the end of the file".to_string(),
                        );
                    }
                    let packed = data[pos + 8];
                    pos += 9;
                    if packed & 0x80 != 0 {
                        pos += (2 << (packed & 0x07)) * 3;
                    }
                    pos += 1; // LZW minimum code size
                    if pos > data.len() || read_sub_blocks(data, &mut pos).is_err() {
                        return Identification::invalid(
                            "raster data runs past the end of the file".to_string(),
                        );
                    }
                    rasters += 1;
                }
                other => {
                    return Identification::invalid(format!(
                        "unknown block introducer {:#04x}",
                        other
                    ));
                }
            }
        }

        if rasters == 0 {
            return Identification::invalid("no raster before the trailer".to_string());
        }
        Identification::valid(format!("well-formed GIF structure with {} rasters", rasters))
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        self.check_magic(data)?;

        let screen_width = read_u16le(data, 6).unwrap_or(0);
        let screen_height = read_u16le(data, 8).unwrap_or(0);
        let packed = data[10];

        let mut pos = LSD_LEN;
        let global_palette = if packed & 0x80 != 0 {
            Some(color_table(data, &mut pos, 2 << (packed & 0x07))?)
        } else {
            None
        };

        let mut image = Image::new(screen_width, screen_height);
        image.palette = global_palette.clone();

        let mut pending: Option<GraphicControl> = None;
        loop {
            let block = *data.get(pos).ok_or_else(|| {
                ReadError::MalformedHeader("file ends before the trailer byte".into())
            })?;
            pos += 1;

            match block {
                TRAILER => break,
                EXTENSION_INTRODUCER => {
                    if !self.version.supports_extensions() {
                        return Err(ReadError::MalformedHeader(
                            "extension blocks are not allowed in GIF87a".into(),
                        ));
                    }
                    let label = *data.get(pos).ok_or_else(|| {
                        ReadError::MalformedHeader("extension label missing".into())
                    })?;
                    pos += 1;
                    let body = read_sub_blocks(data, &mut pos)?;

                    match label {
                        LABEL_GRAPHIC_CONTROL => {
                            if body.len() < 4 {
                                return Err(ReadError::MalformedHeader(format!(
                                    "graphic control block holds {} bytes, expected 4",
                                    body.len()
                                )));
                            }
                            let flags = body[0];
                            let delay = u16::from_le_bytes([body[1], body[2]]);
                            pending = Some(GraphicControl {
                                transparent: (flags & 0x01 != 0).then_some(body[3]),
                                delay_ms: delay.saturating_mul(10),
                            });
                        }
                        LABEL_APPLICATION => {
                            if body.starts_with(NETSCAPE_APP_ID) && body.len() >= 14 {
                                let loops = u16::from_le_bytes([body[12], body[13]]);
                                image.tags.insert(LOOP_TAG.into(), loops.to_string());
                            } else {
                                debug!("skipping application extension");
                            }
                        }
                        other => {
                            debug!("skipping extension {:#04x}", other);
                        }
                    }
                }
                IMAGE_SEPARATOR => {
                    if pos + 9 > data.len() {
                        return Err(ReadError::MalformedHeader(
                            "image descriptor runs past the end of the file".into(),
                        ));
                    }
                    let left = read_u16le(data, pos).unwrap_or(0);
                    let top = read_u16le(data, pos + 2).unwrap_or(0);
                    let width = read_u16le(data, pos + 4).unwrap_or(0);
                    let height = read_u16le(data, pos + 6).unwrap_or(0);
                    let packed = data[pos + 8];
                    pos += 9;

                    if width == 0 || height == 0 {
                        return Err(ReadError::MalformedHeader(format!(
                            "raster has implausible size {}x{}",
                            width, height
                        )));
                    }

                    let local_palette = if packed & 0x80 != 0 {
                        Some(color_table(data, &mut pos, 2 << (packed & 0x07))?)
                    } else {
                        None
                    };

                    let min_code_size = *data.get(pos).ok_or_else(|| {
                        ReadError::MalformedHeader("LZW minimum code size missing".into())
                    })?;
                    pos += 1;
                    if !(2..=8).contains(&min_code_size) {
                        return Err(ReadError::UnsupportedParameter(format!(
                            "LZW minimum code size {}",
                            min_code_size
                        )));
                    }
                    let stream = read_sub_blocks(data, &mut pos)?;
                    let mut pixels = lzw_decompression(&stream, min_code_size)?;

                    let expected = width as usize * height as usize;
                    if pixels.len() != expected {
                        return Err(ReadError::SizeMismatch {
                            expected,
                            actual: pixels.len(),
                        });
                    }
                    if packed & 0x40 != 0 {
                        pixels = deinterlace(&pixels, width as usize, height as usize);
                    }

                    let mut frame = Frame::with_size(width, height, pixels);
                    if (left, top) != (0, 0) {
                        frame.hotspot = Some((left as i16, top as i16));
                    }
                    if let Some(control) = pending.take() {
                        frame.delay_ms = Some(control.delay_ms);
                        if let Some(index) = control.transparent {
                            let mut palette = local_palette
                                .clone()
                                .or_else(|| global_palette.clone())
                                .unwrap_or_default();
                            if let Some(entry) = palette.get_mut(index as usize) {
                                entry[3] = 0;
                            } else {
                                warn!(
                                    "transparent index {} outside the {}-entry palette",
                                    index,
                                    palette.len()
                                );
                            }
                            frame.palette = Some(palette);
                        } else {
                            frame.palette = local_palette;
                        }
                    } else {
                        frame.palette = local_palette;
                    }
                    image.frames.push(frame);
                }
                other => {
                    return Err(ReadError::MalformedHeader(format!(
                        "unknown block introducer {:#04x}",
                        other
                    )));
                }
            }
        }

        if image.frames.is_empty() {
            return Err(ReadError::MalformedHeader("no raster before the trailer".into()));
        }
        if image.frames.len() > 1 && image.frames.iter().any(|f| f.delay_ms.is_some()) {
            image.animation = image
                .frames
                .iter()
                .enumerate()
                .map(|(frame, f)| AnimationStep {
                    frame,
                    delay_ms: f.delay_ms.unwrap_or(0),
                })
                .collect();
        }
        debug!(
            "{}: decoded {} frames on a {}x{} screen",
            self.meta.id,
            image.frames.len(),
            screen_width,
            screen_height
        );
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        let mut problems = check_common_limits(&self.meta, image);
        if image.palette.is_none() {
            problems.push("image carries no palette for the global color table".into());
        }
        if !self.version.supports_extensions() {
            if image.frames.iter().any(|f| f.delay_ms.is_some()) {
                problems.push("GIF87a cannot store frame delays".into());
            }
            let transparent = image
                .palette
                .as_ref()
                .and_then(transparent_index)
                .is_some()
                || image
                    .frames
                    .iter()
                    .any(|f| f.palette.as_ref().and_then(transparent_index).is_some());
            if transparent {
                problems.push("GIF87a cannot store a transparent index".into());
            }
        }
        problems
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let global = image.palette.as_ref().ok_or_else(|| {
            WriteError::LimitViolation("image carries no palette for the global color table".into())
        })?;
        if image.frames.is_empty() {
            return Err(WriteError::LimitViolation("no frames to write".into()));
        }

        let mut out = Vec::new();
        out.extend_from_slice(self.version.magic());
        out.extend_from_slice(&image.width.to_le_bytes());
        out.extend_from_slice(&image.height.to_le_bytes());

        let global_size = table_size(global.len());
        // Global table present, 8 significant bits per channel.
        out.push(0x80 | 0x70 | table_size_bits(global_size));
        out.push(0); // background color index
        out.push(0); // pixel aspect ratio
        for index in 0..global_size {
            let [r, g, b, _] = global.get(index).copied().unwrap_or([0, 0, 0, 0xFF]);
            out.extend_from_slice(&[r, g, b]);
        }

        if self.version.supports_extensions() {
            if let Some(loops) = image.tags.get(LOOP_TAG).and_then(|t| t.parse::<u16>().ok()) {
                out.extend_from_slice(&[EXTENSION_INTRODUCER, LABEL_APPLICATION, 11]);
                out.extend_from_slice(NETSCAPE_APP_ID);
                out.extend_from_slice(&[3, 1]);
                out.extend_from_slice(&loops.to_le_bytes());
                out.push(0);
            }
        }

        for frame in &image.frames {
            let (width, height) = frame.size_in(image);
            let effective = frame.palette.as_ref().unwrap_or(global);
            let transparent = transparent_index(effective);

            if self.version.supports_extensions() {
                if frame.delay_ms.is_some() || transparent.is_some() {
                    let delay = frame.delay_ms.unwrap_or(0) / 10;
                    out.extend_from_slice(&[EXTENSION_INTRODUCER, LABEL_GRAPHIC_CONTROL, 4]);
                    out.push(u8::from(transparent.is_some()));
                    out.extend_from_slice(&delay.to_le_bytes());
                    out.push(transparent.unwrap_or(0));
                    out.push(0);
                }
            }

            // A local table is only worth writing when the colors differ;
            // an alpha-only difference is carried by the graphic control
            // block instead.
            let rgb_differs = frame.palette.as_ref().is_some_and(|palette| {
                palette.len() != global.len()
                    || palette
                        .iter()
                        .zip(global.iter())
                        .any(|(a, b)| a[..3] != b[..3])
            });

            let (left, top) = frame.hotspot.unwrap_or((0, 0));
            out.push(IMAGE_SEPARATOR);
            out.extend_from_slice(&(left.max(0) as u16).to_le_bytes());
            out.extend_from_slice(&(top.max(0) as u16).to_le_bytes());
            out.extend_from_slice(&width.to_le_bytes());
            out.extend_from_slice(&height.to_le_bytes());

            let local_size = table_size(effective.len());
            if rgb_differs {
                out.push(0x80 | table_size_bits(local_size));
                for index in 0..local_size {
                    let [r, g, b, _] = effective.get(index).copied().unwrap_or([0, 0, 0, 0xFF]);
                    out.extend_from_slice(&[r, g, b]);
                }
            } else {
                out.push(0);
            }

            let code_table = if rgb_differs { local_size } else { global_size };
            let min_code_size = (table_size_bits(code_table) + 1).max(2);
            let stream = lzw_compression(&frame.pixels, min_code_size)?;
            out.push(min_code_size);
            write_sub_blocks(&mut out, &stream);
        }

        out.push(TRAILER);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;
    use crate::palette::palette_cga16;

    fn single_frame_image() -> Image {
        let pixels: Vec<u8> = (0..64).map(|i| (i % 16) as u8).collect();
        let mut image = Image::with_frames(8, 8, vec![Frame::from_pixels(pixels)]);
        image.palette = Some(palette_cga16());
        image
    }

    #[test]
    fn test_gif_round_trip_87a() {
        let format = GifFormat::gif87a();
        let image = single_frame_image();
        assert!(format.check_limits(&image).is_empty());

        let bytes = format.write(&image).unwrap();
        assert_eq!(&bytes[..6], b"GIF87a");
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.width, 8);
        assert_eq!(decoded.frames[0].pixels, image.frames[0].pixels);
        assert_eq!(decoded.palette.as_ref().unwrap().len(), 16);
    }

    #[test]
    fn test_gif87a_rejects_extensions() {
        let gif89a = GifFormat::gif89a();
        let mut image = single_frame_image();
        image.frames[0].delay_ms = Some(100);
        let bytes = gif89a.write(&image).unwrap();

        let gif87a = GifFormat::gif87a();
        // Wrong signature outright.
        assert_eq!(gif87a.identify(&bytes).verdict, Verdict::Invalid);

        // Same structure with a forged 87a signature still fails on the
        // extension block.
        let mut forged = bytes.clone();
        forged[..6].copy_from_slice(b"GIF87a");
        let identification = gif87a.identify(&forged);
        assert_eq!(identification.verdict, Verdict::Invalid);
        assert!(identification.reason.contains("extension"));
        assert!(matches!(
            gif87a.read(&forged),
            Err(ReadError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_gif89a_animation_round_trip() {
        let format = GifFormat::gif89a();
        let mut frame_a = Frame::from_pixels((0..64).map(|i| (i % 16) as u8).collect());
        frame_a.delay_ms = Some(100);
        let mut frame_b = Frame::from_pixels(vec![3; 64]);
        frame_b.delay_ms = Some(250);

        let mut image = Image::with_frames(8, 8, vec![frame_a, frame_b]);
        image.palette = Some(palette_cga16());
        image.tags.insert(LOOP_TAG.into(), "0".into());

        let bytes = format.write(&image).unwrap();
        let decoded = format.read(&bytes).unwrap();

        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.frames[0].delay_ms, Some(100));
        assert_eq!(decoded.frames[1].delay_ms, Some(250));
        assert_eq!(decoded.frames[1].pixels, vec![3; 64]);
        assert_eq!(decoded.animation.len(), 2);
        assert_eq!(decoded.animation[1].delay_ms, 250);
        assert_eq!(decoded.tags.get(LOOP_TAG).unwrap(), "0");
        assert!(decoded.validate_animation().is_ok());
    }

    #[test]
    fn test_gif89a_transparency_round_trip() {
        let format = GifFormat::gif89a();
        let mut image = single_frame_image();
        let mut palette = palette_cga16();
        palette[5][3] = 0;
        image.frames[0].palette = Some(palette);

        let bytes = format.write(&image).unwrap();
        let decoded = format.read(&bytes).unwrap();
        let frame_palette = decoded.frames[0].palette.as_ref().unwrap();
        assert_eq!(transparent_index(frame_palette), Some(5));
        // The colors themselves match the global table.
        assert_eq!(frame_palette[5][..3], palette_cga16()[5][..3]);
    }

    #[test]
    fn test_gif_local_color_table() {
        let format = GifFormat::gif89a();
        let mut image = single_frame_image();
        let mut local = palette_cga16();
        local[0] = [12, 34, 56, 0xFF];
        image.frames[0].palette = Some(local.clone());

        let bytes = format.write(&image).unwrap();
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames[0].palette.as_ref().unwrap()[0][..3], [12, 34, 56]);
    }

    #[test]
    fn test_gif_interlaced_read() {
        let format = GifFormat::gif87a();
        // 4x4 raster, two colors, written interlaced by hand: row order
        // on disk is 0, 2, 1, 3.
        let rows: [[u8; 4]; 4] = [[0; 4], [1; 4], [0; 4], [1; 4]];
        let disk_order = [rows[0], rows[2], rows[1], rows[3]].concat();
        let stream = lzw_compression(&disk_order, 2).unwrap();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"GIF87a");
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&[0x80, 0, 0]); // 2-entry global table
        bytes.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        bytes.push(IMAGE_SEPARATOR);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.push(0x40); // interlaced, no local table
        bytes.push(2);
        write_sub_blocks(&mut bytes, &stream);
        bytes.push(TRAILER);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.frames[0].pixels, rows.concat());
    }

    #[test]
    fn test_gif_check_limits_87a_animation() {
        let format = GifFormat::gif87a();
        let mut image = single_frame_image();
        image.frames[0].delay_ms = Some(100);
        let problems = format.check_limits(&image);
        assert!(problems.iter().any(|p| p.contains("delays")));
    }

    #[test]
    fn test_gif_identify_truncated() {
        let format = GifFormat::gif87a();
        let image = single_frame_image();
        let bytes = format.write(&image).unwrap();
        assert_eq!(format.identify(&bytes[..20]).verdict, Verdict::Invalid);
        assert_eq!(
            format.identify(&bytes[..bytes.len() - 1]).verdict,
            Verdict::Invalid
        );
    }

    #[test]
    fn test_gif_read_reports_pixel_shortfall() {
        let format = GifFormat::gif87a();
        // Raster declares 4x4 but the stream only decodes 8 pixels.
        let stream = lzw_compression(&[0u8; 8], 2).unwrap();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"GIF87a");
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&[0x80, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        bytes.push(IMAGE_SEPARATOR);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.push(0);
        bytes.push(2);
        write_sub_blocks(&mut bytes, &stream);
        bytes.push(TRAILER);

        assert!(matches!(
            format.read(&bytes),
            Err(ReadError::SizeMismatch {
                expected: 16,
                actual: 8
            })
        ));
    }
}
