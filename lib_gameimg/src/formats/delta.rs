//! Delta-compressed single images: a 4-byte dimension header followed by
//! the delta/RLE stream.

use super::{
    check_common_limits, read_u16le, FormatHandler, FormatMetadata, Identification, ReadError,
    SizeBounds, WriteError,
};
use crate::codec::delta as delta_rle;
use crate::image::format::{Frame, Image};
use log::debug;

/// Palette index emitted for transparent pixels.
pub const TRANSPARENT: u8 = 0xFF;

const HEADER_LEN: usize = 4;
const MAX_DIMENSION: u16 = 4096;

pub struct DeltaFormat {
    meta: FormatMetadata,
}

impl Default for DeltaFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaFormat {
    pub fn new() -> Self {
        Self {
            meta: FormatMetadata {
                id: "img-delta",
                title: "Delta-compressed image",
                size: SizeBounds::Range {
                    min_width: 1,
                    max_width: MAX_DIMENSION,
                    min_height: 1,
                    max_height: MAX_DIMENSION,
                },
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

    fn parse(&self, data: &[u8]) -> Result<(u16, u16, Vec<u8>), ReadError> {
        if data.len() < HEADER_LEN {
            return Err(ReadError::MalformedHeader(format!(
                "need {} header bytes, file holds {}",
                HEADER_LEN,
                data.len()
            )));
        }
        let width = read_u16le(data, 0).unwrap_or(0);
        let height = read_u16le(data, 2).unwrap_or(0);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ReadError::MalformedHeader(format!(
                "implausible dimensions {}x{}",
                width, height
            )));
        }

        let pixel_count = width as usize * height as usize;
        let pixels = delta_rle::decode(&data[HEADER_LEN..], pixel_count, TRANSPARENT)?;
        Ok((width, height, pixels))
    }
}

impl FormatHandler for DeltaFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        match self.parse(data) {
            Ok((width, height, _)) => Identification::valid(format!(
                "header and delta stream decode to a {}x{} image",
                width, height
            )),
            Err(error) => Identification::invalid(error.to_string()),
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let (width, height, pixels) = self.parse(data)?;
        debug!("img-delta: decoded {}x{} image", width, height);
        Ok(Image::with_frames(
            width,
            height,
            vec![Frame::from_pixels(pixels)],
        ))
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let frame = image.frames.first().ok_or_else(|| {
            WriteError::LimitViolation("delta image needs exactly one frame".into())
        })?;
        let (width, height) = frame.size_in(image);

        let mut out = Vec::new();
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&delta_rle::encode(&frame.pixels, TRANSPARENT));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;

    fn gradient_image() -> Image {
        let pixels: Vec<u8> = (0..64).map(|i| 40 + (i % 8) as u8).collect();
        Image::with_frames(8, 8, vec![Frame::from_pixels(pixels)])
    }

    #[test]
    fn test_delta_round_trip() {
        let format = DeltaFormat::new();
        let image = gradient_image();
        assert!(format.check_limits(&image).is_empty());

        let bytes = format.write(&image).unwrap();
        assert_eq!(&bytes[..4], &[8, 0, 8, 0]);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.width, 8);
        assert_eq!(decoded.frames[0].pixels, image.frames[0].pixels);
    }

    #[test]
    fn test_delta_round_trip_with_transparency() {
        let format = DeltaFormat::new();
        let mut pixels = vec![TRANSPARENT; 100];
        pixels.extend((0..156).map(|i| (i / 2) as u8));
        let image = Image::with_frames(16, 16, vec![Frame::from_pixels(pixels.clone())]);

        let decoded = format.read(&format.write(&image).unwrap()).unwrap();
        assert_eq!(decoded.frames[0].pixels, pixels);
    }

    #[test]
    fn test_delta_identify() {
        let format = DeltaFormat::new();
        let bytes = format.write(&gradient_image()).unwrap();
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);

        assert_eq!(format.identify(&[8, 0]).verdict, Verdict::Invalid);
        assert_eq!(format.identify(&[0, 0, 8, 0, 1]).verdict, Verdict::Invalid);
    }

    #[test]
    fn test_delta_read_truncated() {
        let format = DeltaFormat::new();
        let mut bytes = format.write(&gradient_image()).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(format.read(&bytes), Err(ReadError::Rle(_))));
    }
}
