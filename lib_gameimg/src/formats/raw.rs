//! Headerless raw rasters: linear 8bpp VGA dumps and 4-plane EGA planar
//! dumps. Dimensions come from the handler, not the file, so `identify`
//! can never answer better than `Unknown`.

use super::{
    check_common_limits, FormatHandler, FormatMetadata, Identification, ReadError, SizeBounds,
    WriteError,
};
use crate::codec::planar::{from_planar, to_planar, PlanarLayout};
use crate::image::format::{Frame, Image};

/// Plane values for the standard EGA BGRI plane order.
pub const EGA_PLANE_VALUES: [u8; 4] = [1, 2, 4, 8];

/// Linear one-byte-per-pixel raster with no header.
pub struct RawLinearFormat {
    width: u16,
    height: u16,
    meta: FormatMetadata,
}

impl RawLinearFormat {
    /// 320x200 full screen, the by far most common dump size.
    pub fn fullscreen() -> Self {
        Self::new(320, 200)
    }

    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            meta: FormatMetadata {
                id: "img-raw-vga",
                title: "Raw VGA linear image",
                size: SizeBounds::Fixed { width, height },
                width_multiple: 1,
                depth: 8,
                has_palette: false,
                palette_depth: 8,
                transparent_index: None,
                min_frames: 1,
                max_frames: 1,
                max_images: 1,
            },
        }
    }

    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl FormatHandler for RawLinearFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        let expected = self.expected_len();
        if data.len() == expected {
            // Any file of the right size is a plausible dump; the bytes
            // carry no signature to check.
            Identification::unknown(format!(
                "exactly {} bytes; indistinguishable from other raw data",
                expected
            ))
        } else {
            Identification::invalid(format!(
                "{} bytes, a {}x{} linear raster holds {}",
                data.len(),
                self.width,
                self.height,
                expected
            ))
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let expected = self.expected_len();
        if data.len() != expected {
            return Err(ReadError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Image::with_frames(
            self.width,
            self.height,
            vec![Frame::from_pixels(data.to_vec())],
        ))
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let frame = image.frames.first().ok_or_else(|| {
            WriteError::LimitViolation("raw image needs exactly one frame".into())
        })?;
        Ok(frame.pixels.clone())
    }
}

/// Plane interleave granularity of a planar dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarVariant {
    /// Planes switch every 8 pixels.
    BytePlanar,
    /// Planes switch every full row.
    RowPlanar,
}

/// 16-color planar raster with no header, 4 planes in BGRI order, MSB
/// bit order.
pub struct RawPlanarFormat {
    width: u16,
    height: u16,
    variant: PlanarVariant,
    meta: FormatMetadata,
}

impl RawPlanarFormat {
    pub fn fullscreen() -> Self {
        Self::new(320, 200, PlanarVariant::RowPlanar)
    }

    pub fn new(width: u16, height: u16, variant: PlanarVariant) -> Self {
        Self {
            width,
            height,
            variant,
            meta: FormatMetadata {
                id: "img-raw-ega",
                title: "Raw EGA planar image",
                size: SizeBounds::Fixed { width, height },
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

    fn layout(&self) -> PlanarLayout {
        match self.variant {
            PlanarVariant::BytePlanar => {
                PlanarLayout::byte_planar(EGA_PLANE_VALUES.to_vec(), true)
            }
            PlanarVariant::RowPlanar => {
                PlanarLayout::row_planar(self.width as usize, EGA_PLANE_VALUES.to_vec(), true)
            }
        }
    }

    fn expected_len(&self) -> usize {
        // 4 bits per pixel regardless of interleave granularity.
        self.width as usize * self.height as usize / 2
    }
}

impl FormatHandler for RawPlanarFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        let expected = self.expected_len();
        if data.len() == expected {
            Identification::unknown(format!(
                "exactly {} bytes; indistinguishable from other raw data",
                expected
            ))
        } else {
            Identification::invalid(format!(
                "{} bytes, a {}x{} 4-plane raster holds {}",
                data.len(),
                self.width,
                self.height,
                expected
            ))
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let expected = self.expected_len();
        if data.len() != expected {
            return Err(ReadError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let pixels = from_planar(data, &self.layout())?;
        Ok(Image::with_frames(
            self.width,
            self.height,
            vec![Frame::from_pixels(pixels)],
        ))
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_common_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let frame = image.frames.first().ok_or_else(|| {
            WriteError::LimitViolation("raw image needs exactly one frame".into())
        })?;
        Ok(to_planar(&frame.pixels, &self.layout())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;

    #[test]
    fn test_raw_linear_round_trip() {
        let format = RawLinearFormat::new(16, 4);
        let pixels: Vec<u8> = (0..64).collect();
        let image = Image::with_frames(16, 4, vec![Frame::from_pixels(pixels.clone())]);

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes, pixels);
        assert_eq!(format.read(&bytes).unwrap().frames[0].pixels, pixels);
    }

    #[test]
    fn test_raw_linear_identify_is_tristate() {
        let format = RawLinearFormat::new(16, 4);
        assert_eq!(format.identify(&[0; 64]).verdict, Verdict::Unknown);
        assert_eq!(format.identify(&[0; 63]).verdict, Verdict::Invalid);
    }

    #[test]
    fn test_raw_linear_read_size_mismatch() {
        let format = RawLinearFormat::new(16, 4);
        assert!(matches!(
            format.read(&[0; 63]),
            Err(ReadError::SizeMismatch {
                expected: 64,
                actual: 63
            })
        ));
    }

    #[test]
    fn test_raw_planar_round_trip_both_variants() {
        for variant in [PlanarVariant::BytePlanar, PlanarVariant::RowPlanar] {
            let format = RawPlanarFormat::new(16, 4, variant);
            let pixels: Vec<u8> = (0..64).map(|i| (i % 16) as u8).collect();
            let image = Image::with_frames(16, 4, vec![Frame::from_pixels(pixels.clone())]);

            let bytes = format.write(&image).unwrap();
            assert_eq!(bytes.len(), 32);
            assert_eq!(format.read(&bytes).unwrap().frames[0].pixels, pixels);
        }
    }

    #[test]
    fn test_raw_planar_fullscreen_length() {
        let format = RawPlanarFormat::fullscreen();
        assert_eq!(format.identify(&[0; 32000]).verdict, Verdict::Unknown);
        assert_eq!(format.identify(&[0; 64000]).verdict, Verdict::Invalid);
    }
}
