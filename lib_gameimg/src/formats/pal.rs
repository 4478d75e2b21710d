//! Standalone VGA palette files: the plain 768-byte dump in 8-bit or
//! 6-bit channel precision, and the Papyrus variant with a 3-byte
//! start/count header.
//!
//! A 6-bit file may legally contain the value 64: some tools wrote the
//! hardware maximum off by one. It is clamped to 63 before expansion.

use super::{
    check_common_limits, FormatHandler, FormatMetadata, Identification, ReadError, SizeBounds,
    WriteError,
};
use crate::image::format::{Image, Palette};
use crate::palette::{pal6_to_8, pal8_to_6};
use log::debug;

const PALETTE_FILE_LEN: usize = 768;
const SIX_BIT_MAX: u8 = 64;

fn palette_meta(id: &'static str, title: &'static str, palette_depth: u8) -> FormatMetadata {
    FormatMetadata {
        id,
        title,
        size: SizeBounds::PerFrame,
        width_multiple: 1,
        depth: 8,
        has_palette: true,
        palette_depth,
        transparent_index: None,
        min_frames: 0,
        max_frames: 0,
        max_images: 1,
    }
}

fn palette_image(palette: Palette) -> Image {
    let mut image = Image::new(0, 0);
    image.palette = Some(palette);
    image
}

fn require_palette(image: &Image) -> Result<&Palette, WriteError> {
    image
        .palette
        .as_ref()
        .ok_or_else(|| WriteError::LimitViolation("image carries no palette to write".into()))
}

fn check_palette_limits(meta: &FormatMetadata, image: &Image) -> Vec<String> {
    let mut problems = check_common_limits(meta, image);
    if image.palette.is_none() {
        problems.push("image carries no palette".into());
    }
    problems
}

/// Plain 768-byte RGB dump, 8-bit or 6-bit channels.
pub struct VgaPaletteFormat {
    six_bit: bool,
    meta: FormatMetadata,
}

impl VgaPaletteFormat {
    pub fn eight_bit() -> Self {
        Self {
            six_bit: false,
            meta: palette_meta("pal-vga-8bit", "VGA palette (8-bit)", 8),
        }
    }

    pub fn six_bit() -> Self {
        Self {
            six_bit: true,
            meta: palette_meta("pal-vga-6bit", "VGA palette (6-bit)", 6),
        }
    }
}

impl FormatHandler for VgaPaletteFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        if data.len() != PALETTE_FILE_LEN {
            return Identification::invalid(format!(
                "{} bytes does not match the {}-byte palette length",
                data.len(),
                PALETTE_FILE_LEN
            ));
        }

        let oversized = data.iter().any(|&value| value > SIX_BIT_MAX);
        if self.six_bit {
            if oversized {
                Identification::invalid("channel values above 64 do not fit a 6-bit palette")
            } else {
                Identification::valid("768 bytes of 6-bit channel values")
            }
        } else if data[..3] != [0, 0, 0] {
            Identification::invalid("first palette entry is not black")
        } else if oversized {
            Identification::valid("768 bytes with 8-bit channel values above 64")
        } else {
            Identification::unknown("all channel values also fit a 6-bit palette")
        }
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        if data.len() != PALETTE_FILE_LEN {
            return Err(ReadError::SizeMismatch {
                expected: PALETTE_FILE_LEN,
                actual: data.len(),
            });
        }

        let mut palette = Palette::with_capacity(256);
        for entry in data.chunks_exact(3) {
            let channel = |value: u8| -> Result<u8, ReadError> {
                if self.six_bit {
                    if value > SIX_BIT_MAX {
                        return Err(ReadError::MalformedHeader(format!(
                            "channel value {} out of 6-bit range",
                            value
                        )));
                    }
                    Ok(pal6_to_8(value.min(SIX_BIT_MAX - 1)))
                } else {
                    Ok(value)
                }
            };
            palette.push([channel(entry[0])?, channel(entry[1])?, channel(entry[2])?, 0xFF]);
        }
        debug!("{}: read {} palette entries", self.meta.id, palette.len());
        Ok(palette_image(palette))
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        check_palette_limits(&self.meta, image)
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let palette = require_palette(image)?;
        let mut out = Vec::with_capacity(PALETTE_FILE_LEN);
        for index in 0..256 {
            let [r, g, b, _] = palette.get(index).copied().unwrap_or([0, 0, 0, 0xFF]);
            if self.six_bit {
                out.extend_from_slice(&[pal8_to_6(r), pal8_to_6(g), pal8_to_6(b)]);
            } else {
                out.extend_from_slice(&[r, g, b]);
            }
        }
        Ok(out)
    }
}

/// Papyrus 6-bit palette: zero byte, start index, entry count (0 means
/// 256), then the 3-byte entries.
pub struct PapyrusPaletteFormat {
    meta: FormatMetadata,
}

impl Default for PapyrusPaletteFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl PapyrusPaletteFormat {
    /// Tag key holding the palette's start slot across a read/write pair.
    pub const START_TAG: &'static str = "start-index";

    pub fn new() -> Self {
        Self {
            meta: palette_meta("pal-papyrus", "Papyrus VGA palette", 6),
        }
    }

    fn parse_header(data: &[u8]) -> Result<(usize, usize), ReadError> {
        if data.len() < 3 {
            return Err(ReadError::MalformedHeader(format!(
                "need 3 header bytes, file holds {}",
                data.len()
            )));
        }
        if data[0] != 0 {
            return Err(ReadError::MalformedHeader(format!(
                "leading byte is {:#04x}, expected zero",
                data[0]
            )));
        }
        let start = data[1] as usize;
        let count = match data[2] {
            0 => 256,
            n => n as usize,
        };
        if start + count > 256 {
            return Err(ReadError::MalformedHeader(format!(
                "{} entries starting at {} overflow the 256 palette slots",
                count, start
            )));
        }
        let expected = 3 + count * 3;
        if data.len() != expected {
            return Err(ReadError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok((start, count))
    }
}

impl FormatHandler for PapyrusPaletteFormat {
    fn metadata(&self) -> &FormatMetadata {
        &self.meta
    }

    fn identify(&self, data: &[u8]) -> Identification {
        let (start, count) = match Self::parse_header(data) {
            Ok(header) => header,
            Err(error) => return Identification::invalid(error.to_string()),
        };
        if data[3..].iter().any(|&value| value > SIX_BIT_MAX) {
            return Identification::invalid(
                "channel values above 64 do not fit a 6-bit palette",
            );
        }
        Identification::valid(format!("{} 6-bit entries starting at slot {}", count, start))
    }

    fn read(&self, data: &[u8]) -> Result<Image, ReadError> {
        let (start, count) = Self::parse_header(data)?;

        let mut palette: Palette = vec![[0, 0, 0, 0xFF]; start];
        for entry in data[3..3 + count * 3].chunks_exact(3) {
            let channel = |value: u8| -> Result<u8, ReadError> {
                if value > SIX_BIT_MAX {
                    return Err(ReadError::MalformedHeader(format!(
                        "channel value {} out of 6-bit range",
                        value
                    )));
                }
                Ok(pal6_to_8(value.min(SIX_BIT_MAX - 1)))
            };
            palette.push([channel(entry[0])?, channel(entry[1])?, channel(entry[2])?, 0xFF]);
        }
        debug!("pal-papyrus: read {} entries at slot {}", count, start);

        let mut image = palette_image(palette);
        image
            .tags
            .insert(Self::START_TAG.into(), start.to_string());
        Ok(image)
    }

    fn check_limits(&self, image: &Image) -> Vec<String> {
        let mut problems = check_palette_limits(&self.meta, image);
        let start = image
            .tags
            .get(Self::START_TAG)
            .and_then(|tag| tag.parse::<usize>().ok())
            .unwrap_or(0);
        if let Some(palette) = &image.palette {
            if palette.len() <= start {
                problems.push(format!(
                    "palette holds {} entries, none past the start slot {}",
                    palette.len(),
                    start
                ));
            }
        }
        problems
    }

    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError> {
        let palette = require_palette(image)?;
        let start = image
            .tags
            .get(Self::START_TAG)
            .and_then(|tag| tag.parse::<usize>().ok())
            .unwrap_or(0);
        if palette.len() <= start || palette.len() > 256 {
            return Err(WriteError::LimitViolation(format!(
                "cannot store {} palette entries starting at slot {}",
                palette.len(),
                start
            )));
        }
        let count = palette.len() - start;

        let mut out = Vec::with_capacity(3 + count * 3);
        out.push(0);
        out.push(start as u8);
        out.push(if count == 256 { 0 } else { count as u8 });
        for &[r, g, b, _] in &palette[start..] {
            out.extend_from_slice(&[pal8_to_6(r), pal8_to_6(g), pal8_to_6(b)]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Verdict;
    use crate::palette::palette_vga256;

    #[test]
    fn test_vga8_identify_scenarios() {
        let format = VgaPaletteFormat::eight_bit();

        let mut good = vec![0u8; PALETTE_FILE_LEN];
        good[300] = 200; // one byte above 64
        assert_eq!(format.identify(&good).verdict, Verdict::Valid);

        // Truncation must be called out by length.
        let short = &good[..767];
        let identification = format.identify(short);
        assert_eq!(identification.verdict, Verdict::Invalid);
        assert!(identification.reason.contains("767"));

        // All-small values could equally be a 6-bit file.
        let ambiguous = vec![0u8; PALETTE_FILE_LEN];
        assert_eq!(format.identify(&ambiguous).verdict, Verdict::Unknown);

        let mut not_black = good.clone();
        not_black[0] = 1;
        assert_eq!(format.identify(&not_black).verdict, Verdict::Invalid);
    }

    #[test]
    fn test_vga8_round_trip() {
        let format = VgaPaletteFormat::eight_bit();
        let image = palette_image(palette_vga256());
        assert!(format.check_limits(&image).is_empty());

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes.len(), PALETTE_FILE_LEN);
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.palette, image.palette);
    }

    #[test]
    fn test_vga6_round_trip_and_identify() {
        let format = VgaPaletteFormat::six_bit();
        let image = palette_image(palette_vga256());
        let bytes = format.write(&image).unwrap();
        assert!(bytes.iter().all(|&value| value <= SIX_BIT_MAX));
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);

        // 8-bit values survive the 6-bit round trip when they are exact
        // expansions, which the generated palette's entries are.
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.palette, image.palette);
    }

    #[test]
    fn test_vga6_tolerates_value_64() {
        let format = VgaPaletteFormat::six_bit();
        let mut bytes = vec![0u8; PALETTE_FILE_LEN];
        bytes[0] = 64;
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);
        // Clamped to 63 and expanded to full intensity.
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.palette.as_ref().unwrap()[0][0], 0xFF);
    }

    #[test]
    fn test_papyrus_round_trip_with_start() {
        let format = PapyrusPaletteFormat::new();
        let mut palette: Palette = vec![[0, 0, 0, 0xFF]; 16];
        for i in 0..32u8 {
            palette.push([pal6_to_8(i), pal6_to_8(63 - i), 0, 0xFF]);
        }
        let mut image = palette_image(palette.clone());
        image
            .tags
            .insert(PapyrusPaletteFormat::START_TAG.into(), "16".into());

        let bytes = format.write(&image).unwrap();
        assert_eq!(bytes[..3], [0, 16, 32]);
        assert_eq!(bytes.len(), 3 + 32 * 3);
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);

        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.palette, Some(palette));
        assert_eq!(decoded.tags.get(PapyrusPaletteFormat::START_TAG).unwrap(), "16");
    }

    #[test]
    fn test_papyrus_count_zero_means_full_palette() {
        let format = PapyrusPaletteFormat::new();
        let mut bytes = vec![0u8, 0, 0];
        bytes.extend(vec![0x20u8; 256 * 3]);
        assert_eq!(format.identify(&bytes).verdict, Verdict::Valid);
        let decoded = format.read(&bytes).unwrap();
        assert_eq!(decoded.palette.as_ref().unwrap().len(), 256);
    }

    #[test]
    fn test_papyrus_rejects_overflow_and_bad_lengths() {
        let format = PapyrusPaletteFormat::new();
        // start 250 + 16 entries overflows slot 256.
        let mut bytes = vec![0u8, 250, 16];
        bytes.extend(vec![0u8; 16 * 3]);
        assert_eq!(format.identify(&bytes).verdict, Verdict::Invalid);

        // Declared count not matching the byte length.
        let mut bytes = vec![0u8, 0, 4];
        bytes.extend(vec![0u8; 9]);
        assert_eq!(format.identify(&bytes).verdict, Verdict::Invalid);
        assert!(matches!(
            format.read(&bytes),
            Err(ReadError::SizeMismatch { .. })
        ));
    }
}
