pub mod ccomic;
pub mod cosmo;
pub mod dave;
pub mod delta;
pub mod gif;
pub mod pal;
pub mod raw;
pub mod stamp;

use crate::codec::lzw::{LzwCompressionError, LzwDecompressionError};
use crate::codec::mask::MaskError;
use crate::codec::planar::PlanarError;
use crate::codec::rle_ccomic::PlaneError;
use crate::codec::tile::TileError;
use crate::codec::RleError;
use crate::image::format::{Image, MAX_PALETTE_LEN};
use thiserror::Error;

/// Frame size constraints a format imposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBounds {
    /// Every frame has exactly this size.
    Fixed { width: u16, height: u16 },
    /// Dimensions within inclusive bounds.
    Range {
        min_width: u16,
        max_width: u16,
        min_height: u16,
        max_height: u16,
    },
    /// Size varies per frame with no format-level bound.
    PerFrame,
}

/// Static per-format descriptor. Constructed once per handler and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatMetadata {
    pub id: &'static str,
    pub title: &'static str,
    pub size: SizeBounds,
    /// Frame width must be a multiple of this; 1 means unconstrained.
    pub width_multiple: u16,
    /// Bits per pixel, bounding the largest legal palette index.
    pub depth: u8,
    pub has_palette: bool,
    /// Channel precision of a stored palette: 6 or 8 bits.
    pub palette_depth: u8,
    /// Palette slot reserved as fully transparent, if the format has one.
    pub transparent_index: Option<u8>,
    pub min_frames: usize,
    pub max_frames: usize,
    /// Greater than 1 when one file holds multiple independent images,
    /// e.g. actor tilesets.
    pub max_images: usize,
}

/// Outcome of sniffing a byte buffer against one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    /// File size alone cannot separate this format from raw or sibling
    /// formats; a legitimate answer, not a failure.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Identification {
    pub verdict: Verdict,
    pub reason: String,
}

impl Identification {
    pub fn valid(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Valid,
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Invalid,
            reason: reason.into(),
        }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Unknown,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("size mismatch: expected {expected} bytes of pixel data, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),
    #[error(transparent)]
    Rle(#[from] RleError),
    #[error(transparent)]
    Planar(#[from] PlanarError),
    #[error(transparent)]
    Plane(#[from] PlaneError),
    #[error(transparent)]
    Tile(#[from] TileError),
    #[error(transparent)]
    Lzw(#[from] LzwDecompressionError),
    #[error(transparent)]
    Mask(#[from] MaskError),
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("limit violation: {0}")]
    LimitViolation(String),
    #[error(transparent)]
    Planar(#[from] PlanarError),
    #[error(transparent)]
    Plane(#[from] PlaneError),
    #[error(transparent)]
    Tile(#[from] TileError),
    #[error(transparent)]
    Lzw(#[from] LzwCompressionError),
}

/// One on-disk image format.
///
/// `identify` never fails: uncertainty is the `Unknown` verdict, and
/// malformed-but-plausible input is a verdict too. `read`/`write` fail
/// with typed errors and never truncate silently. `write` assumes
/// `check_limits` returned no violations; output for an image that
/// violates the format's limits is unspecified.
pub trait FormatHandler {
    fn metadata(&self) -> &FormatMetadata;
    fn identify(&self, data: &[u8]) -> Identification;
    fn read(&self, data: &[u8]) -> Result<Image, ReadError>;
    /// Collects every limit violation instead of failing on the first, so
    /// a caller can report all problems before attempting a write.
    fn check_limits(&self, image: &Image) -> Vec<String>;
    fn write(&self, image: &Image) -> Result<Vec<u8>, WriteError>;
}

/// Violations every format shares: frame count, frame dimensions against
/// the metadata bounds, pixel values against the color depth, palette
/// length. Handlers append their format-specific checks to this list.
pub fn check_common_limits(meta: &FormatMetadata, image: &Image) -> Vec<String> {
    let mut problems = Vec::new();

    let frame_count = image.frames.len();
    if frame_count < meta.min_frames || frame_count > meta.max_frames {
        problems.push(format!(
            "{} holds {} to {} frames, image has {}",
            meta.title, meta.min_frames, meta.max_frames, frame_count
        ));
    }

    let mut max_index = (1u16 << meta.depth) - 1;
    if let Some(transparent) = meta.transparent_index {
        max_index = max_index.max(transparent as u16);
    }

    for (index, frame) in image.frames.iter().enumerate() {
        let (width, height) = frame.size_in(image);

        match meta.size {
            SizeBounds::Fixed {
                width: fixed_width,
                height: fixed_height,
            } => {
                if width != fixed_width || height != fixed_height {
                    problems.push(format!(
                        "frame #{} is {}x{}, {} requires exactly {}x{}",
                        index, width, height, meta.title, fixed_width, fixed_height
                    ));
                }
            }
            SizeBounds::Range {
                min_width,
                max_width,
                min_height,
                max_height,
            } => {
                if width < min_width
                    || width > max_width
                    || height < min_height
                    || height > max_height
                {
                    problems.push(format!(
                        "frame #{} is {}x{}, outside {}x{}..{}x{}",
                        index, width, height, min_width, min_height, max_width, max_height
                    ));
                }
            }
            SizeBounds::PerFrame => {}
        }

        if meta.width_multiple > 1 && width % meta.width_multiple != 0 {
            problems.push(format!(
                "frame #{} width {} is not a multiple of {}",
                index, width, meta.width_multiple
            ));
        }

        let expected = width as usize * height as usize;
        if frame.pixels.len() != expected {
            problems.push(format!(
                "frame #{} holds {} pixels for a {}x{} raster",
                index,
                frame.pixels.len(),
                width,
                height
            ));
        }

        if let Some(&pixel) = frame.pixels.iter().find(|&&p| p as u16 > max_index) {
            problems.push(format!(
                "frame #{} uses index {} beyond the {}-bit maximum {}",
                index, pixel, meta.depth, max_index
            ));
        }
    }

    if let Some(palette) = &image.palette {
        if palette.len() > MAX_PALETTE_LEN {
            problems.push(format!(
                "palette holds {} entries, maximum is {}",
                palette.len(),
                MAX_PALETTE_LEN
            ));
        }
    }

    problems
}

pub(crate) fn read_u16le(data: &[u8], offset: usize) -> Option<u16> {
    Some(u16::from_le_bytes([
        *data.get(offset)?,
        *data.get(offset + 1)?,
    ]))
}

pub(crate) fn read_u32le(data: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes([
        *data.get(offset)?,
        *data.get(offset + 1)?,
        *data.get(offset + 2)?,
        *data.get(offset + 3)?,
    ]))
}

/// Every known format handler in fixed registration order. The list is
/// explicit: no import side effects decide what is registered or in which
/// order. Raw formats come last because they can only ever answer
/// `Unknown`.
pub fn all_formats() -> Vec<Box<dyn FormatHandler>> {
    vec![
        Box::new(stamp::StampFormat::v1()),
        Box::new(stamp::StampFormat::v2()),
        Box::new(stamp::StampRollFormat::v1()),
        Box::new(stamp::StampRollFormat::v2()),
        Box::new(delta::DeltaFormat::new()),
        Box::new(ccomic::CComicSplashFormat::new()),
        Box::new(ccomic::CComicTilesFormat::map_tiles()),
        Box::new(ccomic::CComicTilesFormat::sprites()),
        Box::new(cosmo::CosmoTilesFormat::plain()),
        Box::new(cosmo::CosmoTilesFormat::masked()),
        Box::new(cosmo::CosmoActorFormat::new()),
        Box::new(dave::DaveTilesFormat::vga()),
        Box::new(dave::DaveTilesFormat::ega()),
        Box::new(dave::DaveTilesFormat::cga()),
        Box::new(pal::VgaPaletteFormat::eight_bit()),
        Box::new(pal::VgaPaletteFormat::six_bit()),
        Box::new(pal::PapyrusPaletteFormat::new()),
        Box::new(gif::GifFormat::gif87a()),
        Box::new(gif::GifFormat::gif89a()),
        Box::new(raw::RawLinearFormat::fullscreen()),
        Box::new(raw::RawPlanarFormat::fullscreen()),
    ]
}

/// Runs every registered handler's `identify` over the candidate bytes and
/// returns the handlers answering `Valid` or `Unknown`, in registration
/// order. Multiple positive identifications are all returned; the caller
/// resolves ties, never this function.
pub fn auto_detect(data: &[u8]) -> Vec<(Box<dyn FormatHandler>, Identification)> {
    all_formats()
        .into_iter()
        .filter_map(|handler| {
            let identification = handler.identify(data);
            match identification.verdict {
                Verdict::Valid | Verdict::Unknown => Some((handler, identification)),
                Verdict::Invalid => None,
            }
        })
        .collect()
}
