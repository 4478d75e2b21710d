use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanarError {
    #[error("plane width of {0} bits rounds to zero whole bytes")]
    InvalidPlaneWidth(usize),
    #[error("expected {expected} plane values, got {got}")]
    PlaneValueCountMismatch { expected: usize, got: usize },
    #[error("plane value {0:#04x} is not a single bit")]
    InvalidPlaneValue(u8),
}

/// Describes how bitplanes are interleaved in a byte stream.
///
/// `plane_width` is the number of bits emitted per plane before the stream
/// switches to the next plane: 8 for byte-planar layouts, the image row
/// width for row-planar layouts. `plane_values` assigns each plane its
/// output bit, which allows non-contiguous orderings such as the
/// mask-first MIRGB set `[16, 8, 4, 2, 1]`. With `msb_first` set, bit 7 of
/// each byte is the leftmost pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanarLayout {
    pub plane_count: usize,
    pub plane_width: usize,
    pub plane_values: Vec<u8>,
    pub msb_first: bool,
}

impl PlanarLayout {
    /// Layout switching planes every 8 pixels.
    pub fn byte_planar(plane_values: Vec<u8>, msb_first: bool) -> Self {
        Self {
            plane_count: plane_values.len(),
            plane_width: 8,
            plane_values,
            msb_first,
        }
    }

    /// Layout switching planes every full image row of `width` pixels.
    pub fn row_planar(width: usize, plane_values: Vec<u8>, msb_first: bool) -> Self {
        Self {
            plane_count: plane_values.len(),
            plane_width: width,
            plane_values,
            msb_first,
        }
    }

    fn plane_width_bytes(&self) -> usize {
        self.plane_width / 8
    }

    /// Bytes making up one plane line group: all planes for one stretch of
    /// `plane_width` pixels.
    pub fn group_len(&self) -> usize {
        self.plane_count * self.plane_width_bytes()
    }

    /// Pixels produced per plane line group.
    pub fn pixels_per_group(&self) -> usize {
        self.plane_width_bytes() * 8
    }

    fn validate(&self) -> Result<(), PlanarError> {
        if self.plane_width_bytes() == 0 {
            return Err(PlanarError::InvalidPlaneWidth(self.plane_width));
        }
        if self.plane_values.len() != self.plane_count {
            return Err(PlanarError::PlaneValueCountMismatch {
                expected: self.plane_count,
                got: self.plane_values.len(),
            });
        }
        // Each plane must contribute exactly one output bit. Anything else
        // would make the decode/encode pair lossy.
        for &value in &self.plane_values {
            if value.count_ones() != 1 {
                return Err(PlanarError::InvalidPlaneValue(value));
            }
        }
        Ok(())
    }
}

/// Converts planar data to linear one-byte-per-pixel data.
///
/// Input is consumed one plane line group at a time; within a group each
/// plane contributes one bit to every pixel. Zero-length input produces an
/// empty output. Trailing bytes smaller than a whole group are not
/// addressable and are ignored; callers validate total length separately.
pub fn from_planar(data: &[u8], layout: &PlanarLayout) -> Result<Vec<u8>, PlanarError> {
    layout.validate()?;
    let plane_bytes = layout.plane_width_bytes();
    let group_len = layout.group_len();
    let pixels_per_group = layout.pixels_per_group();

    let mut pixels = vec![0u8; data.len() / group_len * pixels_per_group];
    for (group_index, group) in data.chunks_exact(group_len).enumerate() {
        let out_base = group_index * pixels_per_group;
        for (plane, plane_line) in group.chunks_exact(plane_bytes).enumerate() {
            let value = layout.plane_values[plane];
            for (byte_index, &byte) in plane_line.iter().enumerate() {
                for bit in 0..8 {
                    let bit_pos = if layout.msb_first { 7 - bit } else { bit };
                    if byte & (1 << bit_pos) != 0 {
                        pixels[out_base + byte_index * 8 + bit] |= value;
                    }
                }
            }
        }
    }

    debug!(
        "from_planar: {} bytes over {} planes -> {} pixels",
        data.len(),
        layout.plane_count,
        pixels.len()
    );
    Ok(pixels)
}

/// Converts linear one-byte-per-pixel data to planar data. Exact inverse of
/// [`from_planar`].
///
/// For each pixel, the bit belonging to plane `b` is set iff
/// `pixel & plane_values[b]` is set; the plane value itself never reaches
/// the output, only the positional bit does.
pub fn to_planar(pixels: &[u8], layout: &PlanarLayout) -> Result<Vec<u8>, PlanarError> {
    layout.validate()?;
    let plane_bytes = layout.plane_width_bytes();
    let group_len = layout.group_len();
    let pixels_per_group = layout.pixels_per_group();

    let mut data = vec![0u8; pixels.len() / pixels_per_group * group_len];
    for (group_index, group_pixels) in pixels.chunks_exact(pixels_per_group).enumerate() {
        let group_base = group_index * group_len;
        for (pixel_index, &pixel) in group_pixels.iter().enumerate() {
            let byte_index = pixel_index / 8;
            let bit = pixel_index % 8;
            let bit_pos = if layout.msb_first { 7 - bit } else { bit };
            for (plane, &value) in layout.plane_values.iter().enumerate() {
                if pixel & value != 0 {
                    data[group_base + plane * plane_bytes + byte_index] |= 1 << bit_pos;
                }
            }
        }
    }

    debug!(
        "to_planar: {} pixels -> {} bytes over {} planes",
        pixels.len(),
        data.len(),
        layout.plane_count
    );
    Ok(data)
}

/// [`from_planar`] with the plane boundary fixed on every byte.
pub fn from_byte_planar(
    data: &[u8],
    plane_values: Vec<u8>,
    msb_first: bool,
) -> Result<Vec<u8>, PlanarError> {
    from_planar(data, &PlanarLayout::byte_planar(plane_values, msb_first))
}

/// [`to_planar`] with the plane boundary fixed on every byte.
pub fn to_byte_planar(
    pixels: &[u8],
    plane_values: Vec<u8>,
    msb_first: bool,
) -> Result<Vec<u8>, PlanarError> {
    to_planar(pixels, &PlanarLayout::byte_planar(plane_values, msb_first))
}
