//! RLE scheme used by the Captain Comic full-screen images.
//!
//! Control byte with the top bit set is a run: the low 7 bits give the
//! count and the next byte the repeated value. Top bit clear is a literal
//! copy of `control` bytes.
//!
//! The splash format stores one independently compressed block per EGA
//! bitplane with a hard output-length contract: every plane decompresses
//! to exactly [`PLANE_LEN`] bytes and no code spans a plane boundary. That
//! segmentation lives in [`decode_planes`]/[`encode_planes`], not in the
//! byte-stream primitive.

use super::RleError;
use log::debug;
use thiserror::Error;

/// Decompressed size of one EGA bitplane: 320x200 pixels at 1 bit each.
pub const PLANE_LEN: usize = 8000;

/// Bitplanes per screen.
pub const PLANE_COUNT: usize = 4;

#[derive(Error, Debug)]
pub enum PlaneError {
    #[error("plane data holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Rle(#[from] RleError),
}

fn decode_block(data: &[u8], pos: &mut usize, out_len: usize) -> Result<Vec<u8>, RleError> {
    let mut out = Vec::with_capacity(out_len);

    while out.len() < out_len {
        let control = *data.get(*pos).ok_or(RleError::TruncatedInput {
            produced: out.len(),
            expected: out_len,
        })?;
        *pos += 1;

        if control & 0x80 != 0 {
            let count = (control & 0x7F) as usize;
            let value = *data.get(*pos).ok_or(RleError::TruncatedInput {
                produced: out.len(),
                expected: out_len,
            })?;
            *pos += 1;
            out.extend(std::iter::repeat(value).take(count));
        } else {
            let count = control as usize;
            if *pos + count > data.len() {
                return Err(RleError::TruncatedInput {
                    produced: out.len(),
                    expected: out_len,
                });
            }
            out.extend_from_slice(&data[*pos..*pos + count]);
            *pos += count;
        }
    }

    if out.len() > out_len {
        return Err(RleError::ExtraneousInput { expected: out_len });
    }
    Ok(out)
}

/// Decodes a single RLE stream into exactly `out_len` bytes.
pub fn decode(data: &[u8], out_len: usize) -> Result<Vec<u8>, RleError> {
    let mut pos = 0;
    let out = decode_block(data, &mut pos, out_len)?;
    if pos < data.len() {
        return Err(RleError::ExtraneousInput { expected: out_len });
    }
    Ok(out)
}

/// Compresses a byte buffer with the Captain Comic RLE scheme.
///
/// Runs of 3 or more identical bytes become run codes (capped at 127);
/// everything else is accumulated into literal copies of up to 127 bytes.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        let mut run = 1;
        while run < 0x7F && i + run < data.len() && data[i + run] == byte {
            run += 1;
        }
        if run >= 3 {
            out.push(0x80 | run as u8);
            out.push(byte);
            i += run;
            continue;
        }

        let mut j = i + 1;
        while j < data.len() && j - i < 0x7F {
            if j + 2 < data.len() && data[j] == data[j + 1] && data[j] == data[j + 2] {
                break;
            }
            j += 1;
        }
        out.push((j - i) as u8);
        out.extend_from_slice(&data[i..j]);
        i = j;
    }

    out
}

/// Decompresses `plane_count` independently compressed planes laid out back
/// to back, enforcing the exact [`PLANE_LEN`] output contract per plane.
pub fn decode_planes(data: &[u8], plane_count: usize) -> Result<Vec<u8>, PlaneError> {
    let mut out = Vec::with_capacity(plane_count * PLANE_LEN);
    let mut pos = 0;

    for plane in 0..plane_count {
        let decoded = decode_block(data, &mut pos, PLANE_LEN)?;
        debug!("ccomic plane {} decoded to {} bytes", plane, decoded.len());
        out.extend_from_slice(&decoded);
    }

    if pos < data.len() {
        return Err(RleError::ExtraneousInput {
            expected: plane_count * PLANE_LEN,
        }
        .into());
    }
    Ok(out)
}

/// Compresses planar screen data as `plane_count` independent RLE blocks.
/// The input must hold exactly `plane_count` planes of [`PLANE_LEN`] bytes.
pub fn encode_planes(data: &[u8], plane_count: usize) -> Result<Vec<u8>, PlaneError> {
    let expected = plane_count * PLANE_LEN;
    if data.len() != expected {
        return Err(PlaneError::SizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut out = Vec::new();
    for plane in data.chunks_exact(PLANE_LEN) {
        out.extend_from_slice(&encode(plane));
    }
    Ok(out)
}
