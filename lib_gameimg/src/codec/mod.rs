pub mod delta;
pub mod lzw;
pub mod mask;
pub mod planar;
pub mod rle_ccomic;
pub mod stamp;
pub mod tile;

pub use planar::{from_byte_planar, from_planar, to_byte_planar, to_planar, PlanarLayout};
pub use tile::{compose, decompose, TilePlacement};

use thiserror::Error;

/// Shared decode failure taxonomy for the run-length and delta codecs.
///
/// Decoders are a single linear pass producing an exact pixel count; both
/// ending early and having bytes left over are fatal to the read, never a
/// partial result.
#[derive(Error, Debug)]
pub enum RleError {
    #[error("input ended after {produced} of {expected} pixels")]
    TruncatedInput { produced: usize, expected: usize },
    #[error("input continues past the expected {expected} pixels")]
    ExtraneousInput { expected: usize },
}
