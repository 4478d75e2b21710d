use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One palette slot in RGBA order. Alpha 0 marks full transparency; any
/// other alpha value is advisory.
pub type PaletteEntry = [u8; 4];

/// An ordered palette, index = slot. Never longer than 256 entries for the
/// formats in scope.
pub type Palette = Vec<PaletteEntry>;

pub const MAX_PALETTE_LEN: usize = 256;

/// Returns the first palette slot with alpha 0, if any.
pub fn transparent_index(palette: &Palette) -> Option<u8> {
    palette.iter().position(|entry| entry[3] == 0).map(|i| i as u8)
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("animation step #{step} references frame {frame}, but the image has {frame_count} frames")]
    AnimationFrameOutOfRange {
        step: usize,
        frame: usize,
        frame_count: usize,
    },
}

/// One entry of an animation sequence: which frame to show and how long to
/// keep it on screen afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationStep {
    pub frame: usize,
    pub delay_ms: u16,
}

/// A single raster.
///
/// `width`/`height` are `None` when the frame inherits the parent image's
/// dimensions, and `Some` when the frame carries its own. Keeping the
/// inheritance explicit at the type level makes the fallback rule auditable
/// instead of hiding it behind a sentinel value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: Option<u16>,
    pub height: Option<u16>,
    /// Row-major palette indices, one byte per pixel.
    pub pixels: Vec<u8>,
    /// Per-frame palette override. The frame does not own the convention of
    /// the shared image palette it shadows.
    pub palette: Option<Palette>,
    /// Signed anchor offset applied when compositing.
    pub hotspot: Option<(i16, i16)>,
    /// Post-display delay. `Some` marks the frame as part of an animation
    /// rather than a plain tileset member.
    pub delay_ms: Option<u16>,
}

impl Frame {
    pub fn from_pixels(pixels: Vec<u8>) -> Self {
        Self {
            pixels,
            ..Self::default()
        }
    }

    pub fn with_size(width: u16, height: u16, pixels: Vec<u8>) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            pixels,
            ..Self::default()
        }
    }

    /// Resolves this frame's dimensions against the owning image's defaults.
    pub fn size_in(&self, image: &Image) -> (u16, u16) {
        (
            self.width.unwrap_or(image.width),
            self.height.unwrap_or(image.height),
        )
    }
}

/// A decoded image: a collection of frames plus shared defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Default frame width, used by frames without their own.
    pub width: u16,
    pub height: u16,
    pub frames: Vec<Frame>,
    pub palette: Option<Palette>,
    pub hotspot: Option<(i16, i16)>,
    /// Free-form metadata such as "last passable tile" flags.
    pub tags: BTreeMap<String, String>,
    /// Ordered playback sequence. Empty for plain tilesets.
    pub animation: Vec<AnimationStep>,
}

impl Image {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_frames(width: u16, height: u16, frames: Vec<Frame>) -> Self {
        Self {
            width,
            height,
            frames,
            ..Self::default()
        }
    }

    /// Checks the animation invariant: every step must reference an existing
    /// frame.
    pub fn validate_animation(&self) -> Result<(), ModelError> {
        for (step, anim) in self.animation.iter().enumerate() {
            if anim.frame >= self.frames.len() {
                return Err(ModelError::AnimationFrameOutOfRange {
                    step,
                    frame: anim.frame,
                    frame_count: self.frames.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_index_found() {
        let palette: Palette = vec![[0, 0, 0, 255], [255, 0, 255, 0], [255, 255, 255, 255]];
        assert_eq!(transparent_index(&palette), Some(1));
    }

    #[test]
    fn test_transparent_index_absent() {
        let palette: Palette = vec![[0, 0, 0, 255], [255, 255, 255, 255]];
        assert_eq!(transparent_index(&palette), None);
    }

    #[test]
    fn test_frame_size_inheritance() {
        let image = Image::new(320, 200);
        let inherited = Frame::from_pixels(vec![0; 64000]);
        assert_eq!(inherited.size_in(&image), (320, 200));

        let explicit = Frame::with_size(16, 16, vec![0; 256]);
        assert_eq!(explicit.size_in(&image), (16, 16));
    }

    #[test]
    fn test_validate_animation_rejects_bad_index() {
        let mut image = Image::with_frames(8, 8, vec![Frame::from_pixels(vec![0; 64])]);
        image.animation.push(AnimationStep {
            frame: 1,
            delay_ms: 100,
        });
        assert!(matches!(
            image.validate_animation(),
            Err(ModelError::AnimationFrameOutOfRange {
                step: 0,
                frame: 1,
                frame_count: 1
            })
        ));
    }

    #[test]
    fn test_validate_animation_accepts_valid_sequence() {
        let mut image = Image::with_frames(
            8,
            8,
            vec![
                Frame::from_pixels(vec![0; 64]),
                Frame::from_pixels(vec![1; 64]),
            ],
        );
        image.animation.push(AnimationStep {
            frame: 1,
            delay_ms: 50,
        });
        image.animation.push(AnimationStep {
            frame: 0,
            delay_ms: 50,
        });
        assert!(image.validate_animation().is_ok());
    }
}
