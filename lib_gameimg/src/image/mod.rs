pub mod format;

pub use format::{AnimationStep, Frame, Image, Palette, PaletteEntry};
