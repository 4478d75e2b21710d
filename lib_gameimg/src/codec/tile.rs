use crate::image::format::{transparent_index, Palette};
use log::debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("tile #{tile} pixel buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch {
        tile: usize,
        expected: usize,
        actual: usize,
    },
    #[error("tile #{tile} ({width}x{height}) reads past the end of the canvas")]
    TileOverrun {
        tile: usize,
        width: usize,
        height: usize,
    },
}

/// One sub-image scheduled for composition.
#[derive(Debug, Clone, Copy)]
pub struct TilePlacement<'a> {
    pub pixels: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub offset_x: usize,
    pub offset_y: usize,
}

/// Result of composing a set of tiles onto one canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

/// Assembles a set of sub-images into a single canvas.
///
/// The canvas spans the bounding box of all placements. Uncovered regions
/// are filled with `background` if given, otherwise the first palette entry
/// with alpha 0, otherwise index 0. Tiles are blitted with raw row copies:
/// later placements overwrite earlier ones unconditionally, transparent
/// pixels included.
pub fn compose(
    tiles: &[TilePlacement],
    background: Option<u8>,
    palette: Option<&Palette>,
) -> Result<Composed, TileError> {
    for (index, tile) in tiles.iter().enumerate() {
        let expected = tile.width * tile.height;
        if tile.pixels.len() != expected {
            return Err(TileError::SizeMismatch {
                tile: index,
                expected,
                actual: tile.pixels.len(),
            });
        }
    }

    let width = tiles
        .iter()
        .map(|t| t.offset_x + t.width)
        .max()
        .unwrap_or(0);
    let height = tiles
        .iter()
        .map(|t| t.offset_y + t.height)
        .max()
        .unwrap_or(0);

    let fill = background
        .or_else(|| palette.and_then(transparent_index))
        .unwrap_or(0);
    debug!(
        "compose: {} tiles onto {}x{} canvas, background {}",
        tiles.len(),
        width,
        height,
        fill
    );

    let mut pixels = vec![fill; width * height];
    for tile in tiles {
        for row in 0..tile.height {
            let src = &tile.pixels[row * tile.width..(row + 1) * tile.width];
            let dst_start = (tile.offset_y + row) * width + tile.offset_x;
            pixels[dst_start..dst_start + tile.width].copy_from_slice(src);
        }
    }

    Ok(Composed {
        pixels,
        width,
        height,
    })
}

/// Splits a canvas back into tiles of the given dimensions.
///
/// Tiles are read left to right; when the next tile would pass the canvas
/// width the cursor wraps to a new row, advancing by the tallest tile seen
/// in the finished row. Heterogeneous tile sizes are supported in both this
/// and the compose direction.
pub fn decompose(
    canvas: &[u8],
    canvas_width: usize,
    canvas_height: usize,
    dims: &[(usize, usize)],
) -> Result<Vec<Vec<u8>>, TileError> {
    let expected = canvas_width * canvas_height;
    if canvas.len() != expected {
        return Err(TileError::SizeMismatch {
            tile: 0,
            expected,
            actual: canvas.len(),
        });
    }

    let mut tiles = Vec::with_capacity(dims.len());
    let mut x = 0usize;
    let mut y = 0usize;
    let mut row_height = 0usize;

    for (index, &(width, height)) in dims.iter().enumerate() {
        if x + width > canvas_width {
            x = 0;
            y += row_height;
            row_height = 0;
        }
        if width > canvas_width {
            return Err(TileError::TileOverrun {
                tile: index,
                width,
                height,
            });
        }

        let mut pixels = Vec::with_capacity(width * height);
        for row in 0..height {
            let start = (y + row) * canvas_width + x;
            let end = start + width;
            if end > canvas.len() {
                return Err(TileError::TileOverrun {
                    tile: index,
                    width,
                    height,
                });
            }
            pixels.extend_from_slice(&canvas[start..end]);
        }
        tiles.push(pixels);

        x += width;
        row_height = row_height.max(height);
    }

    debug!(
        "decompose: {}x{} canvas into {} tiles",
        canvas_width,
        canvas_height,
        tiles.len()
    );
    Ok(tiles)
}
