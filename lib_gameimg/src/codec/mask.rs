use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("visible buffer holds {visible} pixels but mask holds {mask}")]
    SizeMismatch { visible: usize, mask: usize },
}

/// Merges a visible-pixel buffer and a transparency-mask buffer into one
/// buffer, element-wise, through the caller's combine rule.
///
/// No transparency policy is built in: different games signal "transparent"
/// differently (dedicated palette index, separate 1-bit mask plane), so the
/// rule is entirely the closure's. A typical rule passes the visible pixel
/// through unless the mask pixel signals transparency, in which case it
/// emits a sentinel index.
pub fn merge<F>(visible: &[u8], mask: &[u8], combine: F) -> Result<Vec<u8>, MaskError>
where
    F: Fn(u8, u8) -> u8,
{
    if visible.len() != mask.len() {
        return Err(MaskError::SizeMismatch {
            visible: visible.len(),
            mask: mask.len(),
        });
    }
    Ok(visible
        .iter()
        .zip(mask.iter())
        .map(|(&v, &m)| combine(v, m))
        .collect())
}

/// Splits a combined buffer back into visible and mask buffers through the
/// caller's split rule. Inverse of [`merge`] when the rules are inverses.
pub fn split<F>(combined: &[u8], split_pixel: F) -> (Vec<u8>, Vec<u8>)
where
    F: Fn(u8) -> (u8, u8),
{
    let mut visible = Vec::with_capacity(combined.len());
    let mut mask = Vec::with_capacity(combined.len());
    for &pixel in combined {
        let (v, m) = split_pixel(pixel);
        visible.push(v);
        mask.push(m);
    }
    (visible, mask)
}
