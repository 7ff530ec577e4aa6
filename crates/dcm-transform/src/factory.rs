//! Builds transform chains between colorspaces.
//!
//! [`transform_between`] searches the direct [`ColorTransform`]s breadth
//! first, so the returned chain has the fewest steps. Ties go to the
//! transform listed first: `MONOCHROME1 -> YBR_FULL` becomes
//! `MONOCHROME1 -> MONOCHROME2 -> YBR_FULL`.

use std::collections::VecDeque;

use dcm_core::{ColorSpace, ImageFormat};
use tracing::debug;

use crate::{
    ColorTransform, HighBitTransform, Transform, TransformChain, TransformError, TransformResult,
};

/// Returns the shortest chain converting `from` to `to`.
///
/// Subsampled tags are treated as their base colorspace; equal colorspaces
/// yield an empty chain.
///
/// # Errors
///
/// [`TransformError::NoPath`] if no sequence of direct transforms links
/// the two colorspaces (e.g. `PALETTE COLOR`).
///
/// ```rust
/// use dcm_core::ColorSpace;
/// use dcm_transform::transform_between;
///
/// let chain = transform_between(ColorSpace::YbrFull, ColorSpace::YbrPartial).unwrap();
/// assert_eq!(chain.len(), 2);
/// ```
pub fn transform_between(from: ColorSpace, to: ColorSpace) -> TransformResult<TransformChain> {
    let path = shortest_path(from.normalized(), to.normalized())
        .ok_or(TransformError::NoPath { from, to })?;

    let mut chain = TransformChain::new();
    for step in &path {
        chain.add_transform(*step);
    }
    debug!(
        %from,
        %to,
        steps = path.len(),
        "built colorspace chain"
    );
    Ok(chain)
}

/// Returns a chain converting images of format `from` to format `to`.
///
/// Colorspace conversion comes first, then depth and high bit are
/// reconciled if they still differ.
pub fn transform_between_formats(
    from: &ImageFormat,
    to: &ImageFormat,
) -> TransformResult<TransformChain> {
    let mut chain = transform_between(from.colorspace, to.colorspace)?;
    let converted = chain.output_format(from)?;
    if converted.depth != to.depth || converted.high_bit != to.high_bit {
        chain.add_transform(HighBitTransform::new(to.depth, to.high_bit)?);
    }
    Ok(chain)
}

fn shortest_path(from: ColorSpace, to: ColorSpace) -> Option<Vec<ColorTransform>> {
    if from == to {
        return Some(Vec::new());
    }

    let mut paths: Vec<(ColorSpace, Vec<ColorTransform>)> = vec![(from, Vec::new())];
    let mut queue = VecDeque::from([0usize]);
    while let Some(index) = queue.pop_front() {
        let (node, path) = paths[index].clone();
        for edge in ColorTransform::all().filter(|t| t.from() == node) {
            if paths.iter().any(|(seen, _)| *seen == edge.to()) {
                continue;
            }
            let mut next = path.clone();
            next.push(edge);
            if edge.to() == to {
                return Some(next);
            }
            paths.push((edge.to(), next));
            queue.push_back(paths.len() - 1);
        }
    }
    None
}
