// types.rs — Element-type grid for exhaustive parameterized coverage.
//
// The grid is the cross product (depth × channels) in depth-major,
// channel-minor order:
//
//   8UC1, 8UC2, 8UC3, 8UC4, 8SC1, ..., 64FC4      (7 × 4 = 28 entries)
//
// The order is part of the contract: parameterized test names embed the
// index into this list, so it must not change between runs.

use std::sync::OnceLock;

use crate::mat::{Depth, ElemType, Size, MAX_CHANNELS};

/// All (depth, channels) pairs with depth in `depth_start..=depth_end` and
/// channels in `cn_start..=cn_end`.
///
/// An empty range (start after end) yields an empty list.
///
/// # Panics
/// Panics if a channel bound is outside `1..=4`.
pub fn types(depth_start: Depth, depth_end: Depth, cn_start: usize, cn_end: usize) -> Vec<ElemType> {
    assert!(
        (1..=MAX_CHANNELS).contains(&cn_start) && (1..=MAX_CHANNELS).contains(&cn_end),
        "channel range {cn_start}..={cn_end} must lie within 1..=4"
    );
    let mut out = Vec::new();
    for d in depth_start.index()..=depth_end.index() {
        // Depth::from_index cannot fail here: both bounds are real depths.
        let Some(depth) = Depth::from_index(d) else { continue };
        for cn in cn_start..=cn_end {
            out.push(ElemType::new(depth, cn));
        }
    }
    out
}

/// The full 28-entry grid (8U..64F × 1..4 channels).
pub fn all_types() -> &'static [ElemType] {
    static ALL: OnceLock<Vec<ElemType>> = OnceLock::new();
    ALL.get_or_init(|| types(Depth::U8, Depth::F64, 1, MAX_CHANNELS))
}

/// Every depth, in index order.
pub fn all_depths() -> Vec<Depth> {
    Depth::ALL.to_vec()
}

/// Every channel count, 1 through 4.
pub fn all_channels() -> Vec<usize> {
    (1..=MAX_CHANNELS).collect()
}

/// Channel counts that image formats actually carry: gray, BGR, BGRA.
pub fn image_channels() -> Vec<usize> {
    vec![1, 3, 4]
}

/// One power-of-two size and one odd size, so kernels see both aligned and
/// unaligned row lengths.
pub fn different_sizes() -> Vec<Size> {
    vec![Size::new(128, 128), Size::new(113, 113)]
}

/// (source, destination) depth pairs for conversion-style kernels: every
/// destination is the same kind or a wider one that can hold the source.
pub fn depth_pairs() -> Vec<(Depth, Depth)> {
    use Depth::*;
    vec![
        (U8, U8),
        (U8, U16),
        (U8, S16),
        (U8, S32),
        (U8, F32),
        (U8, F64),
        (U16, U16),
        (U16, S32),
        (U16, F32),
        (U16, F64),
        (S16, S16),
        (S16, S32),
        (S16, F32),
        (S16, F64),
        (S32, S32),
        (S32, F32),
        (S32, F64),
        (F32, F32),
        (F32, F64),
        (F64, F64),
    ]
}
