// factory.rs — Layout-controlled buffer construction.
//
// Kernels under test must never assume that rows are packed back to back.
// With `use_roi = true` the factory allocates a larger backing buffer and
// returns a buffer whose origin sits in the middle of it:
//
//   backing (W0 × H0):
//   ┌──────────────────────────────┐
//   │ margin                       │
//   │     ┌──────────────┐         │
//   │     │ logical w×h  │         │   origin = ((W0-w)/2, (H0-h)/2)
//   │     └──────────────┘         │   step   = W0 * elem_size  > w * elem_size
//   │                              │
//   └──────────────────────────────┘
//
// Margins are drawn from the caller's generator (5..=15 extra columns and
// rows), so the layout is reproducible under a fixed seed but varies across
// seeds. An algorithm that walks `w * elem_size` bytes per row instead of
// `step` reads margin bytes and produces a visible mismatch.

use crate::mat::{Buffer, BufferMut, ElemType, Mat, Size};
use crate::random::SampleGenerator;

/// Smallest extra margin (columns and rows) for ROI buffers.
pub const ROI_MARGIN_MIN: i32 = 5;
/// Largest extra margin (columns and rows) for ROI buffers.
pub const ROI_MARGIN_MAX: i32 = 15;

/// Backing-allocation geometry chosen for one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Size of the full backing allocation, in elements.
    pub backing: Size,
    /// Column of the logical origin inside the backing allocation.
    pub origin_x: usize,
    /// Row of the logical origin inside the backing allocation.
    pub origin_y: usize,
}

impl Layout {
    /// Tight layout: backing == logical size, origin at (0, 0).
    pub fn tight(size: Size) -> Self {
        Layout { backing: size, origin_x: 0, origin_y: 0 }
    }

    /// Padded layout with random margins, origin centred.
    pub fn roi(gen: &mut SampleGenerator, size: Size) -> Self {
        let extra_w = gen.random_int(ROI_MARGIN_MIN, ROI_MARGIN_MAX) as usize;
        let extra_h = gen.random_int(ROI_MARGIN_MIN, ROI_MARGIN_MAX) as usize;
        Layout {
            backing: Size::new(size.width + extra_w, size.height + extra_h),
            origin_x: extra_w / 2,
            origin_y: extra_h / 2,
        }
    }

    /// Pick `roi` or `tight` from the flag.
    pub fn choose(gen: &mut SampleGenerator, size: Size, use_roi: bool) -> Self {
        if use_roi {
            Self::roi(gen, size)
        } else {
            Self::tight(size)
        }
    }

    /// Row step in bytes for `elem`.
    pub fn step(&self, elem: ElemType) -> usize {
        self.backing.width * elem.elem_size()
    }

    /// Byte offset of the logical origin for `elem`.
    pub fn offset(&self, elem: ElemType) -> usize {
        self.origin_y * self.step(elem) + self.origin_x * elem.elem_size()
    }

    /// Total backing bytes for `elem`.
    pub fn byte_len(&self, elem: ElemType) -> usize {
        self.backing.height * self.step(elem)
    }
}

/// Allocate a zeroed `size` × `elem` buffer.
///
/// `use_roi = false` gives a tight buffer (`step == width * elem_size`,
/// origin at byte 0). `use_roi = true` gives a buffer embedded in a larger
/// allocation, with `step` strictly greater than the row size and a
/// non-zero origin.
pub fn create_mat(gen: &mut SampleGenerator, size: Size, elem: ElemType, use_roi: bool) -> Mat {
    let layout = Layout::choose(gen, size, use_roi);
    log::trace!("create_mat {size} {elem}: {layout:?}");
    Mat::from_parts(
        vec![0u8; layout.byte_len(elem)],
        size,
        elem,
        layout.step(elem),
        layout.offset(elem),
    )
}

/// Copy `src` into a new buffer built under the same layout policy as
/// [`create_mat`]. Size, type and every element value are preserved.
pub fn load_mat<B: Buffer>(gen: &mut SampleGenerator, src: &B, use_roi: bool) -> Mat {
    let mut dst = create_mat(gen, src.size(), src.elem_type(), use_roi);
    dst.copy_from(src);
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::{Depth, Scalar};

    #[test]
    fn test_tight_layout() {
        let mut g = SampleGenerator::new();
        let elem = ElemType::new(Depth::S16, 3);
        let m = create_mat(&mut g, Size::new(7, 5), elem, false);
        assert_eq!(m.step(), 7 * 6);
        assert_eq!(m.offset(), 0);
        assert_eq!(m.buffer_len(), 7 * 6 * 5);
    }

    #[test]
    fn test_roi_layout_bounds() {
        let mut g = SampleGenerator::new();
        for _ in 0..50 {
            let l = Layout::roi(&mut g, Size::new(10, 10));
            let extra_w = l.backing.width - 10;
            let extra_h = l.backing.height - 10;
            assert!((5..=15).contains(&extra_w));
            assert!((5..=15).contains(&extra_h));
            assert!(l.origin_x >= 2 && l.origin_y >= 2);
            // Logical region stays inside the backing allocation.
            assert!(l.origin_x + 10 <= l.backing.width);
            assert!(l.origin_y + 10 <= l.backing.height);
        }
    }

    #[test]
    fn test_roi_margin_stays_untouched() {
        let mut g = SampleGenerator::new();
        let mut m = create_mat(&mut g, Size::new(4, 3), ElemType::new(Depth::U8, 1), true);
        m.fill(Scalar::all(9.0));
        let touched = m.bytes().iter().filter(|&&b| b == 9).count();
        assert_eq!(touched, 12);
    }

    #[test]
    fn test_load_preserves_values() {
        let mut g = SampleGenerator::new();
        let src = g.random_mat(Size::new(6, 4), ElemType::new(Depth::F64, 2), -5.0, 5.0);
        let dst = load_mat(&mut g, &src, true);
        assert_eq!(dst.size(), src.size());
        assert_eq!(dst.elem_type(), src.elem_type());
        for (x, y, c, v) in src.elements() {
            assert_eq!(dst.get(x, y, c), v);
        }
    }
}
