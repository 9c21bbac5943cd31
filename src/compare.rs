// compare.rs — Verdicts on computed results.
//
// Three ways to decide whether an accelerated kernel agrees with its
// reference:
//
//   assert_mat_near     every element within an absolute tolerance
//   check_similarity    normalized cross-correlation score, for results
//                       that legitimately differ by rounding/resampling
//   min_max_loc_gold    a deliberately naive scan used as the oracle for
//                       optimized min/max reductions
//
// All functions are generic over `Buffer`, so owned buffers, ROI views and
// downloaded device buffers compare the same way. All accesses are
// stride-aware; padding bytes never take part in a verdict.
//
// NaN policy: NaN compared with NaN counts as equal (so comparing a buffer
// with itself always passes); NaN compared with a number is an infinite
// difference. `min_max_loc_gold` ignores NaN elements.

use crate::error::{Error, Result};
use crate::mat::{Buffer, BufferMut, Depth, ElemType, Mat, Point, Point2f, Point3f, Scalar};

fn check_shape<A: Buffer, B: Buffer>(a: &A, b: &B) -> Result<()> {
    if a.size() != b.size() || a.elem_type() != b.elem_type() {
        return Err(Error::ShapeMismatch {
            lhs_size: a.size(),
            lhs_type: a.elem_type(),
            rhs_size: b.size(),
            rhs_type: b.elem_type(),
        });
    }
    Ok(())
}

#[inline]
fn abs_diff(a: f64, b: f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => 0.0,
        (false, false) => (a - b).abs(),
        _ => f64::INFINITY,
    }
}

/// Largest absolute per-element difference (the infinity norm of `a - b`).
pub fn max_abs_diff<A: Buffer, B: Buffer>(a: &A, b: &B) -> Result<f64> {
    check_shape(a, b)?;
    let mut max = 0.0f64;
    for y in 0..a.height() {
        for x in 0..a.width() {
            for c in 0..a.channels() {
                max = max.max(abs_diff(a.get(x, y, c), b.get(x, y, c)));
            }
        }
    }
    Ok(max)
}

/// Pass iff `a` and `b` have the same size and type and no element differs
/// by more than `eps`. A difference of exactly `eps` passes.
///
/// On failure the error names the first offending element in row-major
/// order (x, y, channel), both values, its difference and the largest
/// difference found anywhere in the buffer.
pub fn assert_mat_near<A: Buffer, B: Buffer>(expected: &A, actual: &B, eps: f64) -> Result<()> {
    check_shape(expected, actual)?;

    let mut first: Option<(usize, usize, usize, f64, f64, f64)> = None;
    let mut max_diff = 0.0f64;
    for y in 0..expected.height() {
        for x in 0..expected.width() {
            for c in 0..expected.channels() {
                let e = expected.get(x, y, c);
                let a = actual.get(x, y, c);
                let d = abs_diff(e, a);
                max_diff = max_diff.max(d);
                if d > eps && first.is_none() {
                    first = Some((x, y, c, e, a, d));
                }
            }
        }
    }

    match first {
        None => Ok(()),
        Some((x, y, channel, expected, actual, diff)) => Err(Error::ValueMismatch {
            x,
            y,
            channel,
            expected,
            actual,
            diff,
            eps,
            max_diff,
        }),
    }
}

/// Structural dissimilarity in `[0, 2]`: `|1 - ncc|`, where `ncc` is the
/// normalized cross-correlation of the two buffers over all elements and
/// channels (template matching of equally sized images, `TM_CCORR_NORMED`).
///
/// 0 means identical up to a positive scale factor. Two all-zero buffers
/// score 0; an all-zero buffer against a non-zero one scores 1.
///
/// Each buffer is scaled by its own largest finite magnitude before
/// accumulating (the score does not depend on scale), so the full F64
/// range does not overflow. Element pairs that are identical non-finite
/// values (NaN with NaN, or the same infinity) are left out; any other
/// pair involving a non-finite value makes the score 2.
pub fn check_similarity<A: Buffer, B: Buffer>(a: &A, b: &B) -> Result<f64> {
    check_shape(a, b)?;

    let (mut scale_a, mut scale_b) = (0.0f64, 0.0f64);
    for (x, y, c, va) in a.elements() {
        let vb = b.get(x, y, c);
        match (va.is_finite(), vb.is_finite()) {
            (true, true) => {
                scale_a = scale_a.max(va.abs());
                scale_b = scale_b.max(vb.abs());
            }
            (false, false) if same_non_finite(va, vb) => {}
            _ => return Ok(2.0),
        }
    }
    match (scale_a == 0.0, scale_b == 0.0) {
        (true, true) => return Ok(0.0),
        (true, false) | (false, true) => return Ok(1.0),
        (false, false) => {}
    }

    let (mut sab, mut saa, mut sbb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y, c, va) in a.elements() {
        if !va.is_finite() {
            continue;
        }
        let va = va / scale_a;
        let vb = b.get(x, y, c) / scale_b;
        sab += va * vb;
        saa += va * va;
        sbb += vb * vb;
    }

    // saa, sbb >= 1 here: the element that set each scale contributes 1.
    let ncc = sab / (saa * sbb).sqrt();
    Ok((1.0 - ncc).abs().min(2.0))
}

#[inline]
fn same_non_finite(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

/// Shape check followed by `check_similarity(a, b) <= eps`.
pub fn assert_mat_similar<A: Buffer, B: Buffer>(a: &A, b: &B, eps: f64) -> Result<()> {
    let score = check_similarity(a, b)?;
    if score <= eps {
        Ok(())
    } else {
        Err(Error::Dissimilar { score, eps })
    }
}

/// Result of [`min_max_loc_gold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxLoc {
    pub min_val: f64,
    pub max_val: f64,
    pub min_loc: Point,
    pub max_loc: Point,
}

/// Reference min/max with first-occurring locations on a single-channel
/// buffer. Returns `None` when the buffer is empty or holds only NaN.
pub fn min_max_loc_gold<B: Buffer>(src: &B) -> Result<Option<MinMaxLoc>> {
    scan_min_max(src, |_, _| true)
}

/// Like [`min_max_loc_gold`], skipping elements where `mask` is zero.
/// `mask` must be 8UC1 and the same size as `src`. Returns `None` when no
/// element survives the mask.
pub fn min_max_loc_gold_masked<B: Buffer, M: Buffer>(src: &B, mask: &M) -> Result<Option<MinMaxLoc>> {
    if mask.elem_type() != ElemType::new(Depth::U8, 1) || mask.size() != src.size() {
        return Err(Error::InvalidArgument(format!(
            "mask must be {} 8UC1, got {} {}",
            src.size(),
            mask.size(),
            mask.elem_type()
        )));
    }
    scan_min_max(src, |x, y| mask.get(x, y, 0) != 0.0)
}

fn scan_min_max<B: Buffer>(src: &B, keep: impl Fn(usize, usize) -> bool) -> Result<Option<MinMaxLoc>> {
    if src.channels() != 1 {
        return Err(Error::InvalidArgument(format!(
            "min/max location needs a single-channel buffer, got {}",
            src.elem_type()
        )));
    }

    let mut best: Option<MinMaxLoc> = None;
    for y in 0..src.height() {
        for x in 0..src.width() {
            if !keep(x, y) {
                continue;
            }
            let v = src.get(x, y, 0);
            if v.is_nan() {
                continue;
            }
            let p = Point::new(x, y);
            match best.as_mut() {
                None => {
                    best = Some(MinMaxLoc { min_val: v, max_val: v, min_loc: p, max_loc: p });
                }
                Some(b) => {
                    if v < b.min_val {
                        b.min_val = v;
                        b.min_loc = p;
                    }
                    if v > b.max_val {
                        b.max_val = v;
                        b.max_loc = p;
                    }
                }
            }
        }
    }
    Ok(best)
}

fn near(what: String, expected: f64, actual: f64, eps: f64) -> Result<()> {
    if abs_diff(expected, actual) <= eps {
        Ok(())
    } else {
        Err(Error::ComponentMismatch { what, expected, actual, eps })
    }
}

/// All four components within `eps`.
pub fn assert_scalar_near(expected: Scalar, actual: Scalar, eps: f64) -> Result<()> {
    for i in 0..4 {
        near(format!("scalar[{i}]"), expected[i], actual[i], eps)?;
    }
    Ok(())
}

/// x and y within `eps`.
pub fn assert_point2_near(expected: Point2f, actual: Point2f, eps: f64) -> Result<()> {
    near("point.x".into(), expected.x as f64, actual.x as f64, eps)?;
    near("point.y".into(), expected.y as f64, actual.y as f64, eps)
}

/// x, y and z within `eps`.
pub fn assert_point3_near(expected: Point3f, actual: Point3f, eps: f64) -> Result<()> {
    near("point.x".into(), expected.x as f64, actual.x as f64, eps)?;
    near("point.y".into(), expected.y as f64, actual.y as f64, eps)?;
    near("point.z".into(), expected.z as f64, actual.z as f64, eps)
}

/// Per-coordinate tolerance check shared by 2D and 3D points, so a single
/// `assert_point_near!` covers both.
pub trait PointNear {
    fn check_near(&self, actual: &Self, eps: f64) -> Result<()>;
}

impl PointNear for Point2f {
    fn check_near(&self, actual: &Self, eps: f64) -> Result<()> {
        assert_point2_near(*self, *actual, eps)
    }
}

impl PointNear for Point3f {
    fn check_near(&self, actual: &Self, eps: f64) -> Result<()> {
        assert_point3_near(*self, *actual, eps)
    }
}

/// 8UC1 mask, 255 wherever any channel of `gold` and `actual` differs by
/// more than `eps`, 0 elsewhere. This is what a diff viewer displays.
pub fn diff_mask<A: Buffer, B: Buffer>(gold: &A, actual: &B, eps: f64) -> Result<Mat> {
    check_shape(gold, actual)?;
    let mut mask = Mat::new(gold.size(), ElemType::new(Depth::U8, 1));
    for y in 0..gold.height() {
        for x in 0..gold.width() {
            let bad = (0..gold.channels()).any(|c| abs_diff(gold.get(x, y, c), actual.get(x, y, c)) > eps);
            if bad {
                mask.set(x, y, 0, 255.0);
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::{Rect, Size};

    fn f32c1(w: usize, h: usize, v: &[f32]) -> Mat {
        Mat::from_slice(Size::new(w, h), 1, v)
    }

    #[test]
    fn test_near_reflexive() {
        let m = f32c1(2, 2, &[1.0, -2.0, 3.5, 1e9]);
        assert!(assert_mat_near(&m, &m, 0.0).is_ok());
    }

    #[test]
    fn test_near_boundary() {
        let a = f32c1(2, 1, &[1.0, 2.0]);
        let b = f32c1(2, 1, &[1.5, 2.0]);
        assert!(assert_mat_near(&a, &b, 0.5).is_ok());
        let err = assert_mat_near(&a, &b, 0.25).unwrap_err();
        match err {
            Error::ValueMismatch { x, y, channel, diff, max_diff, .. } => {
                assert_eq!((x, y, channel), (0, 0, 0));
                assert_eq!(diff, 0.5);
                assert_eq!(max_diff, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_near_reports_first_and_max() {
        let a = f32c1(3, 1, &[0.0, 0.0, 0.0]);
        let b = f32c1(3, 1, &[0.0, 2.0, 5.0]);
        match assert_mat_near(&a, &b, 1.0).unwrap_err() {
            Error::ValueMismatch { x, diff, max_diff, .. } => {
                assert_eq!(x, 1);
                assert_eq!(diff, 2.0);
                assert_eq!(max_diff, 5.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let a = f32c1(2, 2, &[0.0; 4]);
        let b = f32c1(4, 1, &[0.0; 4]);
        assert!(matches!(assert_mat_near(&a, &b, 1.0), Err(Error::ShapeMismatch { .. })));
        let c = Mat::new(Size::new(2, 2), ElemType::new(Depth::F64, 1));
        assert!(matches!(assert_mat_near(&a, &c, 1.0), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_nan_policy() {
        let a = f32c1(2, 1, &[f32::NAN, 1.0]);
        assert!(assert_mat_near(&a, &a, 0.0).is_ok());
        let b = f32c1(2, 1, &[0.0, 1.0]);
        assert!(assert_mat_near(&a, &b, 1e30).is_err());
    }

    #[test]
    fn test_near_ignores_roi_padding() {
        let mut backing = Mat::with_value(Size::new(6, 6), ElemType::new(Depth::U8, 1), Scalar::all(1.0));
        let inner = f32c1(2, 2, &[0.0; 4]).convert_to(Depth::U8);
        backing.roi_mut(Rect::new(2, 2, 2, 2)).copy_from(&inner);
        let view = backing.roi(Rect::new(2, 2, 2, 2));
        assert!(assert_mat_near(&view, &inner, 0.0).is_ok());
    }

    #[test]
    fn test_similarity_identity_and_scale() {
        let a = f32c1(3, 1, &[1.0, 2.0, 3.0]);
        assert!(check_similarity(&a, &a).unwrap() < 1e-12);
        let b = f32c1(3, 1, &[2.0, 4.0, 6.0]);
        assert!(check_similarity(&a, &b).unwrap() < 1e-12);
        let c = f32c1(3, 1, &[3.0, 2.0, 1.0]);
        assert!(check_similarity(&a, &c).unwrap() > 0.1);
    }

    #[test]
    fn test_similarity_zero_buffers() {
        let z = f32c1(2, 1, &[0.0, 0.0]);
        let o = f32c1(2, 1, &[0.0, 1.0]);
        assert_eq!(check_similarity(&z, &z).unwrap(), 0.0);
        assert_eq!(check_similarity(&z, &o).unwrap(), 1.0);
    }

    #[test]
    fn test_assert_similar() {
        let a = f32c1(3, 1, &[1.0, 2.0, 3.0]);
        let c = f32c1(3, 1, &[3.0, 2.0, 1.0]);
        assert!(assert_mat_similar(&a, &a, 1e-6).is_ok());
        assert!(matches!(assert_mat_similar(&a, &c, 1e-6), Err(Error::Dissimilar { .. })));
    }

    #[test]
    fn test_min_max_first_occurrence() {
        let m = f32c1(3, 1, &[1.0, 1.0, 1.0]);
        let r = min_max_loc_gold(&m).unwrap().unwrap();
        assert_eq!(r.min_loc, Point::new(0, 0));
        assert_eq!(r.max_loc, Point::new(0, 0));
    }

    #[test]
    fn test_min_max_all_masked() {
        let m = f32c1(2, 1, &[1.0, 2.0]);
        let mask = Mat::new(Size::new(2, 1), ElemType::new(Depth::U8, 1));
        assert_eq!(min_max_loc_gold_masked(&m, &mask).unwrap(), None);
    }

    #[test]
    fn test_min_max_rejects_bad_inputs() {
        let m = Mat::new(Size::new(2, 2), ElemType::new(Depth::U8, 3));
        assert!(matches!(min_max_loc_gold(&m), Err(Error::InvalidArgument(_))));
        let m = f32c1(2, 1, &[1.0, 2.0]);
        let bad_mask = f32c1(2, 1, &[1.0, 1.0]);
        assert!(matches!(
            min_max_loc_gold_masked(&m, &bad_mask),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_scalar_and_point_near() {
        assert!(assert_scalar_near(Scalar::all(1.0), Scalar::new(1.0, 1.1, 0.9, 1.0), 0.1 + 1e-12).is_ok());
        assert!(assert_scalar_near(Scalar::all(1.0), Scalar::new(1.0, 1.0, 1.0, 2.0), 0.5).is_err());
        assert!(assert_point2_near(Point2f::new(1.0, 2.0), Point2f::new(1.0, 2.5), 0.1).is_err());
        assert!(assert_point3_near(Point3f::new(1.0, 2.0, 3.0), Point3f::new(1.0, 2.0, 3.0), 0.0).is_ok());
    }

    #[test]
    fn test_diff_mask() {
        let a = Mat::from_slice(Size::new(2, 1), 2, &[0u8, 0, 10, 10]);
        let b = Mat::from_slice(Size::new(2, 1), 2, &[0u8, 1, 10, 30]);
        let mask = diff_mask(&a, &b, 1.0).unwrap();
        assert_eq!(mask.get(0, 0, 0), 0.0);
        assert_eq!(mask.get(1, 0, 0), 255.0);
    }
}
