// tests/test_compare.rs — Integration tests for tolerance, similarity and
// reference min/max verdicts.
//
// These run with `cargo test --test test_compare`.

use gpu_testkit::compare::{
    assert_mat_near, assert_mat_similar, assert_scalar_near, check_similarity, max_abs_diff, min_max_loc_gold,
    min_max_loc_gold_masked,
};
use gpu_testkit::factory::load_mat;
use gpu_testkit::mat::{Buffer, BufferMut, Depth, ElemType, Mat, Point, Scalar, Size};
use gpu_testkit::random::SampleGenerator;
use gpu_testkit::types::all_types;
use gpu_testkit::Error;

fn grid3x3() -> Mat {
    Mat::from_slice(Size::new(3, 3), 1, &[5.0f32, 3.0, 8.0, 1.0, 9.0, 2.0, 7.0, 4.0, 6.0])
}

// ===== Tolerance =====

#[test]
fn every_type_is_near_its_own_roi_copy() {
    let mut g = SampleGenerator::new();
    for &t in all_types() {
        let gold = g.random_mat(Size::new(17, 9), t, 0.0, 120.0);
        let actual = load_mat(&mut g, &gold, true);
        gpu_testkit::assert_mat_near!(&gold, &actual, 0.0);
    }
}

#[test]
fn tolerance_boundary_is_inclusive() {
    let a = Mat::from_slice(Size::new(3, 1), 1, &[10i16, 20, 30]);
    let mut b = a.clone();
    b.set(2, 0, 0, 33.0);
    assert!(assert_mat_near(&a, &b, 3.0).is_ok());
    assert!(assert_mat_near(&a, &b, 2.999).is_err());
    assert_eq!(max_abs_diff(&a, &b).unwrap(), 3.0);
}

#[test]
fn mismatch_reports_first_offender_and_max() {
    let a = Mat::new(Size::new(4, 2), ElemType::new(Depth::U8, 2));
    let mut b = a.clone();
    b.set(3, 0, 1, 2.0);
    b.set(0, 1, 0, 40.0);
    match assert_mat_near(&a, &b, 1.0) {
        Err(Error::ValueMismatch { x, y, channel, diff, max_diff, .. }) => {
            assert_eq!((x, y, channel), (3, 0, 1));
            assert_eq!(diff, 2.0);
            assert_eq!(max_diff, 40.0);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn shape_and_type_mismatch_are_rejected() {
    let a = Mat::new(Size::new(4, 4), ElemType::new(Depth::U8, 1));
    let b = Mat::new(Size::new(4, 4), ElemType::new(Depth::U8, 3));
    let c = Mat::new(Size::new(4, 5), ElemType::new(Depth::U8, 1));
    assert!(matches!(assert_mat_near(&a, &b, 255.0), Err(Error::ShapeMismatch { .. })));
    assert!(matches!(assert_mat_near(&a, &c, 255.0), Err(Error::ShapeMismatch { .. })));
}

#[test]
fn nan_agrees_only_with_nan() {
    let a = Mat::from_slice(Size::new(2, 1), 1, &[f32::NAN, 1.0]);
    let b = Mat::from_slice(Size::new(2, 1), 1, &[f32::NAN, 1.0]);
    let c = Mat::from_slice(Size::new(2, 1), 1, &[0.0f32, 1.0]);
    assert!(assert_mat_near(&a, &b, 0.0).is_ok());
    assert!(assert_mat_near(&a, &c, 1e6).is_err());
}

#[test]
fn scalar_components_checked_independently() {
    let e = Scalar::new(1.0, 2.0, 3.0, 4.0);
    assert!(assert_scalar_near(e, Scalar::new(1.1, 2.0, 2.9, 4.0), 0.2).is_ok());
    let err = assert_scalar_near(e, Scalar::new(1.0, 2.0, 3.0, 5.0), 0.5).unwrap_err();
    assert!(err.to_string().contains("scalar[3]"), "{err}");
}

// ===== Similarity =====

#[test]
fn scaled_copy_is_similar() {
    let mut g = SampleGenerator::new();
    let a = g.random_mat(Size::new(32, 32), ElemType::new(Depth::F32, 1), 1.0, 10.0);
    let mut b = a.clone();
    for (x, y, c, v) in a.elements() {
        b.set(x, y, c, v * 2.0);
    }
    assert!(check_similarity(&a, &b).unwrap() < 1e-9);
    assert!(assert_mat_similar(&a, &b, 1e-6).is_ok());
}

#[test]
fn unrelated_buffers_are_dissimilar() {
    let mut a = Mat::new(Size::new(8, 1), ElemType::new(Depth::F32, 1));
    let mut b = a.clone();
    for x in 0..8 {
        if x % 2 == 0 {
            a.set(x, 0, 0, 1.0);
        } else {
            b.set(x, 0, 0, 1.0);
        }
    }
    assert_eq!(check_similarity(&a, &b).unwrap(), 1.0);
    assert!(matches!(assert_mat_similar(&a, &b, 0.5), Err(Error::Dissimilar { .. })));
}

#[test]
fn similarity_score_stays_in_range() {
    let mut g = SampleGenerator::new();
    for _ in 0..20 {
        let a = g.random_mat(Size::new(8, 8), ElemType::new(Depth::F64, 1), -1.0, 1.0);
        let b = g.random_mat(Size::new(8, 8), ElemType::new(Depth::F64, 1), -1.0, 1.0);
        let s = check_similarity(&a, &b).unwrap();
        assert!((0.0..=2.0).contains(&s), "score {s}");
    }
}

#[test]
fn huge_doubles_are_similar_to_themselves() {
    let mut g = SampleGenerator::new();
    let a = g.random_mat(Size::new(4, 4), ElemType::new(Depth::F64, 1), -1e200, 1e200);
    assert_eq!(check_similarity(&a, &a).unwrap(), 0.0);
    assert!(assert_mat_similar(&a, &a, 1e-6).is_ok());

    let full = g.random_mat(Size::new(4, 4), ElemType::new(Depth::F64, 2), f64::MIN, f64::MAX);
    assert_eq!(check_similarity(&full, &full).unwrap(), 0.0);
}

#[test]
fn non_finite_elements_in_similarity() {
    let a = Mat::from_slice(Size::new(3, 1), 1, &[f32::NAN, 1.0, f32::INFINITY]);
    assert_eq!(check_similarity(&a, &a).unwrap(), 0.0);
    assert!(assert_mat_similar(&a, &a, 1e-6).is_ok());

    let b = Mat::from_slice(Size::new(3, 1), 1, &[0.0f32, 1.0, f32::INFINITY]);
    assert_eq!(check_similarity(&a, &b).unwrap(), 2.0);
    assert_eq!(check_similarity(&b, &a).unwrap(), 2.0);

    let nan_only = Mat::from_slice(Size::new(2, 1), 1, &[f64::NAN, f64::NAN]);
    assert_eq!(check_similarity(&nan_only, &nan_only).unwrap(), 0.0);
}

// ===== Reference min/max =====

#[test]
fn min_max_on_3x3() {
    let r = min_max_loc_gold(&grid3x3()).unwrap().unwrap();
    assert_eq!(r.min_val, 1.0);
    assert_eq!(r.min_loc, Point::new(0, 1));
    assert_eq!(r.max_val, 9.0);
    assert_eq!(r.max_loc, Point::new(1, 1));
}

#[test]
fn mask_excluding_minimum_moves_it() {
    let mut mask = Mat::with_value(Size::new(3, 3), ElemType::new(Depth::U8, 1), Scalar::all(255.0));
    mask.set(0, 1, 0, 0.0);
    let r = min_max_loc_gold_masked(&grid3x3(), &mask).unwrap().unwrap();
    assert_eq!(r.min_val, 2.0);
    assert_eq!(r.min_loc, Point::new(2, 1));
    assert_eq!(r.max_loc, Point::new(1, 1));
}

#[test]
fn ties_resolve_to_first_in_scan_order() {
    let m = Mat::from_slice(Size::new(2, 2), 1, &[4u8, 0, 4, 0]);
    let r = min_max_loc_gold(&m).unwrap().unwrap();
    assert_eq!(r.min_loc, Point::new(1, 0));
    assert_eq!(r.max_loc, Point::new(0, 0));
}

#[test]
fn fully_masked_buffer_has_no_extrema() {
    let mask = Mat::new(Size::new(3, 3), ElemType::new(Depth::U8, 1));
    assert_eq!(min_max_loc_gold_masked(&grid3x3(), &mask).unwrap(), None);
}

#[test]
fn bad_mask_is_invalid_argument() {
    let mask = Mat::new(Size::new(3, 3), ElemType::new(Depth::F32, 1));
    assert!(matches!(
        min_max_loc_gold_masked(&grid3x3(), &mask),
        Err(Error::InvalidArgument(_))
    ));
}
