// macros.rs — Panicking wrappers around the comparison functions.
//
// Inside a `#[test]` body the natural failure mode is a panic, not a
// `Result`. Each macro calls the matching function in `compare` or
// `keypoints` and panics with the error's message on failure, prefixed by
// the expressions that were compared.
//
//   assert_mat_near!(&gold, &actual, 1e-5);
//   assert_mat_similar!(&gold, &actual, 1e-2);
//   assert_scalar_near!(expected, actual, 0.5);
//   assert_point_near!(expected, actual, 1e-3);     // Point2f or Point3f
//   assert_keypoints_eq!(&gold_kps, &actual_kps);

#[doc(hidden)]
#[macro_export]
macro_rules! __check {
    ($call:expr, $what:expr) => {
        if let ::std::result::Result::Err(e) = $call {
            panic!("{} failed: {}", $what, e);
        }
    };
}

/// Panics unless every element of the two buffers differs by at most `eps`.
#[macro_export]
macro_rules! assert_mat_near {
    ($a:expr, $b:expr, $eps:expr $(,)?) => {
        $crate::__check!(
            $crate::compare::assert_mat_near($a, $b, $eps),
            concat!("assert_mat_near!(", stringify!($a), ", ", stringify!($b), ")")
        )
    };
}

/// Panics unless the similarity score of the two buffers is at most `eps`.
#[macro_export]
macro_rules! assert_mat_similar {
    ($a:expr, $b:expr, $eps:expr $(,)?) => {
        $crate::__check!(
            $crate::compare::assert_mat_similar($a, $b, $eps),
            concat!("assert_mat_similar!(", stringify!($a), ", ", stringify!($b), ")")
        )
    };
}

/// Panics unless all four scalar components are within `eps`.
#[macro_export]
macro_rules! assert_scalar_near {
    ($a:expr, $b:expr, $eps:expr $(,)?) => {
        $crate::__check!(
            $crate::compare::assert_scalar_near($a, $b, $eps),
            concat!("assert_scalar_near!(", stringify!($a), ", ", stringify!($b), ")")
        )
    };
}

/// Panics unless two points (2D or 3D) agree within `eps` per coordinate.
#[macro_export]
macro_rules! assert_point_near {
    ($a:expr, $b:expr, $eps:expr $(,)?) => {
        $crate::__check!(
            $crate::compare::PointNear::check_near(&$a, &$b, $eps),
            concat!("assert_point_near!(", stringify!($a), ", ", stringify!($b), ")")
        )
    };
}

/// Panics unless the two keypoint sets correspond in both directions.
#[macro_export]
macro_rules! assert_keypoints_eq {
    ($gold:expr, $actual:expr $(,)?) => {
        $crate::__check!(
            $crate::keypoints::assert_keypoints_equals($gold, $actual),
            concat!("assert_keypoints_eq!(", stringify!($gold), ", ", stringify!($actual), ")")
        )
    };
}
