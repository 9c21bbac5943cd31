// keypoints.rs — Order-independent keypoint set comparison.
//
// Feature detectors running on different hardware rarely emit keypoints in
// the same order, and sub-pixel positions drift by rounding. Two keypoints
// are therefore "equal" under a proximity rule rather than bitwise:
//
//   |pt_a - pt_b|           < 1.0 pixel
//   |size_a - size_b|       < 1.0
//   |angle_a - angle_b|     < 2.0 degrees
//   |response_a - resp_b|   < 0.1
//   octave and class_id     identical
//
// The rule is not transitive, so counting matched points uses a one-to-one
// assignment (each keypoint is used at most once) built greedily from the
// closest pairs first.

use crate::error::{Error, Result};
use crate::mat::Point2f;

const MAX_PT_DIST: f32 = 1.0;
const MAX_SIZE_DIFF: f32 = 1.0;
const MAX_ANGLE_DIFF: f32 = 2.0;
const MAX_RESPONSE_DIFF: f32 = 0.1;

/// A detected feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoint {
    pub pt: Point2f,
    /// Diameter of the meaningful neighbourhood.
    pub size: f32,
    /// Orientation in degrees, -1 when not applicable.
    pub angle: f32,
    pub response: f32,
    /// Pyramid octave the keypoint was extracted from.
    pub octave: i32,
    /// Object id, -1 when unused.
    pub class_id: i32,
}

impl KeyPoint {
    /// Keypoint with the given position and size; angle -1, response 0,
    /// octave 0, class id -1.
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        KeyPoint {
            pt: Point2f::new(x, y),
            size,
            angle: -1.0,
            response: 0.0,
            octave: 0,
            class_id: -1,
        }
    }
}

/// A proposed correspondence between `query[query_idx]` and
/// `train[train_idx]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DMatch {
    pub query_idx: i32,
    pub train_idx: i32,
    pub img_idx: i32,
    pub distance: f32,
}

impl DMatch {
    pub fn new(query_idx: i32, train_idx: i32, distance: f32) -> Self {
        DMatch { query_idx, train_idx, img_idx: -1, distance }
    }
}

/// Proximity rule described at the top of this file.
pub fn keypoints_equal(a: &KeyPoint, b: &KeyPoint) -> bool {
    a.pt.distance(&b.pt) < MAX_PT_DIST
        && (a.size - b.size).abs() < MAX_SIZE_DIFF
        && (a.angle - b.angle).abs() < MAX_ANGLE_DIFF
        && (a.response - b.response).abs() < MAX_RESPONSE_DIFF
        && a.octave == b.octave
        && a.class_id == b.class_id
}

/// Every gold keypoint has an equal counterpart in `actual` and vice versa,
/// regardless of order. Fails with the unmatched indices on both sides; a
/// length difference always fails.
pub fn assert_keypoints_equals(gold: &[KeyPoint], actual: &[KeyPoint]) -> Result<()> {
    let unmatched_gold: Vec<usize> = gold
        .iter()
        .enumerate()
        .filter(|(_, g)| !actual.iter().any(|a| keypoints_equal(g, a)))
        .map(|(i, _)| i)
        .collect();
    let unmatched_actual: Vec<usize> = actual
        .iter()
        .enumerate()
        .filter(|(_, a)| !gold.iter().any(|g| keypoints_equal(g, a)))
        .map(|(i, _)| i)
        .collect();

    if gold.len() == actual.len() && unmatched_gold.is_empty() && unmatched_actual.is_empty() {
        return Ok(());
    }
    Err(Error::KeypointMismatch {
        gold_len: gold.len(),
        actual_len: actual.len(),
        unmatched_gold,
        unmatched_actual,
    })
}

/// Size of a one-to-one matching between `gold` and `actual` under the
/// proximity rule. Candidate pairs are taken closest first.
pub fn get_matched_points_count(gold: &[KeyPoint], actual: &[KeyPoint]) -> usize {
    let mut pairs: Vec<(f32, usize, usize)> = Vec::new();
    for (i, g) in gold.iter().enumerate() {
        for (j, a) in actual.iter().enumerate() {
            if keypoints_equal(g, a) {
                pairs.push((g.pt.distance(&a.pt), i, j));
            }
        }
    }
    pairs.sort_by(|p, q| p.0.total_cmp(&q.0).then(p.1.cmp(&q.1)).then(p.2.cmp(&q.2)));

    let mut gold_used = vec![false; gold.len()];
    let mut actual_used = vec![false; actual.len()];
    let mut count = 0;
    for (_, i, j) in pairs {
        if !gold_used[i] && !actual_used[j] {
            gold_used[i] = true;
            actual_used[j] = true;
            count += 1;
        }
    }
    count
}

/// Number of `matches` whose endpoints satisfy the proximity rule. A match
/// with an index outside its keypoint list counts as inconsistent.
pub fn get_matched_points_count_with(keypoints1: &[KeyPoint], keypoints2: &[KeyPoint], matches: &[DMatch]) -> usize {
    let lookup = |kps: &[KeyPoint], idx: i32| usize::try_from(idx).ok().and_then(|i| kps.get(i).copied());
    matches
        .iter()
        .filter(|m| {
            match (lookup(keypoints1, m.query_idx), lookup(keypoints2, m.train_idx)) {
                (Some(a), Some(b)) => keypoints_equal(&a, &b),
                _ => {
                    log::debug!("match {m:?} references a keypoint outside its list");
                    false
                }
            }
        })
        .count()
}
