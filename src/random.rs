// random.rs — Seeded sample generation.
//
// Reproducibility is a hard requirement: when a kernel comparison fails in
// CI, re-running the same test must regenerate the same inputs. The
// generator therefore starts from `DEFAULT_SEED` unless the caller asks for
// a random seed, and always reports the seed it is using.
//
// Each `SampleGenerator` owns its stream. The registry hands every test
// case a fresh generator seeded from the session seed, so test cases never
// share state and their inputs do not depend on execution order or on how
// many threads `cargo test` uses.
//
// ChaCha8 is used instead of `StdRng` because its output is specified and
// stable across `rand` releases; `StdRng` explicitly is not.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::mat::{Buffer, BufferMut, Depth, ElemType, Mat, Scalar, Size};

/// Seed used when nothing else is configured.
pub const DEFAULT_SEED: u64 = 0x1234_5678;

/// How to seed a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// `DEFAULT_SEED`.
    Default,
    /// An explicit, reproducible seed.
    Fixed(u64),
    /// Fresh entropy. The chosen value is still recorded (see
    /// [`SampleGenerator::seed`]) so a failure can be replayed.
    Random,
}

impl Seed {
    /// Resolve to a concrete value, drawing entropy for `Random`.
    pub fn resolve(self) -> u64 {
        match self {
            Seed::Default => DEFAULT_SEED,
            Seed::Fixed(s) => s,
            Seed::Random => rand::thread_rng().next_u64(),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Default
    }
}

/// Random scalars, sizes and filled buffers from one seeded stream.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::with_seed(Seed::Default)
    }
}

impl SampleGenerator {
    /// Generator starting at `DEFAULT_SEED`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: Seed) -> Self {
        let seed = seed.resolve();
        if seed != DEFAULT_SEED {
            log::debug!("sample generator seeded with {seed:#x}");
        }
        SampleGenerator {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this stream started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
    }

    /// Uniform integer in `[min, max]`.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn random_int(&mut self, min: i32, max: i32) -> i32 {
        assert!(min <= max, "random_int: empty range [{min}, {max}]");
        self.rng.gen_range(min..=max)
    }

    /// Uniform real in `[min, max]`.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn random_double(&mut self, min: f64, max: f64) -> f64 {
        assert!(min <= max, "random_double: empty range [{min}, {max}]");
        uniform_real(&mut self.rng, min.max(f64::MIN), max.min(f64::MAX))
    }

    /// Width and height drawn independently from `[min, max]`.
    ///
    /// # Panics
    /// Panics if `min > max` or `min < 0`.
    pub fn random_size(&mut self, min: i32, max: i32) -> Size {
        assert!(min >= 0, "random_size: negative bound {min}");
        let width = self.random_int(min, max) as usize;
        let height = self.random_int(min, max) as usize;
        Size::new(width, height)
    }

    /// Four independent components from `[min, max]`.
    pub fn random_scalar(&mut self, min: f64, max: f64) -> Scalar {
        let mut s = Scalar::default();
        for i in 0..4 {
            s[i] = self.random_double(min, max);
        }
        s
    }

    /// A tightly packed buffer whose every channel of every element is an
    /// independent uniform draw in `[min, max]`, saturated to `elem`'s depth.
    ///
    /// Integer depths draw integers: the range is first narrowed to the
    /// whole numbers inside `[min, max]` and then to the representable
    /// range, so no fractional part survives. If nothing representable
    /// lies in the range, every element holds the saturated value of `min`.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn random_mat(&mut self, size: Size, elem: ElemType, min: f64, max: f64) -> Mat {
        assert!(min <= max, "random_mat: empty range [{min}, {max}]");
        let mut mat = Mat::new(size, elem);
        let depth = elem.depth();

        if depth.is_float() {
            let (lo, hi) = match depth {
                Depth::F32 => (
                    min.max(f32::MIN as f64),
                    max.min(f32::MAX as f64),
                ),
                _ => (min.max(f64::MIN), max.min(f64::MAX)),
            };
            self.fill(&mut mat, |rng| uniform_real(rng, lo, hi));
        } else {
            let lo = min.ceil().max(depth.min_value());
            let hi = max.floor().min(depth.max_value());
            if lo > hi {
                let v = depth.saturate(min);
                self.fill(&mut mat, |_| v);
            } else {
                let (lo, hi) = (lo as i64, hi as i64);
                self.fill(&mut mat, |rng| rng.gen_range(lo..=hi) as f64);
            }
        }
        mat
    }

    fn fill(&mut self, mat: &mut Mat, mut draw: impl FnMut(&mut ChaCha8Rng) -> f64) {
        let size = mat.size();
        let channels = mat.channels();
        for y in 0..size.height {
            for x in 0..size.width {
                for c in 0..channels {
                    let v = draw(&mut self.rng);
                    mat.set(x, y, c, v);
                }
            }
        }
    }
}

/// Uniform draw in `[lo, hi]` for finite bounds, including spans wider
/// than `f64::MAX` (e.g. the whole F64 range).
fn uniform_real(rng: &mut ChaCha8Rng, lo: f64, hi: f64) -> f64 {
    if (hi - lo).is_finite() {
        return rng.gen_range(lo..=hi);
    }
    // Work at half scale so neither the span nor the sum overflows.
    let u: f64 = rng.gen();
    let half = lo / 2.0 + (hi / 2.0 - lo / 2.0) * u;
    (half * 2.0).clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed_is_fixed() {
        let g = SampleGenerator::new();
        assert_eq!(g.seed(), DEFAULT_SEED);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SampleGenerator::with_seed(Seed::Fixed(7));
        let mut b = SampleGenerator::with_seed(Seed::Fixed(7));
        for _ in 0..32 {
            assert_eq!(a.random_int(-100, 100), b.random_int(-100, 100));
        }
    }

    #[test]
    fn test_reseed_restarts() {
        let mut g = SampleGenerator::new();
        let first: Vec<i32> = (0..8).map(|_| g.random_int(0, 1000)).collect();
        g.reseed(DEFAULT_SEED);
        let again: Vec<i32> = (0..8).map(|_| g.random_int(0, 1000)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_random_seed_is_recorded() {
        let g = SampleGenerator::with_seed(Seed::Random);
        let mut replay = SampleGenerator::with_seed(Seed::Fixed(g.seed()));
        let mut g = g;
        assert_eq!(g.random_double(0.0, 1.0), replay.random_double(0.0, 1.0));
    }

    #[test]
    fn test_random_int_inclusive_bounds() {
        let mut g = SampleGenerator::new();
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..1000 {
            let v = g.random_int(0, 3);
            assert!((0..=3).contains(&v));
            seen_min |= v == 0;
            seen_max |= v == 3;
        }
        assert!(seen_min && seen_max);
        assert_eq!(g.random_int(5, 5), 5);
    }

    #[test]
    fn test_random_size_and_scalar_ranges() {
        let mut g = SampleGenerator::new();
        for _ in 0..100 {
            let s = g.random_size(10, 20);
            assert!((10..=20).contains(&s.width) && (10..=20).contains(&s.height));
            let sc = g.random_scalar(-1.0, 1.0);
            assert!(sc.0.iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_random_mat_u8_is_integral_and_in_range() {
        let mut g = SampleGenerator::new();
        let m = g.random_mat(Size::new(16, 16), ElemType::new(Depth::U8, 3), -50.5, 300.7);
        for (_, _, _, v) in m.elements() {
            assert!((0.0..=255.0).contains(&v));
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn test_random_mat_float_range() {
        let mut g = SampleGenerator::new();
        let m = g.random_mat(Size::new(8, 8), ElemType::new(Depth::F32, 1), -1.0, 1.0);
        assert!(m.elements().all(|(_, _, _, v)| (-1.0..=1.0).contains(&v)));
        // Not constant.
        let first = m.get(0, 0, 0);
        assert!(m.elements().any(|(_, _, _, v)| v != first));
    }

    #[test]
    fn test_random_mat_unrepresentable_range_saturates() {
        let mut g = SampleGenerator::new();
        let m = g.random_mat(Size::new(2, 2), ElemType::new(Depth::U8, 1), 300.0, 400.0);
        assert!(m.elements().all(|(_, _, _, v)| v == 255.0));
    }

    #[test]
    #[should_panic(expected = "empty range")]
    fn test_random_mat_inverted_range() {
        let mut g = SampleGenerator::new();
        let _ = g.random_mat(Size::new(2, 2), ElemType::new(Depth::U8, 1), 10.0, 0.0);
    }

    #[test]
    fn test_full_float_range_does_not_overflow() {
        let mut g = SampleGenerator::new();
        let m = g.random_mat(Size::new(4, 4), ElemType::new(Depth::F64, 1), f64::MIN, f64::MAX);
        assert!(m.elements().all(|(_, _, _, v)| v.is_finite()));
        let first = m.get(0, 0, 0);
        assert!(m.elements().any(|(_, _, _, v)| v != first));

        let m = g.random_mat(Size::new(4, 4), ElemType::new(Depth::F32, 2), f64::NEG_INFINITY, f64::INFINITY);
        assert!(m.elements().all(|(_, _, _, v)| v.is_finite()));

        for _ in 0..64 {
            let v = g.random_double(f64::MIN, f64::MAX);
            assert!(v.is_finite());
        }
    }
}
