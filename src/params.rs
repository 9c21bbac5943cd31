// params.rs — Parameter values for parameterized test cases.
//
// A parameterized case is registered once per value in a list (see
// `registry::TestRegistry::add_param`). Every value must display
// readably, because the display ends up in the case's report line:
//
//   Resize.accuracy/5   (128x128, 8UC3, INTER_LINEAR, sub matrix)
//
// This module provides the small wrapper types that make that work:
//
//   Named<T>   labelled value           Channels(3)
//   Flag       boolean with two labels  whole matrix / sub matrix
//   Code       opaque algorithm code    BORDER_REFLECT_101
//   WarpFlags  interpolation + inverse  INTER_CUBIC|WARP_INVERSE_MAP
//   Params<T>  tuple of the above       (113x113, 32FC1, direct)
//
// None of these values are interpreted here; they are passed through to
// the kernel under test.

use std::fmt;

// ---------------------------------------------------------------------------
// Named
// ---------------------------------------------------------------------------

/// A value shown as `Label(value)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Named<T> {
    label: &'static str,
    value: T,
}

impl<T> Named<T> {
    pub const fn new(label: &'static str, value: T) -> Self {
        Named { label, value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: fmt::Display> fmt::Display for Named<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label, self.value)
    }
}

/// `Channels(n)` for each count in `counts`.
pub fn channels(counts: &[usize]) -> Vec<Named<usize>> {
    counts.iter().map(|&n| Named::new("Channels", n)).collect()
}

// ---------------------------------------------------------------------------
// Flag
// ---------------------------------------------------------------------------

/// A boolean parameter whose display depends on what it switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flag {
    value: bool,
    on: &'static str,
    off: &'static str,
}

impl Flag {
    /// Whether buffers are built as sub-views of a larger allocation.
    pub const fn use_roi(value: bool) -> Self {
        Flag { value, on: "sub matrix", off: "whole matrix" }
    }

    /// Whether a transform is applied in its inverse direction.
    pub const fn inverse(value: bool) -> Self {
        Flag { value, on: "inverse", off: "direct" }
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.value { self.on } else { self.off })
    }
}

/// `[whole matrix, sub matrix]`.
pub fn whole_submat() -> Vec<Flag> {
    vec![Flag::use_roi(false), Flag::use_roi(true)]
}

/// `[direct, inverse]`.
pub fn direct_inverse() -> Vec<Flag> {
    vec![Flag::inverse(false), Flag::inverse(true)]
}

// ---------------------------------------------------------------------------
// Codes
// ---------------------------------------------------------------------------

/// An opaque integer code with its conventional name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    pub value: i32,
    pub name: &'static str,
}

impl Code {
    pub const fn new(value: i32, name: &'static str) -> Self {
        Code { value, name }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Norm selectors.
pub mod norm {
    use super::Code;

    pub const INF: Code = Code::new(1, "NORM_INF");
    pub const L1: Code = Code::new(2, "NORM_L1");
    pub const L2: Code = Code::new(4, "NORM_L2");
    pub const TYPE_MASK: Code = Code::new(7, "NORM_TYPE_MASK");
    pub const RELATIVE: Code = Code::new(8, "NORM_RELATIVE");
    pub const MINMAX: Code = Code::new(32, "NORM_MINMAX");

    /// Every norm code, in declaration order.
    pub const ALL: [Code; 6] = [INF, L1, L2, TYPE_MASK, RELATIVE, MINMAX];

    /// The three plain norms.
    pub const PLAIN: [Code; 3] = [INF, L1, L2];
}

/// Interpolation methods.
pub mod interpolation {
    use super::Code;

    pub const NEAREST: Code = Code::new(0, "INTER_NEAREST");
    pub const LINEAR: Code = Code::new(1, "INTER_LINEAR");
    pub const CUBIC: Code = Code::new(2, "INTER_CUBIC");
    pub const AREA: Code = Code::new(3, "INTER_AREA");

    pub const ALL: [Code; 4] = [NEAREST, LINEAR, CUBIC, AREA];
}

/// Border extrapolation modes.
pub mod border {
    use super::Code;

    pub const CONSTANT: Code = Code::new(0, "BORDER_CONSTANT");
    pub const REPLICATE: Code = Code::new(1, "BORDER_REPLICATE");
    pub const REFLECT: Code = Code::new(2, "BORDER_REFLECT");
    pub const WRAP: Code = Code::new(3, "BORDER_WRAP");
    pub const REFLECT_101: Code = Code::new(4, "BORDER_REFLECT_101");

    /// Case ids embed the list index, so this order is fixed.
    pub const ALL: [Code; 5] = [REFLECT_101, REPLICATE, CONSTANT, REFLECT, WRAP];
}

/// Bit set on a warp's flags when the map is already inverted.
pub const WARP_INVERSE_MAP: i32 = 16;

/// Interpolation plus the inverse-map bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WarpFlags {
    pub interpolation: Code,
    pub inverse_map: bool,
}

impl WarpFlags {
    pub const fn new(interpolation: Code, inverse_map: bool) -> Self {
        WarpFlags { interpolation, inverse_map }
    }

    /// Combined integer value.
    pub fn value(&self) -> i32 {
        self.interpolation.value | if self.inverse_map { WARP_INVERSE_MAP } else { 0 }
    }

    /// Nearest, linear and cubic, each with and without the inverse bit.
    pub fn all() -> Vec<WarpFlags> {
        use interpolation::{CUBIC, LINEAR, NEAREST};
        [NEAREST, LINEAR, CUBIC]
            .into_iter()
            .flat_map(|i| [WarpFlags::new(i, false), WarpFlags::new(i, true)])
            .collect()
    }
}

impl fmt::Display for WarpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interpolation)?;
        if self.inverse_map {
            write!(f, "|WARP_INVERSE_MAP")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tuples
// ---------------------------------------------------------------------------

/// A tuple of parameter values, displayed as `(a, b, ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Params<T>(pub T);

macro_rules! impl_params_display {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: fmt::Display),+> fmt::Display for Params<($($name,)+)> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let parts: Vec<String> = vec![$(self.0.$idx.to_string()),+];
                write!(f, "({})", parts.join(", "))
            }
        }
    };
}

impl_params_display!(A: 0, B: 1);
impl_params_display!(A: 0, B: 1, C: 2);
impl_params_display!(A: 0, B: 1, C: 2, D: 3);

/// Cartesian product, first list varying slowest.
pub fn product2<A: Clone, B: Clone>(a: &[A], b: &[B]) -> Vec<Params<(A, B)>> {
    let mut out = Vec::with_capacity(a.len() * b.len());
    for x in a {
        for y in b {
            out.push(Params((x.clone(), y.clone())));
        }
    }
    out
}

/// Cartesian product of three lists.
pub fn product3<A: Clone, B: Clone, C: Clone>(a: &[A], b: &[B], c: &[C]) -> Vec<Params<(A, B, C)>> {
    let mut out = Vec::with_capacity(a.len() * b.len() * c.len());
    for x in a {
        for y in b {
            for z in c {
                out.push(Params((x.clone(), y.clone(), z.clone())));
            }
        }
    }
    out
}

/// Cartesian product of four lists.
pub fn product4<A: Clone, B: Clone, C: Clone, D: Clone>(
    a: &[A],
    b: &[B],
    c: &[C],
    d: &[D],
) -> Vec<Params<(A, B, C, D)>> {
    let mut out = Vec::with_capacity(a.len() * b.len() * c.len() * d.len());
    for x in a {
        for y in b {
            for z in c {
                for w in d {
                    out.push(Params((x.clone(), y.clone(), z.clone(), w.clone())));
                }
            }
        }
    }
    out
}
