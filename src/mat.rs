// mat.rs — Runtime-typed, strided host buffer and borrowed ROI views.
//
// A `Mat` is a 2D array of elements whose kind (`Depth`) and channel count
// are only known at runtime, because the whole point of the harness is to
// sweep every (depth × channels) combination through the same test body.
//
// Memory layout (width = 3, 1 byte per element, step = 6, offset = 7):
//
//   backing index: 0 .. 6 | 7  8  9 [10 11 12] | 13 14 15 [16 17 18] | ...
//   element:       margin | ■  ■  ■   ·  ·  ·  | ■  ■  ■   ·  ·  ·  |
//                          |------ row 0 ------| |------ row 1 ------|
//
// `offset` is where (0, 0) lives inside the backing allocation and `step`
// is the distance in BYTES between rows. A tight buffer has offset 0 and
// step == width * elem_size; an ROI-style buffer has both larger. Every
// accessor goes through `byte_index`, so no code path can assume tight
// packing.
//
// Views (`MatView`, `MatViewMut`) borrow the parent's backing bytes and
// carry their own offset/size. They never own memory, and a `MatViewMut`
// writes straight into the parent.
//
// Elements are stored as raw bytes and read with
// `bytemuck::pod_read_unaligned`: the backing `Vec<u8>` has alignment 1 and
// a row of f64 may start at any byte offset.

use std::fmt;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Width × height of a buffer, in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Size { width, height }
    }

    /// Number of elements (per channel).
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Integer location inside a buffer. x is the column, y the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Sub-pixel 2D location.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Point2f { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2f) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// 3D point, used by the point-near assertions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Point3f { x, y, z }
    }
}

/// Axis-aligned rectangle in element coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Rect { x, y, width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Up to four independent components: one value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scalar(pub [f64; 4]);

impl Scalar {
    pub const fn new(v0: f64, v1: f64, v2: f64, v3: f64) -> Self {
        Scalar([v0, v1, v2, v3])
    }

    /// All four components set to `v`.
    pub const fn all(v: f64) -> Self {
        Scalar([v; 4])
    }
}

impl std::ops::Index<usize> for Scalar {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl std::ops::IndexMut<usize> for Scalar {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

// ---------------------------------------------------------------------------
// Element kinds
// ---------------------------------------------------------------------------

/// Per-element storage representation. The discriminant is the conventional
/// depth index (8U = 0 … 64F = 6), which is also the position in the type
/// grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Depth {
    U8 = 0,
    S8 = 1,
    U16 = 2,
    S16 = 3,
    S32 = 4,
    F32 = 5,
    F64 = 6,
}

impl Depth {
    /// All depths in index order.
    pub const ALL: [Depth; 7] = [
        Depth::U8,
        Depth::S8,
        Depth::U16,
        Depth::S16,
        Depth::S32,
        Depth::F32,
        Depth::F64,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Depth> {
        Depth::ALL.get(i).copied()
    }

    /// Bytes per single-channel element.
    pub fn size_bytes(self) -> usize {
        match self {
            Depth::U8 | Depth::S8 => 1,
            Depth::U16 | Depth::S16 => 2,
            Depth::S32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Depth::F32 | Depth::F64)
    }

    /// Smallest representable value.
    pub fn min_value(self) -> f64 {
        match self {
            Depth::U8 | Depth::U16 => 0.0,
            Depth::S8 => i8::MIN as f64,
            Depth::S16 => i16::MIN as f64,
            Depth::S32 => i32::MIN as f64,
            Depth::F32 => f32::MIN as f64,
            Depth::F64 => f64::MIN,
        }
    }

    /// Largest representable value.
    pub fn max_value(self) -> f64 {
        match self {
            Depth::U8 => u8::MAX as f64,
            Depth::S8 => i8::MAX as f64,
            Depth::U16 => u16::MAX as f64,
            Depth::S16 => i16::MAX as f64,
            Depth::S32 => i32::MAX as f64,
            Depth::F32 => f32::MAX as f64,
            Depth::F64 => f64::MAX,
        }
    }

    /// Saturate `v` to this depth: integer kinds round to nearest and clamp,
    /// f32 narrows, f64 passes through. NaN maps to 0 for integer kinds.
    pub fn saturate(self, v: f64) -> f64 {
        match self {
            Depth::F64 => v,
            Depth::F32 => v as f32 as f64,
            _ if v.is_nan() => 0.0,
            _ => v.round().clamp(self.min_value(), self.max_value()),
        }
    }

    /// Short name, e.g. `8U`, `32F`.
    pub fn name(self) -> &'static str {
        match self {
            Depth::U8 => "8U",
            Depth::S8 => "8S",
            Depth::U16 => "16U",
            Depth::S16 => "16S",
            Depth::S32 => "32S",
            Depth::F32 => "32F",
            Depth::F64 => "64F",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maximum channels per element.
pub const MAX_CHANNELS: usize = 4;

/// Element kind plus channel count, e.g. 8UC3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElemType {
    depth: Depth,
    channels: usize,
}

impl ElemType {
    /// # Panics
    /// Panics if `channels` is not in `1..=4`.
    pub fn new(depth: Depth, channels: usize) -> Self {
        assert!(
            (1..=MAX_CHANNELS).contains(&channels),
            "channel count must be 1..=4 (got {channels})"
        );
        ElemType { depth, channels }
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Packed code: `depth + (channels - 1) * 8`.
    pub fn code(&self) -> i32 {
        self.depth.index() as i32 + ((self.channels as i32 - 1) << 3)
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: i32) -> Option<Self> {
        if code < 0 {
            return None;
        }
        let depth = Depth::from_index((code & 7) as usize)?;
        let channels = ((code >> 3) + 1) as usize;
        (channels <= MAX_CHANNELS).then(|| ElemType::new(depth, channels))
    }

    /// Bytes per element, all channels included.
    pub fn elem_size(&self) -> usize {
        self.depth.size_bytes() * self.channels
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C{}", self.depth, self.channels)
    }
}

/// Rust scalar types that map onto a `Depth`.
pub trait Element: bytemuck::Pod + PartialOrd + Send + Sync + 'static {
    const DEPTH: Depth;

    fn to_f64(self) -> f64;

    /// Build from an f64, saturating to the representable range.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_int_element {
    ($t:ty, $depth:expr) => {
        impl Element for $t {
            const DEPTH: Depth = $depth;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                Self::DEPTH.saturate(v) as $t
            }
        }
    };
}

impl_int_element!(u8, Depth::U8);
impl_int_element!(i8, Depth::S8);
impl_int_element!(u16, Depth::U16);
impl_int_element!(i16, Depth::S16);
impl_int_element!(i32, Depth::S32);

impl Element for f32 {
    const DEPTH: Depth = Depth::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Element for f64 {
    const DEPTH: Depth = Depth::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

fn read_as_f64(depth: Depth, bytes: &[u8]) -> f64 {
    use bytemuck::pod_read_unaligned as rd;
    match depth {
        Depth::U8 => bytes[0] as f64,
        Depth::S8 => bytes[0] as i8 as f64,
        Depth::U16 => rd::<u16>(bytes) as f64,
        Depth::S16 => rd::<i16>(bytes) as f64,
        Depth::S32 => rd::<i32>(bytes) as f64,
        Depth::F32 => rd::<f32>(bytes) as f64,
        Depth::F64 => rd::<f64>(bytes),
    }
}

fn write_from_f64(depth: Depth, bytes: &mut [u8], v: f64) {
    match depth {
        Depth::U8 => bytes.copy_from_slice(&[u8::from_f64(v)]),
        Depth::S8 => bytes.copy_from_slice(bytemuck::bytes_of(&i8::from_f64(v))),
        Depth::U16 => bytes.copy_from_slice(bytemuck::bytes_of(&u16::from_f64(v))),
        Depth::S16 => bytes.copy_from_slice(bytemuck::bytes_of(&i16::from_f64(v))),
        Depth::S32 => bytes.copy_from_slice(bytemuck::bytes_of(&i32::from_f64(v))),
        Depth::F32 => bytes.copy_from_slice(bytemuck::bytes_of(&f32::from_f64(v))),
        Depth::F64 => bytes.copy_from_slice(bytemuck::bytes_of(&v)),
    }
}

// ---------------------------------------------------------------------------
// Buffer traits — shared stride-aware addressing
// ---------------------------------------------------------------------------

/// Read access shared by `Mat`, `MatView` and `MatViewMut`.
///
/// Implementors only describe their layout; every element access is derived
/// from `offset` + `step` here, once.
pub trait Buffer {
    fn size(&self) -> Size;
    fn elem_type(&self) -> ElemType;
    /// Bytes between consecutive rows.
    fn step(&self) -> usize;
    /// Byte position of element (0, 0) inside `bytes()`.
    fn offset(&self) -> usize;
    /// The whole backing allocation (including margins and padding).
    fn bytes(&self) -> &[u8];

    #[inline]
    fn width(&self) -> usize {
        self.size().width
    }

    #[inline]
    fn height(&self) -> usize {
        self.size().height
    }

    #[inline]
    fn depth(&self) -> Depth {
        self.elem_type().depth()
    }

    #[inline]
    fn channels(&self) -> usize {
        self.elem_type().channels()
    }

    /// Bytes occupied by the logical part of one row.
    #[inline]
    fn row_size(&self) -> usize {
        self.width() * self.elem_type().elem_size()
    }

    /// True when rows follow each other with no padding.
    fn is_continuous(&self) -> bool {
        self.step() == self.row_size() || self.height() <= 1
    }

    /// Byte index of channel `c` of element (x, y).
    ///
    /// # Panics
    /// Panics if (x, y, c) is out of bounds.
    #[inline]
    fn byte_index(&self, x: usize, y: usize, c: usize) -> usize {
        let size = self.size();
        assert!(
            x < size.width && y < size.height && c < self.channels(),
            "element ({x},{y}) channel {c} out of bounds for {size} {}",
            self.elem_type(),
        );
        self.offset() + y * self.step() + x * self.elem_type().elem_size() + c * self.depth().size_bytes()
    }

    /// Logical bytes of row `y` (no padding).
    fn row_bytes(&self, y: usize) -> &[u8] {
        assert!(y < self.height(), "row {y} out of bounds (height {})", self.height());
        let start = self.offset() + y * self.step();
        &self.bytes()[start..start + self.row_size()]
    }

    /// Channel `c` of element (x, y), widened to f64.
    #[inline]
    fn get(&self, x: usize, y: usize, c: usize) -> f64 {
        let i = self.byte_index(x, y, c);
        let n = self.depth().size_bytes();
        read_as_f64(self.depth(), &self.bytes()[i..i + n])
    }

    /// Typed read.
    ///
    /// # Panics
    /// Panics if `T` does not match the buffer's depth.
    #[inline]
    fn at<T: Element>(&self, x: usize, y: usize, c: usize) -> T {
        assert_eq!(T::DEPTH, self.depth(), "typed access with wrong element kind");
        let i = self.byte_index(x, y, c);
        bytemuck::pod_read_unaligned(&self.bytes()[i..i + std::mem::size_of::<T>()])
    }

    /// All channels of element (x, y). Unused components are 0.
    fn get_scalar(&self, x: usize, y: usize) -> Scalar {
        let mut s = Scalar::default();
        for c in 0..self.channels() {
            s[c] = self.get(x, y, c);
        }
        s
    }

    /// Iterate `(x, y, channel, value)` in row-major order.
    fn elements(&self) -> ElementIter<'_, Self>
    where
        Self: Sized,
    {
        ElementIter { buf: self, x: 0, y: 0, c: 0 }
    }

    /// Copy into a new tightly packed `Mat`.
    fn to_mat(&self) -> Mat {
        let mut out = Mat::new(self.size(), self.elem_type());
        for y in 0..self.height() {
            out.row_bytes_mut(y).copy_from_slice(self.row_bytes(y));
        }
        out
    }

    /// Borrow a sub-rectangle.
    ///
    /// # Panics
    /// Panics if `rect` extends beyond this buffer.
    fn roi(&self, rect: Rect) -> MatView<'_> {
        check_rect(self.size(), rect);
        let offset = if rect.width == 0 || rect.height == 0 {
            self.offset()
        } else {
            self.byte_index(rect.x, rect.y, 0)
        };
        MatView {
            data: self.bytes(),
            size: rect.size(),
            elem: self.elem_type(),
            step: self.step(),
            offset,
        }
    }
}

/// Write access shared by `Mat` and `MatViewMut`.
pub trait BufferMut: Buffer {
    fn bytes_mut(&mut self) -> &mut [u8];

    /// Store `v` into channel `c` of element (x, y), saturating to the
    /// buffer's depth.
    #[inline]
    fn set(&mut self, x: usize, y: usize, c: usize, v: f64) {
        let i = self.byte_index(x, y, c);
        let depth = self.depth();
        let n = depth.size_bytes();
        write_from_f64(depth, &mut self.bytes_mut()[i..i + n], v);
    }

    /// Typed write.
    ///
    /// # Panics
    /// Panics if `T` does not match the buffer's depth.
    #[inline]
    fn set_at<T: Element>(&mut self, x: usize, y: usize, c: usize, v: T) {
        assert_eq!(T::DEPTH, self.depth(), "typed access with wrong element kind");
        let i = self.byte_index(x, y, c);
        self.bytes_mut()[i..i + std::mem::size_of::<T>()].copy_from_slice(bytemuck::bytes_of(&v));
    }

    /// Write every channel of element (x, y) from `s`.
    fn set_scalar(&mut self, x: usize, y: usize, s: Scalar) {
        for c in 0..self.channels() {
            self.set(x, y, c, s[c]);
        }
    }

    /// Fill every element with `s`.
    fn fill(&mut self, s: Scalar) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set_scalar(x, y, s);
            }
        }
    }

    fn row_bytes_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height(), "row {y} out of bounds (height {})", self.height());
        let start = self.offset() + y * self.step();
        let len = self.row_size();
        &mut self.bytes_mut()[start..start + len]
    }

    /// Copy all elements of `src` (same size and type) row by row.
    ///
    /// # Panics
    /// Panics on size or type mismatch.
    fn copy_from<B: Buffer + ?Sized>(&mut self, src: &B) {
        assert!(
            src.size() == self.size() && src.elem_type() == self.elem_type(),
            "copy_from: {} {} into {} {}",
            src.size(),
            src.elem_type(),
            self.size(),
            self.elem_type(),
        );
        for y in 0..self.height() {
            self.row_bytes_mut(y).copy_from_slice(src.row_bytes(y));
        }
    }
}

fn check_rect(size: Size, rect: Rect) {
    assert!(
        rect.x + rect.width <= size.width && rect.y + rect.height <= size.height,
        "roi ({},{},{},{}) exceeds buffer bounds {size}",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
    );
}

/// Iterator over `(x, y, channel, value)`; see [`Buffer::elements`].
pub struct ElementIter<'a, B: Buffer> {
    buf: &'a B,
    x: usize,
    y: usize,
    c: usize,
}

impl<'a, B: Buffer> Iterator for ElementIter<'a, B> {
    type Item = (usize, usize, usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.buf.height() || self.buf.width() == 0 {
            return None;
        }
        let item = (self.x, self.y, self.c, self.buf.get(self.x, self.y, self.c));
        self.c += 1;
        if self.c == self.buf.channels() {
            self.c = 0;
            self.x += 1;
            if self.x == self.buf.width() {
                self.x = 0;
                self.y += 1;
            }
        }
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Mat
// ---------------------------------------------------------------------------

/// An owned 2D buffer with runtime element type and explicit step/offset.
#[derive(Clone)]
pub struct Mat {
    data: Vec<u8>,
    size: Size,
    elem: ElemType,
    step: usize,
    offset: usize,
}

impl Mat {
    /// Zero-initialized, tightly packed buffer.
    pub fn new(size: Size, elem: ElemType) -> Self {
        let step = size.width * elem.elem_size();
        Mat {
            data: vec![0u8; step * size.height],
            size,
            elem,
            step,
            offset: 0,
        }
    }

    /// Tightly packed buffer filled with `s`.
    pub fn with_value(size: Size, elem: ElemType, s: Scalar) -> Self {
        let mut m = Mat::new(size, elem);
        m.fill(s);
        m
    }

    /// Wrap an existing backing allocation.
    ///
    /// # Panics
    /// Panics if `step` is smaller than a row or the described region does
    /// not fit inside `data`.
    pub fn from_parts(data: Vec<u8>, size: Size, elem: ElemType, step: usize, offset: usize) -> Self {
        let row = size.width * elem.elem_size();
        assert!(step >= row, "step ({step}) must be >= row size ({row})");
        if size.area() > 0 {
            let end = offset + (size.height - 1) * step + row;
            assert!(
                end <= data.len(),
                "layout needs {end} bytes but backing has {}",
                data.len()
            );
        }
        Mat { data, size, elem, step, offset }
    }

    /// Tightly packed buffer from interleaved typed values.
    ///
    /// # Panics
    /// Panics if `values.len() != width * height * channels`.
    pub fn from_slice<T: Element>(size: Size, channels: usize, values: &[T]) -> Self {
        let elem = ElemType::new(T::DEPTH, channels);
        assert_eq!(
            values.len(),
            size.area() * channels,
            "value count ({}) must equal width * height * channels ({})",
            values.len(),
            size.area() * channels,
        );
        let data = bytemuck::cast_slice::<T, u8>(values).to_vec();
        Mat::from_parts(data, size, elem, size.width * elem.elem_size(), 0)
    }

    /// Copy converted to another depth (saturating). Channel count is kept.
    pub fn convert_to(&self, depth: Depth) -> Mat {
        let mut out = Mat::new(self.size, ElemType::new(depth, self.elem.channels()));
        for (x, y, c, v) in self.elements() {
            out.set(x, y, c, v);
        }
        out
    }

    /// Mutable sub-rectangle; writes land in this buffer.
    ///
    /// # Panics
    /// Panics if `rect` extends beyond this buffer.
    pub fn roi_mut(&mut self, rect: Rect) -> MatViewMut<'_> {
        check_rect(self.size, rect);
        let offset = if rect.width == 0 || rect.height == 0 {
            self.offset
        } else {
            self.byte_index(rect.x, rect.y, 0)
        };
        MatViewMut {
            size: rect.size(),
            elem: self.elem,
            step: self.step,
            offset,
            data: &mut self.data,
        }
    }

    /// Total bytes of the backing allocation.
    pub fn buffer_len(&self) -> usize {
        self.data.len()
    }

    /// Consume and return the backing bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Buffer for Mat {
    fn size(&self) -> Size {
        self.size
    }
    fn elem_type(&self) -> ElemType {
        self.elem
    }
    fn step(&self) -> usize {
        self.step
    }
    fn offset(&self) -> usize {
        self.offset
    }
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl BufferMut for Mat {
    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// Small buffers print their contents, which makes assertion failures in
// tests readable.
fn debug_contents<B: Buffer>(b: &B, kind: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
        f,
        "{kind} {{ {} {}, step={}, offset={} }}",
        b.size(),
        b.elem_type(),
        b.step(),
        b.offset()
    )?;
    for y in 0..b.height().min(8) {
        write!(f, "  row {y}: [")?;
        for x in 0..b.width().min(8) {
            if x > 0 {
                write!(f, ", ")?;
            }
            if b.channels() == 1 {
                write!(f, "{}", b.get(x, y, 0))?;
            } else {
                let s = b.get_scalar(x, y);
                write!(f, "{:?}", &s.0[..b.channels()])?;
            }
        }
        if b.width() > 8 {
            write!(f, ", ...")?;
        }
        writeln!(f, "]")?;
    }
    if b.height() > 8 {
        writeln!(f, "  ...")?;
    }
    Ok(())
}

impl fmt::Debug for Mat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_contents(self, "Mat", f)
    }
}

// ---------------------------------------------------------------------------
// MatView / MatViewMut — borrowed sub-regions
// ---------------------------------------------------------------------------

/// Read-only borrowed view into a rectangular region of a buffer.
///
/// The lifetime ties the view to the parent's borrow: the parent cannot be
/// dropped or mutated while the view exists.
#[derive(Clone, Copy)]
pub struct MatView<'a> {
    data: &'a [u8],
    size: Size,
    elem: ElemType,
    step: usize,
    offset: usize,
}

impl<'a> Buffer for MatView<'a> {
    fn size(&self) -> Size {
        self.size
    }
    fn elem_type(&self) -> ElemType {
        self.elem
    }
    fn step(&self) -> usize {
        self.step
    }
    fn offset(&self) -> usize {
        self.offset
    }
    fn bytes(&self) -> &[u8] {
        self.data
    }
}

impl<'a> fmt::Debug for MatView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_contents(self, "MatView", f)
    }
}

/// Mutable borrowed view. Writes go to the parent's storage.
pub struct MatViewMut<'a> {
    data: &'a mut [u8],
    size: Size,
    elem: ElemType,
    step: usize,
    offset: usize,
}

impl<'a> Buffer for MatViewMut<'a> {
    fn size(&self) -> Size {
        self.size
    }
    fn elem_type(&self) -> ElemType {
        self.elem
    }
    fn step(&self) -> usize {
        self.step
    }
    fn offset(&self) -> usize {
        self.offset
    }
    fn bytes(&self) -> &[u8] {
        &*self.data
    }
}

impl<'a> BufferMut for MatViewMut<'a> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }
}

impl<'a> fmt::Debug for MatViewMut<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_contents(self, "MatViewMut", f)
    }
}
