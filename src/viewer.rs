// viewer.rs — Side-by-side gold / actual / difference display.
//
// When a comparison fails on a large image, the coordinate of the first
// bad element says little about the shape of the error. `show_diff` opens
// a window with three panels:
//
//   ┌────────┬────────┬────────┐
//   │  gold  │ actual │  diff  │   diff: white where any channel
//   └────────┴────────┴────────┘         differs by more than eps
//
// Panels are normalized independently to the full 0..255 range, so float
// buffers and 16-bit buffers display as well as 8-bit ones. Channels are
// interpreted as BGR(A).
//
// Frame composition (`diff_frame`) is always available and is what the
// tests exercise. Only the window itself needs the `viewer` cargo feature
// (minifb).

use crate::compare::diff_mask;
use crate::error::Result;
use crate::mat::Buffer;

/// Gap between panels, in pixels.
const SEPARATOR: usize = 2;
const SEPARATOR_COLOR: u32 = 0x0040_4040;

/// A packed 0RGB framebuffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub pixels: Vec<u32>,
    pub width: usize,
    pub height: usize,
}

/// Compose the three-panel frame for `gold` vs `actual`.
pub fn diff_frame<A: Buffer, B: Buffer>(gold: &A, actual: &B, eps: f64) -> Result<Frame> {
    let mask = diff_mask(gold, actual, eps)?;
    let (w, h) = (gold.width(), gold.height());
    let width = 3 * w + 2 * SEPARATOR;
    let mut pixels = vec![SEPARATOR_COLOR; width * h];

    blit(&mut pixels, width, 0, gold);
    blit(&mut pixels, width, w + SEPARATOR, actual);
    blit(&mut pixels, width, 2 * (w + SEPARATOR), &mask);

    Ok(Frame { pixels, width, height: h })
}

fn blit<B: Buffer>(fb: &mut [u32], fb_width: usize, x0: usize, buf: &B) {
    let (lo, hi) = value_range(buf);
    let scale = if hi > lo { 255.0 / (hi - lo) } else { 0.0 };
    let to_u8 = |v: f64| ((v - lo) * scale).round().clamp(0.0, 255.0) as u32;

    for y in 0..buf.height() {
        for x in 0..buf.width() {
            let px = if buf.channels() >= 3 {
                let b = to_u8(buf.get(x, y, 0));
                let g = to_u8(buf.get(x, y, 1));
                let r = to_u8(buf.get(x, y, 2));
                (r << 16) | (g << 8) | b
            } else {
                let c = to_u8(buf.get(x, y, 0));
                (c << 16) | (c << 8) | c
            };
            fb[y * fb_width + x0 + x] = px;
        }
    }
}

/// Finite min and max over the displayed channels. A constant panel maps
/// to black, except an all-255 8-bit panel which stays white.
fn value_range<B: Buffer>(buf: &B) -> (f64, f64) {
    let shown = buf.channels().min(3);
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for y in 0..buf.height() {
        for x in 0..buf.width() {
            for c in 0..shown {
                let v = buf.get(x, y, c);
                if v.is_finite() {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            }
        }
    }
    if !lo.is_finite() {
        return (0.0, 0.0);
    }
    if lo == hi && lo > 0.0 {
        // Constant non-zero panel: show it relative to zero.
        return (0.0, hi);
    }
    (lo, hi)
}

/// Open a window showing [`diff_frame`] until Escape or close.
#[cfg(feature = "viewer")]
pub fn show_diff<A: Buffer, B: Buffer>(gold: &A, actual: &B, eps: f64) -> Result<()> {
    let frame = diff_frame(gold, actual, eps)?;
    let title = format!("gold | actual | diff > {eps}  ({} {})", gold.size(), gold.elem_type());
    let mut window = minifb::Window::new(
        &title,
        frame.width.max(1),
        frame.height.max(1),
        minifb::WindowOptions {
            resize: true,
            scale: minifb::Scale::FitScreen,
            ..Default::default()
        },
    )?;
    window.limit_update_rate(Some(std::time::Duration::from_millis(16)));
    log::info!("diff window open, press Escape or close to continue");

    while window.is_open() && !window.is_key_down(minifb::Key::Escape) {
        window.update_with_buffer(&frame.pixels, frame.width, frame.height)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::{BufferMut, Depth, ElemType, Mat, Scalar, Size};

    #[test]
    fn test_frame_layout() {
        let a = Mat::new(Size::new(4, 3), ElemType::new(Depth::U8, 1));
        let f = diff_frame(&a, &a, 0.0).unwrap();
        assert_eq!(f.width, 3 * 4 + 2 * SEPARATOR);
        assert_eq!(f.height, 3);
        assert_eq!(f.pixels.len(), f.width * f.height);
        // Separator column after the first panel.
        assert_eq!(f.pixels[4], SEPARATOR_COLOR);
    }

    #[test]
    fn test_diff_panel_marks_mismatch() {
        let a = Mat::new(Size::new(2, 1), ElemType::new(Depth::F32, 1));
        let mut b = a.clone();
        b.set(1, 0, 0, 5.0);
        let f = diff_frame(&a, &b, 0.5).unwrap();
        let diff_x0 = 2 * (2 + SEPARATOR);
        assert_eq!(f.pixels[diff_x0], 0);
        assert_eq!(f.pixels[diff_x0 + 1], 0x00FF_FFFF);
    }

    #[test]
    fn test_bgr_panel_colors() {
        let a = Mat::with_value(Size::new(1, 1), ElemType::new(Depth::U8, 3), Scalar::new(0.0, 0.0, 255.0, 0.0));
        let f = diff_frame(&a, &a, 0.0).unwrap();
        // Pure red in BGR order.
        assert_eq!(f.pixels[0], 0x00FF_0000);
    }

    #[test]
    fn test_shape_mismatch_propagates() {
        let a = Mat::new(Size::new(2, 2), ElemType::new(Depth::U8, 1));
        let b = Mat::new(Size::new(3, 2), ElemType::new(Depth::U8, 1));
        assert!(diff_frame(&a, &b, 0.0).is_err());
    }
}
