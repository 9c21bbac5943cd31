// io.rs — Image assets in and debug images out.
//
// Assets live under `HarnessConfig::test_data` and are addressed by a path
// relative to it. Decoded color images come back in BGR(A) channel order,
// which is the order kernels written against the conventional layout
// expect; `dump_image` swaps back to RGB(A) before encoding, so a dump of a
// loaded asset reproduces the file.

use std::path::PathBuf;

use image::{ColorType, DynamicImage};

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::mat::{Buffer, Depth, ElemType, Mat, Size};

/// How to decode an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Keep the file's own channel count and bit depth (8 or 16 bit).
    Unchanged,
    /// Single-channel 8-bit.
    Grayscale,
    /// Three-channel 8-bit BGR.
    Color,
}

fn asset_path(cfg: &HarnessConfig, name: &str) -> PathBuf {
    cfg.test_data.join(name)
}

/// Decode `name` (relative to the test-data directory).
pub fn read_image(cfg: &HarnessConfig, name: &str, mode: ReadMode) -> Result<Mat> {
    let path = asset_path(cfg, name);
    log::debug!("reading {} ({mode:?})", path.display());
    let img = image::open(&path)?;
    Ok(match mode {
        ReadMode::Grayscale => gray8(&img),
        ReadMode::Color => bgr8(&img),
        ReadMode::Unchanged => unchanged(&img),
    })
}

/// Decode `name` and convert it to `elem`: grayscale for one channel,
/// BGR for three, BGRA for four, then saturate to `elem`'s depth.
///
/// # Errors
/// `InvalidArgument` for two-channel types, which no image format carries.
pub fn read_image_type(cfg: &HarnessConfig, name: &str, elem: ElemType) -> Result<Mat> {
    let path = asset_path(cfg, name);
    let img = image::open(&path)?;
    let m = match elem.channels() {
        1 => gray8(&img),
        3 => bgr8(&img),
        4 => bgra8(&img),
        n => {
            return Err(Error::InvalidArgument(format!(
                "cannot read {} as {n}-channel image",
                path.display()
            )))
        }
    };
    Ok(if elem.depth() == Depth::U8 { m } else { m.convert_to(elem.depth()) })
}

fn gray8(img: &DynamicImage) -> Mat {
    let g = img.to_luma8();
    Mat::from_slice(Size::new(g.width() as usize, g.height() as usize), 1, g.as_raw())
}

fn bgr8(img: &DynamicImage) -> Mat {
    let mut rgb = img.to_rgb8();
    swap_rb(&mut rgb, 3);
    Mat::from_slice(Size::new(rgb.width() as usize, rgb.height() as usize), 3, rgb.as_raw())
}

fn bgra8(img: &DynamicImage) -> Mat {
    let mut rgba = img.to_rgba8();
    swap_rb(&mut rgba, 4);
    Mat::from_slice(Size::new(rgba.width() as usize, rgba.height() as usize), 4, rgba.as_raw())
}

fn unchanged(img: &DynamicImage) -> Mat {
    let size = Size::new(img.width() as usize, img.height() as usize);
    match img.color() {
        ColorType::L8 => gray8(img),
        ColorType::Rgb8 => bgr8(img),
        ColorType::L16 => Mat::from_slice(size, 1, img.to_luma16().as_raw()),
        ColorType::Rgb16 => {
            let mut v = img.to_rgb16().into_raw();
            swap_rb(&mut v, 3);
            Mat::from_slice(size, 3, &v)
        }
        ColorType::Rgba16 => {
            let mut v = img.to_rgba16().into_raw();
            swap_rb(&mut v, 4);
            Mat::from_slice(size, 4, &v)
        }
        // Rgba8, gray + alpha and float formats all land in 8-bit BGRA.
        _ => bgra8(img),
    }
}

fn swap_rb<T>(interleaved: &mut [T], channels: usize) {
    for px in interleaved.chunks_exact_mut(channels) {
        px.swap(0, 2);
    }
}

/// Write an 8-bit 1, 3 or 4 channel buffer as PNG into the dump directory.
/// `.png` is appended when `name` has no extension. Returns the path
/// written.
pub fn dump_image<B: Buffer>(cfg: &HarnessConfig, name: &str, buf: &B) -> Result<PathBuf> {
    let color = match (buf.depth(), buf.channels()) {
        (Depth::U8, 1) => ColorType::L8,
        (Depth::U8, 3) => ColorType::Rgb8,
        (Depth::U8, 4) => ColorType::Rgba8,
        _ => return Err(Error::UnsupportedDump(buf.elem_type())),
    };

    let mut bytes = Vec::with_capacity(buf.row_size() * buf.height());
    for y in 0..buf.height() {
        bytes.extend_from_slice(buf.row_bytes(y));
    }
    if buf.channels() >= 3 {
        swap_rb(&mut bytes, buf.channels());
    }

    std::fs::create_dir_all(&cfg.dump_dir)?;
    let mut path = cfg.dump_dir.join(name);
    if path.extension().is_none() {
        path.set_extension("png");
    }
    image::save_buffer(&path, &bytes, buf.width() as u32, buf.height() as u32, color)?;
    log::info!("dumped {} {} to {}", buf.size(), buf.elem_type(), path.display());
    Ok(path)
}
