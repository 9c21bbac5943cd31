// gpu/buffer.rs — Device-resident buffers with preserved host layout.
//
// A `DeviceMat` is the device-side twin of a host `Mat`: the same size,
// element type, step and origin offset, stored in one wgpu storage buffer.
//
// THE LAYOUT-PRESERVATION RULE
// ─────────────────────────────
// An ROI-style host buffer looks like this (step > row size, offset > 0):
//
//   host backing:   [margin ...][row 0 ....][pad][row 1 ....][pad] ...
//   device buffer:  [margin ...][row 0 ....][pad][row 1 ....][pad] ... [align]
//
// The ENTIRE backing allocation is uploaded byte for byte, so a kernel
// receives exactly the step/offset the test asked for. Compacting rows on
// upload would hide the stride bugs ROI tests exist to catch.
//
// The only change is a tail of zero bytes: wgpu buffer sizes and copy
// ranges must be multiples of COPY_BUFFER_ALIGNMENT (4). The tail lies
// past the last logical row and is never part of a comparison.
//
// READBACK
// ────────
// `download` copies into a MAP_READ buffer, maps it and blocks with
// `device.poll(Maintain::Wait)`. Expensive and synchronous; test-only.

use wgpu::util::DeviceExt;

use crate::error::Result;
use crate::factory::{load_mat, Layout};
use crate::gpu::device::{GpuDevice, GpuError};
use crate::mat::{Buffer, ElemType, Mat, Size};
use crate::random::SampleGenerator;

/// wgpu requires buffer sizes and copy ranges to be multiples of this.
const COPY_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// A 2D buffer in device memory, laid out like its host counterpart.
pub struct DeviceMat {
    /// STORAGE | COPY_SRC | COPY_DST. Bind directly to compute pipelines.
    pub buffer: wgpu::Buffer,
    size: Size,
    elem: ElemType,
    step: usize,
    offset: usize,
    /// Backing bytes before alignment padding.
    byte_len: usize,
}

impl DeviceMat {
    /// Allocate a zero-filled device buffer under the factory's layout
    /// policy (`use_roi` = padded rows and a non-zero origin).
    pub fn create(gpu: &GpuDevice, gen: &mut SampleGenerator, size: Size, elem: ElemType, use_roi: bool) -> Result<Self> {
        let layout = Layout::choose(gen, size, use_roi);
        let byte_len = layout.byte_len(elem);
        let padded = check_size(gpu, byte_len)?;

        // wgpu zero-initialises new buffers.
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DeviceMat"),
            size: padded,
            usage: usage(),
            mapped_at_creation: false,
        });
        log::trace!("DeviceMat::create {size} {elem}: {layout:?}");

        Ok(DeviceMat {
            buffer,
            size,
            elem,
            step: layout.step(elem),
            offset: layout.offset(elem),
            byte_len,
        })
    }

    /// Upload `host` under the factory's layout policy. Values, size and
    /// type are preserved; the layout is chosen afresh from `use_roi`.
    pub fn load<B: Buffer>(gpu: &GpuDevice, gen: &mut SampleGenerator, host: &B, use_roi: bool) -> Result<Self> {
        let staged = load_mat(gen, host, use_roi);
        Self::upload(gpu, &staged)
    }

    /// Upload `host` with its own layout, backing allocation included.
    pub fn upload(gpu: &GpuDevice, host: &Mat) -> Result<Self> {
        let byte_len = host.buffer_len();
        let padded = check_size(gpu, byte_len)? as usize;

        let mut contents = Vec::with_capacity(padded);
        contents.extend_from_slice(host.bytes());
        contents.resize(padded, 0);

        let buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("DeviceMat"),
            contents: &contents,
            usage: usage(),
        });

        Ok(DeviceMat {
            buffer,
            size: host.size(),
            elem: host.elem_type(),
            step: host.step(),
            offset: host.offset(),
            byte_len,
        })
    }

    /// Read back into a host `Mat` with the same size, type, step and
    /// offset as this buffer.
    pub fn download(&self, gpu: &GpuDevice) -> Result<Mat> {
        let padded = self.buffer.size();
        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DeviceMat::readback"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("DeviceMat::download"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &readback, 0, padded);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        receiver.recv().map_err(|_| GpuError::ReadbackLost)?.map_err(GpuError::from)?;

        let data = {
            let mapped = slice.get_mapped_range();
            mapped[..self.byte_len].to_vec()
        };
        readback.unmap();

        Ok(Mat::from_parts(data, self.size, self.elem, self.step, self.offset))
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn elem_type(&self) -> ElemType {
        self.elem
    }

    /// Bytes between rows.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Byte position of element (0, 0) inside `buffer`.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Tightly packed host copy of `d`, ready for the comparison functions.
pub fn get_mat(gpu: &GpuDevice, d: &DeviceMat) -> Result<Mat> {
    Ok(d.download(gpu)?.to_mat())
}

fn usage() -> wgpu::BufferUsages {
    wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST
}

/// Padded size for `byte_len`, or `BufferTooLarge` past the device limit.
fn check_size(gpu: &GpuDevice, byte_len: usize) -> std::result::Result<u64, GpuError> {
    let padded = padded_len(byte_len as u64);
    let max = gpu.max_buffer_size();
    if padded > max {
        return Err(GpuError::BufferTooLarge { bytes: padded, max });
    }
    Ok(padded)
}

/// Round up to `COPY_ALIGNMENT`. Empty buffers still get one aligned
/// word, since wgpu rejects zero-sized copies.
#[inline]
pub(crate) fn padded_len(byte_len: u64) -> u64 {
    align_to(byte_len.max(1), COPY_ALIGNMENT)
}

/// Round `value` up to the next multiple of `alignment`.
///
/// Examples:
///   align_to(1, 4)   = 4
///   align_to(4, 4)   = 4
///   align_to(257, 256) = 512
#[inline]
pub(crate) fn align_to(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) / alignment * alignment
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
