// gpu/mod.rs — Device layer.
//
// Everything that touches wgpu lives here: adapter enumeration and
// logical device creation (`device`), and device-resident buffers that
// keep the host layout (`buffer`).
//
// The host side of the harness (`mat`, `factory`, `compare`) never needs a
// GPU. A kernel test uploads its inputs with `DeviceMat::load`, runs the
// kernel, downloads with `get_mat`, and compares on the host against a
// reference computed with the same inputs.

pub mod buffer;
pub mod device;
