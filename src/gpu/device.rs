// gpu/device.rs — wgpu adapter enumeration and logical device creation.
//
// Responsibilities:
//   - `WgpuDeviceSource`: enumerate adapters and describe each one as a
//     catalog `DeviceInfo` (name, ids, type, backend, features, limits).
//   - `GpuDevice::open`: create a device + queue on a catalog entry's
//     adapter, requesting exactly the optional features that both the
//     adapter and this build support.
//   - `DeviceProfile`: optionally request *lower* limits than the hardware
//     has, so buffers that would not fit on a small target fail on the dev
//     machine too.
//
// ADAPTER ORDER:
// The catalog identifies devices by enumeration index. `GpuDevice::open`
// creates its own instance and enumerates again; wgpu returns adapters in
// driver order, which is stable within a process. The adapter name is
// checked against the catalog entry anyway, and a mismatch is an error
// rather than a silent test on the wrong device.
//
// NON-CONFORMANT ADAPTERS:
// Microsoft's dzn (D3D12-to-Vulkan on WSL2) declares itself non-conformant
// and wgpu hides such adapters by default.
// ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER lists them anyway; a test harness
// wants to see every device that might run a kernel.

use std::fmt;

use thiserror::Error;

use crate::catalog::{BuildTargets, DeviceInfo, DeviceLimits, DeviceSource, FeatureSet};

/// Hardware profile controlling the limits requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceProfile {
    /// The adapter's default limits.
    #[default]
    Native,
    /// Raspberry Pi 4/5 (VideoCore VI/VII, V3DV Vulkan) limits.
    RaspberryPi,
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceProfile::Native => write!(f, "Native"),
            DeviceProfile::RaspberryPi => write!(f, "RaspberryPi (simulated limits)"),
        }
    }
}

fn instance_flags() -> wgpu::InstanceFlags {
    if cfg!(debug_assertions) {
        wgpu::InstanceFlags::VALIDATION | wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
    } else {
        wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
    }
}

fn new_instance(backends: wgpu::Backends) -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        flags: instance_flags(),
        ..Default::default()
    })
}

fn describe_adapter(index: usize, adapter: &wgpu::Adapter) -> DeviceInfo {
    let info = adapter.get_info();
    DeviceInfo {
        id: index,
        name: info.name,
        vendor: info.vendor,
        device: info.device,
        device_type: info.device_type,
        backend: info.backend,
        features: FeatureSet::from_wgpu(adapter.features()),
        limits: DeviceLimits::from(&adapter.limits()),
    }
}

/// Real adapters, enumerated once at construction.
///
/// # Field drop order
/// `adapters` is declared before `_instance` so the adapters are released
/// while the instance is still alive.
pub struct WgpuDeviceSource {
    adapters: Vec<wgpu::Adapter>,
    _instance: wgpu::Instance,
}

impl WgpuDeviceSource {
    /// Enumerate Vulkan adapters.
    pub fn new() -> Self {
        Self::with_backends(wgpu::Backends::VULKAN)
    }

    /// Enumerate adapters on the given backends.
    pub fn with_backends(backends: wgpu::Backends) -> Self {
        let instance = new_instance(backends);
        let adapters = instance.enumerate_adapters(backends);
        for (i, a) in adapters.iter().enumerate() {
            let info = a.get_info();
            log::debug!("adapter {i}: {} ({:?}, {:?})", info.name, info.backend, info.device_type);
        }
        if adapters.is_empty() {
            log::warn!("no GPU adapters found on {backends:?}");
        }
        WgpuDeviceSource { adapters, _instance: instance }
    }
}

impl Default for WgpuDeviceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSource for WgpuDeviceSource {
    fn device_count(&self) -> usize {
        self.adapters.len()
    }

    fn describe(&self, index: usize) -> Option<DeviceInfo> {
        self.adapters.get(index).map(|a| describe_adapter(index, a))
    }
}

/// An open logical device on one catalog entry.
///
/// # Field drop order
/// Rust drops fields top to bottom. `_instance` is last so the
/// `wgpu::Instance` outlives `device` and `queue`; dzn on WSL2 crashes when
/// the Vulkan instance goes first.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub profile: DeviceProfile,
    pub info: DeviceInfo,
    /// Optional features actually enabled on `device`.
    pub enabled: FeatureSet,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Open the device described by `info` (a catalog entry).
    ///
    /// # Errors
    /// `AdapterNotFound` if the adapter at `info.id` is gone or is a
    /// different device; `DeviceRequest` if the driver refuses.
    pub fn open(info: &DeviceInfo, profile: DeviceProfile) -> Result<Self, GpuError> {
        pollster::block_on(Self::open_async(info, profile, BuildTargets::current()))
    }

    async fn open_async(info: &DeviceInfo, profile: DeviceProfile, build: BuildTargets) -> Result<Self, GpuError> {
        let backends = wgpu::Backends::from(info.backend);
        let instance = new_instance(backends);
        let adapter = instance
            .enumerate_adapters(backends)
            .into_iter()
            .nth(info.id)
            .filter(|a| a.get_info().name == info.name)
            .ok_or_else(|| GpuError::AdapterNotFound { id: info.id, name: info.name.clone() })?;

        // Auto-detect the Pi when the caller passed Native but the adapter is V3D.
        let profile = match profile {
            DeviceProfile::Native if info.name.to_ascii_lowercase().contains("v3d") => {
                log::info!("V3D adapter detected, using RaspberryPi profile");
                DeviceProfile::RaspberryPi
            }
            other => other,
        };

        let enabled = FeatureSet::all()
            .iter()
            .filter(|&f| build.supports(info, f))
            .fold(FeatureSet::empty(), |acc, f| acc | f);

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("gpu-testkit"),
                    required_features: enabled.to_wgpu(),
                    required_limits: limits_for_profile(profile),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        log::info!("opened {info} with {profile} limits, features [{enabled}]");

        Ok(GpuDevice {
            device,
            queue,
            profile,
            info: info.clone(),
            enabled,
            _instance: instance,
        })
    }

    /// Largest buffer this device accepts, as requested at open time.
    pub fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ adapter: {}, profile: {}, features: [{}] }}",
            self.info, self.profile, self.enabled
        )
    }
}

// ============================================================
// Limits helpers
// ============================================================

/// Build wgpu limits for the given profile.
///
/// wgpu validates buffer creation and dispatches against the *requested*
/// limits, so a non-Native profile reproduces the target's failures here.
pub(crate) fn limits_for_profile(profile: DeviceProfile) -> wgpu::Limits {
    match profile {
        DeviceProfile::Native => wgpu::Limits::default(),

        DeviceProfile::RaspberryPi => wgpu::Limits {
            // VideoCore VI/VII: vulkaninfo reports 256 max invocations.
            max_compute_invocations_per_workgroup: 256,
            max_compute_workgroup_size_x: 256,
            max_compute_workgroup_size_y: 256,
            max_compute_workgroup_size_z: 64,
            max_texture_dimension_2d: 4096,
            // 4 GiB shared with the CPU; 128 MiB per buffer is safe.
            max_storage_buffer_binding_size: 128 << 20,
            max_buffer_size: 128 << 20,
            ..wgpu::Limits::default()
        },
    }
}

// ============================================================
// Error type
// ============================================================

/// Errors from device creation and buffer transfer.
#[derive(Debug, Error)]
pub enum GpuError {
    /// The adapter a catalog entry refers to is no longer enumerated at
    /// the same index.
    #[error("adapter #{id} ({name}) not found")]
    AdapterNotFound { id: usize, name: String },

    /// wgpu device request failed (driver issue, unsupported limits, ...).
    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Mapping a readback buffer failed.
    #[error("buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    /// The map callback never reported back.
    #[error("readback channel closed before the map callback ran")]
    ReadbackLost,

    /// A buffer would exceed the device's `max_buffer_size`.
    #[error("buffer of {bytes} bytes exceeds device limit of {max}")]
    BufferTooLarge { bytes: u64, max: u64 },
}

// ============================================================
// Tests
// ============================================================
