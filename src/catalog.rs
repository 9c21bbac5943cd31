// catalog.rs — Device discovery and capability queries.
//
// The catalog is the ordered list of devices a test session parameterizes
// over. It is filled either index by index (`load`) or in bulk
// (`load_all`), and never holds the same device twice.
//
// Discovery is behind the `DeviceSource` trait:
//
//   WgpuDeviceSource    (gpu::device)  real adapters via wgpu
//   StaticDeviceSource  (here)         a fixed list, for machines without
//                                      a GPU and for the harness's own tests
//
// A capability is usable only when BOTH the device reports it AND this
// build was compiled with support for it (cargo features `shader-f64`,
// `shader-f16`, ...). Either one missing means "unsupported": test cases
// that need the capability are skipped, never failed.

use std::fmt;

use bitflags::bitflags;

use crate::config::DeviceSelection;
use crate::error::{Error, Result};

bitflags! {
    /// Optional device capabilities a test case may depend on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FeatureSet: u32 {
        /// 64-bit float arithmetic in shaders.
        const NATIVE_DOUBLE   = 1 << 0;
        /// 16-bit float arithmetic in shaders.
        const NATIVE_HALF     = 1 << 1;
        /// 64-bit integer arithmetic in shaders.
        const NATIVE_INT64    = 1 << 2;
        /// Subgroup (warp/wave) operations.
        const SUBGROUPS       = 1 << 3;
        /// GPU timestamp queries.
        const TIMESTAMP_QUERY = 1 << 4;
    }
}

impl FeatureSet {
    /// Translate wgpu's feature bits. Bits with no counterpart are dropped.
    pub fn from_wgpu(features: wgpu::Features) -> Self {
        let mut out = FeatureSet::empty();
        for (flag, wgpu_flag) in Self::WGPU_PAIRS {
            if features.contains(wgpu_flag) {
                out |= flag;
            }
        }
        out
    }

    /// The wgpu features to request for this set.
    pub fn to_wgpu(self) -> wgpu::Features {
        let mut out = wgpu::Features::empty();
        for (flag, wgpu_flag) in Self::WGPU_PAIRS {
            if self.contains(flag) {
                out |= wgpu_flag;
            }
        }
        out
    }

    const WGPU_PAIRS: [(FeatureSet, wgpu::Features); 5] = [
        (FeatureSet::NATIVE_DOUBLE, wgpu::Features::SHADER_F64),
        (FeatureSet::NATIVE_HALF, wgpu::Features::SHADER_F16),
        (FeatureSet::NATIVE_INT64, wgpu::Features::SHADER_INT64),
        (FeatureSet::SUBGROUPS, wgpu::Features::SUBGROUP),
        (FeatureSet::TIMESTAMP_QUERY, wgpu::Features::TIMESTAMP_QUERY),
    ];
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|"))
    }
}

/// Capabilities compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTargets(FeatureSet);

impl BuildTargets {
    /// Derived from the enabled cargo features.
    pub fn current() -> Self {
        let mut set = FeatureSet::empty();
        set.set(FeatureSet::NATIVE_DOUBLE, cfg!(feature = "shader-f64"));
        set.set(FeatureSet::NATIVE_HALF, cfg!(feature = "shader-f16"));
        set.set(FeatureSet::NATIVE_INT64, cfg!(feature = "shader-int64"));
        set.set(FeatureSet::SUBGROUPS, cfg!(feature = "subgroups"));
        set.set(FeatureSet::TIMESTAMP_QUERY, cfg!(feature = "timestamp-query"));
        BuildTargets(set)
    }

    /// Explicit set, for simulating a reduced build.
    pub fn new(set: FeatureSet) -> Self {
        BuildTargets(set)
    }

    pub fn features(&self) -> FeatureSet {
        self.0
    }

    /// True iff both the build and `info` support every flag in `feature`.
    pub fn supports(&self, info: &DeviceInfo, feature: FeatureSet) -> bool {
        self.0.contains(feature) && info.features.contains(feature)
    }
}

/// Limits worth knowing when sizing test buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_buffer_size: u64,
    pub max_storage_buffer_binding_size: u32,
    pub max_compute_invocations_per_workgroup: u32,
}

impl From<&wgpu::Limits> for DeviceLimits {
    fn from(l: &wgpu::Limits) -> Self {
        DeviceLimits {
            max_buffer_size: l.max_buffer_size,
            max_storage_buffer_binding_size: l.max_storage_buffer_binding_size,
            max_compute_invocations_per_workgroup: l.max_compute_invocations_per_workgroup,
        }
    }
}

impl Default for DeviceLimits {
    fn default() -> Self {
        DeviceLimits::from(&wgpu::Limits::default())
    }
}

/// One physically present device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Enumeration index; the value passed to `DeviceCatalog::load`.
    pub id: usize,
    pub name: String,
    pub vendor: u32,
    pub device: u32,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
    pub features: FeatureSet,
    pub limits: DeviceLimits,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({:?}, {:?})", self.id, self.name, self.backend, self.device_type)
    }
}

/// Something that can enumerate devices.
pub trait DeviceSource {
    /// Number of physically present devices.
    fn device_count(&self) -> usize;

    /// Descriptor of device `index`, or `None` if `index >= device_count()`.
    fn describe(&self, index: usize) -> Option<DeviceInfo>;
}

/// A fixed device list. `id`s are rewritten to the list position.
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceSource {
    devices: Vec<DeviceInfo>,
}

impl StaticDeviceSource {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        let devices = devices
            .into_iter()
            .enumerate()
            .map(|(i, mut d)| {
                d.id = i;
                d
            })
            .collect();
        StaticDeviceSource { devices }
    }
}

impl DeviceSource for StaticDeviceSource {
    fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn describe(&self, index: usize) -> Option<DeviceInfo> {
        self.devices.get(index).cloned()
    }
}

/// Ordered, duplicate-free list of devices under test.
pub struct DeviceCatalog {
    source: Box<dyn DeviceSource>,
    devices: Vec<DeviceInfo>,
    build: BuildTargets,
}

impl DeviceCatalog {
    /// Empty catalog over `source`, with this build's capabilities.
    pub fn new(source: impl DeviceSource + 'static) -> Self {
        DeviceCatalog {
            source: Box::new(source),
            devices: Vec::new(),
            build: BuildTargets::current(),
        }
    }

    /// Replace the build capabilities used by [`supports`](Self::supports).
    pub fn with_build_targets(mut self, build: BuildTargets) -> Self {
        self.build = build;
        self
    }

    /// Number of physically present devices (loaded or not).
    pub fn device_count(&self) -> usize {
        self.source.device_count()
    }

    /// Append device `index`. Loading an index that is already present
    /// leaves the catalog unchanged.
    ///
    /// # Errors
    /// `Error::OutOfRange` if `index >= device_count()`.
    pub fn load(&mut self, index: usize) -> Result<()> {
        let available = self.source.device_count();
        if index >= available {
            return Err(Error::OutOfRange { index, available });
        }
        if self.devices.iter().any(|d| d.id == index) {
            log::debug!("device {index} already in catalog");
            return Ok(());
        }
        let info = self
            .source
            .describe(index)
            .ok_or(Error::OutOfRange { index, available })?;
        log::info!("catalog: added {info} [{}]", info.features);
        self.devices.push(info);
        Ok(())
    }

    /// Append every present device in enumeration order.
    pub fn load_all(&mut self) -> Result<()> {
        for i in 0..self.source.device_count() {
            self.load(i)?;
        }
        Ok(())
    }

    /// Populate from a configured selection.
    pub fn load_from_selection(&mut self, selection: &DeviceSelection) -> Result<()> {
        match selection {
            DeviceSelection::All => self.load_all(),
            DeviceSelection::Indices(indices) => {
                for &i in indices {
                    self.load(i)?;
                }
                Ok(())
            }
        }
    }

    /// Loaded devices, in load order.
    pub fn values(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn build_targets(&self) -> BuildTargets {
        self.build
    }

    /// Capability check against this catalog's build targets.
    pub fn supports(&self, info: &DeviceInfo, feature: FeatureSet) -> bool {
        self.build.supports(info, feature)
    }
}

/// True iff `info` reports `feature` and this build supports it.
pub fn support_feature(info: &DeviceInfo, feature: FeatureSet) -> bool {
    BuildTargets::current().supports(info, feature)
}

/// `Ok` if [`support_feature`] holds, otherwise the skip signal
/// `Error::UnsupportedFeature`.
pub fn require_feature(info: &DeviceInfo, feature: FeatureSet) -> Result<()> {
    if support_feature(info, feature) {
        Ok(())
    } else {
        Err(Error::UnsupportedFeature {
            device: info.name.clone(),
            feature: feature.to_string(),
        })
    }
}

/// Human-readable summary of `devices`, one block per device.
pub fn device_info_report(devices: &[DeviceInfo]) -> String {
    let build = BuildTargets::current();
    let mut out = format!("{} device(s), build supports [{}]\n", devices.len(), build.features());
    for d in devices {
        out += &format!(
            "  {d}\n    vendor {:#06x} device {:#06x}\n    features [{}]\n    \
             max buffer {} B, max storage binding {} B, max invocations/workgroup {}\n",
            d.vendor,
            d.device,
            d.features,
            d.limits.max_buffer_size,
            d.limits.max_storage_buffer_binding_size,
            d.limits.max_compute_invocations_per_workgroup,
        );
    }
    out
}

/// Print [`device_info_report`] to stdout.
pub fn print_device_info(devices: &[DeviceInfo]) {
    print!("{}", device_info_report(devices));
}
