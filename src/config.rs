// config.rs — Session configuration from the environment.
//
// Variables (all optional):
//
//   GPU_TESTKIT_SEED       integer (decimal or 0x-hex) or "random"
//   GPU_TESTKIT_DEVICES    "all" or comma-separated indices, e.g. "0,2"
//   GPU_TESTKIT_TEST_DATA  directory holding image assets
//   GPU_TESTKIT_DUMP_DIR   where dump_image writes
//   GPU_TESTKIT_PROFILE    "native" or "rpi"
//
// Unset means default. A set but malformed value is an error, not a
// silent fallback: a CI job that asks for seed "0x12G" should fail loudly.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::gpu::device::DeviceProfile;
use crate::random::Seed;

pub const ENV_SEED: &str = "GPU_TESTKIT_SEED";
pub const ENV_DEVICES: &str = "GPU_TESTKIT_DEVICES";
pub const ENV_TEST_DATA: &str = "GPU_TESTKIT_TEST_DATA";
pub const ENV_DUMP_DIR: &str = "GPU_TESTKIT_DUMP_DIR";
pub const ENV_PROFILE: &str = "GPU_TESTKIT_PROFILE";

/// Which devices a session runs on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceSelection {
    /// Every present device.
    #[default]
    All,
    /// Exactly these enumeration indices, in this order.
    Indices(Vec<usize>),
}

/// Everything a `TestSession` needs to know up front.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub seed: Seed,
    pub devices: DeviceSelection,
    pub test_data: PathBuf,
    pub dump_dir: PathBuf,
    /// Limits profile used by `TestContext::open_device`.
    pub profile: DeviceProfile,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            seed: Seed::Default,
            devices: DeviceSelection::All,
            test_data: PathBuf::from("testdata"),
            dump_dir: std::env::temp_dir().join("gpu-testkit"),
            profile: DeviceProfile::Native,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by whatever `GPU_TESTKIT_*` variables are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable
    /// source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = HarnessConfig::default();
        if let Some(v) = lookup(ENV_SEED) {
            cfg.seed = parse_seed(&v)?;
        }
        if let Some(v) = lookup(ENV_DEVICES) {
            cfg.devices = parse_devices(&v)?;
        }
        if let Some(v) = lookup(ENV_TEST_DATA) {
            cfg.test_data = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DUMP_DIR) {
            cfg.dump_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_PROFILE) {
            cfg.profile = parse_profile(&v)?;
        }
        log::debug!("harness config: {cfg:?}");
        Ok(cfg)
    }

    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    pub fn devices(mut self, devices: DeviceSelection) -> Self {
        self.devices = devices;
        self
    }

    pub fn test_data(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_data = dir.into();
        self
    }

    pub fn dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = dir.into();
        self
    }

    pub fn profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = profile;
        self
    }
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Error {
    Error::Config {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_seed(v: &str) -> Result<Seed> {
    let t = v.trim();
    if t.eq_ignore_ascii_case("random") {
        return Ok(Seed::Random);
    }
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => t.parse::<u64>(),
    };
    parsed
        .map(Seed::Fixed)
        .map_err(|e| invalid(ENV_SEED, v, format!("expected an integer or \"random\" ({e})")))
}

fn parse_devices(v: &str) -> Result<DeviceSelection> {
    let t = v.trim();
    if t.eq_ignore_ascii_case("all") {
        return Ok(DeviceSelection::All);
    }
    let indices = t
        .split(',')
        .map(|s| s.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid(ENV_DEVICES, v, format!("expected \"all\" or indices like 0,2 ({e})")))?;
    Ok(DeviceSelection::Indices(indices))
}

fn parse_profile(v: &str) -> Result<DeviceProfile> {
    match v.trim().to_ascii_lowercase().as_str() {
        "native" => Ok(DeviceProfile::Native),
        "rpi" | "raspberrypi" => Ok(DeviceProfile::RaspberryPi),
        _ => Err(invalid(ENV_PROFILE, v, "expected \"native\" or \"rpi\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = HarnessConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, HarnessConfig::default());
        assert_eq!(cfg.seed, Seed::Default);
    }

    #[test]
    fn test_parse_all_variables() {
        let cfg = HarnessConfig::from_lookup(lookup(&[
            (ENV_SEED, "0xBEEF"),
            (ENV_DEVICES, " 1, 0 "),
            (ENV_TEST_DATA, "/data/assets"),
            (ENV_DUMP_DIR, "/tmp/dumps"),
            (ENV_PROFILE, "RPi"),
        ]))
        .unwrap();
        assert_eq!(cfg.seed, Seed::Fixed(0xBEEF));
        assert_eq!(cfg.devices, DeviceSelection::Indices(vec![1, 0]));
        assert_eq!(cfg.test_data, PathBuf::from("/data/assets"));
        assert_eq!(cfg.dump_dir, PathBuf::from("/tmp/dumps"));
        assert_eq!(cfg.profile, DeviceProfile::RaspberryPi);
    }

    #[test]
    fn test_random_seed_and_all_devices() {
        let cfg = HarnessConfig::from_lookup(lookup(&[(ENV_SEED, "random"), (ENV_DEVICES, "ALL")])).unwrap();
        assert_eq!(cfg.seed, Seed::Random);
        assert_eq!(cfg.devices, DeviceSelection::All);
    }

    #[test]
    fn test_malformed_values_are_errors() {
        for (k, v) in [(ENV_SEED, "12G"), (ENV_DEVICES, "0,,1"), (ENV_PROFILE, "cray")] {
            let err = HarnessConfig::from_lookup(lookup(&[(k, v)])).unwrap_err();
            match err {
                Error::Config { key, value, .. } => {
                    assert_eq!(key, k);
                    assert_eq!(value, v);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_builder() {
        let cfg = HarnessConfig::default()
            .seed(Seed::Fixed(9))
            .devices(DeviceSelection::Indices(vec![0]))
            .test_data("assets")
            .profile(DeviceProfile::RaspberryPi);
        assert_eq!(cfg.seed, Seed::Fixed(9));
        assert_eq!(cfg.test_data, PathBuf::from("assets"));
        assert_eq!(cfg.profile, DeviceProfile::RaspberryPi);
    }
}
