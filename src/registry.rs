// registry.rs — Test case registration and execution.
//
// A `TestSession` owns the three pieces of session state:
//
//   config    HarnessConfig (seed, device selection, paths)
//   catalog   DeviceCatalog, populated once from the config
//   registry  TestRegistry, the list of cases to run
//
// Cases are closures `Fn(&mut TestContext) -> Result<()>`. A context gives
// the case read access to the catalog and config, the device it is
// running on (for per-device cases) and its OWN `SampleGenerator`, seeded
// from the session seed. Every case therefore sees the same input stream
// no matter which cases ran before it.
//
// Case ids:
//
//   plain            Name
//   parameterized    Name/<index>               (display: the value)
//   per device       Name [#<id> <device name>]
//
// Outcome of a case:
//   Ok(())                            Passed
//   Err(e) with e.is_skip()           Skipped (capability missing)
//   Err(e) otherwise, or a panic      Failed
//
// `TestContext::open_device` opens the case's device with the configured
// profile, so GPU_TESTKIT_PROFILE applies to every kernel test.
//
// Panics are caught per case with `catch_unwind`; buffers and device
// handles owned by the case are dropped during unwinding.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::catalog::{DeviceCatalog, DeviceInfo, DeviceSource, FeatureSet};
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::gpu::device::{GpuDevice, WgpuDeviceSource};
use crate::random::{SampleGenerator, Seed};

type CaseFn = Box<dyn Fn(&mut TestContext<'_>) -> Result<()> + Send + Sync>;

struct Case {
    id: String,
    display: Option<String>,
    per_device: bool,
    body: CaseFn,
}

/// Per-case view of the session.
pub struct TestContext<'a> {
    catalog: &'a DeviceCatalog,
    config: &'a HarnessConfig,
    device: Option<&'a DeviceInfo>,
    gen: SampleGenerator,
}

impl<'a> TestContext<'a> {
    /// Context with a generator freshly seeded with `seed`.
    pub fn new(catalog: &'a DeviceCatalog, config: &'a HarnessConfig, device: Option<&'a DeviceInfo>, seed: u64) -> Self {
        TestContext {
            catalog,
            config,
            device,
            gen: SampleGenerator::with_seed(Seed::Fixed(seed)),
        }
    }

    /// This case's random stream.
    pub fn gen(&mut self) -> &mut SampleGenerator {
        &mut self.gen
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        self.catalog
    }

    pub fn config(&self) -> &HarnessConfig {
        self.config
    }

    /// The device a per-device case runs on; `None` for plain cases.
    pub fn device(&self) -> Option<&'a DeviceInfo> {
        self.device
    }

    /// Open this case's device with the configured `DeviceProfile`.
    ///
    /// Only per-device cases have a device; a plain case gets
    /// `InvalidArgument`.
    pub fn open_device(&self) -> Result<GpuDevice> {
        let info = self
            .device
            .ok_or_else(|| Error::InvalidArgument("open_device called from a case without a device".into()))?;
        Ok(GpuDevice::open(info, self.config.profile)?)
    }

    /// Skip signal unless the current device and the build support
    /// `feature`. A case without a device never has device features.
    pub fn require(&self, feature: FeatureSet) -> Result<()> {
        match self.device {
            Some(d) if self.catalog.supports(d, feature) => Ok(()),
            Some(d) => Err(Error::UnsupportedFeature {
                device: d.name.clone(),
                feature: feature.to_string(),
            }),
            None => Err(Error::UnsupportedFeature {
                device: "<none>".into(),
                feature: feature.to_string(),
            }),
        }
    }
}

/// What happened to one case.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

/// One executed case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub id: String,
    /// Parameter display, for parameterized cases.
    pub param: Option<String>,
    pub outcome: Outcome,
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(p) = &self.param {
            write!(f, " {p}")?;
        }
        match &self.outcome {
            Outcome::Passed => write!(f, ": ok"),
            Outcome::Failed(msg) => write!(f, ": FAILED: {msg}"),
            Outcome::Skipped(why) => write!(f, ": skipped ({why})"),
        }
    }
}

/// Reports of a whole run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub reports: Vec<CaseReport>,
}

impl Summary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    /// No case failed. Skips do not count against success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, id: &str) -> Option<&CaseReport> {
        self.reports.iter().find(|r| r.id == id)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Ordered collection of cases.
#[derive(Default)]
pub struct TestRegistry {
    cases: Vec<Case>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, id: String, display: Option<String>, per_device: bool, body: CaseFn) {
        assert!(
            !self.cases.iter().any(|c| c.id == id),
            "test case '{id}' registered twice"
        );
        self.cases.push(Case { id, display, per_device, body });
    }

    fn push_params<T, F>(&mut self, name: &str, values: Vec<T>, per_device: bool, f: F)
    where
        T: fmt::Display + Send + Sync + 'static,
        F: Fn(&mut TestContext<'_>, &T) -> Result<()> + Clone + Send + Sync + 'static,
    {
        for (i, value) in values.into_iter().enumerate() {
            let display = value.to_string();
            let f = f.clone();
            let body = move |ctx: &mut TestContext<'_>| f(ctx, &value);
            self.push(format!("{name}/{i}"), Some(display), per_device, Box::new(body));
        }
    }

    /// Register one case.
    ///
    /// # Panics
    /// Panics if `name` is already registered.
    pub fn add<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut TestContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.push(name.to_string(), None, false, Box::new(f));
    }

    /// Register one case per value, with ids `name/0`, `name/1`, ...
    pub fn add_param<T, F>(&mut self, name: &str, values: Vec<T>, f: F)
    where
        T: fmt::Display + Send + Sync + 'static,
        F: Fn(&mut TestContext<'_>, &T) -> Result<()> + Clone + Send + Sync + 'static,
    {
        self.push_params(name, values, false, f);
    }

    /// Register a case that runs once for every device in the catalog.
    pub fn add_for_devices<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut TestContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.push(name.to_string(), None, true, Box::new(f));
    }

    /// Parameterized and per device: every value × every device.
    pub fn add_param_for_devices<T, F>(&mut self, name: &str, values: Vec<T>, f: F)
    where
        T: fmt::Display + Send + Sync + 'static,
        F: Fn(&mut TestContext<'_>, &T) -> Result<()> + Clone + Send + Sync + 'static,
    {
        self.push_params(name, values, true, f);
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Run every case.
    pub fn run(&self, catalog: &DeviceCatalog, config: &HarnessConfig, seed: u64) -> Summary {
        self.run_filtered(catalog, config, seed, "")
    }

    /// Run the cases whose id contains `filter`.
    pub fn run_filtered(&self, catalog: &DeviceCatalog, config: &HarnessConfig, seed: u64, filter: &str) -> Summary {
        let mut summary = Summary::default();
        for case in self.cases.iter().filter(|c| c.id.contains(filter)) {
            if !case.per_device {
                let mut ctx = TestContext::new(catalog, config, None, seed);
                summary.reports.push(run_case(case, case.id.clone(), &mut ctx));
                continue;
            }
            if catalog.is_empty() {
                let report = CaseReport {
                    id: case.id.clone(),
                    param: case.display.clone(),
                    outcome: Outcome::Skipped("no devices in catalog".into()),
                };
                log::info!("{report}");
                summary.reports.push(report);
                continue;
            }
            for device in catalog.values() {
                let id = format!("{} [#{} {}]", case.id, device.id, device.name);
                let mut ctx = TestContext::new(catalog, config, Some(device), seed);
                summary.reports.push(run_case(case, id, &mut ctx));
            }
        }
        log::info!("{summary}");
        summary
    }
}

fn run_case(case: &Case, id: String, ctx: &mut TestContext<'_>) -> CaseReport {
    let result = catch_unwind(AssertUnwindSafe(|| (case.body)(ctx)));
    let outcome = match result {
        Ok(Ok(())) => Outcome::Passed,
        Ok(Err(e)) if e.is_skip() => Outcome::Skipped(e.to_string()),
        Ok(Err(e)) => Outcome::Failed(e.to_string()),
        Err(payload) => Outcome::Failed(panic_message(payload.as_ref())),
    };
    let report = CaseReport { id, param: case.display.clone(), outcome };
    match report.outcome {
        Outcome::Failed(_) => log::warn!("{report}"),
        _ => log::info!("{report}"),
    }
    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Config, catalog and registry for one run.
pub struct TestSession {
    config: HarnessConfig,
    catalog: DeviceCatalog,
    registry: TestRegistry,
    seed: u64,
}

impl TestSession {
    /// Session over real adapters, configured from the environment.
    pub fn from_env() -> Result<Self> {
        let config = HarnessConfig::from_env()?;
        Self::new(config, WgpuDeviceSource::new())
    }

    /// Session over `source`. The catalog is populated from
    /// `config.devices`; the seed is resolved once here.
    pub fn new(config: HarnessConfig, source: impl DeviceSource + 'static) -> Result<Self> {
        let mut catalog = DeviceCatalog::new(source);
        catalog.load_from_selection(&config.devices)?;
        Ok(Self::with_catalog(config, catalog))
    }

    /// Session over an already populated catalog.
    pub fn with_catalog(config: HarnessConfig, catalog: DeviceCatalog) -> Self {
        let seed = config.seed.resolve();
        log::info!(
            "session seed {seed:#x} (replay with {}={seed:#x}), {} device(s)",
            crate::config::ENV_SEED,
            catalog.values().len()
        );
        TestSession {
            config,
            catalog,
            registry: TestRegistry::new(),
            seed,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn registry_mut(&mut self) -> &mut TestRegistry {
        &mut self.registry
    }

    /// The resolved session seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(&self) -> Summary {
        self.registry.run(&self.catalog, &self.config, self.seed)
    }

    pub fn run_filtered(&self, filter: &str) -> Summary {
        self.registry.run_filtered(&self.catalog, &self.config, self.seed, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::fake_device;
    use crate::catalog::StaticDeviceSource;
    use crate::config::DeviceSelection;

    fn session(devices: Vec<DeviceInfo>) -> TestSession {
        TestSession::new(HarnessConfig::default(), StaticDeviceSource::new(devices)).unwrap()
    }

    #[test]
    fn test_outcome_classification() {
        let mut s = session(vec![]);
        let r = s.registry_mut();
        r.add("ok", |_| Ok(()));
        r.add("fails", |_| Err(Error::InvalidArgument("bad".into())));
        r.add("skips", |_| {
            Err(Error::UnsupportedFeature { device: "d".into(), feature: "NATIVE_DOUBLE".into() })
        });
        r.add("panics", |_| panic!("boom"));

        let sum = s.run();
        assert_eq!((sum.passed(), sum.failed(), sum.skipped()), (1, 2, 1));
        assert!(!sum.is_success());
        match &sum.get("panics").unwrap().outcome {
            Outcome::Failed(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_param_ids_and_display() {
        let mut r = TestRegistry::new();
        r.add_param("Case", vec!["a", "b", "c"], |_, _| Ok(()));
        assert_eq!(r.ids(), ["Case/0", "Case/1", "Case/2"]);
        let cat = DeviceCatalog::new(StaticDeviceSource::default());
        let sum = r.run(&cat, &HarnessConfig::default(), 1);
        assert_eq!(sum.reports[2].param.as_deref(), Some("c"));
        assert_eq!(sum.reports[2].to_string(), "Case/2 c: ok");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_id_panics() {
        let mut r = TestRegistry::new();
        r.add("x", |_| Ok(()));
        r.add("x", |_| Ok(()));
    }

    #[test]
    fn test_each_case_gets_fresh_generator() {
        use std::sync::{Arc, Mutex};
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut r = TestRegistry::new();
        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            r.add(name, move |ctx| {
                let v = ctx.gen().random_int(0, 1_000_000);
                seen.lock().unwrap().push(v);
                Ok(())
            });
        }
        let cat = DeviceCatalog::new(StaticDeviceSource::default());
        r.run(&cat, &HarnessConfig::default(), 42);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_per_device_cases_and_require() {
        let mut s = session(vec![
            fake_device("strong", FeatureSet::all()),
            fake_device("weak", FeatureSet::empty()),
        ]);
        s.registry_mut()
            .add_for_devices("needs_f64", |ctx| ctx.require(FeatureSet::NATIVE_DOUBLE));
        let sum = s.run();
        assert_eq!(sum.reports.len(), 2);
        assert_eq!(sum.reports[0].id, "needs_f64 [#0 strong]");
        assert!(matches!(sum.reports[1].outcome, Outcome::Skipped(_)));
        assert!(sum.is_success());
    }

    #[test]
    fn test_per_device_without_devices_skips() {
        let mut s = session(vec![]);
        s.registry_mut().add_param_for_devices("sizes", vec![1, 2], |_, _| Ok(()));
        let sum = s.run();
        assert_eq!(sum.skipped(), 2);
    }

    #[test]
    fn test_filter() {
        let mut s = session(vec![]);
        s.registry_mut().add("Arith.add", |_| Ok(()));
        s.registry_mut().add("Arith.sub", |_| Ok(()));
        s.registry_mut().add("Resize.linear", |_| Ok(()));
        assert_eq!(s.run_filtered("Arith").reports.len(), 2);
    }

    #[test]
    fn test_session_selection_out_of_range() {
        let cfg = HarnessConfig::default().devices(DeviceSelection::Indices(vec![3]));
        let err = TestSession::new(cfg, StaticDeviceSource::default()).err().unwrap();
        assert!(matches!(err, Error::OutOfRange { index: 3, available: 0 }));
    }

    #[test]
    fn test_session_seed_is_resolved_once() {
        let cfg = HarnessConfig::default().seed(Seed::Fixed(77));
        let s = TestSession::new(cfg, StaticDeviceSource::default()).unwrap();
        assert_eq!(s.seed(), 77);
    }

    #[test]
    fn test_open_device_needs_a_device() {
        let mut s = session(vec![]);
        s.registry_mut().add("plain", |ctx| ctx.open_device().map(drop));
        let sum = s.run();
        match &sum.get("plain").unwrap().outcome {
            Outcome::Failed(msg) => assert!(msg.contains("without a device"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    // Runs inside the subprocess started by test_open_device_uses_profile.
    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_open_device_uses_profile() {
        use crate::gpu::device::DeviceProfile;
        use std::sync::{Arc, Mutex};

        let cfg = HarnessConfig::default()
            .devices(DeviceSelection::Indices(vec![0]))
            .profile(DeviceProfile::RaspberryPi);
        let mut s = TestSession::new(cfg, WgpuDeviceSource::new()).expect("adapter 0");
        let opened = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&opened);
        s.registry_mut().add_for_devices("open", move |ctx| {
            let gpu = ctx.open_device()?;
            *sink.lock().unwrap() = Some(gpu.profile);
            Ok(())
        });
        assert!(s.run().is_success());
        assert_eq!(*opened.lock().unwrap(), Some(DeviceProfile::RaspberryPi));
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "requires a real Vulkan GPU"]
    fn test_open_device_uses_profile() {
        let out = crate::gpu::device::tests::run_gpu_test_in_subprocess(
            "registry::tests::inner_open_device_uses_profile",
        );
        assert!(out.contains("GPU_TEST_OK"), "inner test did not print GPU_TEST_OK:\n{out}");
    }
}
