// gpu-testkit: validation harness for GPU-accelerated image kernels
//
// An accelerated kernel is correct when, for every element type, every
// buffer layout and every device, it agrees with a reference computed on
// the host. This crate supplies the pieces such tests are built from:
//
//   types      the (depth × channels) grid and other parameter lists
//   random     seeded, reproducible sample generation
//   factory    buffers with tight or ROI-style (padded, offset) layouts
//   gpu        device discovery/opening and layout-preserving device buffers
//   catalog    the devices under test and their capabilities
//   compare    tolerance, similarity and reference min/max verdicts
//   keypoints  order-independent keypoint set comparison
//   registry   parameterized case registration, run with pass/fail/skip
//   params     displayable parameter wrappers (flags, codes, tuples)
//   io         image assets in, debug images out
//   viewer     gold / actual / diff display

mod macros;

pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod factory;
pub mod gpu;
pub mod io;
pub mod keypoints;
pub mod mat;
pub mod params;
pub mod random;
pub mod registry;
pub mod types;
pub mod viewer;

pub use catalog::{DeviceCatalog, DeviceInfo, FeatureSet};
pub use error::{Error, Result};
pub use mat::{Buffer, BufferMut, Depth, ElemType, Mat, Point, Point2f, Point3f, Rect, Scalar, Size};
pub use random::SampleGenerator;
