//! Scene graph to declarative component source.
//!
//! [`generate`] validates a [`Scene`], walks it once, and emits a single
//! source unit: imports, optional type descriptors, the default context,
//! the node tree, control descriptors and the host scaffold.

pub mod assembly;
pub mod context;
pub mod controls;
pub mod dialect;
pub mod emitter;
pub mod naming;
pub mod numeric;
pub mod options;
pub mod progress;
pub mod scene;
pub mod types_emit;
pub mod validate;
pub mod walker;

pub use assembly::{GeneratedUnit, Generator, generate};
pub use context::ContextValue;
pub use dialect::{Dialect, ReactThreeFiber};
pub use options::GenerateOptions;
pub use scene::{Scene, load_scene_from_path};
pub use validate::SceneError;
