//! tg build engine
//!
//! Turns `TARGETS` declaration files scattered over a source tree into a
//! dependency-ordered build plan and a `build.ninja` that builds it.
//!
//! # Example
//!
//! ```no_run
//! use tg_build::{BuildPlan, SrcFs, TargetCache, TargetRef};
//!
//! let src_fs = SrcFs::new("/home/me/tg/src")?;
//! let mut cache = TargetCache::new(src_fs);
//! let requested = [TargetRef::parse("//app:main")?];
//! let plan = BuildPlan::resolve(&mut cache, &requested)?;
//! for target_ref in plan.refs() {
//!     println!("{target_ref}");
//! }
//! # Ok::<(), tg_build::BuildError>(())
//! ```

pub mod build_order;
pub mod cache;
pub mod declaration;
pub mod error;
pub mod loader;
pub mod ninja;
pub mod path;
pub mod patterns;
pub mod registry;
pub mod src_fs;
pub mod target_ref;
pub mod targets;

pub use build_order::{collapse_last_occurrence, BuildPlan, PlanEntry};
pub use cache::TargetCache;
pub use declaration::{parse_declarations, Invocation, Value, TARGETS_FILE};
pub use error::{BuildError, BuildResult};
pub use loader::{load_targets, TargetMap};
pub use ninja::{is_signature_current, make_build_ninja, make_signature, Toolchain};
pub use patterns::{resolve_pattern, resolve_patterns};
pub use registry::{Arguments, TargetBuilder, TargetRegistry};
pub use src_fs::SrcFs;
pub use target_ref::TargetRef;
pub use targets::{Target, TargetKind, TargetSpec};
