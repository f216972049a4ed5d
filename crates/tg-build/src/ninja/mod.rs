//! Ninja build file output

pub mod emitter;
pub mod writer;

pub use emitter::{
    is_signature_current, make_build_ninja, make_signature, relative_path, Toolchain, BUILD_NINJA,
    NINJA_TRAINING_FLAG,
};
pub use writer::{escape_path, Build, NinjaWriter, Rule};
