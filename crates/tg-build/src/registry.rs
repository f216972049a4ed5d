//! Target constructor registry
//!
//! Maps the constructor names callable from declaration files to builder
//! functions. The loader only ever talks to the registry, so adding a target
//! flavour means registering one more builder.

use crate::declaration::{Invocation, Value};
use crate::error::{BuildError, BuildResult};
use crate::src_fs::SrcFs;
use crate::targets::{Target, TargetKind, TargetSpec};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Builds a target declared in `directory` from its call arguments
pub type TargetBuilder =
    Box<dyn Fn(&SrcFs, &str, &mut Arguments) -> BuildResult<Target> + Send + Sync>;

/// Keyword arguments of one constructor call
///
/// Builders take the arguments they understand; [`Arguments::finish`] then
/// rejects whatever is left over.
#[derive(Debug)]
pub struct Arguments {
    file: PathBuf,
    line: usize,
    constructor: String,
    values: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new(file: impl Into<PathBuf>, invocation: Invocation) -> Self {
        Self {
            file: file.into(),
            line: invocation.line,
            constructor: invocation.constructor,
            values: invocation.arguments,
        }
    }

    pub fn error(&self, message: impl Into<String>) -> BuildError {
        BuildError::InvalidArguments {
            file: self.file.clone(),
            line: self.line,
            constructor: self.constructor.clone(),
            message: message.into(),
        }
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        let index = self.values.iter().position(|(name, _)| name == key)?;
        Some(self.values.remove(index).1)
    }

    /// Take a required string argument
    pub fn take_string(&mut self, key: &str) -> BuildResult<String> {
        match self.take(key) {
            Some(Value::String(value)) => Ok(value),
            Some(other) => Err(self.error(format!(
                "'{key}' must be a string, not a {}",
                other.type_name()
            ))),
            None => Err(self.error(format!("missing required argument '{key}'"))),
        }
    }

    /// Take an optional list argument, empty when absent
    pub fn take_list(&mut self, key: &str) -> BuildResult<Vec<String>> {
        match self.take(key) {
            Some(Value::List(values)) => Ok(values),
            Some(other) => Err(self.error(format!(
                "'{key}' must be a list, not a {}",
                other.type_name()
            ))),
            None => Ok(Vec::new()),
        }
    }

    /// Fail if any argument was not taken
    pub fn finish(self) -> BuildResult<()> {
        match self.values.first() {
            None => Ok(()),
            Some((name, _)) => Err(self.error(format!("unexpected keyword argument '{name}'"))),
        }
    }
}

/// Registry of target constructors available to declaration files
pub struct TargetRegistry {
    builders: BTreeMap<String, TargetBuilder>,
}

impl TargetRegistry {
    /// Create a registry with no constructors
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Create a registry holding `c_library`, `c_binary`, `cxx_library` and `cxx_binary`
    pub fn with_builtin_targets() -> Self {
        let mut registry = Self::new();
        for kind in TargetKind::ALL {
            registry.register(kind.public_name(), move |src_fs, directory, args| {
                let spec = cc_target_spec(args)?;
                Target::new(src_fs, directory, kind, spec)
            });
        }
        registry
    }

    /// Register (or replace) a constructor
    pub fn register<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&SrcFs, &str, &mut Arguments) -> BuildResult<Target> + Send + Sync + 'static,
    {
        self.builders.insert(name.into(), Box::new(builder));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Registered constructor names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Run the constructor named by `invocation`
    pub fn construct(
        &self,
        src_fs: &SrcFs,
        directory: &str,
        file: &Path,
        invocation: Invocation,
    ) -> BuildResult<Target> {
        let builder = self.builders.get(&invocation.constructor).ok_or_else(|| {
            BuildError::UnknownConstructor {
                file: file.to_path_buf(),
                line: invocation.line,
                name: invocation.constructor.clone(),
            }
        })?;

        let mut args = Arguments::new(file, invocation);
        let target = builder(src_fs, directory, &mut args)?;
        args.finish()?;
        Ok(target)
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::with_builtin_targets()
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

/// Field set shared by every C and C++ target
fn cc_target_spec(args: &mut Arguments) -> BuildResult<TargetSpec> {
    Ok(TargetSpec {
        name: args.take_string("name")?,
        deps: args.take_list("deps")?,
        srcs: args.take_list("srcs")?,
        headers: args.take_list("headers")?,
        compiler_flags: args.take_list("compiler_flags")?,
        transitive_compiler_flags: args.take_list("transitive_compiler_flags")?,
        linker_flags: args.take_list("linker_flags")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::parse_declarations;
    use tempfile::TempDir;

    fn construct(registry: &TargetRegistry, source: &str) -> BuildResult<Target> {
        let temp = TempDir::new().unwrap();
        let src_fs = SrcFs::new(temp.path()).unwrap();
        let invocation = parse_declarations("TARGETS", source)?.remove(0);
        registry.construct(&src_fs, "//pkg", Path::new("TARGETS"), invocation)
    }

    #[test]
    fn test_builtin_names() {
        let registry = TargetRegistry::with_builtin_targets();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["c_binary", "c_library", "cxx_binary", "cxx_library"]
        );
    }

    #[test]
    fn test_construct_builtin() {
        let registry = TargetRegistry::with_builtin_targets();
        let target = construct(&registry, "cxx_binary(name = 'app', srcs = ['main.cc'])").unwrap();
        assert_eq!(target.kind(), TargetKind::CxxBinary);
        assert_eq!(target.target_ref().to_string(), "//pkg:app");
    }

    #[test]
    fn test_unknown_constructor() {
        let registry = TargetRegistry::with_builtin_targets();
        let err = construct(&registry, "rust_library(name = 'x')").unwrap_err();
        assert!(matches!(err, BuildError::UnknownConstructor { ref name, .. } if name == "rust_library"));
    }

    #[test]
    fn test_unexpected_keyword() {
        let registry = TargetRegistry::with_builtin_targets();
        let err = construct(&registry, "c_library(name = 'x', sources = ['a.c'])").unwrap_err();
        match err {
            BuildError::InvalidArguments { message, .. } => {
                assert!(message.contains("sources"));
            }
            other => panic!("Expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_argument_types() {
        let registry = TargetRegistry::with_builtin_targets();
        assert!(construct(&registry, "c_library(name = ['x'])").is_err());
        assert!(construct(&registry, "c_library(name = 'x', srcs = 'a.c')").is_err());
        assert!(construct(&registry, "c_library(srcs = ['a.c'])").is_err());
    }

    #[test]
    fn test_register_custom_constructor() {
        let mut registry = TargetRegistry::with_builtin_targets();
        registry.register("header_library", |src_fs, directory, args| {
            let name = args.take_string("name")?;
            let headers = args.take_list("headers")?;
            let spec = TargetSpec::new(name).with_headers(headers);
            Target::new(src_fs, directory, TargetKind::CLibrary, spec)
        });

        assert!(registry.contains("header_library"));
        let target = construct(&registry, "header_library(name = 'h', headers = ['h.h'])").unwrap();
        assert_eq!(target.headers().len(), 1);
        assert!(target.srcs().is_empty());
    }
}
