/// Build target types
use crate::error::{BuildError, BuildResult};
use crate::src_fs::SrcFs;
use crate::target_ref::TargetRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of build target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Static archive built from C sources
    CLibrary,
    /// Executable linked from C sources
    CBinary,
    /// Static archive built from C++ sources
    CxxLibrary,
    /// Executable linked from C++ sources
    CxxBinary,
}

impl TargetKind {
    /// All kinds, in registration order
    pub const ALL: [TargetKind; 4] = [
        Self::CLibrary,
        Self::CBinary,
        Self::CxxLibrary,
        Self::CxxBinary,
    ];

    /// Constructor name used in declaration files
    pub fn public_name(&self) -> &'static str {
        match self {
            Self::CLibrary => "c_library",
            Self::CBinary => "c_binary",
            Self::CxxLibrary => "cxx_library",
            Self::CxxBinary => "cxx_binary",
        }
    }

    pub fn is_library(&self) -> bool {
        matches!(self, Self::CLibrary | Self::CxxLibrary)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::CBinary | Self::CxxBinary)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.public_name())
    }
}

/// Raw field set of a target as written in a declaration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSpec {
    pub name: String,
    pub deps: Vec<String>,
    pub srcs: Vec<String>,
    pub headers: Vec<String>,
    pub compiler_flags: Vec<String>,
    pub transitive_compiler_flags: Vec<String>,
    pub linker_flags: Vec<String>,
}

impl TargetSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_deps<S: Into<String>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_srcs<S: Into<String>>(mut self, srcs: impl IntoIterator<Item = S>) -> Self {
        self.srcs = srcs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_headers<S: Into<String>>(mut self, headers: impl IntoIterator<Item = S>) -> Self {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_compiler_flags<S: Into<String>>(
        mut self,
        flags: impl IntoIterator<Item = S>,
    ) -> Self {
        self.compiler_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_transitive_compiler_flags<S: Into<String>>(
        mut self,
        flags: impl IntoIterator<Item = S>,
    ) -> Self {
        self.transitive_compiler_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_linker_flags<S: Into<String>>(mut self, flags: impl IntoIterator<Item = S>) -> Self {
        self.linker_flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

/// A declared, validated build target
///
/// Every address is absolute and every set is sorted and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    target_ref: TargetRef,
    kind: TargetKind,
    deps: Vec<TargetRef>,
    srcs: BTreeSet<String>,
    headers: BTreeSet<String>,
    compiler_flags: BTreeSet<String>,
    transitive_compiler_flags: BTreeSet<String>,
    linker_flags: BTreeSet<String>,
}

impl Target {
    /// Validate and normalize `spec` as declared in directory `path`
    pub fn new(src_fs: &SrcFs, path: &str, kind: TargetKind, spec: TargetSpec) -> BuildResult<Self> {
        if !src_fs.is_absolute_path(path) {
            return Err(BuildError::invalid_address(path, "Absolute path expected."));
        }
        if !src_fs.is_name(&spec.name) {
            return Err(BuildError::InvalidName { name: spec.name });
        }
        let target_ref = TargetRef::new(path, spec.name);

        let mut deps = BTreeSet::new();
        for dep in &spec.deps {
            deps.insert(normalize_dep(src_fs, &target_ref, dep)?);
        }

        Ok(Self {
            srcs: normalize_files(src_fs, &target_ref, "src", &spec.srcs)?,
            headers: normalize_files(src_fs, &target_ref, "header", &spec.headers)?,
            compiler_flags: normalize_flags(&target_ref, "compiler flag", spec.compiler_flags)?,
            transitive_compiler_flags: normalize_flags(
                &target_ref,
                "transitive compiler flag",
                spec.transitive_compiler_flags,
            )?,
            linker_flags: normalize_flags(&target_ref, "linker flag", spec.linker_flags)?,
            deps: deps.into_iter().collect(),
            target_ref,
            kind,
        })
    }

    pub fn target_ref(&self) -> &TargetRef {
        &self.target_ref
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Direct dependencies, sorted
    pub fn deps(&self) -> &[TargetRef] {
        &self.deps
    }

    pub fn srcs(&self) -> &BTreeSet<String> {
        &self.srcs
    }

    pub fn headers(&self) -> &BTreeSet<String> {
        &self.headers
    }

    /// Flags used only when compiling this target
    pub fn compiler_flags(&self) -> &BTreeSet<String> {
        &self.compiler_flags
    }

    /// Flags used when compiling this target and everything that depends on it
    pub fn transitive_compiler_flags(&self) -> &BTreeSet<String> {
        &self.transitive_compiler_flags
    }

    /// Flags propagated to the link of every dependent binary
    pub fn linker_flags(&self) -> &BTreeSet<String> {
        &self.linker_flags
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn field<'a>(
            f: &mut fmt::Formatter<'_>,
            key: &str,
            values: impl IntoIterator<Item = &'a String>,
        ) -> fmt::Result {
            let mut values = values.into_iter().peekable();
            if values.peek().is_none() {
                return Ok(());
            }
            writeln!(f, "  {key} = [")?;
            for value in values {
                writeln!(f, "    {value:?},")?;
            }
            writeln!(f, "  ],")
        }

        writeln!(f, "{}(", self.kind)?;
        writeln!(f, "  name = {:?},", self.target_ref.to_string())?;
        field(f, "srcs", &self.srcs)?;
        field(f, "headers", &self.headers)?;
        field(f, "compiler_flags", &self.compiler_flags)?;
        field(f, "transitive_compiler_flags", &self.transitive_compiler_flags)?;
        field(f, "linker_flags", &self.linker_flags)?;
        let deps: Vec<String> = self.deps.iter().map(ToString::to_string).collect();
        field(f, "deps", &deps)?;
        write!(f, ")")
    }
}

fn normalize_dep(src_fs: &SrcFs, target_ref: &TargetRef, dep: &str) -> BuildResult<TargetRef> {
    let invalid = || BuildError::InvalidDependency {
        target: target_ref.to_string(),
        dependency: dep.to_string(),
    };

    let mut tokens = dep.split(':');
    let (path, name) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(path), Some(name), None) => (path, name),
        _ => return Err(invalid()),
    };
    if !src_fs.is_path(path) || !src_fs.is_name(name) {
        return Err(invalid());
    }
    let path = src_fs.combine_paths(&target_ref.path, &[path])?;
    Ok(TargetRef::new(path, name))
}

fn normalize_files(
    src_fs: &SrcFs,
    target_ref: &TargetRef,
    field: &'static str,
    files: &[String],
) -> BuildResult<BTreeSet<String>> {
    let mut normalized = BTreeSet::new();
    for file in files {
        if file.is_empty() || !src_fs.is_relative_path(file) {
            return Err(BuildError::invalid_field(target_ref, field, file.as_str()));
        }
        normalized.insert(src_fs.combine_paths(&target_ref.path, &[file])?);
    }
    Ok(normalized)
}

fn normalize_flags(
    target_ref: &TargetRef,
    field: &'static str,
    flags: Vec<String>,
) -> BuildResult<BTreeSet<String>> {
    // A control character would end the ninja variable the flag is written into
    if let Some(flag) = flags
        .iter()
        .find(|flag| flag.trim().is_empty() || flag.chars().any(char::is_control))
    {
        return Err(BuildError::invalid_field(target_ref, field, flag.as_str()));
    }
    Ok(flags.into_iter().collect())
}
