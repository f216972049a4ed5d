//! `build.ninja` generation from a build plan
//!
//! Layout under the tg directory:
//! - `src/...`  the source tree
//! - `pkg/...`  a symlinked mirror of the sources used by the build plus
//!   object files and archives; every mirrored directory gets an `@` link to
//!   its local root so that `#include <@/...>` works
//! - `bin/...`  linked binaries, each also linked back into `src/`

use crate::build_order::BuildPlan;
use crate::declaration::TARGETS_FILE;
use crate::error::{BuildError, BuildResult};
use crate::ninja::writer::{Build, NinjaWriter, Rule};
use crate::src_fs::SrcFs;
use crate::target_ref::TargetRef;
use crate::targets::Target;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Name of the generated file inside the tg directory
pub const BUILD_NINJA: &str = "build.ninja";

/// Flag passed by the regeneration rule back to `tg build`
pub const NINJA_TRAINING_FLAG: &str = "--ninja-training";

const FAKE_ROOT: &str = "fake_root";

/// Compilers and base flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cc: String,
    pub cxx: String,
    pub cc_flags: Vec<String>,
    pub cxx_flags: Vec<String>,
    pub ar: String,
    /// Command that regenerates `build.ninja`
    pub tg: String,
}

impl Toolchain {
    /// Default toolchain for the host platform
    pub fn host() -> Self {
        let common = [
            "-O2",
            "-g",
            "-march=native",
            "-Wall",
            "-Wextra",
            "-pedantic",
            "-Werror",
            "-isystem pkg",
            "-pthread",
        ];
        let with = |extra: &[&str]| -> Vec<String> {
            common.iter().chain(extra).map(|s| s.to_string()).collect()
        };

        if cfg!(target_os = "macos") {
            Self {
                cc: "clang".to_string(),
                cxx: "clang++".to_string(),
                cc_flags: with(&["-std=c11"]),
                cxx_flags: with(&["-std=c++17", "-stdlib=libc++"]),
                ar: "ar".to_string(),
                tg: "tg".to_string(),
            }
        } else {
            Self {
                cc: "gcc".to_string(),
                cxx: "g++".to_string(),
                cc_flags: with(&["-std=gnu11"]),
                cxx_flags: with(&["-std=c++17"]),
                ar: "ar".to_string(),
                tg: "tg".to_string(),
            }
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::host()
    }
}

/// First line of a generated file for the given requested targets
pub fn make_signature(requested: &[TargetRef]) -> String {
    let mut line = String::from("# tg");
    for target_ref in requested {
        line.push(' ');
        line.push_str(&target_ref.to_string());
    }
    line
}

/// Whether `build_ninja` was generated for exactly `requested`
///
/// Only the first line is read.
pub fn is_signature_current(build_ninja: &Path, requested: &[TargetRef]) -> BuildResult<bool> {
    let file = match File::open(build_ninja) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(BuildError::io(build_ninja, e)),
    };
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|e| BuildError::io(build_ninja, e))?;
    Ok(first_line.trim() == make_signature(requested))
}

fn is_c_file(src: &str) -> bool {
    src.ends_with(".c")
}

fn is_cxx_file(src: &str) -> bool {
    src.ends_with(".cpp") || src.ends_with(".cc")
}

fn is_header_file(src: &str) -> bool {
    src.ends_with(".h") || src.ends_with(".hh")
}

/// Strip the leading `/` of an absolute address: `//a/b` -> `/a/b`, `/` -> ``
fn tail(address: &str) -> &str {
    &address[1..]
}

fn lib_output(target_ref: &TargetRef) -> String {
    format!("pkg{}/{}.a", tail(&target_ref.path), target_ref.name)
}

fn bin_output(target_ref: &TargetRef) -> String {
    format!("bin{}/{}", tail(&target_ref.path), target_ref.name)
}

fn bin_symlink(target_ref: &TargetRef) -> String {
    format!("src{}/{}", tail(&target_ref.path), target_ref.name)
}

fn object_output(src: &str) -> String {
    format!("pkg{}.o", tail(src))
}

fn mirrored(src: &str) -> String {
    format!("pkg{}", tail(src))
}

fn dirname(path: &str) -> &str {
    path.rsplit_once('/').map(|(head, _)| head).unwrap_or("")
}

/// Relative path from directory `from` to `to`; both relative to one base
pub fn relative_path(to: &str, from: &str) -> String {
    match pathdiff::diff_paths(to, from) {
        Some(path) if !path.as_os_str().is_empty() => path
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/"),
        _ => ".".to_string(),
    }
}

/// Compiled sources of a target, sorted
fn compiled_sources(target: &Target) -> BuildResult<Vec<(&str, &'static str)>> {
    let mut result = Vec::new();
    for src in target.srcs() {
        let rule = if is_header_file(src) {
            continue;
        } else if is_c_file(src) {
            "c_compile"
        } else if is_cxx_file(src) {
            "cxx_compile"
        } else {
            return Err(BuildError::UnsupportedSource {
                target: target.target_ref().clone(),
                source_file: src.clone(),
            });
        };
        result.push((src.as_str(), rule));
    }
    Ok(result)
}

struct Emitter<'a> {
    writer: NinjaWriter,
    src_fs: &'a SrcFs,
    plan: &'a BuildPlan,
}

impl<'a> Emitter<'a> {
    fn symlink(&mut self, input: &str, output: String, order_only: bool) {
        let relpath = relative_path(input, dirname(&output));
        let mut build = Build::new(output, "symlink").variable("relpath_in", relpath);
        if order_only {
            build = build.order_only([BUILD_NINJA]);
        }
        self.writer.build(&build);
    }

    fn fake_root(&mut self) -> BuildResult<()> {
        let mut dirs = BTreeSet::new();
        let mut files = BTreeSet::new();
        for target in self.plan.targets() {
            for file in target.srcs().iter().chain(target.headers()) {
                dirs.insert(dirname(file).to_string());
                files.insert(file.clone());
            }
        }

        let mut links = BTreeSet::new();
        for dir in &dirs {
            let local_root = self
                .src_fs
                .find_local_root(dir)?
                .ok_or_else(|| BuildError::LocalRootNotFound { path: dir.clone() })?;
            let output = format!("pkg{}/@", tail(dir));
            self.symlink(&mirrored(&local_root), output.clone(), true);
            links.insert(output);
        }
        for file in &files {
            let output = mirrored(file);
            self.symlink(&format!("src{}", tail(file)), output.clone(), true);
            links.insert(output);
        }

        self.writer.build(&Build::new(FAKE_ROOT, "phony").inputs(links));
        self.writer.newline();
        Ok(())
    }

    fn compile(&mut self, target: &Target, transitive: &[&Target]) -> BuildResult<Vec<String>> {
        let mut flags: BTreeSet<&str> = target
            .compiler_flags()
            .iter()
            .chain(target.transitive_compiler_flags())
            .map(String::as_str)
            .collect();
        for dep in transitive {
            flags.extend(dep.transitive_compiler_flags().iter().map(String::as_str));
        }
        let flags = flags.into_iter().collect::<Vec<_>>().join(" ");

        let mut objects = Vec::new();
        for (src, rule) in compiled_sources(target)? {
            let object = object_output(src);
            let mut build = Build::new(object.clone(), rule)
                .inputs([mirrored(src)])
                .order_only([BUILD_NINJA, FAKE_ROOT]);
            if !flags.is_empty() {
                build = build.variable("extra_compiler_flags", flags.as_str());
            }
            self.writer.build(&build);
            objects.push(object);
        }
        Ok(objects)
    }

    fn library(&mut self, target: &Target, transitive: &[&Target]) -> BuildResult<()> {
        let objects = self.compile(target, transitive)?;
        if !objects.is_empty() {
            self.writer
                .build(&Build::new(lib_output(target.target_ref()), "ar").inputs(objects));
            self.writer.newline();
        }
        Ok(())
    }

    fn binary(&mut self, target: &Target, transitive: &[&Target]) -> BuildResult<()> {
        let mut inputs = self.compile(target, transitive)?;
        for dep in transitive {
            if dep.kind().is_library() && !compiled_sources(dep)?.is_empty() {
                inputs.push(lib_output(dep.target_ref()));
            }
        }

        let mut linker_flags: BTreeSet<&str> =
            target.linker_flags().iter().map(String::as_str).collect();
        for dep in transitive {
            linker_flags.extend(dep.linker_flags().iter().map(String::as_str));
        }

        let output = bin_output(target.target_ref());
        let mut link = Build::new(output.clone(), "cxx_link").inputs(inputs);
        if !linker_flags.is_empty() {
            let flags = linker_flags.into_iter().collect::<Vec<_>>().join(" ");
            link = link.variable("extra_linker_flags", flags);
        }
        self.writer.build(&link);
        self.symlink(&output, bin_symlink(target.target_ref()), false);
        self.writer.newline();
        Ok(())
    }
}

fn header(writer: &mut NinjaWriter, toolchain: &Toolchain) {
    writer.comment(BUILD_NINJA);
    writer.newline();
    writer.variable("ninja_required_version", "1.3");
    writer.newline();
    writer.variable("builddir", ".");
    writer.newline();
    writer.variable("ar", &toolchain.ar);
    writer.variable("ln", "ln -snf");
    writer.variable("rm", "rm -r -f");
    writer.variable("tg", &toolchain.tg);
    writer.newline();
    writer.variable("cc", &toolchain.cc);
    writer.variable("cxx", &toolchain.cxx);
    writer.variable("cc_flags", &toolchain.cc_flags.join(" "));
    writer.variable("cxx_flags", &toolchain.cxx_flags.join(" "));
    writer.newline();

    let rules = [
        Rule::new(
            "c_compile",
            "$cc $cc_flags -MMD -MT $out -MF $out.d -c $in -o $out $extra_compiler_flags",
        )
        .with_description("Building C file $in")
        .with_gcc_depfile("$out.d"),
        Rule::new(
            "cxx_compile",
            "$cxx $cxx_flags -MMD -MT $out -MF $out.d -c $in -o $out $extra_compiler_flags",
        )
        .with_description("Building C++ file $in")
        .with_gcc_depfile("$out.d"),
        Rule::new("cxx_link", "$cxx $cxx_flags $in -o $out $extra_linker_flags")
            .with_description("Linking $out"),
        Rule::new("ar", "$rm $out && $ar crs $out $in").with_description("Creating archive $out"),
        Rule::new("symlink", "$ln $relpath_in $out").with_description("Creating symlink $out"),
        Rule::new(
            "rebuild_ninja",
            format!("$tg build {NINJA_TRAINING_FLAG} $target_refs"),
        )
        .with_description("Ninja training"),
    ];
    for rule in &rules {
        writer.rule(rule);
        writer.newline();
    }
}

/// Generate the complete `build.ninja` for `requested`, expanded into `plan`
///
/// `tg_path` is the directory ninja runs in; the source tree must lie inside it.
pub fn make_build_ninja(
    tg_path: &Path,
    src_fs: &SrcFs,
    requested: &[TargetRef],
    plan: &BuildPlan,
    toolchain: &Toolchain,
) -> BuildResult<String> {
    let mut writer = NinjaWriter::new();
    header(&mut writer, toolchain);

    let mut declaration_files = BTreeSet::new();
    for target_ref in plan.refs() {
        let real_dir = src_fs.make_real_path(&target_ref.path)?;
        let relative = real_dir.strip_prefix(tg_path).map_err(|_| {
            BuildError::invalid_address(
                target_ref.path.as_str(),
                format!("Not inside {}.", tg_path.display()),
            )
        })?;
        declaration_files.insert(
            relative
                .join(TARGETS_FILE)
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/"),
        );
    }
    let target_refs = requested
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writer.build(
        &Build::new(BUILD_NINJA, "rebuild_ninja")
            .implicit(declaration_files)
            .variable("target_refs", target_refs),
    );
    writer.newline();

    let mut emitter = Emitter {
        writer,
        src_fs,
        plan,
    };
    emitter.fake_root()?;

    let transitive_deps = plan.transitive_deps();
    for (target_ref, target) in plan.iter() {
        let transitive: Vec<&Target> = transitive_deps
            .get(target_ref)
            .into_iter()
            .flatten()
            .filter_map(|dep| plan.get(dep).map(|t| t.as_ref()))
            .collect();
        if target.kind().is_library() {
            emitter.library(target, &transitive)?;
        } else {
            emitter.binary(target, &transitive)?;
        }
    }

    debug!(targets = plan.len(), "generated {}", BUILD_NINJA);
    Ok(format!(
        "{}\n{}",
        make_signature(requested),
        emitter.writer.into_string()
    ))
}
