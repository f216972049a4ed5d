//! Per-invocation target cache
//!
//! Owns the source filesystem and the constructor registry, and remembers
//! the targets of every directory it has loaded so that each declaration
//! file is read at most once. Create one cache per invocation; it is never
//! persisted.

use crate::error::{BuildError, BuildResult};
use crate::loader::{load_targets, TargetMap};
use crate::registry::TargetRegistry;
use crate::src_fs::SrcFs;
use crate::target_ref::TargetRef;
use crate::targets::Target;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct TargetCache {
    src_fs: SrcFs,
    registry: TargetRegistry,
    loaded: HashMap<String, Rc<TargetMap>>,
    load_count: usize,
}

impl TargetCache {
    /// Create a cache using the builtin target constructors
    pub fn new(src_fs: SrcFs) -> Self {
        Self::with_registry(src_fs, TargetRegistry::with_builtin_targets())
    }

    pub fn with_registry(src_fs: SrcFs, registry: TargetRegistry) -> Self {
        Self {
            src_fs,
            registry,
            loaded: HashMap::new(),
            load_count: 0,
        }
    }

    pub fn src_fs(&self) -> &SrcFs {
        &self.src_fs
    }

    /// Number of declaration files actually read and evaluated
    pub fn load_count(&self) -> usize {
        self.load_count
    }

    /// All targets declared in `directory`
    pub fn get_targets(&mut self, directory: &str) -> BuildResult<Rc<TargetMap>> {
        if !self.src_fs.is_absolute_path(directory) {
            return Err(BuildError::invalid_address(directory, "Absolute path expected."));
        }
        if let Some(targets) = self.loaded.get(directory) {
            return Ok(Rc::clone(targets));
        }

        self.load_count += 1;
        let targets = Rc::new(load_targets(&self.src_fs, &self.registry, directory)?);
        self.loaded.insert(directory.to_string(), Rc::clone(&targets));
        Ok(targets)
    }

    /// The target named by `target_ref`
    pub fn get_target(&mut self, target_ref: &TargetRef) -> BuildResult<Rc<Target>> {
        let missing = || BuildError::MissingTarget {
            target: target_ref.clone(),
        };
        let targets = match self.get_targets(&target_ref.path) {
            Ok(targets) => targets,
            Err(e) if e.is_not_found() => return Err(missing()),
            Err(e) => return Err(e),
        };
        targets.get(target_ref).cloned().ok_or_else(missing)
    }
}
