//! Virtual source filesystem
//!
//! Binds the path algebra to one real source tree on disk. Local roots are
//! discovered by looking for version-control markers and memoized for the
//! lifetime of the instance; the tree is assumed not to change meanwhile.

use crate::error::{BuildError, BuildResult};
use crate::path;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Directories whose presence marks a local root
pub const LOCAL_ROOT_MARKERS: [&str; 2] = [".git", ".hg"];

#[derive(Debug)]
pub struct SrcFs {
    root: PathBuf,
    local_roots: RefCell<HashMap<String, Option<String>>>,
}

impl SrcFs {
    /// Wrap an existing directory
    pub fn new(root: impl Into<PathBuf>) -> BuildResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BuildError::NotFound { path: root });
        }
        Ok(Self {
            root,
            local_roots: RefCell::new(HashMap::new()),
        })
    }

    pub fn is_name(&self, s: &str) -> bool {
        path::is_name(s)
    }

    pub fn is_absolute_path(&self, s: &str) -> bool {
        path::is_absolute_path(s)
    }

    pub fn is_local_path(&self, s: &str) -> bool {
        path::is_local_path(s)
    }

    pub fn is_relative_path(&self, s: &str) -> bool {
        path::is_relative_path(s)
    }

    pub fn is_path(&self, s: &str) -> bool {
        path::is_path(s)
    }

    /// Nearest ancestor of `address` (itself included) holding a VCS marker
    pub fn find_local_root(&self, address: &str) -> BuildResult<Option<String>> {
        expect_absolute(address)?;
        Ok(self.lookup_local_root(address))
    }

    /// Combine paths, resolving local parts against this tree
    pub fn combine_paths<S: AsRef<str>>(&self, base: &str, parts: &[S]) -> BuildResult<String> {
        path::combine_paths(base, parts, |address| self.lookup_local_root(address))
    }

    /// Map an absolute address to the real path under the root
    pub fn make_real_path(&self, address: &str) -> BuildResult<PathBuf> {
        expect_absolute(address)?;
        Ok(self.real_path(address))
    }

    /// Map a real path under the root back to its absolute address
    pub fn make_path(&self, real_path: &Path) -> BuildResult<String> {
        let relative = real_path.strip_prefix(&self.root).map_err(|_| {
            BuildError::invalid_address(
                real_path.display().to_string(),
                "Not inside the source tree.",
            )
        })?;

        let mut address = path::ROOT.to_string();
        for component in relative.components() {
            let segment = component.as_os_str().to_string_lossy();
            if !path::is_name(&segment) {
                return Err(BuildError::invalid_address(
                    real_path.display().to_string(),
                    format!("'{segment}' is not a valid path segment."),
                ));
            }
            address.push('/');
            address.push_str(&segment);
        }
        Ok(address)
    }

    /// Read a UTF-8 file by address
    pub fn read_text(&self, address: &str) -> BuildResult<String> {
        let real_path = self.make_real_path(address)?;
        fs::read_to_string(&real_path).map_err(|e| BuildError::io(real_path, e))
    }

    fn real_path(&self, address: &str) -> PathBuf {
        if address == path::ROOT {
            return self.root.clone();
        }
        self.root.join(&address[2..])
    }

    fn is_local_root(&self, address: &str) -> bool {
        let real_path = self.real_path(address);
        LOCAL_ROOT_MARKERS
            .iter()
            .any(|marker| real_path.join(marker).exists())
    }

    fn lookup_local_root(&self, address: &str) -> Option<String> {
        let mut pending = Vec::new();
        let mut current = address;
        let found = loop {
            if let Some(cached) = self.local_roots.borrow().get(current) {
                break cached.clone();
            }
            pending.push(current.to_string());
            if self.is_local_root(current) {
                break Some(current.to_string());
            }
            match path::parent_path(current) {
                Some(parent) => current = parent,
                None => break None,
            }
        };

        if !pending.is_empty() {
            trace!(address, local_root = ?found, "resolved local root");
        }
        let mut cache = self.local_roots.borrow_mut();
        for visited in pending {
            cache.insert(visited, found.clone());
        }
        found
    }
}

fn expect_absolute(address: &str) -> BuildResult<()> {
    if path::is_absolute_path(address) {
        Ok(())
    } else {
        Err(BuildError::invalid_address(address, "Absolute path expected."))
    }
}
