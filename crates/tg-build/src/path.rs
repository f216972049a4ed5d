//! Virtual path algebra
//!
//! Addresses come in four forms:
//! - names: a single token (`main.c`)
//! - absolute paths rooted at the source tree root (`/`, `//lib/net`)
//! - local paths rooted at the nearest version-control boundary (`@`, `@/net`)
//! - relative paths with no root marker (`net/socket`)
//!
//! Nothing in this module touches the filesystem. Local paths are resolved
//! through a caller-supplied root finder.

use crate::error::{BuildError, BuildResult};
use regex::Regex;
use std::sync::OnceLock;

const TOKEN: &str = "(?:[0-9A-Za-z_+-][0-9A-Za-z._+-]*)";

/// Root of the source tree
pub const ROOT: &str = "/";

/// Marker that starts a local path
pub const LOCAL_MARKER: &str = "@";

struct Grammar {
    name: Regex,
    absolute: Regex,
    local: Regex,
    relative: Regex,
    any: Regex,
}

fn grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let compile = |pattern: String| Regex::new(&pattern).expect("path grammar is valid");
        Grammar {
            name: compile(format!("^{TOKEN}$")),
            absolute: compile(format!("^/(?:/{TOKEN})*$")),
            local: compile(format!("^@(?:/{TOKEN})*$")),
            relative: compile(format!("^(?:|{TOKEN}(?:/{TOKEN})*)$")),
            any: compile(format!("^(?:|(?:{TOKEN}|@|/)(?:/{TOKEN})*)$")),
        }
    })
}

/// Check whether `s` is a single target or file name token
pub fn is_name(s: &str) -> bool {
    grammar().name.is_match(s)
}

/// Check whether `s` is rooted at the source tree root
pub fn is_absolute_path(s: &str) -> bool {
    grammar().absolute.is_match(s)
}

/// Check whether `s` is rooted at the local root marker
pub fn is_local_path(s: &str) -> bool {
    grammar().local.is_match(s)
}

/// Check whether `s` is relative (the empty string included)
pub fn is_relative_path(s: &str) -> bool {
    grammar().relative.is_match(s)
}

/// Check whether `s` is any kind of path
pub fn is_path(s: &str) -> bool {
    grammar().any.is_match(s)
}

/// Parent of an absolute path, `None` for the root
pub fn parent_path(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    path.rsplit_once('/').map(|(head, _)| head)
}

/// Fold `parts` onto the absolute `base`
///
/// Empty parts are skipped. An absolute part replaces everything combined so
/// far, a local part is resolved against the boundary that `find_local_root`
/// reports for the current result, and a relative part is appended.
pub fn combine_paths<S, F>(base: &str, parts: &[S], mut find_local_root: F) -> BuildResult<String>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Option<String>,
{
    if !is_absolute_path(base) {
        return Err(BuildError::invalid_address(
            base,
            "The first part must be an absolute one.",
        ));
    }

    let mut result = base.to_string();
    for part in parts.iter().map(AsRef::as_ref).filter(|p| !p.is_empty()) {
        if is_absolute_path(part) {
            result = part.to_string();
        } else if is_local_path(part) {
            let local_root = find_local_root(&result)
                .ok_or_else(|| BuildError::LocalRootNotFound { path: result.clone() })?;
            result = format!("{}{}", local_root, &part[LOCAL_MARKER.len()..]);
        } else if is_relative_path(part) {
            result.push('/');
            result.push_str(part);
        } else {
            return Err(BuildError::invalid_address(
                part,
                "Each trailing part must be a path.",
            ));
        }
    }

    Ok(result)
}
