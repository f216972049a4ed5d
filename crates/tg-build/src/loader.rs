//! Loading the targets declared by one directory
use crate::declaration::{parse_declarations, Invocation, Value, TARGETS_FILE};
use crate::error::{BuildError, BuildResult};
use crate::registry::TargetRegistry;
use crate::src_fs::SrcFs;
use crate::target_ref::TargetRef;
use crate::targets::Target;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Targets of one directory keyed by reference
pub type TargetMap = BTreeMap<TargetRef, Rc<Target>>;

/// Read and evaluate the declaration file of `directory`
pub fn load_targets(
    src_fs: &SrcFs,
    registry: &TargetRegistry,
    directory: &str,
) -> BuildResult<TargetMap> {
    if !src_fs.is_absolute_path(directory) {
        return Err(BuildError::invalid_address(directory, "Absolute path expected."));
    }

    let targets_path = src_fs.combine_paths(directory, &[TARGETS_FILE])?;
    let real_path = src_fs.make_real_path(&targets_path)?;
    let source = src_fs.read_text(&targets_path)?;
    let invocations = parse_declarations(&real_path, &source)?;

    let mut result = TargetMap::new();
    for invocation in invocations {
        // Report a repeated name even when the repeated call is also malformed
        if let Some(name) = declared_name(&invocation) {
            let target_ref = TargetRef::new(directory, name);
            if result.contains_key(&target_ref) {
                return Err(BuildError::DuplicateTarget { target: target_ref });
            }
        }
        let target = registry.construct(src_fs, directory, &real_path, invocation)?;
        let target_ref = target.target_ref().clone();
        if result.contains_key(&target_ref) {
            return Err(BuildError::DuplicateTarget { target: target_ref });
        }
        result.insert(target_ref, Rc::new(target));
    }

    debug!(directory, targets = result.len(), "loaded declaration file");
    Ok(result)
}

fn declared_name(invocation: &Invocation) -> Option<&str> {
    invocation
        .arguments
        .iter()
        .find_map(|(key, value)| match value {
            Value::String(name) if key == "name" => Some(name.as_str()),
            _ => None,
        })
}
