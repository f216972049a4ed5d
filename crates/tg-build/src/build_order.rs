//! Build plan computation
//!
//! Expands a set of requested targets into every target they transitively
//! need, ordered so that each target comes after all of its dependencies.
use crate::cache::TargetCache;
use crate::error::{BuildError, BuildResult};
use crate::target_ref::TargetRef;
use crate::targets::Target;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;
use tracing::debug;

/// Dependency-first ordered set of resolved targets
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    targets: IndexMap<TargetRef, Rc<Target>>,
}

impl BuildPlan {
    /// Resolve `requested` and everything reachable from it
    ///
    /// Uses an explicit stack: a target is re-pushed above its dependencies
    /// when first expanded and emitted when popped the second time, after
    /// all of its dependencies have been emitted. A dependency that is still
    /// being expanded closes a cycle.
    pub fn resolve<'a, I>(cache: &mut TargetCache, requested: I) -> BuildResult<Self>
    where
        I: IntoIterator<Item = &'a TargetRef>,
    {
        let mut targets = IndexMap::new();
        let mut stack: Vec<TargetRef> = requested.into_iter().cloned().collect();
        let mut visited = HashSet::new();
        let mut charged = HashSet::new();

        while let Some(target_ref) = stack.pop() {
            let target = cache.get_target(&target_ref)?;
            if charged.remove(&target_ref) {
                targets.insert(target_ref, target);
                continue;
            }
            if !visited.insert(target_ref.clone()) {
                continue;
            }

            charged.insert(target_ref.clone());
            stack.push(target_ref.clone());
            for dep in target.deps() {
                if charged.contains(dep) {
                    return Err(BuildError::CircularDependency {
                        dependency: dep.clone(),
                        dependent: target_ref,
                    });
                }
                stack.push(dep.clone());
            }
        }

        debug!(targets = targets.len(), "computed build plan");
        Ok(Self { targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, target_ref: &TargetRef) -> Option<&Rc<Target>> {
        self.targets.get(target_ref)
    }

    /// Planned targets in build order
    pub fn iter(&self) -> impl Iterator<Item = (&TargetRef, &Rc<Target>)> {
        self.targets.iter()
    }

    /// Planned references in build order
    pub fn refs(&self) -> impl Iterator<Item = &TargetRef> {
        self.targets.keys()
    }

    /// Planned targets in build order
    pub fn targets(&self) -> impl Iterator<Item = &Rc<Target>> {
        self.targets.values()
    }

    /// Transitive dependency set of every planned target
    ///
    /// Each direct dependency contributes itself followed by its own set;
    /// repeated entries keep only their last occurrence.
    pub fn transitive_deps(&self) -> IndexMap<TargetRef, Vec<TargetRef>> {
        let mut result: IndexMap<TargetRef, Vec<TargetRef>> = IndexMap::new();
        for (target_ref, target) in &self.targets {
            let mut expanded = Vec::new();
            for dep in target.deps() {
                expanded.push(dep.clone());
                if let Some(nested) = result.get(dep) {
                    expanded.extend(nested.iter().cloned());
                }
            }
            result.insert(target_ref.clone(), collapse_last_occurrence(expanded));
        }
        result
    }

    /// Serializable view of the plan
    pub fn summary(&self) -> Vec<PlanEntry> {
        let transitive = self.transitive_deps();
        self.targets
            .iter()
            .map(|(target_ref, target)| PlanEntry {
                target: target_ref.to_string(),
                kind: target.kind().public_name(),
                deps: target.deps().iter().map(ToString::to_string).collect(),
                transitive_deps: transitive
                    .get(target_ref)
                    .map(|deps| deps.iter().map(ToString::to_string).collect())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// One target of a [`BuildPlan::summary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub target: String,
    pub kind: &'static str,
    pub deps: Vec<String>,
    pub transitive_deps: Vec<String>,
}

/// Drop all but the last occurrence of every item, keeping relative order
pub fn collapse_last_occurrence<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(item.clone()))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_last_occurrence() {
        assert_eq!(collapse_last_occurrence(Vec::<u32>::new()), Vec::<u32>::new());
        assert_eq!(collapse_last_occurrence(vec![1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(collapse_last_occurrence(vec![3, 1, 2, 3, 2, 1]), vec![3, 2, 1]);
        assert_eq!(
            collapse_last_occurrence(vec!["X", "Y", "Y", "Z"]),
            vec!["X", "Y", "Z"]
        );
    }

    #[test]
    fn test_empty_plan() {
        let plan = BuildPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
        assert!(plan.transitive_deps().is_empty());
    }
}
