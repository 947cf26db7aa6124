//! Selection validation and application ordering

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{AssemblyError, Result};
use crate::manifest::Catalogue;
use crate::models::ModuleManifest;

/// Validates a module selection and computes its application order
///
/// Handles:
/// - `requires` edges that point outside the selection
/// - conflicting pairs, declared on either side
/// - a deterministic topological order over `requires`
///
/// Resolution is a pure function of the selection and the catalogue; the
/// order in which names were supplied never matters.
pub struct DependencyResolver;

impl DependencyResolver {
    /// Resolve a selection against a catalogue
    pub fn resolve(selection: &BTreeSet<String>, catalogue: &Catalogue) -> Result<Vec<String>> {
        let mut unknown = Vec::new();
        let mut manifests = Vec::with_capacity(selection.len());
        for name in selection {
            match catalogue.manifest(name) {
                Some(manifest) => manifests.push(manifest),
                None => unknown.push(name.clone()),
            }
        }
        if !unknown.is_empty() {
            return Err(AssemblyError::UnknownModule(unknown));
        }

        Self::resolve_manifests(&manifests)
    }

    /// Resolve an explicit set of manifests
    pub fn resolve_manifests(manifests: &[&ModuleManifest]) -> Result<Vec<String>> {
        let selected: BTreeMap<&str, &ModuleManifest> = manifests
            .iter()
            .map(|manifest| (manifest.name.as_str(), *manifest))
            .collect();

        Self::check_requires(&selected)?;
        Self::check_conflicts(&selected)?;
        let order = Self::topological_sort(&selected)?;

        debug!(order = ?order, "Resolved application order");
        Ok(order)
    }

    /// Fail on the first module (by name) whose requirements are not all selected
    fn check_requires(selected: &BTreeMap<&str, &ModuleManifest>) -> Result<()> {
        for (name, manifest) in selected {
            let missing: Vec<String> = manifest
                .requires
                .iter()
                .filter(|required| !selected.contains_key(required.as_str()))
                .cloned()
                .collect();

            if !missing.is_empty() {
                return Err(AssemblyError::MissingDependency {
                    module: name.to_string(),
                    missing,
                });
            }
        }
        Ok(())
    }

    /// Fail on the first conflicting pair; a conflict declared by either side counts
    fn check_conflicts(selected: &BTreeMap<&str, &ModuleManifest>) -> Result<()> {
        let mut pairs: BTreeSet<(&str, &str)> = BTreeSet::new();
        for (&name, manifest) in selected {
            for other in &manifest.conflicts {
                let other = other.as_str();
                if selected.contains_key(other) {
                    pairs.insert(if name < other { (name, other) } else { (other, name) });
                }
            }
        }

        match pairs.into_iter().next() {
            Some((first, second)) => Err(AssemblyError::Conflict {
                first: first.to_string(),
                second: second.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Kahn's algorithm with an ordered ready set, so ties break by ascending name
    fn topological_sort(selected: &BTreeMap<&str, &ModuleManifest>) -> Result<Vec<String>> {
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (&name, manifest) in selected {
            pending.insert(name, manifest.requires.len());
            for required in &manifest.requires {
                dependents.entry(required.as_str()).or_default().push(name);
            }
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(selected.len());

        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());
            pending.remove(name);

            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if !pending.is_empty() {
            return Err(AssemblyError::DependencyCycle(
                pending.keys().map(|name| name.to_string()).collect(),
            ));
        }

        Ok(order)
    }
}
