//! Dependency and environment merging across the preset and selected modules
//!
//! Tie-break rule for a package declared twice with different specs:
//!
//! 1. Equal specs are kept as they are.
//! 2. If both specs are *simple* (`^` or `~` followed by a plain
//!    `MAJOR.MINOR.PATCH`, no pre-release or build metadata), the higher
//!    version wins. Equal versions prefer `^` over `~`.
//! 3. Anything else is a [`AssemblyError::DependencyVersionConflict`].
//!
//! There is no "last wins" fallback.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use tracing::debug;

use crate::error::{AssemblyError, Result};
use crate::models::{BaseManifest, DependencyMap, MergedManifest, ModuleManifest, VersionResolution};

/// Range operator of a simple spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RangeOperator {
    Tilde,
    Caret,
}

/// `^1.2.3` or `~1.2.3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSpec {
    operator: RangeOperator,
    version: Version,
}

impl SimpleSpec {
    /// Parse a simple spec; `None` when the spec is anything else
    pub fn parse(spec: &str) -> Option<Self> {
        let (operator, rest) = if let Some(rest) = spec.strip_prefix('^') {
            (RangeOperator::Caret, rest)
        } else if let Some(rest) = spec.strip_prefix('~') {
            (RangeOperator::Tilde, rest)
        } else {
            return None;
        };

        let version = Version::parse(rest).ok()?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return None;
        }
        Some(Self { operator, version })
    }
}

impl Ord for SimpleSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then(self.operator.cmp(&other.operator))
    }
}

impl PartialOrd for SimpleSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimpleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            RangeOperator::Caret => write!(f, "^{}", self.version),
            RangeOperator::Tilde => write!(f, "~{}", self.version),
        }
    }
}

/// Merges manifests in application order
pub struct ManifestMerger;

impl ManifestMerger {
    /// Merge the preset's default manifest with each module, in order
    ///
    /// `preset_name` labels the preset's contribution in resolutions and errors.
    pub fn merge(
        preset_name: &str,
        base: &BaseManifest,
        modules: &[&ModuleManifest],
    ) -> Result<MergedManifest> {
        let mut merged = MergedManifest::default();
        let preset_label = format!("preset:{}", preset_name);

        Self::fold(&mut merged.deps, &base.deps, &preset_label, &mut merged.resolutions)?;
        Self::fold(&mut merged.dev_deps, &base.dev_deps, &preset_label, &mut merged.resolutions)?;
        merged.env.extend(base.env.iter().cloned());

        for module in modules {
            Self::fold(&mut merged.deps, &module.deps, &module.name, &mut merged.resolutions)?;
            Self::fold(&mut merged.dev_deps, &module.dev_deps, &module.name, &mut merged.resolutions)?;
            merged.env.extend(module.env.iter().cloned());
        }

        debug!(
            deps = merged.deps.len(),
            dev_deps = merged.dev_deps.len(),
            env = merged.env.len(),
            resolutions = merged.resolutions.len(),
            "Merged manifests"
        );
        Ok(merged)
    }

    /// Fold one contributor's declarations into the accumulator
    fn fold(
        acc: &mut DependencyMap,
        incoming: &DependencyMap,
        contributor: &str,
        resolutions: &mut Vec<VersionResolution>,
    ) -> Result<()> {
        for (package, spec) in incoming {
            let Some(existing) = acc.get(package) else {
                acc.insert(package.clone(), spec.clone());
                continue;
            };

            if existing == spec {
                continue;
            }

            let kept = Self::reconcile(package, existing, spec, contributor)?;
            let discarded = if kept == *existing { spec.clone() } else { existing.clone() };
            resolutions.push(VersionResolution {
                package: package.clone(),
                kept: kept.clone(),
                discarded,
                contributor: contributor.to_string(),
            });
            acc.insert(package.clone(), kept);
        }
        Ok(())
    }

    /// Pick the winning spec for two different declarations of `package`
    pub fn reconcile(
        package: &str,
        existing: &str,
        incoming: &str,
        contributor: &str,
    ) -> Result<String> {
        if existing == incoming {
            return Ok(existing.to_string());
        }

        match (SimpleSpec::parse(existing), SimpleSpec::parse(incoming)) {
            (Some(a), Some(b)) => {
                let winner = if b > a { incoming } else { existing };
                Ok(winner.to_string())
            }
            _ => Err(AssemblyError::DependencyVersionConflict {
                package: package.to_string(),
                existing: existing.to_string(),
                incoming: incoming.to_string(),
                contributor: contributor.to_string(),
            }),
        }
    }
}
