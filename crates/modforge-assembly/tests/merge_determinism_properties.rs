//! Property-based tests for manifest merging
//!
//! The tie-break rule must be total and deterministic: simple specs resolve
//! to the higher one regardless of contributor order, anything else fails.

use proptest::prelude::*;

use modforge_assembly::{AssemblyError, BaseManifest, ManifestMerger, ModuleManifest};

/// Strategy for `^x.y.z` / `~x.y.z` specs
fn simple_spec_strategy() -> impl Strategy<Value = String> {
    (prop_oneof![Just('^'), Just('~')], 0u64..4, 0u64..4, 0u64..4)
        .prop_map(|(op, major, minor, patch)| format!("{}{}.{}.{}", op, major, minor, patch))
}

/// Strategy for specs outside the simple form
fn exotic_spec_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u64..4, 0u64..4, 0u64..4).prop_map(|(a, b, c)| format!("{}.{}.{}", a, b, c)),
        (0u64..4, "[a-z]{1,6}").prop_map(|(a, tag)| format!("^{}.0.0-{}", a, tag)),
        (0u64..4).prop_map(|a| format!(">={}.0.0", a)),
        Just("latest".to_string()),
    ]
}

fn module(name: &str, package: &str, spec: &str) -> ModuleManifest {
    let mut manifest = ModuleManifest::new(name);
    manifest.deps.insert(package.to_string(), spec.to_string());
    manifest
}

/// Numeric ordering key of a simple spec: version first, then `^` over `~`
fn rank(spec: &str) -> (u64, u64, u64, bool) {
    let caret = spec.starts_with('^');
    let parts: Vec<u64> = spec[1..].split('.').map(|p| p.parse().unwrap()).collect();
    (parts[0], parts[1], parts[2], caret)
}

proptest! {
    /// Two simple specs always merge to the higher one
    #[test]
    fn prop_higher_simple_spec_wins(
        first in simple_spec_strategy(),
        second in simple_spec_strategy(),
    ) {
        let a = module("a", "pkg", &first);
        let b = module("b", "pkg", &second);

        let merged = ManifestMerger::merge("base", &BaseManifest::default(), &[&a, &b]).unwrap();
        let expected = if rank(&second) > rank(&first) { &second } else { &first };
        prop_assert_eq!(&merged.deps["pkg"], expected);
    }

    /// Swapping contributor order never changes the resolved spec
    #[test]
    fn prop_simple_merge_is_commutative(
        first in simple_spec_strategy(),
        second in simple_spec_strategy(),
    ) {
        let a = module("a", "pkg", &first);
        let b = module("b", "pkg", &second);

        let forward = ManifestMerger::merge("base", &BaseManifest::default(), &[&a, &b]).unwrap();
        let backward = ManifestMerger::merge("base", &BaseManifest::default(), &[&b, &a]).unwrap();
        prop_assert_eq!(&forward.deps, &backward.deps);
    }

    /// A differing exotic spec is always a conflict naming the package
    #[test]
    fn prop_exotic_specs_conflict(
        base_spec in simple_spec_strategy(),
        exotic in exotic_spec_strategy(),
    ) {
        let mut base = BaseManifest::default();
        base.deps.insert("pkg".to_string(), base_spec.clone());
        let m = module("m", "pkg", &exotic);

        match ManifestMerger::merge("base", &base, &[&m]) {
            Err(AssemblyError::DependencyVersionConflict { package, existing, incoming, contributor }) => {
                prop_assert_eq!(package, "pkg");
                prop_assert_eq!(existing, base_spec);
                prop_assert_eq!(incoming, exotic);
                prop_assert_eq!(contributor, "m");
            }
            other => prop_assert!(false, "expected version conflict, got {:?}", other),
        }
    }

    /// Environment requirements merge to the same set in any order
    #[test]
    fn prop_env_union_is_order_independent(
        envs in prop::collection::vec(prop::collection::btree_set("[A-Z]{1,4}", 0..4), 1..5),
    ) {
        let modules: Vec<ModuleManifest> = envs
            .iter()
            .enumerate()
            .map(|(i, env)| {
                let mut manifest = ModuleManifest::new(format!("m{}", i));
                manifest.env = env.clone();
                manifest
            })
            .collect();
        let forward: Vec<&ModuleManifest> = modules.iter().collect();
        let backward: Vec<&ModuleManifest> = modules.iter().rev().collect();

        let a = ManifestMerger::merge("base", &BaseManifest::default(), &forward).unwrap();
        let b = ManifestMerger::merge("base", &BaseManifest::default(), &backward).unwrap();

        let expected: std::collections::BTreeSet<String> = envs.into_iter().flatten().collect();
        prop_assert_eq!(&a.env, &expected);
        prop_assert_eq!(&b.env, &expected);
    }
}

#[test]
fn test_documented_merge_examples() {
    let mut base = BaseManifest::default();
    base.deps.insert("x".to_string(), "^1.0.0".to_string());
    let m = module("M", "x", "^2.0.0");
    let merged = ManifestMerger::merge("base", &base, &[&m]).unwrap();
    assert_eq!(merged.deps["x"], "^2.0.0");

    let mut base = BaseManifest::default();
    base.deps.insert("x".to_string(), "1.2.3".to_string());
    let m = module("M", "x", "2.0.0-custom");
    let err = ManifestMerger::merge("base", &base, &[&m]).unwrap_err();
    assert!(matches!(err, AssemblyError::DependencyVersionConflict { ref package, .. } if package == "x"));
}
