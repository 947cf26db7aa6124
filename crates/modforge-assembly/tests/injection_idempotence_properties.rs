//! Property-based tests for anchor injection and full-run idempotence

use std::collections::BTreeMap;

use proptest::prelude::*;

use modforge_assembly::{
    inject_before_marker, AnchorDirective, AssemblyConfig, Catalogue, CatalogueHandle,
    DirectiveKind, ManifestLoader, Module, ModuleManifest, Preset, ProjectAssembler,
    SelectionRequest, TreeFile,
};

const MARKER: &str = "// MODULES";

/// Strategy for file content with the marker somewhere on its own line
fn anchored_content_strategy() -> impl Strategy<Value = (String, String, String)> {
    (
        "([a-z ;]{0,12}\n){0,4}",
        "[ \t]{0,4}",
        "(\n[a-z ;]{0,12}){0,4}\n?",
    )
}

fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z]{1,10},", 1..4)
}

fn assembler_for(names: &[String]) -> ProjectAssembler {
    let mut preset = Preset::new("base");
    preset.files.insert(
        "src/app.module.ts".to_string(),
        TreeFile::text("// IMPORTS\nexport const modules = [\n  // MODULES\n];\n"),
    );

    let mut builder = Catalogue::builder().preset(preset);
    for name in names {
        let mut manifest = ModuleManifest::new(name.clone());
        manifest.inject.insert(
            "src/app.module.ts".to_string(),
            vec![
                AnchorDirective {
                    target_file: "src/app.module.ts".to_string(),
                    kind: DirectiveKind::Import,
                    lines: vec![format!("import {{ {} }} from './{}';", name, name)],
                    anchor_marker: "// IMPORTS".to_string(),
                },
                AnchorDirective {
                    target_file: "src/app.module.ts".to_string(),
                    kind: DirectiveKind::Register,
                    lines: vec![format!("{},", name)],
                    anchor_marker: MARKER.to_string(),
                },
            ],
        );
        builder = builder.module(Module {
            manifest,
            files: BTreeMap::new(),
        });
    }

    let config = AssemblyConfig::default();
    let handle = CatalogueHandle::new(builder.build().unwrap(), ManifestLoader::new(&config));
    ProjectAssembler::new(handle, config)
}

proptest! {
    /// Injection only adds lines: removing them restores the original
    #[test]
    fn prop_injection_never_rewrites_existing_content(
        (before, indent, after) in anchored_content_strategy(),
        lines in lines_strategy(),
    ) {
        let content = format!("{}{}{}{}", before, indent, MARKER, after);
        let injected = inject_before_marker(&content, MARKER, &lines).unwrap();

        let block: String = lines.iter().map(|line| format!("{}{}\n", indent, line)).collect();
        prop_assert_eq!(injected.replacen(&block, "", 1), content);
    }

    /// Injecting into fresh copies of the same content is byte-identical
    #[test]
    fn prop_injection_is_deterministic(
        (before, indent, after) in anchored_content_strategy(),
        lines in lines_strategy(),
    ) {
        let content = format!("{}{}{}{}", before, indent, MARKER, after);
        prop_assert_eq!(
            inject_before_marker(&content, MARKER, &lines),
            inject_before_marker(&content, MARKER, &lines)
        );
    }

    /// Assembling the same selection twice yields identical trees, and the
    /// injected blocks follow the application order
    #[test]
    fn prop_assembly_is_idempotent(
        names in prop::collection::btree_set("[a-z]{1,8}", 0..6),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let assembler = assembler_for(&names);
        let request = SelectionRequest::new("base", "app").with_modules(names.iter().cloned());

        let first = assembler.assemble(&request).unwrap();
        let second = assembler.assemble(&request).unwrap();
        prop_assert_eq!(&first.tree, &second.tree);
        prop_assert_eq!(&first.application_order, &names);

        let content = first.tree.text("src/app.module.ts").unwrap();
        let positions: Vec<usize> = names
            .iter()
            .map(|name| content.find(&format!("  {},\n", name)).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
