//! Concurrent runs share only the catalogue snapshot

use std::fs;
use std::path::{Path, PathBuf};

use modforge_assembly::{AssemblyConfig, ProjectAssembler, SelectionRequest};
use tempfile::TempDir;

fn catalogue_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates/catalogue")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn assembler_at(root: &Path) -> ProjectAssembler {
    ProjectAssembler::from_config(AssemblyConfig {
        catalogue_root: root.to_path_buf(),
        ..AssemblyConfig::default()
    })
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_are_isolated() {
    let assembler = assembler_at(&catalogue_root());
    let selections: [&[&str]; 4] = [
        &["auth"],
        &["file-storage"],
        &["auth", "mailer"],
        &["auth", "no-auth"],
    ];

    let mut handles = Vec::new();
    for i in 0..16 {
        let assembler = assembler.clone();
        let modules = selections[i % selections.len()];
        let request = SelectionRequest::new("base", format!("project-{}", i)).with_modules(modules.iter().copied());
        handles.push(tokio::spawn(async move { (i, assembler.assemble_async(request).await) }));
    }

    for handle in handles {
        let (i, result) = handle.await.unwrap();
        let modules = selections[i % selections.len()];
        if modules.contains(&"no-auth") {
            assert_eq!(result.unwrap_err().error_kind(), "conflict");
            continue;
        }

        let project = result.unwrap();
        assert_eq!(project.project_name, format!("project-{}", i));
        assert!(project
            .tree
            .text("README.md")
            .unwrap()
            .starts_with(&format!("# project-{}\n", i)));

        let app_module = project.tree.text("src/app.module.ts").unwrap();
        assert_eq!(app_module.matches("AuthModule,").count(), usize::from(modules.contains(&"auth")));
        assert_eq!(app_module.matches("StorageModule,").count(), usize::from(modules.contains(&"file-storage")));
    }
}

#[tokio::test]
async fn test_reload_swaps_snapshot_for_new_runs_only() {
    let temp = TempDir::new().unwrap();
    copy_dir(&catalogue_root(), temp.path());
    let assembler = assembler_at(temp.path());

    let before = assembler.catalogue().snapshot();
    assert!(before.module("payments").is_none());

    let payments = temp.path().join("modules/payments");
    fs::create_dir_all(&payments).unwrap();
    fs::write(
        payments.join("module.json"),
        r#"{ "name": "payments", "deps": { "stripe": "^14.0.0" }, "env": ["STRIPE_KEY"] }"#,
    )
    .unwrap();

    assembler.catalogue().reload().unwrap();
    assert!(before.module("payments").is_none());

    let project = assembler
        .assemble_async(SelectionRequest::new("base", "shop").with_modules(["payments"]))
        .await
        .unwrap();
    assert_eq!(project.merged_manifest.deps["stripe"], "^14.0.0");
    assert!(project.required_env.contains(&"STRIPE_KEY".to_string()));
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_snapshot() {
    let temp = TempDir::new().unwrap();
    copy_dir(&catalogue_root(), temp.path());
    let assembler = assembler_at(temp.path());

    fs::write(temp.path().join("modules/auth/module.json"), "{ not json").unwrap();
    let err = assembler.catalogue().reload().unwrap_err();
    assert_eq!(err.kind(), "manifest_parse");

    let project = assembler
        .assemble_async(SelectionRequest::new("base", "shop").with_modules(["auth"]))
        .await
        .unwrap();
    assert_eq!(project.application_order, vec!["auth"]);
}
