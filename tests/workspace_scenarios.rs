//! Workspace store scenarios through the public API.

use blink::workspace::{language_for_path, WorkspaceStore};
use tempfile::TempDir;

#[test]
fn create_then_read_scenario() {
    let temp = TempDir::new().unwrap();
    let store = WorkspaceStore::new(temp.path().join("workspace")).unwrap();

    let written = store.write("sensors/temperature.ts", "export const x = 1;\n").unwrap();
    assert!(written.ends_with("sensors/temperature.ts"));

    assert_eq!(
        store.read("sensors/temperature.ts").unwrap().as_deref(),
        Some("export const x = 1;\n")
    );
    assert_eq!(store.list_dirs(".").unwrap(), vec!["sensors".to_string()]);
    assert_eq!(store.list("sensors").unwrap(), vec!["sensors/temperature.ts".to_string()]);
}

#[test]
fn empty_workspace_lists_nothing() {
    let temp = TempDir::new().unwrap();
    let store = WorkspaceStore::new(temp.path().join("empty")).unwrap();
    assert!(store.list(".").unwrap().is_empty());
    assert!(store.list_dirs(".").unwrap().is_empty());
    assert!(store.read("anything.txt").unwrap().is_none());
}

#[test]
fn absolute_and_relative_paths_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = WorkspaceStore::new(temp.path().join("workspace")).unwrap();

    store.write("relative.txt", "inside").unwrap();
    assert!(temp.path().join("workspace/relative.txt").is_file());

    let outside = temp.path().join("elsewhere/outside.txt");
    store.write(outside.to_str().unwrap(), "outside").unwrap();
    assert_eq!(
        store.read(outside.to_str().unwrap()).unwrap().as_deref(),
        Some("outside")
    );
}

#[test]
fn modify_rejects_missing_targets_but_rewrites_existing_ones() {
    let temp = TempDir::new().unwrap();
    let store = WorkspaceStore::new(temp.path().join("workspace")).unwrap();

    assert!(store.modify("ghost.rs", "x").is_err());

    store.write("real.rs", "fn a() {}").unwrap();
    store.modify("real.rs", "fn b() {}").unwrap();
    assert_eq!(store.read("real.rs").unwrap().as_deref(), Some("fn b() {}"));
}

#[test]
fn language_table_covers_the_supported_extensions() {
    assert_eq!(language_for_path("a/b/service.ts"), "TypeScript");
    assert_eq!(language_for_path("component.TSX"), "TypeScript (React)");
    assert_eq!(language_for_path("script.py"), "Python");
    assert_eq!(language_for_path("main.rs"), "Rust");
    assert_eq!(language_for_path("Makefile"), "Unknown");
}
