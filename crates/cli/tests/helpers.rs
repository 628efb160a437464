use std::fs;
use std::path::Path;

use debuginfo::{canonicalize_or_current, infer_project_name};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_and_missing_paths() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let existing = canonicalize_or_current(subdir.to_str().unwrap()).expect("canonicalize");
    assert_eq!(existing, subdir.canonicalize().unwrap());

    let missing = canonicalize_or_current("does-not-exist-yet").expect("fallback");
    assert!(missing.is_absolute());
    assert!(missing.ends_with("does-not-exist-yet"));
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}
