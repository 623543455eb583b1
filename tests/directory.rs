//! Merging directories of markdown documents.

use std::{fs, path::Path};

use aligned::{LoadError, Specification, load, parse_directory};

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn titles(spec: &Specification) -> Vec<String> {
    spec.roots().map(|s| s.title().to_string()).collect()
}

#[test]
fn subdirectory_without_parent_document_gets_synthesized_section() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("main.md"),
        "# Main Project\n\n## Overview\n\nWhat it does.\n",
    );
    write(
        &dir.path().join("submodule/feature.md"),
        "# Submodule\n\n## Feature\n**Test:** `sub.TestFeature`\n",
    );

    let spec = parse_directory(dir.path()).unwrap();

    assert_eq!(titles(&spec), ["Main Project", "Submodule"]);

    let mut roots = spec.roots();
    let main = roots.next().unwrap();
    let children: Vec<_> = main.children().map(|c| c.title().to_string()).collect();
    assert_eq!(children, ["Overview"]);

    let synthesized = roots.next().unwrap();
    let children: Vec<_> = synthesized.children().collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].title(), "Submodule");

    let feature = children[0].children().next().unwrap();
    assert_eq!(feature.title(), "Feature");
    assert_eq!(feature.test_reference(), Some("sub.TestFeature"));
}

#[test]
fn parent_document_hosts_its_siblings() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("cli/cli.md"),
        "# CLI Commands\n\nThe command line surface.\n",
    );
    write(&dir.path().join("cli/check.md"), "# Check\n\n## Exit code\n");
    write(&dir.path().join("cli/show.md"), "# Show\n");

    let spec = parse_directory(dir.path()).unwrap();

    assert_eq!(titles(&spec), ["CLI Commands"]);
    let root = spec.roots().next().unwrap();
    let children: Vec<_> = root.children().map(|c| c.title().to_string()).collect();
    assert_eq!(children, ["Check", "Show"]);

    let check = root.children().next().unwrap();
    assert!(check.level() > root.level());
    let exit_code = check.children().next().unwrap();
    assert_eq!(exit_code.title(), "Exit code");
    assert!(exit_code.level() > check.level());
}

#[test]
fn other_sections_of_parent_document_become_children() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("cli/cli.md"), "# CLI\n# Appendix\n## Note\n");
    write(&dir.path().join("cli/check.md"), "# Check\n");

    let spec = parse_directory(dir.path()).unwrap();

    assert_eq!(titles(&spec), ["CLI"]);
    let root = spec.roots().next().unwrap();
    assert_eq!(root.level(), 1);
    let children: Vec<_> = root.children().collect();
    let names: Vec<_> = children.iter().map(|c| c.title()).collect();
    assert_eq!(names, ["Appendix", "Check"]);
    assert!(children.iter().all(|c| c.level() == 2));

    let note = children[0].children().next().unwrap();
    assert_eq!(note.title(), "Note");
    assert_eq!(note.level(), 3);
}

#[test]
fn parent_document_children_are_renormalized() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("cli/cli.md"), "# CLI\n#### Usage\n# Appendix\n");
    write(&dir.path().join("cli/check.md"), "# Check\n");

    let spec = parse_directory(dir.path()).unwrap();

    let root = spec.roots().next().unwrap();
    let children: Vec<_> = root.children().collect();
    let shape: Vec<_> = children.iter().map(|c| (c.title(), c.level())).collect();
    assert_eq!(shape, [("Usage", 2), ("Appendix", 2), ("Check", 2)]);
}

#[test]
fn entries_are_merged_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("b.md"), "# Beta\n");
    write(&dir.path().join("a.md"), "# Alpha\n");
    write(&dir.path().join("c_dir/x.md"), "# Gamma\n");

    let spec = parse_directory(dir.path()).unwrap();

    assert_eq!(titles(&spec), ["Alpha", "Beta", "C Dir"]);
}

#[test]
fn root_documents_keep_authored_levels() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("deep.md"), "### Deep\n#### Deeper\n");

    let spec = parse_directory(dir.path()).unwrap();
    let root = spec.roots().next().unwrap();

    assert_eq!(root.level(), 3);
    assert_eq!(root.children().next().unwrap().level(), 4);
}

#[test]
fn empty_subdirectories_contribute_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("empty/nested")).unwrap();
    write(&dir.path().join("spec.md"), "# Spec\n");

    let spec = parse_directory(dir.path()).unwrap();

    assert_eq!(titles(&spec), ["Spec"]);
}

#[test]
fn load_accepts_files_and_directories() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("spec.md");
    write(&file, "# Spec\n## Leaf\n");

    let from_file = load(&file).unwrap();
    let from_dir = load(dir.path()).unwrap();

    assert_eq!(titles(&from_file), titles(&from_dir));
    assert_eq!(from_file.len(), from_dir.len());
    assert_eq!(from_file.source(), Some(file.as_path()));
    assert_eq!(from_dir.source(), Some(dir.path()));
}

#[test]
fn missing_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere");

    assert!(matches!(load(&missing), Err(LoadError::NotFound(path)) if path == missing));
}

#[cfg(unix)]
#[test]
fn unreadable_file_aborts_the_merge() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("ok.md"), "# Fine\n");
    let locked = dir.path().join("locked.md");
    write(&locked, "# Locked\n");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not restrict root.
    if fs::read_to_string(&locked).is_ok() {
        return;
    }

    assert!(matches!(
        parse_directory(dir.path()),
        Err(LoadError::Io { path, .. }) if path == locked
    ));
}
