//! Name allocation and temporary handles.

use crate::common::*;
use modelvault::{NameAllocator, SaveOptions, TempModelFile, Value};
use std::collections::HashSet;
use std::path::PathBuf;

#[test]
fn generated_names_never_repeat_or_collide() {
    let mut names = NameAllocator::ephemeral().unwrap();

    // Pre-existing files in the root are never handed out
    let mut existing = HashSet::new();
    for i in 0..20 {
        let path = names.root().join(format!("existing-{}.mvlt", i));
        std::fs::write(&path, b"").unwrap();
        existing.insert(path);
    }

    let generated: Vec<PathBuf> = names.iter(".mvlt").take(500).map(|r| r.unwrap()).collect();
    let unique: HashSet<&PathBuf> = generated.iter().collect();
    assert_eq!(unique.len(), 500);
    assert!(generated.iter().all(|p| !existing.contains(p)));
    assert_eq!(names.names().count(), 500);
}

#[test]
fn ephemeral_root_is_removed_after_scope() {
    let root;
    {
        let mut names = NameAllocator::ephemeral().unwrap();
        root = names.root().to_path_buf();
        let e = engine();
        for _ in 0..3 {
            let path = names.next(".mvlt").unwrap();
            e.save(&path, Value::Int(1), SaveOptions::new()).unwrap();
        }
        assert!(root.exists());
    }
    assert!(!root.exists());
}

#[test]
fn explicit_close_reports_success() {
    let mut names = NameAllocator::ephemeral().unwrap();
    let root = names.root().to_path_buf();
    std::fs::create_dir(names.next("").unwrap()).unwrap();
    names.close().unwrap();
    assert!(!root.exists());
}

#[test]
fn fixed_root_survives_close() {
    let t = TestPath::new("unused");
    let mut names = NameAllocator::fixed_root(t.dir.path()).unwrap();
    let path = names.next(".mvlt").unwrap();
    engine().save(&path, Value::Null, SaveOptions::new()).unwrap();

    names.close().unwrap();
    assert!(t.dir.path().is_dir());
    assert!(path.is_file());
}

#[test]
fn temp_model_file_lifecycle() {
    let file = TempModelFile::new(engine()).unwrap();
    let path = file.path().to_path_buf();
    let root = path.parent().unwrap().to_path_buf();

    file.save(map(&[("a", Value::Int(1))]), SaveOptions::new()).unwrap();
    assert_eq!(file.load().unwrap().into_value().unwrap(), map(&[("a", Value::Int(1))]));

    file.close().unwrap();
    assert!(!path.exists());
    assert!(!root.exists());
}
