//! Directory stores.

use crate::common::*;
use modelvault::{Error, InfoField, ModelStore, NdArray, SaveOptions, TempModelStore, Value};
use std::thread::sleep;
use std::time::Duration;

#[test]
fn store_operations_by_name() {
    let t = TestPath::new("unused");
    let store = ModelStore::open(t.dir.path().join("models"), engine()).unwrap();
    assert!(store.root().is_dir());

    store
        .save("config.mvlt", map(&[("layers", Value::Int(4))]), SaveOptions::new().meta(map(&[("v", Value::Int(1))])))
        .unwrap();
    store
        .save_weights("weights.mvlt", vec![NdArray::from_vec(vec![1.0f64])], SaveOptions::new())
        .unwrap();

    assert_eq!(
        store.load("config.mvlt").unwrap().into_value().unwrap(),
        map(&[("layers", Value::Int(4))])
    );
    assert_eq!(Value::Map(store.load_meta("config.mvlt").unwrap()), map(&[("v", Value::Int(1))]));
    assert_eq!(
        store.load_info("weights.mvlt", &[InfoField::CodecTag]).unwrap()["codec_tag"],
        Value::from("List[ndarray]")
    );
    let weights = store
        .load_map("weights.mvlt", |d| d.into_arrays().expect("arrays").collect_all())
        .unwrap();
    assert_eq!(weights, vec![NdArray::from_vec(vec![1.0f64])]);
}

#[test]
fn store_names_cannot_escape_root() {
    let t = TestPath::new("unused");
    let store = ModelStore::open(t.dir.path().join("models"), engine()).unwrap();

    for name in ["../outside.mvlt", "/tmp/abs.mvlt", "", "a/../../b"] {
        let err = store.save(name, Value::Null, SaveOptions::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)), "{:?} accepted", name);
    }
    assert!(!t.dir.path().join("outside.mvlt").exists());
}

#[test]
fn store_lists_by_modification_time() {
    let t = TestPath::new("unused");
    let store = ModelStore::open(t.dir.path(), engine()).unwrap();

    for name in ["first.mvlt", "second.mvlt", "third.mvlt"] {
        store.save(name, Value::from(name), SaveOptions::new()).unwrap();
        sleep(Duration::from_millis(20));
    }
    // Touch the first one again
    store
        .save("first.mvlt", Value::Null, SaveOptions::new().overwrite(true))
        .unwrap();

    let names: Vec<String> = store
        .list_by_updated_at(true)
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["first.mvlt", "third.mvlt", "second.mvlt"]);
}

#[test]
fn temp_store_generates_and_cleans_up() {
    let mut store = TempModelStore::new(engine()).unwrap();
    let root = store.root().to_path_buf();

    let a = store.file(None, ".mvlt").unwrap();
    let b = store.file(None, ".mvlt").unwrap();
    assert_ne!(a.path(), b.path());
    a.save(Value::Int(1), SaveOptions::new()).unwrap();
    b.save(Value::Int(2), SaveOptions::new()).unwrap();

    let named = store.file(Some("best"), ".mvlt").unwrap();
    named.save(Value::Int(3), SaveOptions::new()).unwrap();
    assert_eq!(store.load("best.mvlt").unwrap().into_value().unwrap(), Value::Int(3));
    assert_eq!(store.list_by_updated_at(false).unwrap().len(), 3);

    drop(store);
    assert!(!root.exists());
}
