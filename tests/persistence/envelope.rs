//! Metadata envelope: timestamps, meta and info fields.

use crate::common::*;
use modelvault::{Container, Error, InfoField, NdArray, OpenMode, SaveOptions, Value, APP_TAG};
use std::thread::sleep;
use std::time::Duration;

#[test]
fn meta_and_value_scenario() {
    let t = TestPath::new("m.mvlt");
    let e = engine();
    e.save(
        &t.path,
        map(&[("a", Value::Int(1))]),
        SaveOptions::new().meta(map(&[("k", Value::from("v"))])),
    )
    .unwrap();

    assert_eq!(Value::Map(e.load_meta(&t.path).unwrap()), map(&[("k", Value::from("v"))]));
    assert_eq!(e.load(&t.path).unwrap().into_value().unwrap(), map(&[("a", Value::Int(1))]));
}

#[test]
fn envelope_attributes_are_stamped() {
    let t = TestPath::new("m.mvlt");
    engine()
        .save(&t.path, NdArray::from_vec(vec![1u16, 2]), SaveOptions::new())
        .unwrap();

    let c = Container::open(&t.path, OpenMode::ReadOnly).unwrap();
    let root = c.root();
    assert_eq!(root.require_attr("app_tag").unwrap().as_str(), Some(APP_TAG));
    assert_eq!(root.require_attr("codec_tag").unwrap().as_str(), Some("ndarray"));
    assert_eq!(root.require_attr("meta").unwrap().as_str(), Some("{}"));

    let created = root.require_attr("created_at").unwrap();
    let created = created.as_str().unwrap();
    assert!(created.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
}

#[test]
fn created_at_survives_overwrite() {
    let t = TestPath::new("m.mvlt");
    let e = engine();

    e.save(&t.path, Value::Int(1), SaveOptions::new()).unwrap();
    let first = e.load_envelope(&t.path).unwrap();
    assert!(first.created_at <= first.updated_at);

    sleep(Duration::from_millis(5));
    e.save(&t.path, Value::from("replaced"), SaveOptions::new().overwrite(true))
        .unwrap();
    let second = e.load_envelope(&t.path).unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(e.load(&t.path).unwrap().into_value().unwrap(), Value::from("replaced"));
}

#[test]
fn overwrite_of_foreign_file_starts_fresh() {
    let t = TestPath::new("m.mvlt");
    std::fs::write(&t.path, b"not a container").unwrap();

    let e = engine();
    e.save(&t.path, Value::Int(1), SaveOptions::new().overwrite(true))
        .unwrap();
    let env = e.load_envelope(&t.path).unwrap();
    assert!(env.created_at <= env.updated_at);
}

#[test]
fn meta_must_be_a_mapping() {
    let e = engine();
    for bad in [Value::List(vec![Value::Int(1)]), Value::Int(7)] {
        let t = TestPath::new("m.mvlt");
        let err = e
            .save(&t.path, Value::Int(1), SaveOptions::new().meta(bad))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMeta { .. }));
        assert!(err.to_string().contains("meta must be a mapping"));
    }
}

#[test]
fn meta_with_nested_values() {
    let t = TestPath::new("m.mvlt");
    let e = engine();
    let meta = map(&[
        ("epoch", Value::Int(12)),
        ("tags", Value::List(vec![Value::from("a"), Value::from("b")])),
        ("optimizer", map(&[("lr", Value::Float(0.001))])),
    ]);
    e.save(&t.path, Value::Null, SaveOptions::new().meta(meta.clone()))
        .unwrap();
    assert_eq!(Value::Map(e.load_meta(&t.path).unwrap()), meta);
}

#[test]
fn load_info_defaults_to_every_field() {
    let t = TestPath::new("m.mvlt");
    let e = engine();
    e.save(&t.path, Value::Bytes(vec![1, 2, 3]), SaveOptions::new().meta(map(&[("x", Value::Int(1))])))
        .unwrap();

    let info = e.load_info(&t.path, &InfoField::ALL).unwrap();
    assert_eq!(info.len(), 5);
    assert_eq!(info["app_tag"], Value::from("modelvault"));
    assert_eq!(info["codec_tag"], Value::from("bytes"));
    assert_eq!(info["meta"], map(&[("x", Value::Int(1))]));
    assert!(info["created_at"].as_str().is_some());
    assert!(info["updated_at"].as_str().is_some());

    let subset = e.load_info(&t.path, &[InfoField::UpdatedAt]).unwrap();
    assert_eq!(subset.keys().collect::<Vec<_>>(), vec!["updated_at"]);
}

#[test]
fn envelope_reads_from_open_node() {
    let c = Container::in_memory();
    let e = engine();
    e.save(&c.root(), Value::Bool(true), SaveOptions::new()).unwrap();

    let env = e.load_envelope(&c.root()).unwrap();
    assert_eq!(env.codec_tag, "json");
    assert!(env.meta.is_empty());
    assert!(c.is_open());
}
