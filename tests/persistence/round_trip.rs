//! Every codec reproduces what it saved.

use crate::common::*;
use modelvault::{Container, Error, NdArray, OpenMode, SaveOptions, Value};
use proptest::prelude::*;

fn round_trip(value: Value) -> Value {
    let t = TestPath::new("v.mvlt");
    let e = engine();
    e.save(&t.path, value, SaveOptions::new()).unwrap();
    e.load_map(&t.path, |d| d.into_value()).unwrap()
}

#[test]
fn json_scalars_round_trip() {
    for v in [
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(0),
        Value::Int(i64::MIN),
        Value::Int(i64::MAX),
        Value::Float(0.1),
        Value::Float(-1e300),
        Value::from(""),
        Value::from("héllo wörld ✓"),
    ] {
        assert_eq!(round_trip(v.clone()), v);
    }
}

#[test]
fn json_composites_round_trip() {
    let nested = map(&[
        ("list", Value::List(vec![Value::Int(1), Value::from("two"), Value::Null])),
        ("inner", map(&[("x", Value::Float(1.5)), ("y", Value::List(vec![]))])),
        ("empty", map(&[])),
    ]);
    assert_eq!(round_trip(nested.clone()), nested);
}

#[test]
fn json_loads_eagerly_from_path() {
    let t = TestPath::new("v.mvlt");
    let e = engine();
    e.save(&t.path, Value::List(vec![Value::Int(1)]), SaveOptions::new())
        .unwrap();
    // Scalar payloads do not need the container to stay open
    let decoded = e.load(&t.path).unwrap();
    assert_eq!(decoded.as_value(), Some(&Value::List(vec![Value::Int(1)])));
}

#[test]
fn bytes_round_trip() {
    for len in [0usize, 1, 100, 32768, 100_000] {
        let data = pattern(len);
        assert_eq!(round_trip(Value::Bytes(data.clone())), Value::Bytes(data));
    }
}

#[test]
fn ndarray_round_trip() {
    for array in sample_arrays() {
        let t = TestPath::new("a.mvlt");
        let e = engine();
        e.save(&t.path, array.clone(), SaveOptions::new()).unwrap();
        let loaded = e.load(&t.path).unwrap().into_value().unwrap();
        assert_eq!(loaded, Value::Array(array));
    }
}

#[test]
fn array_list_round_trip() {
    let arrays = sample_arrays();
    let t = TestPath::new("w.mvlt");
    let e = engine();
    e.save(&t.path, arrays.clone(), SaveOptions::new()).unwrap();

    let loaded = e
        .load_map(&t.path, |d| d.into_arrays().expect("arrays").collect_all())
        .unwrap();
    assert_eq!(loaded, arrays);
}

#[test]
fn array_list_keeps_insertion_order_beyond_ten_items() {
    let arrays: Vec<NdArray> = (0..25i64).map(|i| NdArray::from_vec(vec![i])).collect();
    let t = TestPath::new("w.mvlt");
    let e = engine();
    e.save_weights(&t.path, arrays.clone(), SaveOptions::new())
        .unwrap();

    let loaded = e
        .load_map(&t.path, |d| d.into_arrays().expect("arrays").collect_all())
        .unwrap();
    assert_eq!(loaded, arrays);
}

#[test]
fn array_list_rejects_non_array_elements() {
    let t = TestPath::new("w.mvlt");
    let items = Value::List(vec![
        Value::Array(NdArray::from_vec(vec![1i64])),
        Value::from("not an array"),
    ]);
    let err = engine()
        .save(
            &t.path,
            items,
            SaveOptions::new().codec(engine().registry().array_list_codec().unwrap()),
        )
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { index: 1, .. }));
}

#[test]
fn container_subtree_round_trip() {
    let src = Container::in_memory();
    let group = src.root().create_child("group").unwrap();
    group.set_attr("name", "encoder").unwrap();
    group
        .create_dataset("w", NdArray::from_vec(vec![0.5f32, 0.25]))
        .unwrap();

    let t = TestPath::new("c.mvlt");
    let e = engine();
    e.save(&t.path, &group, SaveOptions::new()).unwrap();

    let (name, weights) = e
        .load_with(&t.path, |d, _| {
            let node = d.into_node().expect("node");
            let name = node.require_attr("name")?;
            let weights = node.child("w")?.data()?;
            Ok((name, weights))
        })
        .unwrap();
    assert_eq!(name.as_str(), Some("encoder"));
    assert_eq!(weights, Some(NdArray::from_vec(vec![0.5f32, 0.25])));

    // Raw layout: the subtree sits under a child named "value"
    let c = Container::open(&t.path, OpenMode::ReadOnly).unwrap();
    assert!(c.root().has_child("value").unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn json_maps_of_scalars_round_trip(
        entries in proptest::collection::btree_map(
            "[a-z]{1,8}",
            prop_oneof![
                any::<i64>().prop_map(Value::Int),
                any::<bool>().prop_map(Value::Bool),
                (-1e12f64..1e12).prop_map(Value::Float),
                "[ -~]{0,16}".prop_map(Value::String),
            ],
            0..8,
        )
    ) {
        let value = Value::Map(entries);
        prop_assert_eq!(round_trip(value.clone()), value);
    }
}
