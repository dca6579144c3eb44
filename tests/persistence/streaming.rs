//! Chunked byte streams, array lists and lazy cursors.

use crate::common::*;
use modelvault::{Container, Decoded, Error, LazyChunkCursor, NdArray, OpenMode, Payload, SaveOptions, Value};
use std::io::Cursor;

const CHUNK: usize = 32768;

fn chunk_count(len: usize) -> usize {
    let t = TestPath::new("b.mvlt");
    engine()
        .save(&t.path, Value::Bytes(pattern(len)), SaveOptions::new())
        .unwrap();
    let c = Container::open(&t.path, OpenMode::ReadOnly).unwrap();
    c.root().len().unwrap()
}

#[test]
fn chunk_boundaries() {
    assert_eq!(chunk_count(0), 0);
    assert_eq!(chunk_count(CHUNK - 1), 1);
    assert_eq!(chunk_count(CHUNK), 1);
    assert_eq!(chunk_count(CHUNK + 1), 2);
    assert_eq!(chunk_count(3 * CHUNK), 3);
}

#[test]
fn chunk_layout_on_disk() {
    let t = TestPath::new("b.mvlt");
    engine()
        .save(&t.path, Value::Bytes(pattern(CHUNK + 10)), SaveOptions::new())
        .unwrap();

    let c = Container::open(&t.path, OpenMode::ReadOnly).unwrap();
    let root = c.root();
    assert_eq!(root.require_attr("chunksize").unwrap().as_int(), Some(32768));
    assert_eq!(root.child_names().unwrap(), vec!["0000000000", "0000000001"]);
    let last = root.child("0000000001").unwrap().require_attr("value").unwrap();
    assert_eq!(last.as_opaque().map(<[u8]>::len), Some(10));
}

#[test]
fn stream_and_buffer_store_the_same_chunks() {
    let data = pattern(2 * CHUNK + 123);
    let e = engine();

    let buffered = Container::in_memory();
    e.save(&buffered.root(), Value::Bytes(data.clone()), SaveOptions::new())
        .unwrap();
    let streamed = Container::in_memory();
    e.save(&streamed.root(), Payload::stream(Cursor::new(data.clone())), SaveOptions::new())
        .unwrap();

    let chunks = |c: &Container| {
        e.load(&c.root())
            .unwrap()
            .into_chunks()
            .unwrap()
            .collect_all()
            .unwrap()
    };
    assert_eq!(chunks(&buffered), chunks(&streamed));
    assert_eq!(chunks(&streamed).concat(), data);
}

#[test]
fn save_file_round_trip() {
    let t = TestPath::new("b.mvlt");
    let src = t.dir.path().join("weights.bin");
    let data = pattern(100_000);
    std::fs::write(&src, &data).unwrap();

    let e = engine();
    e.save_file(&t.path, &src, SaveOptions::new()).unwrap();
    let loaded = e
        .load_with(&t.path, |d, _| d.into_chunks().expect("chunks").read_to_vec())
        .unwrap();
    assert_eq!(loaded, data);
}

#[test]
fn save_file_missing_source_creates_nothing() {
    let t = TestPath::new("b.mvlt");
    let err = engine()
        .save_file(&t.path, t.dir.path().join("missing.bin"), SaveOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!t.path.exists());
}

#[test]
fn lazy_codecs_refuse_plain_load_from_path() {
    let e = engine();

    let bytes = TestPath::new("b.mvlt");
    e.save(&bytes.path, Value::Bytes(vec![1]), SaveOptions::new()).unwrap();
    assert!(matches!(e.load(&bytes.path), Err(Error::Usage(_))));

    let arrays = TestPath::new("w.mvlt");
    e.save_weights(&arrays.path, sample_arrays(), SaveOptions::new()).unwrap();
    assert!(matches!(e.load(&arrays.path), Err(Error::Usage(_))));

    let container = TestPath::new("c.mvlt");
    let src = Container::in_memory();
    src.root().set_attr("k", 1i64).unwrap();
    e.save(&container.path, &src.root(), SaveOptions::new()).unwrap();
    assert!(matches!(e.load(&container.path), Err(Error::Usage(_))));

    // Eager transforms are allowed for every codec
    assert_eq!(
        e.load_map(&bytes.path, |d| d.into_value()).unwrap(),
        Value::Bytes(vec![1])
    );
}

fn escaped_cursor() -> LazyChunkCursor<Vec<u8>> {
    let t = TestPath::new("b.mvlt");
    let e = engine();
    e.save(&t.path, Value::Bytes(pattern(CHUNK * 2)), SaveOptions::new())
        .unwrap();
    // The cursor outlives the scoped open
    e.load_with(&t.path, |d, _| Ok(d.into_chunks().expect("chunks")))
        .unwrap()
}

#[test]
fn closed_cursor_fails_on_every_attempt() {
    let cursor = escaped_cursor();
    assert!(!cursor.is_open());
    for _ in 0..3 {
        assert!(matches!(cursor.iter(), Err(Error::AlreadyClosed)));
        assert!(matches!(cursor.collect_all(), Err(Error::AlreadyClosed)));
        assert!(matches!(cursor.read_to_vec(), Err(Error::AlreadyClosed)));
    }
}

#[test]
fn cursor_is_restartable_while_open() {
    let t = TestPath::new("b.mvlt");
    let e = engine();
    let data = pattern(CHUNK + 5);
    e.save(&t.path, Value::Bytes(data.clone()), SaveOptions::new())
        .unwrap();

    let c = Container::open(&t.path, OpenMode::ReadOnly).unwrap();
    let cursor = e.load(&c.root()).unwrap().into_chunks().unwrap();
    assert_eq!(cursor.read_to_vec().unwrap(), data);
    assert_eq!(cursor.read_to_vec().unwrap(), data);
    assert_eq!(cursor.iter().unwrap().count(), 2);

    c.close().unwrap();
    assert!(matches!(cursor.read_to_vec(), Err(Error::AlreadyClosed)));
    assert!(matches!(cursor.read_to_vec(), Err(Error::AlreadyClosed)));
}

#[test]
fn array_cursor_closes_with_container() {
    let c = Container::in_memory();
    let e = engine();
    e.save_weights(&c.root(), sample_arrays(), SaveOptions::new()).unwrap();

    let decoded = e.load(&c.root()).unwrap();
    assert_eq!(decoded.kind(), "Arrays");
    let cursor = match decoded {
        Decoded::Arrays(cursor) => cursor,
        other => panic!("unexpected {}", other.kind()),
    };
    assert_eq!(cursor.len().unwrap(), sample_arrays().len());

    c.close().unwrap();
    for _ in 0..2 {
        assert!(matches!(cursor.collect_all(), Err(Error::AlreadyClosed)));
    }
}

#[test]
fn sequence_payload_is_saved_as_array_list() {
    let c = Container::in_memory();
    let e = engine();
    let arrays: Vec<NdArray> = (0..3u32).map(|i| NdArray::from_vec(vec![i; 2])).collect();
    e.save(&c.root(), Payload::sequence(arrays.clone()), SaveOptions::new())
        .unwrap();

    let cursor = e.load(&c.root()).unwrap().into_arrays().unwrap();
    assert_eq!(cursor.collect_all().unwrap(), arrays);
}

#[test]
fn empty_weights_have_no_children() {
    let t = TestPath::new("w.mvlt");
    let e = engine();
    e.save_weights(&t.path, Vec::<NdArray>::new(), SaveOptions::new())
        .unwrap();
    let loaded = e
        .load_map(&t.path, |d| d.into_arrays().expect("arrays").collect_all())
        .unwrap();
    assert!(loaded.is_empty());
}
