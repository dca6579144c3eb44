//! Codec resolution through the engine, including caller-defined codecs.

use crate::common::*;
use modelvault::codec::standard_codecs;
use modelvault::{
    AttrValue, Codec, CodecDescriptor, CodecRegistry, Container, Decoded, Error, Node, Payload,
    PersistenceEngine, Result, SaveOptions, Value,
};
use std::sync::Arc;

/// Stores strings verbatim in a `text` attribute
struct TextCodec {
    tag: &'static str,
    priority: i32,
}

impl Codec for TextCodec {
    fn descriptor(&self) -> CodecDescriptor {
        CodecDescriptor {
            tag: self.tag,
            priority: self.priority,
            ordered_children: false,
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Value(Value::String(_)))
    }

    fn encode(&self, node: &Node, payload: Payload) -> Result<()> {
        match payload {
            Payload::Value(Value::String(s)) => node.set_attr("text", s),
            other => Err(Error::Encode {
                codec: "text",
                reason: format!("unexpected {}", other.kind()),
            }),
        }
    }

    fn decode(&self, node: &Node) -> Result<Decoded> {
        let text = node.require_attr("text")?;
        Ok(Decoded::Value(Value::from(text.as_str().unwrap_or_default())))
    }
}

fn text_codec(tag: &'static str, priority: i32) -> Arc<dyn Codec> {
    Arc::new(TextCodec { tag, priority })
}

fn engine_with(codecs: Vec<Arc<dyn Codec>>) -> PersistenceEngine {
    PersistenceEngine::new(Arc::new(CodecRegistry::new(codecs).unwrap()))
}

fn saved_tag(engine: &PersistenceEngine, value: Value) -> String {
    let c = Container::in_memory();
    engine.save(&c.root(), value, SaveOptions::new()).unwrap();
    engine.load_envelope(&c.root()).unwrap().codec_tag
}

#[test]
fn custom_codec_outranks_json() {
    let mut codecs = standard_codecs(32768);
    codecs.push(text_codec("text", 0));
    let e = engine_with(codecs);

    assert_eq!(saved_tag(&e, Value::from("hello")), "text");
    assert_eq!(saved_tag(&e, Value::Int(1)), "json");

    let c = Container::in_memory();
    e.save(&c.root(), Value::from("hello"), SaveOptions::new()).unwrap();
    assert_eq!(c.root().attr("text").unwrap(), Some(AttrValue::from("hello")));
    assert_eq!(e.load(&c.root()).unwrap().into_value().unwrap(), Value::from("hello"));
}

#[test]
fn equal_priority_first_registered_wins_in_every_order() {
    let tags = ["first", "second", "third"];
    let orders = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    for order in orders {
        let codecs = order.iter().map(|&i| text_codec(tags[i], 7)).collect();
        let e = engine_with(codecs);
        assert_eq!(saved_tag(&e, Value::from("x")), tags[order[0]]);
    }
}

#[test]
fn lower_priority_codec_never_shadows_higher() {
    let e = engine_with(vec![text_codec("low", -1), text_codec("high", 1)]);
    assert_eq!(saved_tag(&e, Value::from("x")), "high");
}

#[test]
fn load_resolves_by_stored_tag_not_by_value() {
    let writer = engine_with(vec![text_codec("low", -1), text_codec("high", 1)]);
    let c = Container::in_memory();
    writer
        .save(
            &c.root(),
            Value::from("x"),
            SaveOptions::new().codec(text_codec("low", -1)),
        )
        .unwrap();
    assert_eq!(writer.load_envelope(&c.root()).unwrap().codec_tag, "low");
    assert_eq!(writer.codec_for(&c.root()).unwrap().tag(), "low");
}

#[test]
fn unresolvable_value_is_an_error() {
    let e = engine_with(vec![text_codec("text", 0)]);
    let c = Container::in_memory();
    let err = e.save(&c.root(), Value::Int(3), SaveOptions::new()).unwrap_err();
    assert!(matches!(err, Error::NoCodec { kind: "Int" }));
    assert!(c.root().is_empty().unwrap());
}

#[test]
fn unknown_stored_tag_is_an_error() {
    let c = Container::in_memory();
    engine()
        .save(&c.root(), Value::from("x"), SaveOptions::new())
        .unwrap();

    let e = engine_with(vec![text_codec("text", 0)]);
    assert!(matches!(e.load(&c.root()), Err(Error::UnknownCodecTag(tag)) if tag == "json"));
}

#[test]
fn duplicate_tags_are_rejected() {
    let err = CodecRegistry::new(vec![text_codec("dup", 0), text_codec("dup", 5)]).unwrap_err();
    assert!(matches!(err, Error::DuplicateCodecTag(_)));
}
