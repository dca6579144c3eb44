//! Metadata envelope stamped on every saved node
//!
//! Every node written by the engine carries five root attributes:
//!
//! | Attribute | Content |
//! |-----------|---------|
//! | `app_tag` | always `"modelvault"` |
//! | `codec_tag` | tag of the codec that wrote the payload |
//! | `created_at` | RFC 3339 UTC timestamp of the first write |
//! | `updated_at` | RFC 3339 UTC timestamp of the latest write |
//! | `meta` | caller metadata as JSON text, `{}` by default |
//!
//! `created_at` is written once and carried forward across overwrites;
//! `created_at <= updated_at` always holds.

use chrono::{DateTime, SecondsFormat, Utc};
use modelvault_core::{Error, Result, Value};
use modelvault_storage::{AttrValue, Node};
use std::collections::BTreeMap;

/// Constant value of the `app_tag` attribute
pub const APP_TAG: &str = "modelvault";

/// Attribute names of the envelope
pub mod attrs {
    /// Application marker
    pub const APP_TAG: &str = "app_tag";
    /// Codec that wrote the payload
    pub const CODEC_TAG: &str = "codec_tag";
    /// First write
    pub const CREATED_AT: &str = "created_at";
    /// Latest write
    pub const UPDATED_AT: &str = "updated_at";
    /// Caller metadata (JSON text)
    pub const META: &str = "meta";
}

/// Envelope fields selectable through `load_info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoField {
    /// `app_tag`
    AppTag,
    /// `codec_tag`
    CodecTag,
    /// `created_at`
    CreatedAt,
    /// `updated_at`
    UpdatedAt,
    /// `meta`, decoded from JSON
    Meta,
}

impl InfoField {
    /// Every field, in attribute order
    pub const ALL: [InfoField; 5] = [
        InfoField::AppTag,
        InfoField::CodecTag,
        InfoField::CreatedAt,
        InfoField::UpdatedAt,
        InfoField::Meta,
    ];

    /// Attribute name backing this field
    pub fn attr_name(&self) -> &'static str {
        match self {
            InfoField::AppTag => attrs::APP_TAG,
            InfoField::CodecTag => attrs::CODEC_TAG,
            InfoField::CreatedAt => attrs::CREATED_AT,
            InfoField::UpdatedAt => attrs::UPDATED_AT,
            InfoField::Meta => attrs::META,
        }
    }
}

/// Selected envelope fields keyed by attribute name
pub type Info = BTreeMap<String, Value>;

/// Typed view of a node's envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Application marker
    pub app_tag: String,
    /// Codec that wrote the payload
    pub codec_tag: String,
    /// First write
    pub created_at: DateTime<Utc>,
    /// Latest write
    pub updated_at: DateTime<Utc>,
    /// Caller metadata; always a mapping
    pub meta: BTreeMap<String, Value>,
}

impl Envelope {
    /// Read the envelope stamped on `node`
    pub fn read(node: &Node) -> Result<Envelope> {
        Ok(Envelope {
            app_tag: read_str(node, attrs::APP_TAG)?,
            codec_tag: read_str(node, attrs::CODEC_TAG)?,
            created_at: read_timestamp(node, attrs::CREATED_AT)?,
            updated_at: read_timestamp(node, attrs::UPDATED_AT)?,
            meta: read_meta(node)?,
        })
    }

    /// Selected fields as plain values; timestamps stay in their stored
    /// text form.
    pub fn info(node: &Node, fields: &[InfoField]) -> Result<Info> {
        let mut info = Info::new();
        for field in fields {
            let value = match field {
                InfoField::Meta => Value::Map(read_meta(node)?),
                other => Value::String(read_str(node, other.attr_name())?),
            };
            info.insert(field.attr_name().to_string(), value);
        }
        Ok(info)
    }
}

/// Check that `meta` is a mapping (absent means empty)
pub fn validate_meta(meta: Option<Value>) -> Result<BTreeMap<String, Value>> {
    match meta {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Map(map)) => Ok(map),
        Some(other) => Err(Error::InvalidMeta {
            actual: other.type_name(),
        }),
    }
}

/// Stamp the envelope on `node`.
///
/// `created_at` is kept when the node already has one, otherwise taken from
/// `carried` (the timestamp of a file being overwritten) or set to now.
pub fn stamp(
    node: &Node,
    codec_tag: &str,
    meta: &BTreeMap<String, Value>,
    carried: Option<DateTime<Utc>>,
) -> Result<()> {
    let meta_text = Value::Map(meta.clone()).to_json_text()?;

    let now = Utc::now();
    let created_at = match node.attr(attrs::CREATED_AT)? {
        Some(AttrValue::Str(text)) => parse_timestamp(attrs::CREATED_AT, &text)?,
        _ => carried.unwrap_or(now),
    };
    let updated_at = now.max(created_at);

    node.set_attr(attrs::APP_TAG, APP_TAG)?;
    node.set_attr(attrs::CODEC_TAG, codec_tag)?;
    node.set_attr(attrs::CREATED_AT, format_timestamp(&created_at))?;
    node.set_attr(attrs::UPDATED_AT, format_timestamp(&updated_at))?;
    node.set_attr(attrs::META, meta_text)
}

/// RFC 3339 UTC with microseconds, e.g. `2024-01-02T03:04:05.000006Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(key: &str, text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Corruption(format!("attribute '{}' is not a timestamp: {}", key, e)))
}

fn read_str(node: &Node, key: &str) -> Result<String> {
    match node.require_attr(key)? {
        AttrValue::Str(s) => Ok(s),
        other => Err(Error::Corruption(format!(
            "attribute '{}' holds {} instead of text",
            key,
            other.type_name()
        ))),
    }
}

fn read_timestamp(node: &Node, key: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(key, &read_str(node, key)?)
}

/// Caller metadata stored on `node`
pub fn read_meta(node: &Node) -> Result<BTreeMap<String, Value>> {
    match Value::from_json_text(&read_str(node, attrs::META)?)? {
        Value::Map(map) => Ok(map),
        other => Err(Error::Corruption(format!(
            "stored meta is {} instead of a mapping",
            other.type_name()
        ))),
    }
}

/// `created_at` of an existing node, if it carries a well-formed one
pub fn created_at(node: &Node) -> Result<Option<DateTime<Utc>>> {
    match node.attr(attrs::CREATED_AT)? {
        Some(AttrValue::Str(text)) => Ok(DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))),
        _ => Ok(None),
    }
}
