//! Values going into and coming out of the engine
//!
//! [`Payload`] is what `save` accepts: a [`Value`], a byte stream, a
//! container subtree, or an arbitrary sequence. [`Decoded`] is what `load`
//! produces; streaming codecs return lazy cursors that read from the
//! container only when iterated.

use crate::cursor::LazyChunkCursor;
use modelvault_core::{Error, NdArray, Result, Value};
use modelvault_storage::Node;
use std::io::Read;

/// Input to a save
pub enum Payload {
    /// In-memory value
    Value(Value),
    /// Buffered byte-readable stream, consumed until exhausted
    Stream(Box<dyn Read + Send>),
    /// Container subtree, deep-copied on save
    Node(Node),
    /// Arbitrary ordered sequence of values
    Sequence(Box<dyn Iterator<Item = Value> + Send>),
}

impl Payload {
    /// Wrap a byte stream
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Payload::Stream(Box::new(reader))
    }

    /// Wrap any iterable whose items convert into values
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        I::IntoIter: Send + 'static,
        V: Into<Value> + 'static,
    {
        Payload::Sequence(Box::new(items.into_iter().map(Into::into)))
    }

    /// Kind name, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Value(v) => v.type_name(),
            Payload::Stream(_) => "Stream",
            Payload::Node(_) => "Node",
            Payload::Sequence(_) => "Sequence",
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Payload::Stream(_) => f.write_str("Stream(..)"),
            Payload::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Payload::Sequence(_) => f.write_str("Sequence(..)"),
        }
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Value(v)
    }
}

impl From<NdArray> for Payload {
    fn from(a: NdArray) -> Self {
        Payload::Value(Value::Array(a))
    }
}

impl From<Vec<NdArray>> for Payload {
    fn from(arrays: Vec<NdArray>) -> Self {
        Payload::Value(Value::List(arrays.into_iter().map(Value::Array).collect()))
    }
}

impl From<Node> for Payload {
    fn from(n: Node) -> Self {
        Payload::Node(n)
    }
}

impl From<&Node> for Payload {
    fn from(n: &Node) -> Self {
        Payload::Node(n.clone())
    }
}

/// Output of a load
#[derive(Debug)]
pub enum Decoded {
    /// Fully materialized value
    Value(Value),
    /// Subtree inside the source container
    Node(Node),
    /// Lazy byte chunks
    Chunks(LazyChunkCursor<Vec<u8>>),
    /// Lazy array sequence
    Arrays(LazyChunkCursor<NdArray>),
}

impl Decoded {
    /// Kind name, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Decoded::Value(_) => "Value",
            Decoded::Node(_) => "Node",
            Decoded::Chunks(_) => "Chunks",
            Decoded::Arrays(_) => "Arrays",
        }
    }

    /// Materialize into a [`Value`].
    ///
    /// Chunks become one `Bytes`, arrays become a `List` of `Array`. Lazy
    /// variants read the container, so call this while it is open.
    pub fn into_value(self) -> Result<Value> {
        match self {
            Decoded::Value(v) => Ok(v),
            Decoded::Chunks(cursor) => Ok(Value::Bytes(cursor.read_to_vec()?)),
            Decoded::Arrays(cursor) => Ok(Value::List(
                cursor.collect_all()?.into_iter().map(Value::Array).collect(),
            )),
            Decoded::Node(_) => Err(Error::Usage(
                "a container subtree cannot be materialized as a value".to_string(),
            )),
        }
    }

    /// Borrow the value if already materialized
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Decoded::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Take the subtree handle
    pub fn into_node(self) -> Option<Node> {
        match self {
            Decoded::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Take the byte cursor
    pub fn into_chunks(self) -> Option<LazyChunkCursor<Vec<u8>>> {
        match self {
            Decoded::Chunks(c) => Some(c),
            _ => None,
        }
    }

    /// Take the array cursor
    pub fn into_arrays(self) -> Option<LazyChunkCursor<NdArray>> {
        match self {
            Decoded::Arrays(c) => Some(c),
            _ => None,
        }
    }
}
