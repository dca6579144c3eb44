//! Dense numeric arrays
//!
//! An [`NdArray`] is a shape plus a typed, row-major element buffer. It is the
//! unit stored by the numeric-array codec (as one attribute) and by the
//! array-list codec (as one child dataset per element).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Element type of an [`NdArray`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl Dtype {
    /// Conventional short name (`"f64"`, `"i32"`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::I8 => "i8",
            Dtype::I16 => "i16",
            Dtype::I32 => "i32",
            Dtype::I64 => "i64",
            Dtype::U8 => "u8",
            Dtype::U16 => "u16",
            Dtype::U32 => "u32",
            Dtype::U64 => "u64",
            Dtype::F32 => "f32",
            Dtype::F64 => "f64",
        }
    }
}

/// Typed element buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayData {
    /// Boolean elements
    Bool(Vec<bool>),
    /// i8 elements
    I8(Vec<i8>),
    /// i16 elements
    I16(Vec<i16>),
    /// i32 elements
    I32(Vec<i32>),
    /// i64 elements
    I64(Vec<i64>),
    /// u8 elements
    U8(Vec<u8>),
    /// u16 elements
    U16(Vec<u16>),
    /// u32 elements
    U32(Vec<u32>),
    /// u64 elements
    U64(Vec<u64>),
    /// f32 elements
    F32(Vec<f32>),
    /// f64 elements
    F64(Vec<f64>),
}

impl ArrayData {
    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::I8(v) => v.len(),
            ArrayData::I16(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::U8(v) => v.len(),
            ArrayData::U16(v) => v.len(),
            ArrayData::U32(v) => v.len(),
            ArrayData::U64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
        }
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type
    pub fn dtype(&self) -> Dtype {
        match self {
            ArrayData::Bool(_) => Dtype::Bool,
            ArrayData::I8(_) => Dtype::I8,
            ArrayData::I16(_) => Dtype::I16,
            ArrayData::I32(_) => Dtype::I32,
            ArrayData::I64(_) => Dtype::I64,
            ArrayData::U8(_) => Dtype::U8,
            ArrayData::U16(_) => Dtype::U16,
            ArrayData::U32(_) => Dtype::U32,
            ArrayData::U64(_) => Dtype::U64,
            ArrayData::F32(_) => Dtype::F32,
            ArrayData::F64(_) => Dtype::F64,
        }
    }
}

/// Rust scalar types that can back an [`NdArray`]
pub trait Element: Copy + Sized {
    /// Element type tag
    const DTYPE: Dtype;

    /// Wrap an owned buffer
    fn wrap(values: Vec<Self>) -> ArrayData;

    /// Borrow a buffer of this type, if the data has this type
    fn slice(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: Dtype = Dtype::$variant;

            fn wrap(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            fn slice(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool);
impl_element!(i8, I8);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(u8, U8);
impl_element!(u16, U16);
impl_element!(u32, U32);
impl_element!(u64, U64);
impl_element!(f32, F32);
impl_element!(f64, F64);

/// Dense, row-major numeric array
///
/// ## Invariants
///
/// - The element count equals the product of `shape` (an empty shape is a
///   scalar holding one element)
/// - The product of `shape` fits in `usize`
///
/// Both hold for deserialized arrays too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNdArray")]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

/// Unvalidated wire form of [`NdArray`]
#[derive(Deserialize)]
struct RawNdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl TryFrom<RawNdArray> for NdArray {
    type Error = Error;

    fn try_from(raw: RawNdArray) -> Result<Self> {
        NdArray::new(raw.shape, raw.data)
    }
}

fn element_count(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |count, &dim| count.checked_mul(dim))
        .ok_or_else(|| {
            Error::Serialization(format!("shape {:?} overflows the element count", shape))
        })
}

impl NdArray {
    /// Create an array, validating that the shape matches the element count
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected = element_count(&shape)?;
        if expected != data.len() {
            return Err(Error::Serialization(format!(
                "shape {:?} needs {} elements, buffer holds {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(NdArray { shape, data })
    }

    /// Create a one-dimensional array
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        NdArray {
            shape: vec![values.len()],
            data: T::wrap(values),
        }
    }

    /// Create an array with an explicit shape
    pub fn from_shape_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        NdArray::new(shape, T::wrap(values))
    }

    /// Dimensions
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element type
    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    /// Underlying buffer
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Borrow elements as `T`; `None` when the dtype differs
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }
}

impl<T: Element> From<Vec<T>> for NdArray {
    fn from(values: Vec<T>) -> Self {
        NdArray::from_vec(values)
    }
}
