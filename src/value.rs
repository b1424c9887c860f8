//! Host-side values produced by unpacking and consumed by packing.

use indexmap::IndexMap;
use num_rational::BigRational;

/// A structured host value matching the shape of a [crate::types::Type].
///
/// Cluster values preserve member declaration order. FXP values carry their
/// exact rational magnitude, plus the overflow status when the geometry has
/// overflow reporting enabled.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Fxp(BigRational),
    FxpOverflow(bool, BigRational),
    Cluster(IndexMap<String, Value>),
    Array(Vec<Value>),
}

impl Value {
    /// Short label used in pack-error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U64(_) => "unsigned integer",
            Value::I64(_) => "signed integer",
            Value::F32(_) | Value::F64(_) => "float",
            Value::Str(_) => "string",
            Value::Fxp(_) => "fixed-point",
            Value::FxpOverflow(..) => "fixed-point with overflow",
            Value::Cluster(_) => "cluster",
            Value::Array(_) => "array",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<BigRational> for Value {
    fn from(value: BigRational) -> Self {
        Value::Fxp(value)
    }
}
