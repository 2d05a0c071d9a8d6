//! Values and Arguments - Dynamic Op Call Model
//!
//! Every kernel in the op library is called as `op(input, args)` and returns
//! a `Value`. `Args` carries positional and keyword arguments the way a
//! caller wrote them; kernels look parameters up by position or by name.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::BTreeMap;

use shardwise_core::error::{Error, Result};
use shardwise_core::{DType, Device};

use crate::tensor::Tensor;

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed op argument or op result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// Data type.
    DType(DType),
    /// Device.
    Device(Device),
    /// Plain tensor.
    Tensor(Tensor),
    /// Tuple of values.
    Tuple(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::DType(_) => "dtype",
            Self::Device(_) => "device",
            Self::Tensor(_) => "tensor",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Returns true for `Value::None`.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the tensor if this value holds one.
    #[must_use]
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Consumes the value, returning the tensor if it holds one.
    #[must_use]
    pub fn into_tensor(self) -> Option<Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Interprets the value as a number. Booleans count as 0/1 and
    /// one-element tensors as their element.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Tensor(t) if t.numel() == 1 => t.item().ok(),
            _ => None,
        }
    }

    /// Interprets the value as an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Interprets the value as a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Returns the string if this value holds one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<DType> for Value {
    fn from(value: DType) -> Self {
        Self::DType(value)
    }
}

impl From<Device> for Value {
    fn from(value: Device) -> Self {
        Self::Device(value)
    }
}

impl From<Tensor> for Value {
    fn from(value: Tensor) -> Self {
        Self::Tensor(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

// =============================================================================
// Args
// =============================================================================

/// Positional and keyword arguments forwarded to a kernel after its input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.to_string(), value.into());
        self
    }

    /// Returns the positional arguments.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the keyword arguments.
    #[must_use]
    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// Returns true if no argument was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Looks a parameter up by position, then by name. `Value::None` counts
    /// as not supplied.
    #[must_use]
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.keyword.get(name))
            .filter(|v| !v.is_none())
    }

    /// Optional numeric parameter.
    pub fn opt_f64(&self, op: &str, index: usize, name: &str) -> Result<Option<f64>> {
        match self.get(index, name) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| type_error(op, name, "a number", value)),
        }
    }

    /// Numeric parameter with a default.
    pub fn f64_or(&self, op: &str, index: usize, name: &str, default: f64) -> Result<f64> {
        Ok(self.opt_f64(op, index, name)?.unwrap_or(default))
    }

    /// Required numeric parameter.
    pub fn require_f64(&self, op: &str, index: usize, name: &str) -> Result<f64> {
        self.opt_f64(op, index, name)?
            .ok_or_else(|| Error::missing_argument(op, name))
    }

    /// Optional integer parameter.
    pub fn opt_i64(&self, op: &str, index: usize, name: &str) -> Result<Option<i64>> {
        match self.get(index, name) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_error(op, name, "an int", value)),
        }
    }

    /// Boolean parameter with a default.
    pub fn bool_or(&self, op: &str, index: usize, name: &str, default: bool) -> Result<bool> {
        match self.get(index, name) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| type_error(op, name, "a bool", value)),
        }
    }

    /// Optional string parameter.
    pub fn opt_str(&self, op: &str, index: usize, name: &str) -> Result<Option<&str>> {
        match self.get(index, name) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| type_error(op, name, "a str", value)),
        }
    }

    /// Optional dtype parameter; accepts a `DType` or a dtype/type name.
    pub fn opt_dtype(&self, op: &str, index: usize, name: &str) -> Result<Option<DType>> {
        match self.get(index, name) {
            None => Ok(None),
            Some(Value::DType(dtype)) => Ok(Some(*dtype)),
            Some(Value::Str(s)) => DType::parse(s)
                .map(Some)
                .ok_or_else(|| Error::invalid_argument(op, name, format!("unknown dtype '{s}'"))),
            Some(value) => Err(type_error(op, name, "a dtype", value)),
        }
    }

    /// Required tensor parameter. Numbers are accepted and become double
    /// precision scalar tensors.
    pub fn require_tensor(&self, op: &str, index: usize, name: &str) -> Result<Tensor> {
        match self.get(index, name) {
            None => Err(Error::missing_argument(op, name)),
            Some(Value::Tensor(t)) => Ok(t.clone()),
            Some(value) => value
                .as_f64()
                .map(Tensor::scalar_operand)
                .ok_or_else(|| type_error(op, name, "a tensor or number", value)),
        }
    }
}

fn type_error(op: &str, name: &str, expected: &str, found: &Value) -> Error {
    Error::invalid_argument(op, name, format!("must be {expected}, not {}", found.kind()))
}

// =============================================================================
// Tests
// =============================================================================
