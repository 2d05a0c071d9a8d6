//! Elementwise Op Catalog
//!
//! The symbols that get a distributed handler, per namespace, with the
//! category the op library is expected to export each one under. The
//! catalog is plain data; [`validate_catalog`] checks it against a library
//! before anything is registered.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use shardwise_core::error::{Error, Result};
use shardwise_tensor::OpCategory::{
    self, Binary, Conversion, Normalize, Pointwise, Predicate, Random, Reduction,
};
use shardwise_tensor::{Namespace, OpLibrary, OpSymbol};

// =============================================================================
// CatalogEntry
// =============================================================================

/// One catalogued op name and its expected category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Op name within its namespace.
    pub name: &'static str,
    /// Category the library must report.
    pub category: OpCategory,
}

const fn entry(name: &'static str, category: OpCategory) -> CatalogEntry {
    CatalogEntry { name, category }
}

// =============================================================================
// Tables
// =============================================================================

/// Tensor methods (`Tensor.<name>`).
pub const METHOD_OPS: &[CatalogEntry] = &[
    entry("abs", Pointwise),
    entry("absolute", Pointwise),
    entry("acos", Pointwise),
    entry("arccos", Pointwise),
    entry("angle", Pointwise),
    entry("asin", Pointwise),
    entry("arcsin", Pointwise),
    entry("atan", Pointwise),
    entry("arctan", Pointwise),
    entry("all", Reduction),
    entry("any", Reduction),
    entry("bernoulli", Random),
    entry("bfloat16", Conversion),
    entry("bitwise_not", Pointwise),
    entry("bool", Conversion),
    entry("byte", Conversion),
    entry("ceil", Pointwise),
    entry("char", Conversion),
    entry("clamp", Pointwise),
    entry("clamp_max", Pointwise),
    entry("clamp_min", Pointwise),
    entry("clip", Pointwise),
    entry("clone", Conversion),
    entry("contiguous", Conversion),
    entry("copysign", Binary),
    entry("cos", Pointwise),
    entry("cosh", Pointwise),
    entry("acosh", Pointwise),
    entry("arccosh", Pointwise),
    entry("cpu", Conversion),
    entry("cuda", Conversion),
    entry("deg2rad", Pointwise),
    entry("detach", Conversion),
    entry("digamma", Pointwise),
    entry("double", Conversion),
    entry("erf", Pointwise),
    entry("erfc", Pointwise),
    entry("erfinv", Pointwise),
    entry("exp", Pointwise),
    entry("expm1", Pointwise),
    entry("fix", Pointwise),
    entry("trunc", Pointwise),
    entry("float", Conversion),
    entry("float_power", Binary),
    entry("floor", Pointwise),
    entry("frac", Pointwise),
    entry("half", Conversion),
    entry("hardshrink", Pointwise),
    entry("heaviside", Binary),
    entry("i0", Pointwise),
    entry("int", Conversion),
    entry("isfinite", Predicate),
    entry("isinf", Predicate),
    entry("isposinf", Predicate),
    entry("isneginf", Predicate),
    entry("isnan", Predicate),
    entry("lgamma", Pointwise),
    entry("log", Pointwise),
    entry("log10", Pointwise),
    entry("log1p", Pointwise),
    entry("log2", Pointwise),
    entry("logical_not", Predicate),
    entry("logit", Pointwise),
    entry("long", Conversion),
    entry("nan_to_num", Pointwise),
    entry("neg", Pointwise),
    entry("negative", Pointwise),
    entry("positive", Pointwise),
    entry("pow", Binary),
    entry("rad2deg", Pointwise),
    entry("reciprocal", Pointwise),
    entry("round", Pointwise),
    entry("rsqrt", Pointwise),
    entry("short", Conversion),
    entry("sigmoid", Pointwise),
    entry("sign", Pointwise),
    entry("signbit", Predicate),
    entry("sgn", Pointwise),
    entry("sin", Pointwise),
    entry("sinc", Pointwise),
    entry("sinh", Pointwise),
    entry("asinh", Pointwise),
    entry("arcsinh", Pointwise),
    entry("sqrt", Pointwise),
    entry("square", Pointwise),
    entry("to", Conversion),
    entry("tan", Pointwise),
    entry("tanh", Pointwise),
    entry("atanh", Pointwise),
    entry("arctanh", Pointwise),
    entry("type", Conversion),
    entry("type_as", Conversion),
];

/// Free math functions (`math.<name>`).
pub const MATH_OPS: &[CatalogEntry] = &[
    entry("abs", Pointwise),
    entry("absolute", Pointwise),
    entry("acos", Pointwise),
    entry("arccos", Pointwise),
    entry("angle", Pointwise),
    entry("asin", Pointwise),
    entry("arcsin", Pointwise),
    entry("atan", Pointwise),
    entry("arctan", Pointwise),
    entry("all", Reduction),
    entry("any", Reduction),
    entry("bernoulli", Random),
    entry("bitwise_not", Pointwise),
    entry("ceil", Pointwise),
    entry("clamp", Pointwise),
    entry("clamp_max", Pointwise),
    entry("clamp_min", Pointwise),
    entry("clip", Pointwise),
    entry("clone", Conversion),
    entry("copysign", Binary),
    entry("cos", Pointwise),
    entry("cosh", Pointwise),
    entry("acosh", Pointwise),
    entry("arccosh", Pointwise),
    entry("deg2rad", Pointwise),
    entry("digamma", Pointwise),
    entry("erf", Pointwise),
    entry("erfc", Pointwise),
    entry("erfinv", Pointwise),
    entry("exp", Pointwise),
    entry("expm1", Pointwise),
    entry("fix", Pointwise),
    entry("trunc", Pointwise),
    entry("float_power", Binary),
    entry("floor", Pointwise),
    entry("frac", Pointwise),
    entry("hardshrink", Pointwise),
    entry("heaviside", Binary),
    entry("i0", Pointwise),
    entry("isfinite", Predicate),
    entry("isinf", Predicate),
    entry("isposinf", Predicate),
    entry("isneginf", Predicate),
    entry("isnan", Predicate),
    entry("lgamma", Pointwise),
    entry("log", Pointwise),
    entry("log10", Pointwise),
    entry("log1p", Pointwise),
    entry("log2", Pointwise),
    entry("logical_not", Predicate),
    entry("logit", Pointwise),
    entry("nan_to_num", Pointwise),
    entry("neg", Pointwise),
    entry("negative", Pointwise),
    entry("positive", Pointwise),
    entry("pow", Binary),
    entry("rad2deg", Pointwise),
    entry("reciprocal", Pointwise),
    entry("round", Pointwise),
    entry("rsqrt", Pointwise),
    entry("sigmoid", Pointwise),
    entry("sign", Pointwise),
    entry("signbit", Predicate),
    entry("sgn", Pointwise),
    entry("sin", Pointwise),
    entry("sinc", Pointwise),
    entry("sinh", Pointwise),
    entry("asinh", Pointwise),
    entry("arcsinh", Pointwise),
    entry("sqrt", Pointwise),
    entry("square", Pointwise),
    entry("tan", Pointwise),
    entry("tanh", Pointwise),
    entry("atanh", Pointwise),
    entry("arctanh", Pointwise),
];

/// Neural-network functional ops (`nn.functional.<name>`).
pub const FUNCTIONAL_OPS: &[CatalogEntry] = &[
    entry("threshold", Pointwise),
    entry("relu", Pointwise),
    entry("hardtanh", Pointwise),
    entry("hardswish", Pointwise),
    entry("relu6", Pointwise),
    entry("elu", Pointwise),
    entry("selu", Pointwise),
    entry("celu", Pointwise),
    entry("leaky_relu", Pointwise),
    entry("prelu", Binary),
    entry("rrelu", Random),
    entry("gelu", Pointwise),
    entry("logsigmoid", Pointwise),
    entry("hardshrink", Pointwise),
    entry("tanhshrink", Pointwise),
    entry("softsign", Pointwise),
    entry("softplus", Pointwise),
    entry("softmin", Normalize),
    entry("softmax", Normalize),
    entry("softshrink", Pointwise),
    entry("gumbel_softmax", Random),
    entry("log_softmax", Normalize),
    entry("tanh", Pointwise),
    entry("sigmoid", Pointwise),
    entry("hardsigmoid", Pointwise),
    entry("silu", Pointwise),
    entry("mish", Pointwise),
    entry("dropout", Random),
    entry("alpha_dropout", Random),
    entry("feature_alpha_dropout", Random),
];

// =============================================================================
// Lookup and Validation
// =============================================================================

/// Catalog entries of one namespace.
#[must_use]
pub fn entries(namespace: Namespace) -> &'static [CatalogEntry] {
    match namespace {
        Namespace::Method => METHOD_OPS,
        Namespace::Math => MATH_OPS,
        Namespace::Functional => FUNCTIONAL_OPS,
    }
}

/// Symbols of one namespace, in catalog order.
pub fn symbols(namespace: Namespace) -> impl Iterator<Item = OpSymbol> {
    entries(namespace)
        .iter()
        .map(move |e| OpSymbol::new(namespace, e.name))
}

/// Total number of catalogued symbols across all namespaces.
#[must_use]
pub fn len() -> usize {
    Namespace::ALL.iter().map(|&ns| entries(ns).len()).sum()
}

/// Checks that `library` exports `entry` under `namespace` with the
/// expected category.
pub fn check_entry(library: &OpLibrary, namespace: Namespace, entry: &CatalogEntry) -> Result<()> {
    let symbol = OpSymbol::new(namespace, entry.name);
    let exported = library.get(&symbol).ok_or_else(|| Error::MissingSymbol {
        op: symbol.to_string(),
    })?;
    if exported.category() != entry.category {
        return Err(Error::CategoryMismatch {
            op: symbol.to_string(),
            expected: entry.category.to_string(),
            actual: exported.category().to_string(),
        });
    }
    Ok(())
}

/// Checks every entry of the given namespaces, failing on the first
/// missing symbol or category mismatch.
pub fn validate_catalog(library: &OpLibrary, namespaces: &[Namespace]) -> Result<()> {
    for &namespace in namespaces {
        for entry in entries(namespace) {
            check_entry(library, namespace, entry)?;
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
