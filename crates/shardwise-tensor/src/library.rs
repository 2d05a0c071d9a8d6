//! Op Library - Default Kernels by Symbol
//!
//! `OpLibrary` maps every `OpSymbol` to the kernel that implements it and
//! the `OpCategory` it belongs to. The standard library is built once per
//! process; custom libraries can be assembled with [`OpLibrary::insert`].
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use shardwise_core::error::{Error, Result};

use crate::ops::{activation, convert, dropout, pointwise, reduce, special};
use crate::ops::{float_result, same_dtype};
use crate::symbol::{Namespace, OpCategory, OpSymbol};
use crate::tensor::Tensor;
use crate::value::{Args, Value};

// =============================================================================
// Kernel Types
// =============================================================================

/// A callable operation: `op(input, args) -> value`.
pub type Kernel = Arc<dyn Fn(&Tensor, &Args) -> Result<Value> + Send + Sync>;

type KernelFn = fn(&Tensor, &Args) -> Result<Value>;

/// A kernel together with its category.
#[derive(Clone)]
pub struct KernelEntry {
    kernel: Kernel,
    category: OpCategory,
}

impl KernelEntry {
    /// Wraps a kernel.
    pub fn new(
        category: OpCategory,
        kernel: impl Fn(&Tensor, &Args) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kernel: Arc::new(kernel),
            category,
        }
    }

    /// Returns a shared handle to the kernel.
    #[must_use]
    pub fn kernel(&self) -> Kernel {
        Arc::clone(&self.kernel)
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> OpCategory {
        self.category
    }

    /// Runs the kernel.
    pub fn call(&self, input: &Tensor, args: &Args) -> Result<Value> {
        (self.kernel)(input, args)
    }
}

impl fmt::Debug for KernelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelEntry")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Kernel Tables
// =============================================================================

fn rsqrt(v: f64) -> f64 {
    1.0 / v.sqrt()
}

/// Float-valued unary ops shared by the method and math namespaces.
const FLOAT_UNARY: &[(&str, fn(f64) -> f64)] = &[
    ("acos", f64::acos),
    ("arccos", f64::acos),
    ("asin", f64::asin),
    ("arcsin", f64::asin),
    ("atan", f64::atan),
    ("arctan", f64::atan),
    ("cos", f64::cos),
    ("cosh", f64::cosh),
    ("acosh", f64::acosh),
    ("arccosh", f64::acosh),
    ("sin", f64::sin),
    ("sinh", f64::sinh),
    ("asinh", f64::asinh),
    ("arcsinh", f64::asinh),
    ("tan", f64::tan),
    ("tanh", f64::tanh),
    ("atanh", f64::atanh),
    ("arctanh", f64::atanh),
    ("angle", special::angle),
    ("deg2rad", f64::to_radians),
    ("rad2deg", f64::to_degrees),
    ("digamma", special::digamma),
    ("erf", special::erf),
    ("erfc", special::erfc),
    ("erfinv", special::erfinv),
    ("exp", f64::exp),
    ("expm1", f64::exp_m1),
    ("i0", special::i0),
    ("lgamma", special::lgamma),
    ("log", f64::ln),
    ("log10", f64::log10),
    ("log1p", f64::ln_1p),
    ("log2", f64::log2),
    ("reciprocal", f64::recip),
    ("rsqrt", rsqrt),
    ("sigmoid", special::sigmoid),
    ("sinc", special::sinc),
    ("sqrt", f64::sqrt),
];

/// Unary ops that keep the input dtype.
const SAME_DTYPE_UNARY: &[(&str, fn(f64) -> f64)] = &[
    ("abs", f64::abs),
    ("absolute", f64::abs),
    ("ceil", f64::ceil),
    ("floor", f64::floor),
    ("trunc", f64::trunc),
    ("fix", f64::trunc),
    ("frac", f64::fract),
    ("square", square),
    ("positive", positive),
];

fn square(v: f64) -> f64 {
    v * v
}

fn positive(v: f64) -> f64 {
    v
}

/// Named kernels shared by the method and math namespaces.
const SHARED: &[(&str, OpCategory, KernelFn)] = &[
    ("neg", OpCategory::Pointwise, pointwise::neg),
    ("negative", OpCategory::Pointwise, pointwise::neg),
    ("sign", OpCategory::Pointwise, pointwise::sign),
    ("sgn", OpCategory::Pointwise, pointwise::sign),
    ("round", OpCategory::Pointwise, pointwise::round),
    ("clamp", OpCategory::Pointwise, pointwise::clamp),
    ("clip", OpCategory::Pointwise, pointwise::clamp),
    ("clamp_min", OpCategory::Pointwise, pointwise::clamp_min),
    ("clamp_max", OpCategory::Pointwise, pointwise::clamp_max),
    ("hardshrink", OpCategory::Pointwise, pointwise::hardshrink),
    ("logit", OpCategory::Pointwise, pointwise::logit),
    ("nan_to_num", OpCategory::Pointwise, pointwise::nan_to_num),
    ("bitwise_not", OpCategory::Pointwise, pointwise::bitwise_not),
    ("pow", OpCategory::Binary, pointwise::pow),
    ("float_power", OpCategory::Binary, pointwise::float_power),
    ("copysign", OpCategory::Binary, pointwise::copysign),
    ("heaviside", OpCategory::Binary, pointwise::heaviside),
    ("isfinite", OpCategory::Predicate, pointwise::isfinite),
    ("isinf", OpCategory::Predicate, pointwise::isinf),
    ("isposinf", OpCategory::Predicate, pointwise::isposinf),
    ("isneginf", OpCategory::Predicate, pointwise::isneginf),
    ("isnan", OpCategory::Predicate, pointwise::isnan),
    ("signbit", OpCategory::Predicate, pointwise::signbit),
    ("logical_not", OpCategory::Predicate, pointwise::logical_not),
    ("all", OpCategory::Reduction, reduce::all),
    ("any", OpCategory::Reduction, reduce::any),
    ("bernoulli", OpCategory::Random, dropout::bernoulli),
    ("clone", OpCategory::Conversion, convert::clone),
];

/// Kernels that only exist as tensor methods.
const METHOD_ONLY: &[(&str, KernelFn)] = &[
    ("contiguous", convert::contiguous),
    ("cpu", convert::cpu),
    ("cuda", convert::cuda),
    ("detach", convert::detach),
    ("to", convert::to),
    ("type", convert::type_),
    ("type_as", convert::type_as),
];

/// `nn.functional` kernels.
const FUNCTIONAL: &[(&str, OpCategory, KernelFn)] = &[
    ("threshold", OpCategory::Pointwise, activation::threshold),
    ("relu", OpCategory::Pointwise, activation::relu),
    ("hardtanh", OpCategory::Pointwise, activation::hardtanh),
    ("hardswish", OpCategory::Pointwise, activation::hardswish),
    ("relu6", OpCategory::Pointwise, activation::relu6),
    ("elu", OpCategory::Pointwise, activation::elu),
    ("selu", OpCategory::Pointwise, activation::selu),
    ("celu", OpCategory::Pointwise, activation::celu),
    ("leaky_relu", OpCategory::Pointwise, activation::leaky_relu),
    ("prelu", OpCategory::Binary, activation::prelu),
    ("rrelu", OpCategory::Random, activation::rrelu),
    ("gelu", OpCategory::Pointwise, activation::gelu),
    ("logsigmoid", OpCategory::Pointwise, activation::logsigmoid),
    ("hardshrink", OpCategory::Pointwise, pointwise::hardshrink),
    ("tanhshrink", OpCategory::Pointwise, activation::tanhshrink),
    ("softsign", OpCategory::Pointwise, activation::softsign),
    ("softplus", OpCategory::Pointwise, activation::softplus),
    ("softmin", OpCategory::Normalize, activation::softmin),
    ("softmax", OpCategory::Normalize, activation::softmax),
    ("softshrink", OpCategory::Pointwise, activation::softshrink),
    ("gumbel_softmax", OpCategory::Random, activation::gumbel_softmax),
    ("log_softmax", OpCategory::Normalize, activation::log_softmax),
    ("tanh", OpCategory::Pointwise, activation::tanh),
    ("sigmoid", OpCategory::Pointwise, activation::sigmoid),
    ("hardsigmoid", OpCategory::Pointwise, activation::hardsigmoid),
    ("silu", OpCategory::Pointwise, activation::silu),
    ("mish", OpCategory::Pointwise, activation::mish),
    ("dropout", OpCategory::Random, dropout::dropout),
    ("alpha_dropout", OpCategory::Random, dropout::alpha_dropout),
    ("feature_alpha_dropout", OpCategory::Random, dropout::feature_alpha_dropout),
];

// =============================================================================
// OpLibrary
// =============================================================================

/// Default kernels keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct OpLibrary {
    entries: FxHashMap<OpSymbol, KernelEntry>,
}

impl OpLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide standard library.
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<OpLibrary> = OnceLock::new();
        STANDARD.get_or_init(Self::build_standard)
    }

    fn build_standard() -> Self {
        let mut lib = Self::new();

        for &(name, f) in FLOAT_UNARY {
            lib.insert_shared(name, KernelEntry::new(OpCategory::Pointwise, move |x, _| {
                Ok(float_result(x, f).into())
            }));
        }
        for &(name, f) in SAME_DTYPE_UNARY {
            lib.insert_shared(name, KernelEntry::new(OpCategory::Pointwise, move |x, _| {
                Ok(same_dtype(x, f).into())
            }));
        }
        for &(name, category, f) in SHARED {
            lib.insert_shared(name, KernelEntry::new(category, f));
        }

        for (name, dtype) in convert::CASTS {
            lib.insert(
                OpSymbol::method(name),
                KernelEntry::new(OpCategory::Conversion, move |x, _| Ok(convert::cast(x, dtype))),
            );
        }
        for &(name, f) in METHOD_ONLY {
            lib.insert(OpSymbol::method(name), KernelEntry::new(OpCategory::Conversion, f));
        }

        for &(name, category, f) in FUNCTIONAL {
            lib.insert(OpSymbol::functional(name), KernelEntry::new(category, f));
        }
        lib
    }

    fn insert_shared(&mut self, name: &'static str, entry: KernelEntry) {
        self.insert(OpSymbol::method(name), entry.clone());
        self.insert(OpSymbol::math(name), entry);
    }

    /// Adds or replaces the kernel for `symbol`, returning the previous
    /// entry.
    pub fn insert(&mut self, symbol: OpSymbol, entry: KernelEntry) -> Option<KernelEntry> {
        self.entries.insert(symbol, entry)
    }

    /// Removes the kernel for `symbol`.
    pub fn remove(&mut self, symbol: &OpSymbol) -> Option<KernelEntry> {
        self.entries.remove(symbol)
    }

    /// Looks a symbol up.
    #[must_use]
    pub fn get(&self, symbol: &OpSymbol) -> Option<&KernelEntry> {
        self.entries.get(symbol)
    }

    /// Returns true if the library exports `symbol`.
    #[must_use]
    pub fn contains(&self, symbol: &OpSymbol) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Number of exported symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the library exports nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the exported symbols in no particular order.
    pub fn symbols(&self) -> impl Iterator<Item = &OpSymbol> {
        self.entries.keys()
    }

    /// Iterates over the symbols of one namespace.
    pub fn symbols_in(&self, namespace: Namespace) -> impl Iterator<Item = &OpSymbol> {
        self.entries.keys().filter(move |s| s.namespace() == namespace)
    }

    /// Calls the kernel for `symbol`.
    pub fn call(&self, symbol: &OpSymbol, input: &Tensor, args: &Args) -> Result<Value> {
        self.get(symbol)
            .ok_or_else(|| Error::MissingSymbol {
                op: symbol.to_string(),
            })?
            .call(input, args)
    }
}

// =============================================================================
// Tests
// =============================================================================
