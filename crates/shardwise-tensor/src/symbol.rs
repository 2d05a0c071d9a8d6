//! Op Symbols - Names of Library Operations
//!
//! An `OpSymbol` names one operation of the op library: a namespace plus the
//! operation name. The same name may live in several namespaces
//! (`Tensor.abs` and `math.abs`) and those are distinct symbols.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use core::str::FromStr;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use shardwise_core::error::Error;

// =============================================================================
// Namespace
// =============================================================================

/// The three catalogs op symbols are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Methods called on a tensor (`Tensor.<name>`).
    Method,
    /// Free math functions (`math.<name>`).
    Math,
    /// Neural-network functional ops (`nn.functional.<name>`).
    Functional,
}

impl Namespace {
    /// All namespaces.
    pub const ALL: [Namespace; 3] = [Self::Method, Self::Math, Self::Functional];

    /// Prefix used in the display form of a symbol.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Method => "Tensor",
            Self::Math => "math",
            Self::Functional => "nn.functional",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

// =============================================================================
// OpSymbol
// =============================================================================

/// Identifier of a library operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OpSymbol {
    namespace: Namespace,
    name: Cow<'static, str>,
}

impl OpSymbol {
    /// Creates a symbol from a static name.
    #[must_use]
    pub const fn new(namespace: Namespace, name: &'static str) -> Self {
        Self {
            namespace,
            name: Cow::Borrowed(name),
        }
    }

    /// Shorthand for `OpSymbol::new(Namespace::Method, name)`.
    #[must_use]
    pub const fn method(name: &'static str) -> Self {
        Self::new(Namespace::Method, name)
    }

    /// Shorthand for `OpSymbol::new(Namespace::Math, name)`.
    #[must_use]
    pub const fn math(name: &'static str) -> Self {
        Self::new(Namespace::Math, name)
    }

    /// Shorthand for `OpSymbol::new(Namespace::Functional, name)`.
    #[must_use]
    pub const fn functional(name: &'static str) -> Self {
        Self::new(Namespace::Functional, name)
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Returns the operation name within its namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for OpSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace.prefix(), self.name)
    }
}

impl FromStr for OpSymbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, name) = s
            .rsplit_once('.')
            .ok_or_else(|| Error::invalid_operation(format!("'{s}' is not a qualified op symbol")))?;
        let namespace = Namespace::ALL
            .into_iter()
            .find(|ns| ns.prefix() == prefix)
            .ok_or_else(|| Error::invalid_operation(format!("unknown op namespace '{prefix}'")))?;
        if name.is_empty() {
            return Err(Error::invalid_operation(format!("'{s}' has an empty op name")));
        }
        Ok(Self {
            namespace,
            name: Cow::Owned(name.to_string()),
        })
    }
}

impl TryFrom<String> for OpSymbol {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OpSymbol> for String {
    fn from(symbol: OpSymbol) -> Self {
        symbol.to_string()
    }
}

// =============================================================================
// OpCategory
// =============================================================================

/// Arity/shape category of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCategory {
    /// Pointwise, input-shaped result, no tensor operands besides the input.
    Pointwise,
    /// Pointwise with a second tensor-or-scalar operand, broadcast result.
    Binary,
    /// Pointwise predicate producing a bool tensor.
    Predicate,
    /// Normalization along one dimension (softmax family).
    Normalize,
    /// Reduction; the full reduction yields a non-tensor value.
    Reduction,
    /// Dtype or device conversion; may yield a non-tensor value.
    Conversion,
    /// Draws from the global random generator.
    Random,
}

impl OpCategory {
    /// Name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pointwise => "pointwise",
            Self::Binary => "binary",
            Self::Predicate => "predicate",
            Self::Normalize => "normalize",
            Self::Reduction => "reduction",
            Self::Conversion => "conversion",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for OpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tests
// =============================================================================
