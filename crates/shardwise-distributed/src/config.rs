//! Elementwise Registration Config
//!
//! Controls which catalogued symbols `register_elementwise_ops` installs
//! and what happens when the op library lacks one of them.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use serde::{Deserialize, Serialize};
use shardwise_tensor::{Namespace, OpSymbol};

// =============================================================================
// MissingSymbolPolicy
// =============================================================================

/// What to do when the op library does not export a catalogued symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSymbolPolicy {
    /// Abort registration with `Error::MissingSymbol`.
    #[default]
    Fail,
    /// Log a warning and register the remaining symbols.
    Skip,
}

// =============================================================================
// ElementwiseConfig
// =============================================================================

/// Configuration of the elementwise interceptor registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementwiseConfig {
    /// Namespaces whose catalog is registered.
    pub namespaces: Vec<Namespace>,
    /// Behaviour on symbols the library does not export.
    pub missing_symbols: MissingSymbolPolicy,
    /// Symbols never registered.
    pub exclude: Vec<OpSymbol>,
}

impl Default for ElementwiseConfig {
    fn default() -> Self {
        Self {
            namespaces: Namespace::ALL.to_vec(),
            missing_symbols: MissingSymbolPolicy::Fail,
            exclude: Vec::new(),
        }
    }
}

impl ElementwiseConfig {
    /// Creates the default configuration: every namespace, fail fast.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: restrict registration to `namespaces`.
    #[must_use]
    pub fn namespaces(mut self, namespaces: impl IntoIterator<Item = Namespace>) -> Self {
        self.namespaces = namespaces.into_iter().collect();
        self
    }

    /// Builder: set the missing-symbol policy.
    #[must_use]
    pub fn missing_symbols(mut self, policy: MissingSymbolPolicy) -> Self {
        self.missing_symbols = policy;
        self
    }

    /// Builder: never register `symbols`.
    #[must_use]
    pub fn exclude(mut self, symbols: impl IntoIterator<Item = OpSymbol>) -> Self {
        self.exclude.extend(symbols);
        self
    }

    /// Returns true if `namespace` is enabled.
    #[must_use]
    pub fn includes_namespace(&self, namespace: Namespace) -> bool {
        self.namespaces.contains(&namespace)
    }

    /// Returns true if `symbol` is excluded.
    #[must_use]
    pub fn is_excluded(&self, symbol: &OpSymbol) -> bool {
        self.exclude.contains(symbol)
    }
}

// =============================================================================
// Tests
// =============================================================================
