//! Dispatch Registry - Op Symbol to Distributed Handler
//!
//! The registry maps an `OpSymbol` to the handler that runs it on a
//! `GeneralTensor`. It is populated once during initialisation and then
//! shared read-only, typically as `Arc<DispatchRegistry>`.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use shardwise_core::error::{Error, Result};
use shardwise_tensor::{Args, OpLibrary, OpSymbol};

use crate::colo_tensor::{GeneralTensor, OpOutput};

/// A registered handler: runs an op on a plain or distributed tensor.
pub type OpHandler = Arc<dyn Fn(&GeneralTensor, &Args) -> Result<OpOutput> + Send + Sync>;

// =============================================================================
// DispatchRegistry
// =============================================================================

/// Handlers keyed by op symbol.
#[derive(Clone, Default)]
pub struct DispatchRegistry {
    handlers: FxHashMap<OpSymbol, OpHandler>,
}

impl DispatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handler` for `symbol`. A later registration of the same
    /// symbol replaces the earlier one, which is returned.
    pub fn register(&mut self, symbol: OpSymbol, handler: OpHandler) -> Option<OpHandler> {
        self.handlers.insert(symbol, handler)
    }

    /// Returns the handler for `symbol`.
    #[must_use]
    pub fn resolve(&self, symbol: &OpSymbol) -> Option<OpHandler> {
        self.handlers.get(symbol).cloned()
    }

    /// Returns true if a handler is registered for `symbol`.
    #[must_use]
    pub fn contains(&self, symbol: &OpSymbol) -> bool {
        self.handlers.contains_key(symbol)
    }

    /// Number of registered symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered symbols, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<OpSymbol> {
        let mut symbols: Vec<_> = self.handlers.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Runs `symbol` on `input`.
    ///
    /// Distributed inputs go through the registered handler. Plain inputs
    /// take the library's default kernel.
    pub fn call(
        &self,
        library: &OpLibrary,
        symbol: &OpSymbol,
        input: &GeneralTensor,
        args: &Args,
    ) -> Result<OpOutput> {
        match input {
            GeneralTensor::Distributed(_) => {
                let handler = self.handlers.get(symbol).ok_or_else(|| Error::NoDistributedHandler {
                    op: symbol.to_string(),
                })?;
                handler(input, args)
            }
            GeneralTensor::Plain(tensor) => library.call(symbol, tensor, args).map(OpOutput::Plain),
        }
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
