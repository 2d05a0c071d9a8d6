//! Elementwise-Op Interceptor
//!
//! Lets elementwise library ops run on distributed tensors. The handler
//! installed for each op runs the library kernel on the local payload. For
//! a distributed input it rewraps the tensor result into a new distributed
//! tensor with the input's process group and distribution spec. Elementwise
//! ops act on every element independently, so the local result is the
//! correct shard of the global result.
//!
//! Nothing about the computation is sharding-aware: reductions such as
//! `all`/`any` answer for the local shard only.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::Arc;

use shardwise_core::error::{Error, Result};
use shardwise_tensor::{Args, Kernel, OpLibrary, OpSymbol, Value};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::colo_tensor::{DistTensor, GeneralTensor, OpOutput, TensorSpec};
use crate::config::{ElementwiseConfig, MissingSymbolPolicy};
use crate::dispatch::{DispatchRegistry, OpHandler};

// =============================================================================
// Handler
// =============================================================================

/// Builds the interceptor for one op.
///
/// The handler forwards the arguments to `kernel` untouched. Plain inputs
/// get the kernel's value back as is. Distributed inputs must produce a
/// tensor, which is wrapped with a clone of the input's spec; any other
/// value fails with `Error::UnsupportedOutputType`. Kernel errors are
/// returned unchanged.
pub fn elementwise_handler(symbol: OpSymbol, kernel: Kernel) -> OpHandler {
    Arc::new(move |input: &GeneralTensor, args: &Args| {
        let value = kernel(input.payload(), args)?;
        match input {
            GeneralTensor::Plain(_) => Ok(OpOutput::Plain(value)),
            GeneralTensor::Distributed(dist) => match value {
                Value::Tensor(result) => {
                    let spec = TensorSpec::new(dist.process_group().clone(), dist.dist_spec().clone());
                    Ok(OpOutput::Distributed(DistTensor::from_plain(result, spec)))
                }
                other => Err(Error::UnsupportedOutputType {
                    op: symbol.to_string(),
                    found: other.kind().to_string(),
                }),
            },
        }
    })
}

/// Installs the interceptor for `symbol`, returning the handler it
/// replaced.
pub fn register_elementwise_op(
    registry: &mut DispatchRegistry,
    symbol: OpSymbol,
    kernel: Kernel,
) -> Option<OpHandler> {
    let handler = elementwise_handler(symbol.clone(), kernel);
    registry.register(symbol, handler)
}

// =============================================================================
// Bulk Registration
// =============================================================================

/// Outcome of [`register_elementwise_ops`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Symbols that received a handler, in catalog order.
    pub registered: Vec<OpSymbol>,
    /// Symbols the library lacked, skipped under `MissingSymbolPolicy::Skip`.
    pub skipped: Vec<OpSymbol>,
    /// Symbols left out by the config's exclusion list.
    pub excluded: Vec<OpSymbol>,
}

/// Installs an interceptor for every catalogued symbol of the enabled
/// namespaces.
///
/// The catalog is checked against `library` before the registry is
/// touched: under `MissingSymbolPolicy::Fail` a missing symbol aborts with
/// `Error::MissingSymbol` and nothing is registered. A category mismatch
/// always aborts.
pub fn register_elementwise_ops(
    registry: &mut DispatchRegistry,
    library: &OpLibrary,
    config: &ElementwiseConfig,
) -> Result<RegistrationReport> {
    let mut report = RegistrationReport::default();
    let mut plan: Vec<(OpSymbol, Kernel)> = Vec::new();

    for &namespace in &config.namespaces {
        for entry in catalog::entries(namespace) {
            let symbol = OpSymbol::new(namespace, entry.name);
            if config.is_excluded(&symbol) {
                report.excluded.push(symbol);
                continue;
            }
            match catalog::check_entry(library, namespace, entry) {
                Ok(()) => {}
                Err(Error::MissingSymbol { .. }) if config.missing_symbols == MissingSymbolPolicy::Skip => {
                    warn!(op = %symbol, "Op library does not export symbol, skipping");
                    report.skipped.push(symbol);
                    continue;
                }
                Err(err) => return Err(err),
            }
            let kernel = library
                .get(&symbol)
                .map(|e| e.kernel())
                .ok_or_else(|| Error::MissingSymbol { op: symbol.to_string() })?;
            plan.push((symbol, kernel));
        }
    }

    for (symbol, kernel) in plan {
        if register_elementwise_op(registry, symbol.clone(), kernel).is_some() {
            debug!(op = %symbol, "Replaced distributed handler");
        } else {
            debug!(op = %symbol, "Registered distributed handler");
        }
        report.registered.push(symbol);
    }

    info!(
        registered = report.registered.len(),
        skipped = report.skipped.len(),
        excluded = report.excluded.len(),
        "Elementwise ops registered for distributed tensors"
    );
    Ok(report)
}

// =============================================================================
// ElementwiseDispatch
// =============================================================================

/// A frozen registry holding the elementwise interceptors, plus the report
/// of how it was built.
#[derive(Debug, Clone)]
pub struct ElementwiseDispatch {
    registry: Arc<DispatchRegistry>,
    report: RegistrationReport,
}

impl ElementwiseDispatch {
    /// Builds a fresh registry from `library` and `config`.
    pub fn build(library: &OpLibrary, config: &ElementwiseConfig) -> Result<Self> {
        let mut registry = DispatchRegistry::new();
        let report = register_elementwise_ops(&mut registry, library, config)?;
        Ok(Self {
            registry: Arc::new(registry),
            report,
        })
    }

    /// Returns a shared handle to the registry.
    #[must_use]
    pub fn registry(&self) -> Arc<DispatchRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns the registration report.
    #[must_use]
    pub fn report(&self) -> &RegistrationReport {
        &self.report
    }

    /// Consumes the dispatch, returning the registry.
    #[must_use]
    pub fn into_registry(self) -> Arc<DispatchRegistry> {
        self.registry
    }
}

// =============================================================================
// Tests
// =============================================================================
