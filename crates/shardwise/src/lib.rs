//! # Shardwise - Elementwise Ops on Distributed Tensors
//!
//! Shardwise lets a library of elementwise tensor ops run on tensors that
//! are laid out across a group of workers. An op applied to a distributed
//! tensor runs on the local payload, and the result comes back as a new
//! distributed tensor with the same process group and distribution spec.
//!
//! ## Crates
//!
//! - **`shardwise-core`**: data types, devices and the shared error type
//! - **`shardwise-tensor`**: the plain tensor and the op library
//!   (197 symbols across tensor methods, math ops and `nn.functional`)
//! - **`shardwise-distributed`**: process groups, distributed tensors, the
//!   dispatch registry and the elementwise interceptor
//!
//! # Quick Start
//!
//! ```rust
//! use shardwise::prelude::*;
//!
//! // Register the interceptor once, then share the frozen registry.
//! let registry = shardwise::init(&ElementwiseConfig::default()).unwrap();
//!
//! let x = Tensor::from_vec(vec![-1.0, 0.0, 2.0], &[3]).unwrap();
//! let d = DistTensor::from_plain(x, TensorSpec::replicated(ProcessGroup::mock()));
//!
//! let out = shardwise::call(&registry, &OpSymbol::functional("relu"), &d.into(), &Args::new()).unwrap();
//! let out = out.into_distributed().unwrap();
//! assert_eq!(out.payload().to_vec(), vec![0.0, 0.0, 2.0]);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use tracing::info;

// =============================================================================
// Re-exports
// =============================================================================

pub use shardwise_core as core;
pub use shardwise_distributed as distributed;
pub use shardwise_tensor as tensor;

pub use shardwise_core::{DType, Device, Error, Result};
pub use shardwise_distributed::{
    DispatchRegistry, DistSpec, DistTensor, ElementwiseConfig, ElementwiseDispatch, GeneralTensor,
    MissingSymbolPolicy, OpOutput, ProcessGroup, RegistrationReport, TensorSpec, World,
};
pub use shardwise_tensor::{Args, Namespace, OpLibrary, OpSymbol, Tensor, Value};

// =============================================================================
// Initialisation
// =============================================================================

/// Registers the elementwise interceptor for every catalogued op against
/// the standard op library and returns the frozen registry.
///
/// Fails with `Error::MissingSymbol` or `Error::CategoryMismatch` when the
/// library disagrees with the catalog, unless the config skips missing
/// symbols.
pub fn init(config: &ElementwiseConfig) -> Result<Arc<DispatchRegistry>> {
    init_with_report(config).map(ElementwiseDispatch::into_registry)
}

/// Same as [`init`], keeping the registration report.
pub fn init_with_report(config: &ElementwiseConfig) -> Result<ElementwiseDispatch> {
    let dispatch = ElementwiseDispatch::build(OpLibrary::standard(), config)?;
    info!(
        version = version(),
        ops = dispatch.report().registered.len(),
        "Shardwise initialised"
    );
    Ok(dispatch)
}

/// Runs `symbol` on `input` through `registry`, using the standard op
/// library for plain inputs.
pub fn call(
    registry: &DispatchRegistry,
    symbol: &OpSymbol,
    input: &GeneralTensor,
    args: &Args,
) -> Result<OpOutput> {
    registry.call(OpLibrary::standard(), symbol, input, args)
}

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for working with distributed tensors.
///
/// ```rust
/// use shardwise::prelude::*;
/// ```
pub mod prelude {
    pub use shardwise_core::{DType, Device, Error, Result};
    pub use shardwise_distributed::prelude::*;
    pub use shardwise_tensor::{Args, Namespace, OpCategory, OpLibrary, OpSymbol, Tensor, Value};
}

// =============================================================================
// Version Information
// =============================================================================

/// Returns the version of the Shardwise crates.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// Tests
// =============================================================================
