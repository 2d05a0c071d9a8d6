//! Shardwise Distributed - Distributed Tensors and Op Interception
//!
//! Distributed tensors and the dispatch layer that lets the elementwise
//! op library run on them.
//!
//! # Features
//!
//! ## Distributed Tensors
//! - **`DistTensor`** - local payload plus process group and distribution spec
//! - **`DistSpec`** - replicated or sharded along one or more dims
//! - **`to_replicate`** - gathers shards back through the process group
//!
//! ## Communication
//! - **Collective Operations**: all-reduce, all-gather, broadcast, barrier
//! - **Process Groups**: a shared backend plus the ranks taking part
//! - Mock backend running a whole world in one process
//!
//! ## Dispatch
//! - **`DispatchRegistry`** - op symbol to handler, built once and then frozen
//! - **Elementwise interceptor** - runs the library kernel on the payload and
//!   rewraps the result with the input's placement
//! - **Catalog** - the symbols that get a handler, checked against the library
//!
//! # Example
//!
//! ```rust
//! use shardwise_distributed::prelude::*;
//! use shardwise_tensor::{Args, OpLibrary, OpSymbol, Tensor};
//!
//! let dispatch = ElementwiseDispatch::build(OpLibrary::standard(), &ElementwiseConfig::default()).unwrap();
//! let registry = dispatch.registry();
//!
//! let world = World::mock();
//! let x = Tensor::from_vec(vec![-1.0, 2.0, -3.0], &[3]).unwrap();
//! let d = DistTensor::distribute(&x, world.default_group().clone(), DistSpec::Replicate).unwrap();
//!
//! let out = registry
//!     .call(OpLibrary::standard(), &OpSymbol::method("abs"), &d.into(), &Args::new())
//!     .unwrap();
//! assert_eq!(out.into_distributed().unwrap().payload().to_vec(), vec![1.0, 2.0, 3.0]);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/tensor-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::float_cmp)]
#![allow(clippy::len_without_is_empty)]

pub mod backend;
pub mod catalog;
pub mod colo_tensor;
pub mod config;
pub mod dispatch;
pub mod dist_spec;
pub mod elementwise;
pub mod process_group;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{Backend, MockBackend, ReduceOp};
pub use catalog::{validate_catalog, CatalogEntry, FUNCTIONAL_OPS, MATH_OPS, METHOD_OPS};
pub use colo_tensor::{DistTensor, GeneralTensor, OpOutput, TensorSpec};
pub use config::{ElementwiseConfig, MissingSymbolPolicy};
pub use dispatch::{DispatchRegistry, OpHandler};
pub use dist_spec::DistSpec;
pub use elementwise::{
    elementwise_handler, register_elementwise_op, register_elementwise_ops, ElementwiseDispatch,
    RegistrationReport,
};
pub use process_group::{ProcessGroup, World};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for distributed tensors and dispatch.
pub mod prelude {
    pub use crate::{
        // Backend
        Backend,
        MockBackend,
        ProcessGroup,
        ReduceOp,
        World,
        // Tensors
        DistSpec,
        DistTensor,
        GeneralTensor,
        OpOutput,
        TensorSpec,
        // Dispatch
        DispatchRegistry,
        ElementwiseConfig,
        ElementwiseDispatch,
        MissingSymbolPolicy,
        OpHandler,
        RegistrationReport,
    };
}
