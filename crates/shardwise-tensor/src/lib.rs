//! Shardwise Tensor - Plain Tensors and the Elementwise Op Library
//!
//! This crate provides the plain `Tensor` type, the dynamic `Value`/`Args`
//! call model, operation symbols, and `OpLibrary`, the table of default
//! kernels every intercepted operation delegates to.
//!
//! # Key Features
//! - Dtype-tagged tensors with runtime casts between all supported types
//! - Device placement tags
//! - Roughly a hundred elementwise kernels: math, activations, predicates,
//!   conversions and dropout
//! - One seedable global generator for the random kernels
//!
//! # Example
//! ```rust
//! use shardwise_tensor::{Args, OpLibrary, OpSymbol, Tensor};
//!
//! let x = Tensor::from_vec(vec![-1.0, 0.0, 2.0], &[3]).unwrap();
//! let y = OpLibrary::standard()
//!     .call(&OpSymbol::functional("relu"), &x, &Args::new())
//!     .unwrap();
//! assert_eq!(y.into_tensor().unwrap().to_vec(), vec![0.0, 0.0, 2.0]);
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
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::float_cmp)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

// =============================================================================
// Modules
// =============================================================================

pub mod library;
pub mod ops;
pub mod random;
pub mod shape;
pub mod symbol;
pub mod tensor;
pub mod value;

// =============================================================================
// Re-exports
// =============================================================================

pub use library::{Kernel, KernelEntry, OpLibrary};
pub use shape::{Shape, Strides};
pub use shardwise_core::{DType, Device, Error, Result};
pub use symbol::{Namespace, OpCategory, OpSymbol};
pub use tensor::Tensor;
pub use value::{Args, Value};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::library::{Kernel, KernelEntry, OpLibrary};
    pub use crate::symbol::{Namespace, OpCategory, OpSymbol};
    pub use crate::tensor::Tensor;
    pub use crate::value::{Args, Value};
    pub use shardwise_core::prelude::*;
}
