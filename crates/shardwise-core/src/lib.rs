//! Shardwise Core - Foundation Layer for the Shardwise Framework
//!
//! This crate provides the small set of types every other Shardwise crate
//! speaks: the runtime data type tag, the device placement tag and the
//! unified error type.
//!
//! # Key Features
//! - Runtime data types (f16, bf16, f32, f64, i8..i64, u8, bool)
//! - Device placement tags (CPU, CUDA)
//! - One error type shared by kernels and the dispatch layer
//!
//! # Example
//! ```rust
//! use shardwise_core::{DType, Device};
//!
//! let device = Device::Cpu;
//! assert_eq!(DType::U8.quantize(3.7), 3.0);
//! assert!(device.is_cpu());
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
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::derivable_impls)]

// =============================================================================
// Modules
// =============================================================================

pub mod device;
pub mod dtype;
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use device::Device;
pub use dtype::DType;
pub use error::{Error, Result};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::device::Device;
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
}
