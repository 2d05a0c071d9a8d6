//! Error Types - Shardwise Error Handling
//!
//! One error type is shared by the tensor library, the distributed tensor
//! types and the dispatch layer. Errors raised by a kernel therefore reach
//! the caller of an intercepted op exactly as the kernel produced them.
//!
//! # Key Features
//! - Unified error type for all Shardwise operations
//! - Argument errors carry the op and parameter names
//! - Integration with `std::error::Error`
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

use crate::dtype::DType;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for Shardwise operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Shape mismatch between tensors.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape.
        actual: Vec<usize>,
    },

    /// Invalid dimension index.
    #[error("Invalid dimension: index {index} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension index.
        index: i64,
        /// Number of dimensions in the tensor.
        ndim: usize,
    },

    /// Broadcasting failed between shapes.
    #[error("Cannot broadcast shapes {shape1:?} and {shape2:?}")]
    BroadcastError {
        /// The first shape.
        shape1: Vec<usize>,
        /// The second shape.
        shape2: Vec<usize>,
    },

    /// The op does not support tensors of this dtype.
    #[error("{op} is not supported for dtype {dtype}")]
    DTypeNotSupported {
        /// Name of the op.
        op: String,
        /// The rejected dtype.
        dtype: DType,
    },

    /// A required argument was not supplied.
    #[error("{op}() missing required argument '{name}'")]
    MissingArgument {
        /// Name of the op.
        op: String,
        /// Name of the missing parameter.
        name: String,
    },

    /// An argument had the wrong kind or an out-of-range value.
    #[error("{op}(): argument '{name}' {message}")]
    InvalidArgument {
        /// Name of the op.
        op: String,
        /// Name of the offending parameter.
        name: String,
        /// What was wrong with it.
        message: String,
    },

    /// Invalid operation for the given tensor.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// An intercepted op produced a non-tensor result for a distributed input.
    #[error("{op} returned {found} for a distributed tensor input; only tensor outputs can be rewrapped")]
    UnsupportedOutputType {
        /// The intercepted op symbol.
        op: String,
        /// Kind of the value the op produced.
        found: String,
    },

    /// The op library does not export a symbol the caller expected.
    #[error("Op library does not export {op}")]
    MissingSymbol {
        /// The missing op symbol.
        op: String,
    },

    /// The op library exports a symbol under a different category.
    #[error("{op} is exported as {actual} but expected as {expected}")]
    CategoryMismatch {
        /// The op symbol.
        op: String,
        /// Expected category name.
        expected: String,
        /// Category the library reports.
        actual: String,
    },

    /// A distributed tensor reached an op that has no registered handler.
    #[error("No distributed handler registered for {op}")]
    NoDistributedHandler {
        /// The op symbol.
        op: String,
    },

    /// Invalid distribution descriptor.
    #[error("Invalid distribution spec: {message}")]
    InvalidDistSpec {
        /// Description of the problem.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("Internal error: {message}")]
    InternalError {
        /// Description of the internal error.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for Shardwise operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a new invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a new missing argument error.
    #[must_use]
    pub fn missing_argument(op: &str, name: &str) -> Self {
        Self::MissingArgument {
            op: op.to_string(),
            name: name.to_string(),
        }
    }

    /// Creates a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(op: &str, name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            op: op.to_string(),
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Creates a new unsupported dtype error.
    #[must_use]
    pub fn dtype_not_supported(op: &str, dtype: DType) -> Self {
        Self::DTypeNotSupported {
            op: op.to_string(),
            dtype,
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::shape_mismatch(&[2, 3], &[2, 4]);
        assert!(err.to_string().contains("Shape mismatch"));
    }

    #[test]
    fn test_unsupported_output_display() {
        let err = Error::UnsupportedOutputType {
            op: "Tensor.all".to_string(),
            found: "bool".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Tensor.all"));
        assert!(msg.contains("bool"));
    }

    #[test]
    fn test_argument_errors() {
        let err = Error::missing_argument("threshold", "value");
        assert_eq!(err.to_string(), "threshold() missing required argument 'value'");

        let err = Error::invalid_argument("dropout", "p", "must be in [0, 1], got 2");
        assert!(err.to_string().starts_with("dropout(): argument 'p'"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::dtype_not_supported("bitwise_not", DType::F32);
        let err2 = Error::dtype_not_supported("bitwise_not", DType::F32);
        assert_eq!(err1, err2);
    }
}
