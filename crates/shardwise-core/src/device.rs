//! Device Abstraction - Tensor Placement Tags
//!
//! Identifies where a tensor lives. Shardwise keeps every payload in host
//! memory; the device is a placement tag carried through ops so that
//! `cuda()`/`cpu()`/`to(device)` round-trip the way callers expect.
//!
//! # Example
//! ```rust
//! use shardwise_core::Device;
//!
//! let cpu = Device::Cpu;
//! assert!(cpu.is_cpu());
//! assert_eq!(Device::parse("cuda:1"), Some(Device::Cuda(1)));
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Device Enum
// =============================================================================

/// Represents a compute device a tensor is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// CPU device.
    Cpu,

    /// CUDA GPU device with device index.
    Cuda(usize),
}

impl Device {
    /// Returns true if this is a CPU device.
    #[must_use]
    pub const fn is_cpu(self) -> bool {
        matches!(self, Self::Cpu)
    }

    /// Returns true if this is a GPU device.
    #[must_use]
    pub const fn is_gpu(self) -> bool {
        !self.is_cpu()
    }

    /// Returns the device index for GPU devices, or 0 for CPU.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Cuda(idx) => idx,
        }
    }

    /// Returns the name of this device type.
    #[must_use]
    pub const fn device_type(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda(_) => "cuda",
        }
    }

    /// Returns the default CPU device.
    #[must_use]
    pub const fn cpu() -> Self {
        Self::Cpu
    }

    /// Returns a CUDA device with the given index.
    #[must_use]
    pub const fn cuda(index: usize) -> Self {
        Self::Cuda(index)
    }

    /// Parses `cpu`, `cuda` or `cuda:<index>`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.split_once(':') {
            None if name == "cpu" => Some(Self::Cpu),
            None if name == "cuda" => Some(Self::Cuda(0)),
            Some(("cuda", idx)) => idx.parse().ok().map(Self::Cuda),
            _ => None,
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(idx) => write!(f, "cuda:{idx}"),
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
    fn test_cpu_device() {
        let device = Device::Cpu;
        assert!(device.is_cpu());
        assert!(!device.is_gpu());
        assert_eq!(device.device_type(), "cpu");
        assert_eq!(device.index(), 0);
    }

    #[test]
    fn test_cuda_device() {
        let device = Device::cuda(2);
        assert!(device.is_gpu());
        assert_eq!(device.index(), 2);
        assert_eq!(format!("{device}"), "cuda:2");
    }

    #[test]
    fn test_device_parse() {
        assert_eq!(Device::parse("cpu"), Some(Device::Cpu));
        assert_eq!(Device::parse("cuda"), Some(Device::Cuda(0)));
        assert_eq!(Device::parse("cuda:3"), Some(Device::Cuda(3)));
        assert_eq!(Device::parse("cuda:x"), None);
        assert_eq!(Device::parse("metal"), None);
    }

    #[test]
    fn test_device_default() {
        assert_eq!(Device::default(), Device::Cpu);
    }
}
