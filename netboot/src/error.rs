//! Boot engine error handling
//!
//! This module defines the error types used throughout the boot engine
//! for consistent error reporting and handling.
//!
//! Two variants are not failures at all: [`BootError::Exit`] and
//! [`BootError::Restart`] carry control requests from collaborators back
//! to the controller. Returning them through `?` replaces the global
//! non-local jump the firmware loop used to rely on.

use core::fmt;

use crate::boot_order::DeviceClass;
use crate::boot_stage::ResumeTarget;

/// Boot engine error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Device errors
    ProbeFailed,
    DeviceError(&'static str),

    /// Registry errors
    InvalidDeviceClass,
    DriverNotRegistered(DeviceClass),
    DriverAlreadyRegistered(DeviceClass),

    /// Configuration phase errors (e.g. no DHCP offer)
    ConfigurationFailed(&'static str),
    NoOffer,

    /// Load phase errors (e.g. TFTP transfer error)
    LoadFailed(&'static str),
    FileNotFound,
    Timeout,

    /// Boot configuration errors
    InvalidBootConfig,
    ConfigurationError(&'static str),

    /// Control requests
    Exit(i32),
    Restart(ResumeTarget),
}

impl BootError {
    /// Convert to an error code suitable for passing to firmware
    pub fn as_error_code(&self) -> u32 {
        match self {
            BootError::ProbeFailed => 0x6000,
            BootError::DeviceError(_) => 0x6002,
            BootError::InvalidDeviceClass => 0x6100,
            BootError::DriverNotRegistered(_) => 0x6101,
            BootError::DriverAlreadyRegistered(_) => 0x6102,
            BootError::ConfigurationFailed(_) => 0x8000,
            BootError::NoOffer => 0x8001,
            BootError::LoadFailed(_) => 0x9000,
            BootError::FileNotFound => 0x9001,
            BootError::Timeout => 0x9002,
            BootError::InvalidBootConfig => 0xA000,
            BootError::ConfigurationError(_) => 0xA001,
            BootError::Exit(status) => 0xE000 | (*status as u32 & 0xFF),
            BootError::Restart(_) => 0xE100,
        }
    }

    /// Get a human-readable description of the error
    pub fn description(&self) -> &'static str {
        match self {
            BootError::ProbeFailed => "Probe failed",
            BootError::DeviceError(msg) => *msg,
            BootError::InvalidDeviceClass => "Invalid device class",
            BootError::DriverNotRegistered(_) => "No driver registered for device class",
            BootError::DriverAlreadyRegistered(_) => "Driver already registered for device class",
            BootError::ConfigurationFailed(msg) => *msg,
            BootError::NoOffer => "No configuration offer received",
            BootError::LoadFailed(msg) => *msg,
            BootError::FileNotFound => "Boot file not found",
            BootError::Timeout => "Operation timed out",
            BootError::InvalidBootConfig => "Invalid boot configuration",
            BootError::ConfigurationError(msg) => *msg,
            BootError::Exit(_) => "Exit requested",
            BootError::Restart(_) => "Restart requested",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Every device, configuration and load failure is survivable by moving
    /// on to the next candidate.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            BootError::Exit(_)
                | BootError::Restart(_)
                | BootError::InvalidBootConfig
                | BootError::DriverAlreadyRegistered(_)
        )
    }

    /// Check if this value is a control request rather than a failure
    pub fn is_control(&self) -> bool {
        matches!(self, BootError::Exit(_) | BootError::Restart(_))
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::DriverNotRegistered(class) => write!(
                f,
                "BootError: {} {} (code: {:#x})",
                self.description(),
                class,
                self.as_error_code()
            ),
            BootError::Exit(status) => write!(f, "BootError: {} (status: {})", self.description(), status),
            _ => write!(f, "BootError: {} (code: {:#x})", self.description(), self.as_error_code()),
        }
    }
}

/// Result type used throughout the boot engine
pub type Result<T = ()> = core::result::Result<T, BootError>;
