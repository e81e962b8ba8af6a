//! User visible status lines
//!
//! Every phase transition of a boot attempt produces one [`BootEvent`]. The
//! event goes to the `log` facade and to [`Host::report`] so the embedding
//! firmware can print it on its console.

use alloc::string::String;
use core::fmt;

use log::Level;

use crate::boot_order::DeviceClass;
use crate::device::ProbeState;
use crate::error::BootError;
use crate::host::Host;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootEvent {
    /// About to probe a class
    Probing { class: DeviceClass, driver: &'static str, how: ProbeState },
    ProbeFailed { class: DeviceClass, error: BootError },
    /// Probe worked but found an instance other than the requested one
    WrongIndex { requested: u32, found: u32 },
    DeviceFound { driver: &'static str, class: DeviceClass, description: String },
    ConfigurationFailed { error: BootError },
    LoadFailed { error: BootError },
    ImageLoaded { name: &'static str },
    /// Control came back from an image; `started` is its boot() result
    ImageReturned { name: &'static str, started: bool },
    NoMoreDevices,
    Abort,
    Exiting { status: i32 },
}

impl BootEvent {
    /// Log level the event is emitted at
    pub fn level(&self) -> Level {
        match self {
            BootEvent::Probing { .. } => Level::Debug,
            BootEvent::ProbeFailed { .. } | BootEvent::Abort => Level::Debug,
            BootEvent::WrongIndex { .. }
            | BootEvent::ConfigurationFailed { .. }
            | BootEvent::LoadFailed { .. }
            | BootEvent::ImageReturned { .. } => Level::Warn,
            _ => Level::Info,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            BootEvent::ProbeFailed { .. }
                | BootEvent::WrongIndex { .. }
                | BootEvent::ConfigurationFailed { .. }
                | BootEvent::LoadFailed { .. }
                | BootEvent::ImageReturned { .. }
        )
    }
}

impl fmt::Display for BootEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootEvent::Probing { class, driver, how } => write!(f, "{} ({}) probe {}", driver, class, how),
            BootEvent::ProbeFailed { error, .. } => write!(f, "...probe failed: {}", error.description()),
            BootEvent::WrongIndex { .. } => write!(f, "Wrong index"),
            BootEvent::DeviceFound { driver, class, description } => {
                write!(f, "{} {} has {}", driver, class, description)
            }
            BootEvent::ConfigurationFailed { error } => {
                write!(f, "...configuration failed: {}", error.description())
            }
            BootEvent::LoadFailed { error } => write!(f, "...load failed: {}", error.description()),
            BootEvent::ImageLoaded { name } => write!(f, "Loaded {} image", name),
            BootEvent::ImageReturned { started: true, .. } => write!(f, "...image returned"),
            BootEvent::ImageReturned { started: false, .. } => write!(f, "...boot failed: image returned"),
            BootEvent::NoMoreDevices => write!(f, "No more boot devices"),
            BootEvent::Abort => write!(f, "<abort>"),
            BootEvent::Exiting { status } => write!(f, "Exiting with status {}", status),
        }
    }
}

/// Log an event and hand it to the host console
pub(crate) fn emit<H: Host + ?Sized>(host: &mut H, event: BootEvent) {
    log::log!(event.level(), "{}", event);
    host.report(&event);
}
