//! The boot candidate device handle
//!
//! Exactly one [`Device`] is live at a time. It is recycled (reset, not
//! reallocated) for every class/instance attempt, and drivers only see it
//! for the duration of a single operation call.

use core::fmt;

use crate::boot_order::{BootEntry, DeviceClass};

/// How the next probe call should treat the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeState {
    /// Find the first instance of the class
    #[default]
    First,
    /// Find the instance after the current `type_index`
    Next,
    /// Re-wake the current instance after a restart
    Awake,
    /// The last probe found nothing
    Failed,
    /// The last probe found an instance
    Worked,
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeState::First => write!(f, "first"),
            ProbeState::Next => write!(f, "next"),
            ProbeState::Awake => write!(f, "awake"),
            ProbeState::Failed => write!(f, "failed"),
            ProbeState::Worked => write!(f, "ok"),
        }
    }
}

/// Shared driver state slot a class operates on
///
/// Disk and floppy share the disk slot, so their drivers see one
/// instance numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceSlot {
    #[default]
    None,
    Network,
    Disk,
}

/// Current candidate device of the current class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub class: DeviceClass,
    pub slot: DeviceSlot,
    /// Instance index within the class, in discovery order
    pub type_index: u32,
    pub failsafe: bool,
    pub probe_state: ProbeState,
}

impl Device {
    pub const fn new() -> Self {
        Self {
            class: DeviceClass::Nothing,
            slot: DeviceSlot::None,
            type_index: 0,
            failsafe: false,
            probe_state: ProbeState::First,
        }
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Bind to the first instance of a boot entry's class
    pub fn bind(&mut self, entry: &BootEntry, slot: DeviceSlot) {
        self.reset();
        self.class = entry.class;
        self.slot = slot;
        self.failsafe = entry.is_failsafe();
        self.probe_state = ProbeState::First;
        self.type_index = 0;
    }

    pub fn is_bound(&self) -> bool {
        !self.class.is_nothing()
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class, self.type_index)?;
        if self.failsafe {
            write!(f, " (failsafe)")?;
        }
        Ok(())
    }
}
