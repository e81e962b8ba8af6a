// Boot iteration states and the transitions between them

use core::fmt;

use crate::image::LoadedImage;

/// Position of the boot iteration state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    /// Begin a pass from the first boot entry
    Start,
    /// Pick the next instance of the bound class, or the next class
    Select,
    Probe,
    Configure,
    Load,
    /// Re-wake the bound device, then resume into a phase
    Wake(ResumeTarget),
    /// Abandon the current attempt
    Abort,
    /// Abandon the whole pass
    AbortAll,
}

impl BootState {
    /// States entered between completed attempts.
    ///
    /// Devices are quiesced and pending exits honored only here.
    pub fn is_safe_point(&self) -> bool {
        matches!(self, BootState::Start | BootState::Select)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BootState::Start => "start",
            BootState::Select => "select",
            BootState::Probe => "probe",
            BootState::Configure => "configure",
            BootState::Load => "load",
            BootState::Wake(_) => "wake",
            BootState::Abort => "abort",
            BootState::AbortAll => "abort-all",
        }
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootState::Wake(target) => write!(f, "wake -> {}", target),
            other => f.write_str(other.name()),
        }
    }
}

/// Where a restart request re-enters the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeTarget {
    /// Drop the current attempt, continue with the next candidate
    Select,
    /// Re-wake the device and redo configuration
    Configure,
    /// Re-wake the device and redo the load
    Load,
    /// Start a fresh pass from the first boot entry
    Restart,
    /// Abandon the pass, then start a fresh one
    AbortAll,
}

impl ResumeTarget {
    /// Map the firmware's numeric restart codes
    pub fn from_code(code: i32) -> Self {
        match code {
            0 | 256 => ResumeTarget::Restart,
            1 => ResumeTarget::Load,
            2 => ResumeTarget::Configure,
            -3 => ResumeTarget::AbortAll,
            _ => ResumeTarget::Select,
        }
    }

    /// Phase entered after a successful wake
    pub fn phase(self) -> BootState {
        match self {
            ResumeTarget::Configure => BootState::Configure,
            ResumeTarget::Load => BootState::Load,
            _ => BootState::Abort,
        }
    }
}

impl From<ResumeTarget> for BootState {
    fn from(target: ResumeTarget) -> Self {
        match target {
            ResumeTarget::Select => BootState::Abort,
            ResumeTarget::Configure | ResumeTarget::Load => BootState::Wake(target),
            ResumeTarget::Restart => BootState::Start,
            ResumeTarget::AbortAll => BootState::AbortAll,
        }
    }
}

impl fmt::Display for ResumeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeTarget::Select => write!(f, "select"),
            ResumeTarget::Configure => write!(f, "configure"),
            ResumeTarget::Load => write!(f, "load"),
            ResumeTarget::Restart => write!(f, "restart"),
            ResumeTarget::AbortAll => write!(f, "abort-all"),
        }
    }
}

/// Result of one state machine step, interpreted by the controller
pub enum Transition {
    Next(BootState),
    /// Load succeeded; the controller hands off to the image
    Boot(LoadedImage),
    /// The pass is exhausted; idle, then start over
    Idle,
    /// Terminate with a status at the next safe point
    Exit(i32),
    /// A collaborator asked to re-enter the loop elsewhere
    Restart(ResumeTarget),
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Next(state) => f.debug_tuple("Next").field(state).finish(),
            Transition::Boot(image) => f.debug_tuple("Boot").field(&image.name()).finish(),
            Transition::Idle => f.write_str("Idle"),
            Transition::Exit(status) => f.debug_tuple("Exit").field(status).finish(),
            Transition::Restart(target) => f.debug_tuple("Restart").field(target).finish(),
        }
    }
}
