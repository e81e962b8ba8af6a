//! Boot iteration stage
//!
//! Tries boot devices class by class in boot order, and instance by
//! instance within a class, until one yields a bootable image.

mod machine;
mod state;

pub use machine::{BootContext, BootMachine, BootStats};
pub use state::{BootState, ResumeTarget, Transition};
