//! Host collaborator interfaces
//!
//! The boot engine consumes process-wide lifecycle hooks, an idle delay and
//! a status console from the embedding firmware through [`Host`].
//! [`HookTable`] keeps ordered callback lists for firmware that registers
//! hooks at startup, and [`HookedHost`] turns such a table into a `Host`.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use crate::status::BootEvent;

/// Services the boot loop needs from the firmware around it
pub trait Host {
    /// Run registered initialisation functions, once at startup
    fn call_init_functions(&mut self);

    /// Run registered exit functions, once at termination
    fn call_exit_functions(&mut self);

    /// Run registered reset functions, before every attempt
    fn call_reset_functions(&mut self);

    /// Block for `delay` between passes
    fn idle(&mut self, delay: Duration);

    /// Print a status line
    fn report(&mut self, event: &BootEvent) {
        let _ = event;
    }
}

/// Lifecycle hook kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Init,
    Reset,
    Exit,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Init => write!(f, "init"),
            HookKind::Reset => write!(f, "reset"),
            HookKind::Exit => write!(f, "exit"),
        }
    }
}

pub type Hook = Box<dyn FnMut() + Send>;

/// Ordered lists of registered lifecycle callbacks
#[derive(Default)]
pub struct HookTable {
    init: Vec<Hook>,
    reset: Vec<Hook>,
    exit: Vec<Hook>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<Hook> {
        match kind {
            HookKind::Init => &mut self.init,
            HookKind::Reset => &mut self.reset,
            HookKind::Exit => &mut self.exit,
        }
    }

    /// Append a callback; callbacks run in registration order
    pub fn register(&mut self, kind: HookKind, hook: Hook) {
        self.list_mut(kind).push(hook);
    }

    /// Run every callback of a kind, returning how many ran
    pub fn run(&mut self, kind: HookKind) -> usize {
        let hooks = self.list_mut(kind);
        for hook in hooks.iter_mut() {
            hook();
        }
        log::trace!("ran {} {} hooks", hooks.len(), kind);
        hooks.len()
    }

    pub fn len(&self, kind: HookKind) -> usize {
        match kind {
            HookKind::Init => self.init.len(),
            HookKind::Reset => self.reset.len(),
            HookKind::Exit => self.exit.len(),
        }
    }
}

/// A [`Host`] built from a hook table and an idle routine
pub struct HookedHost<I: FnMut(Duration)> {
    hooks: HookTable,
    idle: I,
}

impl<I: FnMut(Duration)> HookedHost<I> {
    pub fn new(hooks: HookTable, idle: I) -> Self {
        Self { hooks, idle }
    }

    pub fn hooks_mut(&mut self) -> &mut HookTable {
        &mut self.hooks
    }
}

impl<I: FnMut(Duration)> Host for HookedHost<I> {
    fn call_init_functions(&mut self) {
        self.hooks.run(HookKind::Init);
    }

    fn call_exit_functions(&mut self) {
        self.hooks.run(HookKind::Exit);
    }

    fn call_reset_functions(&mut self) {
        self.hooks.run(HookKind::Reset);
    }

    fn idle(&mut self, delay: Duration) {
        (self.idle)(delay);
    }
}
