//! Execution context: the single resumption point of the boot loop
//!
//! The context records where the loop resumes after a restart and the
//! status the program terminates with. Exit requests go through an
//! [`ExitGate`]: they are accepted at any time, but only honored once the
//! controller has permitted exits, and only at a safe point between
//! completed attempts.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spin::Mutex;

use crate::boot_stage::{BootState, ResumeTarget};

/// Deferred exit request latch
#[derive(Debug, Default)]
pub struct ExitGate {
    exit_ok: AtomicBool,
    pending: Mutex<Option<i32>>,
    requests: AtomicU32,
}

impl ExitGate {
    pub const fn new() -> Self {
        Self {
            exit_ok: AtomicBool::new(false),
            pending: Mutex::new(None),
            requests: AtomicU32::new(0),
        }
    }

    /// Record an exit request. The last request wins.
    pub fn request(&self, status: i32) {
        *self.pending.lock() = Some(status);
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Allow pending and future requests to be honored
    pub fn permit(&self) {
        self.exit_ok.store(true, Ordering::Release);
    }

    pub fn is_permitted(&self) -> bool {
        self.exit_ok.load(Ordering::Acquire)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Consume the pending request if exits are permitted
    pub fn take(&self) -> Option<i32> {
        if !self.is_permitted() {
            return None;
        }
        self.pending.lock().take()
    }

    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::Relaxed)
    }
}

/// Cloneable handle collaborators use to request termination
#[derive(Clone, Default)]
pub struct ExitHandle {
    gate: Arc<ExitGate>,
}

impl ExitHandle {
    /// Ask the boot loop to stop with `status`.
    ///
    /// Returns immediately; the loop unwinds at its next safe point.
    pub fn exit(&self, status: i32) {
        log::debug!("exit({}) requested", status);
        self.gate.request(status);
    }

    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }
}

impl fmt::Debug for ExitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitHandle")
            .field("permitted", &self.gate.is_permitted())
            .field("pending", &self.gate.is_pending())
            .finish()
    }
}

/// Saved resumption point of the top-level loop
#[derive(Debug)]
pub struct ExecutionContext {
    gate: Arc<ExitGate>,
    resume: BootState,
    exit_status: i32,
    restarts: u32,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(ExitGate::new()),
            resume: BootState::Start,
            exit_status: 0,
            restarts: 0,
        }
    }

    pub fn exit_handle(&self) -> ExitHandle {
        ExitHandle { gate: Arc::clone(&self.gate) }
    }

    pub fn gate(&self) -> &ExitGate {
        &self.gate
    }

    /// Record a direct exit request from the loop itself
    pub fn request_exit(&self, status: i32) {
        self.gate.request(status);
    }

    /// Honor a pending exit at a safe point
    pub fn try_exit(&mut self) -> Option<i32> {
        let status = self.gate.take()?;
        self.exit_status = status;
        Some(status)
    }

    /// Re-enter the loop at the state a restart target names
    pub fn restart(&mut self, target: ResumeTarget) {
        self.restarts += 1;
        self.resume = target.into();
    }

    /// State the loop resumes into; consumed by the controller
    pub fn take_resume(&mut self) -> BootState {
        core::mem::replace(&mut self.resume, BootState::Start)
    }

    pub fn exit_status(&self) -> i32 {
        self.exit_status
    }

    pub fn restart_count(&self) -> u32 {
        self.restarts
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
