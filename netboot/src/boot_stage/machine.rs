//! Boot iteration state machine
//!
//! [`BootMachine::step`] runs one state against the owned [`BootContext`]
//! and returns a [`Transition`]. The machine never blocks, never boots an
//! image and never terminates on its own; the controller interprets the
//! transitions that need more than a state change.

use alloc::string::ToString;
use core::fmt;

use crate::boot_order::BootOrder;
use crate::config::BootConfig;
use crate::device::{Device, ProbeState};
use crate::error::BootError;
use crate::host::Host;
use crate::registry::DeviceClassRegistry;
use crate::status::{BootEvent, emit};

use super::state::{BootState, ResumeTarget, Transition};

/// Everything the boot loop owns
pub struct BootContext {
    pub registry: DeviceClassRegistry,
    pub device: Device,
    pub config: BootConfig,
}

impl BootContext {
    pub fn new(config: BootConfig, registry: DeviceClassRegistry) -> Self {
        Self { registry, device: Device::new(), config }
    }
}

/// Counters across every pass of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootStats {
    pub passes: u32,
    pub attempts: u32,
    pub probe_failures: u32,
    pub wrong_index: u32,
    pub configuration_failures: u32,
    pub load_failures: u32,
    pub images_booted: u32,
    pub images_returned: u32,
}

impl fmt::Display for BootStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "passes: {}, attempts: {}, probe failures: {}, wrong index: {}, configuration failures: {}, load failures: {}, images: {}/{} returned",
            self.passes,
            self.attempts,
            self.probe_failures,
            self.wrong_index,
            self.configuration_failures,
            self.load_failures,
            self.images_returned,
            self.images_booted
        )
    }
}

/// Cursor and counters of the boot iteration
pub struct BootMachine {
    order: BootOrder,
    boot_index: u32,
    /// Position of the bound class in the order; `None` before the first
    /// candidate of a pass
    cursor: Option<usize>,
    stats: BootStats,
}

/// Map a control request returned by a collaborator
fn control(error: BootError) -> Option<Transition> {
    match error {
        BootError::Exit(status) => Some(Transition::Exit(status)),
        BootError::Restart(target) => Some(Transition::Restart(target)),
        _ => None,
    }
}

impl BootMachine {
    pub fn new(config: &BootConfig) -> Self {
        Self {
            order: config.order(),
            boot_index: config.boot_index,
            cursor: None,
            stats: BootStats::default(),
        }
    }

    /// Candidates of this pass were already tried
    pub fn skip(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn order(&self) -> &BootOrder {
        &self.order
    }

    pub fn passes(&self) -> u32 {
        self.stats.passes
    }

    pub fn stats(&self) -> &BootStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut BootStats {
        &mut self.stats
    }

    /// Run one state
    pub fn step<H: Host + ?Sized>(&mut self, state: BootState, ctx: &mut BootContext, host: &mut H) -> Transition {
        #[cfg(feature = "verbose_logging")]
        log::trace!("boot state {} (cursor {:?}, device {})", state, self.cursor, ctx.device);

        match state {
            BootState::Start => self.start(ctx),
            BootState::Select => self.select(ctx, host),
            BootState::Probe => self.probe(ctx, host),
            BootState::Configure => self.configure(ctx, host),
            BootState::Load => self.load(ctx, host),
            BootState::Wake(target) => self.wake(target, ctx, host),
            BootState::Abort => {
                emit(host, BootEvent::Abort);
                if self.past_order() {
                    Transition::Next(BootState::Start)
                } else {
                    Transition::Next(BootState::Select)
                }
            }
            BootState::AbortAll => {
                self.cursor = Some(self.order.len());
                Transition::Next(BootState::Start)
            }
        }
    }

    fn past_order(&self) -> bool {
        self.cursor.is_some_and(|i| i >= self.order.len())
    }

    fn start(&mut self, ctx: &mut BootContext) -> Transition {
        if ctx.config.exit_if_no_offer && self.stats.passes > 0 {
            log::info!("no boot offer after {} pass(es), giving up", self.stats.passes);
            return Transition::Exit(0);
        }
        self.stats.passes = self.stats.passes.saturating_add(1);
        self.cursor = None;
        ctx.device.reset();
        log::debug!("boot pass {} over {}", self.stats.passes, self.order);
        Transition::Next(BootState::Select)
    }

    fn select<H: Host + ?Sized>(&mut self, ctx: &mut BootContext, host: &mut H) -> Transition {
        if ctx.device.is_bound() {
            ctx.device.probe_state = ProbeState::Next;
            return Transition::Next(BootState::Probe);
        }

        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = Some(next);
        let Some(entry) = self.order.get(next) else {
            if next == 0 {
                log::info!("boot order is empty");
                return Transition::Exit(0);
            }
            emit(host, BootEvent::NoMoreDevices);
            return Transition::Idle;
        };

        let slot = ctx.registry.slot(entry.class).unwrap_or_default();
        ctx.device.bind(&entry, slot);
        Transition::Next(BootState::Probe)
    }

    fn probe<H: Host + ?Sized>(&mut self, ctx: &mut BootContext, host: &mut H) -> Transition {
        let class = ctx.device.class;
        let driver = ctx.registry.driver_name(class).unwrap_or("none");
        emit(host, BootEvent::Probing { class, driver, how: ctx.device.probe_state });
        self.stats.attempts = self.stats.attempts.saturating_add(1);

        let result = match ctx.registry.lookup(class) {
            Ok(ops) => ops.probe(&mut ctx.device),
            Err(error) => Err(error),
        };
        if let Err(error) = result {
            if let Some(transition) = control(error) {
                return transition;
            }
            ctx.device.probe_state = ProbeState::Failed;
            self.stats.probe_failures = self.stats.probe_failures.saturating_add(1);
            emit(host, BootEvent::ProbeFailed { class, error });
            if let Ok(ops) = ctx.registry.lookup(class) {
                ops.disable(&mut ctx.device);
            }
            ctx.device.reset();
            return Transition::Next(BootState::Select);
        }
        ctx.device.probe_state = ProbeState::Worked;

        if self.cursor == Some(0) && self.boot_index != 0 && self.boot_index != ctx.device.type_index {
            self.stats.wrong_index = self.stats.wrong_index.saturating_add(1);
            emit(host, BootEvent::WrongIndex { requested: self.boot_index, found: ctx.device.type_index });
            return Transition::Next(BootState::Select);
        }

        let description = match ctx.registry.lookup(class) {
            Ok(ops) => ops.describe(&ctx.device),
            Err(_) => ctx.device.to_string(),
        };
        emit(host, BootEvent::DeviceFound { driver, class, description });
        Transition::Next(BootState::Configure)
    }

    fn configure<H: Host + ?Sized>(&mut self, ctx: &mut BootContext, host: &mut H) -> Transition {
        let result = ctx
            .registry
            .lookup(ctx.device.class)
            .and_then(|ops| ops.load_configuration(&mut ctx.device));
        match result {
            Ok(()) => Transition::Next(BootState::Load),
            Err(error) => control(error).unwrap_or_else(|| {
                self.stats.configuration_failures = self.stats.configuration_failures.saturating_add(1);
                emit(host, BootEvent::ConfigurationFailed { error });
                Transition::Next(BootState::Abort)
            }),
        }
    }

    fn load<H: Host + ?Sized>(&mut self, ctx: &mut BootContext, host: &mut H) -> Transition {
        let result = ctx.registry.lookup(ctx.device.class).and_then(|ops| ops.load(&mut ctx.device));
        match result {
            Ok(image) => {
                emit(host, BootEvent::ImageLoaded { name: image.name() });
                Transition::Boot(image)
            }
            Err(error) => control(error).unwrap_or_else(|| {
                self.stats.load_failures = self.stats.load_failures.saturating_add(1);
                emit(host, BootEvent::LoadFailed { error });
                Transition::Next(BootState::Abort)
            }),
        }
    }

    fn wake<H: Host + ?Sized>(&mut self, target: ResumeTarget, ctx: &mut BootContext, host: &mut H) -> Transition {
        if !ctx.device.is_bound() {
            log::debug!("no device to wake for {}", target);
            return Transition::Next(BootState::Abort);
        }

        ctx.device.probe_state = ProbeState::Awake;
        let class = ctx.device.class;
        let driver = ctx.registry.driver_name(class).unwrap_or("none");
        emit(host, BootEvent::Probing { class, driver, how: ProbeState::Awake });

        let result = ctx.registry.lookup(class).and_then(|ops| ops.probe(&mut ctx.device));
        match result {
            Ok(()) => {
                ctx.device.probe_state = ProbeState::Worked;
                Transition::Next(target.phase())
            }
            Err(error) => control(error).unwrap_or_else(|| {
                ctx.device.probe_state = ProbeState::Failed;
                self.stats.probe_failures = self.stats.probe_failures.saturating_add(1);
                emit(host, BootEvent::ProbeFailed { class, error });
                Transition::Next(BootState::Abort)
            }),
        }
    }
}
