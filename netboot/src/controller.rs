//! Top-level boot loop
//!
//! [`BootController::run`] drives the [`BootMachine`] until an exit is
//! honored. Between attempts it quiesces the current device and runs the
//! host reset functions; that is also the only place a pending exit takes
//! effect.

use crate::boot_stage::{BootContext, BootMachine, BootState, BootStats, Transition};
use crate::config::BootConfig;
use crate::context::{ExecutionContext, ExitHandle};
use crate::host::Host;
use crate::image::{ImageContext, LoadedImage};
use crate::registry::DeviceClassRegistry;
use crate::status::{BootEvent, emit};

pub struct BootController<H: Host> {
    host: H,
    ctx: BootContext,
    machine: BootMachine,
    exec: ExecutionContext,
}

impl<H: Host> BootController<H> {
    pub fn new(config: BootConfig, registry: DeviceClassRegistry, host: H) -> Self {
        let machine = BootMachine::new(&config);
        Self {
            host,
            ctx: BootContext::new(config, registry),
            machine,
            exec: ExecutionContext::new(),
        }
    }

    /// Handle for hooks and images to request termination
    pub fn exit_handle(&self) -> ExitHandle {
        self.exec.exit_handle()
    }

    /// Run until an exit is honored; returns the exit status
    pub fn run(&mut self) -> i32 {
        self.host.call_init_functions();
        log::set_max_level(self.ctx.config.log_level);
        log::info!("{}", self.ctx.config);
        self.exec.gate().permit();

        let mut state = self.exec.take_resume();
        let status = loop {
            if state.is_safe_point() {
                self.quiesce();
                if let Some(status) = self.exec.try_exit() {
                    break status;
                }
            }

            state = match self.machine.step(state, &mut self.ctx, &mut self.host) {
                Transition::Next(next) => next,
                Transition::Idle => {
                    self.host.idle(self.ctx.config.idle_delay);
                    BootState::Start
                }
                Transition::Exit(status) => {
                    self.exec.request_exit(status);
                    BootState::Start
                }
                Transition::Restart(target) => {
                    log::debug!("restart into {}", target);
                    self.exec.restart(target);
                    self.exec.take_resume()
                }
                Transition::Boot(image) => self.boot_image(image),
            };
        };

        emit(&mut self.host, BootEvent::Exiting { status });
        log::debug!("{}", self.machine.stats());
        self.host.call_exit_functions();
        status
    }

    /// Disable the bound device and run the reset functions
    fn quiesce(&mut self) {
        if self.ctx.device.is_bound() {
            if let Ok(ops) = self.ctx.registry.lookup(self.ctx.device.class) {
                ops.disable(&mut self.ctx.device);
            }
        }
        self.host.call_reset_functions();
    }

    fn boot_image(&mut self, mut image: LoadedImage) -> BootState {
        self.quiesce();
        let context = ImageContext {
            class: self.ctx.device.class,
            type_index: self.ctx.device.type_index,
            exit: self.exec.exit_handle(),
        };
        log::info!("booting {} image from {}", image.name(), self.ctx.device);

        let stats = self.machine.stats_mut();
        stats.images_booted = stats.images_booted.saturating_add(1);
        let started = image.boot(&context);
        stats.images_returned = stats.images_returned.saturating_add(1);
        emit(&mut self.host, BootEvent::ImageReturned { name: image.name(), started });

        if self.ctx.config.rescan_after_return {
            BootState::Start
        } else {
            BootState::Abort
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &BootConfig {
        &self.ctx.config
    }

    pub fn device(&self) -> &crate::device::Device {
        &self.ctx.device
    }

    pub fn machine(&self) -> &BootMachine {
        &self.machine
    }

    pub fn stats(&self) -> &BootStats {
        self.machine.stats()
    }

    pub fn execution(&self) -> &ExecutionContext {
        &self.exec
    }
}
