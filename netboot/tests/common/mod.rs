//! Shared fakes for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use nos_netboot::*;
use spin::Mutex;

/// Ordered record of driver, image and host activity
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

/// What an image does when booted
#[derive(Clone, Copy)]
pub struct ImageBehavior {
    pub started: bool,
    pub exit: Option<i32>,
}

pub struct FakeImage {
    label: String,
    behavior: ImageBehavior,
    journal: Journal,
}

impl BootImage for FakeImage {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn boot(&mut self, context: &ImageContext) -> bool {
        self.journal.lock().push(format!("boot {}", self.label));
        if let Some(status) = self.behavior.exit {
            context.exit.exit(status);
        }
        self.behavior.started
    }
}

/// Driver with `present` instances numbered from zero
pub struct FakeDriver {
    name: &'static str,
    present: u32,
    journal: Journal,
    configure: VecDeque<Result<()>>,
    load: VecDeque<Result<()>>,
    wake: VecDeque<Result<()>>,
    image: ImageBehavior,
}

impl FakeDriver {
    pub fn new(name: &'static str, present: u32, journal: &Journal) -> Self {
        Self {
            name,
            present,
            journal: Arc::clone(journal),
            configure: VecDeque::new(),
            load: VecDeque::new(),
            wake: VecDeque::new(),
            image: ImageBehavior { started: true, exit: None },
        }
    }

    /// Scripted configuration results; `Ok` once exhausted
    pub fn configure_results(mut self, results: impl IntoIterator<Item = Result<()>>) -> Self {
        self.configure.extend(results);
        self
    }

    pub fn load_results(mut self, results: impl IntoIterator<Item = Result<()>>) -> Self {
        self.load.extend(results);
        self
    }

    /// Scripted results of `Awake` probes; success once exhausted
    pub fn wake_results(mut self, results: impl IntoIterator<Item = Result<()>>) -> Self {
        self.wake.extend(results);
        self
    }

    pub fn image(mut self, started: bool, exit: Option<i32>) -> Self {
        self.image = ImageBehavior { started, exit };
        self
    }

    fn record(&self, line: String) {
        self.journal.lock().push(line);
    }
}

impl DeviceClassOps for FakeDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn probe(&mut self, device: &mut Device) -> Result<()> {
        let index = match device.probe_state {
            ProbeState::Next => device.type_index + 1,
            ProbeState::Awake => {
                self.record(format!("wake {}#{}", self.name, device.type_index));
                return self.wake.pop_front().unwrap_or(Ok(()));
            }
            _ => 0,
        };
        if index >= self.present {
            self.record(format!("probe {} {} -> none", self.name, device.probe_state));
            return Err(BootError::ProbeFailed);
        }
        self.record(format!("probe {} {} -> {}", self.name, device.probe_state, index));
        device.type_index = index;
        Ok(())
    }

    fn load_configuration(&mut self, device: &mut Device) -> Result<()> {
        self.record(format!("configure {}#{}", self.name, device.type_index));
        self.configure.pop_front().unwrap_or(Ok(()))
    }

    fn load(&mut self, device: &mut Device) -> Result<LoadedImage> {
        let label = format!("{}#{}", self.name, device.type_index);
        self.record(format!("load {}", label));
        self.load.pop_front().unwrap_or(Ok(()))?;
        Ok(Box::new(FakeImage { label, behavior: self.image, journal: Arc::clone(&self.journal) }))
    }

    fn disable(&mut self, device: &mut Device) {
        self.record(format!("disable {}#{}", self.name, device.type_index));
    }

    fn describe(&self, device: &Device) -> String {
        format!("instance {}", device.type_index)
    }
}

/// Host recording hooks and events, optionally stopping the loop
pub struct TestHost {
    pub journal: Journal,
    pub events: Vec<BootEvent>,
    pub idles: u32,
    pub resets: u32,
    stop_after_idles: Option<(u32, i32, ExitHandle)>,
    exit_on_init: Option<(i32, ExitHandle)>,
    exit_on_report: Option<(&'static str, usize, i32, ExitHandle)>,
}

impl TestHost {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            events: Vec::new(),
            idles: 0,
            resets: 0,
            stop_after_idles: None,
            exit_on_init: None,
            exit_on_report: None,
        }
    }

    /// Request exit with `status` from the `idles`th idle
    pub fn stop_after_idles(&mut self, idles: u32, status: i32, handle: ExitHandle) {
        self.stop_after_idles = Some((idles, status, handle));
    }

    /// Request exit from an init function
    pub fn exit_on_init(&mut self, status: i32, handle: ExitHandle) {
        self.exit_on_init = Some((status, handle));
    }

    /// Request exit when `line` is reported for the `nth` time
    pub fn exit_on_report(&mut self, line: &'static str, nth: usize, status: i32, handle: ExitHandle) {
        self.exit_on_report = Some((line, nth, status, handle));
    }

    pub fn count(&self, event: &BootEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }
}

impl Host for TestHost {
    fn call_init_functions(&mut self) {
        self.journal.lock().push("init".to_string());
        if let Some((status, handle)) = &self.exit_on_init {
            handle.exit(*status);
        }
    }

    fn call_exit_functions(&mut self) {
        self.journal.lock().push("exit".to_string());
    }

    fn call_reset_functions(&mut self) {
        self.resets += 1;
    }

    fn idle(&mut self, delay: Duration) {
        self.idles += 1;
        self.journal.lock().push(format!("idle {}s", delay.as_secs()));
        if let Some((after, status, handle)) = &self.stop_after_idles {
            if self.idles >= *after {
                handle.exit(*status);
            }
        }
    }

    fn report(&mut self, event: &BootEvent) {
        self.events.push(event.clone());
        if let Some((line, nth, status, handle)) = &self.exit_on_report {
            let seen = self.events.iter().filter(|e| e.to_string() == *line).count();
            if seen == *nth && event.to_string() == *line {
                handle.exit(*status);
            }
        }
    }
}

pub fn registry(drivers: Vec<(DeviceClass, FakeDriver)>) -> DeviceClassRegistry {
    let mut builder = DeviceClassRegistry::builder();
    for (class, driver) in drivers {
        let slot = match class {
            DeviceClass::Nic => DeviceSlot::Network,
            _ => DeviceSlot::Disk,
        };
        builder = builder.register(class, slot, Box::new(driver)).expect("register driver");
    }
    builder.build()
}

pub fn order(classes: &[DeviceClass]) -> BootConfig {
    let entries: Vec<BootEntry> = classes.iter().map(|class| BootEntry::new(*class)).collect();
    BootConfig::new().with_entries(&entries)
}
