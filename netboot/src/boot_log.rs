// Boot logging backend for diagnostics and debugging

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

use crate::error::{BootError, Result};

pub const MAX_LOG_ENTRIES: usize = 256;

/// In-memory `log` backend keeping the most recent lines
pub struct BootLog {
    entries: Mutex<VecDeque<String>>,
}

impl BootLog {
    pub const fn new() -> Self {
        Self { entries: Mutex::new(VecDeque::new()) }
    }

    fn push(&self, line: String) {
        let mut entries = self.entries.lock();
        if entries.len() == MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(line);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Write every retained line to a console
    pub fn dump<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "=== Boot Log ===")?;
        for entry in self.entries.lock().iter() {
            writeln!(out, "{}", entry)?;
        }
        Ok(())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for BootLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for BootLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.push(format!("[{}] {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

/// Global boot logger
pub static BOOT_LOG: BootLog = BootLog::new();

/// Install [`BOOT_LOG`] as the `log` backend
pub fn init_logger(level: LevelFilter) -> Result {
    log::set_logger(&BOOT_LOG).map_err(|_| BootError::ConfigurationError("logger already installed"))?;
    log::set_max_level(level);
    Ok(())
}
