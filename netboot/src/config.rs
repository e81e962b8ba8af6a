// Boot configuration and runtime settings

use core::fmt;
use core::time::Duration;

use arrayvec::ArrayVec;
use log::LevelFilter;

use crate::boot_order::{
    BOOT_BITS, BOOT_DISK, BOOT_FLOPPY, BOOT_NIC, BOOT_NOTHING, BootEntry, BootOrder, DEFAULT_BOOT_INDEX,
    DEFAULT_BOOT_ORDER, DeviceClass, MAX_BOOT_ENTRIES,
};

/// Pause between two passes over the boot order
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    /// Packed boot order, see [`crate::boot_order`]
    pub boot_order: u32,
    /// Required instance of the first class; 0 accepts any
    pub boot_index: u32,
    pub idle_delay: Duration,
    /// Stop with status 0 after the first failed pass instead of retrying
    pub exit_if_no_offer: bool,
    /// Rescan from the first boot entry after an image returns
    pub rescan_after_return: bool,
    pub log_level: LevelFilter,
}

impl BootConfig {
    pub fn new() -> Self {
        Self {
            boot_order: DEFAULT_BOOT_ORDER,
            boot_index: DEFAULT_BOOT_INDEX,
            idle_delay: DEFAULT_IDLE_DELAY,
            exit_if_no_offer: false,
            rescan_after_return: false,
            log_level: LevelFilter::Info,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.boot_order = order;
        self
    }

    pub fn with_entries(mut self, entries: &[BootEntry]) -> Self {
        self.boot_order = crate::boot_order::encode(entries);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.boot_index = index;
        self
    }

    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Decoded boot order
    pub fn order(&self) -> BootOrder {
        BootOrder::decode(self.boot_order)
    }

    /// Apply space separated command-line flags
    ///
    /// Unknown flags and malformed values are skipped with a warning.
    /// Returns the number of flags applied.
    ///
    /// # Example command lines
    /// - `order=nic,disk! index=1`
    /// - `order=0x31 idle=5 exit-if-no-offer verbose`
    pub fn apply_cmdline_flags(&mut self, cmdline: &str) -> usize {
        let mut applied = 0;
        for token in cmdline.split_ascii_whitespace() {
            let (flag, value) = match token.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (token, None),
            };
            if self.apply_single_flag(flag, value) {
                applied += 1;
            } else {
                log::warn!("ignoring boot flag '{}'", token);
            }
        }
        applied
    }

    fn apply_single_flag(&mut self, flag: &str, value: Option<&str>) -> bool {
        match (flag, value) {
            ("verbose", None) => self.log_level = LevelFilter::Debug,
            ("debug", None) => self.log_level = LevelFilter::Trace,
            ("quiet", None) => self.log_level = LevelFilter::Warn,
            ("exit-if-no-offer", None) => self.exit_if_no_offer = true,
            ("rescan", None) => self.rescan_after_return = true,
            ("order", Some(value)) => match parse_order(value) {
                Some(order) => self.boot_order = order,
                None => return false,
            },
            ("index", Some(value)) => match parse_number(value) {
                Some(index) => self.boot_index = index,
                None => return false,
            },
            ("idle", Some(value)) => match parse_number(value) {
                Some(secs) => self.idle_delay = Duration::from_secs(secs as u64),
                None => return false,
            },
            _ => return false,
        }
        true
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BootConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boot order: {}", self.order())?;
        if self.boot_index != 0 {
            write!(f, " index: {}", self.boot_index)?;
        }
        write!(f, " idle: {}s", self.idle_delay.as_secs())?;
        if self.exit_if_no_offer {
            write!(f, " exit-if-no-offer")?;
        }
        if self.rescan_after_return {
            write!(f, " rescan")?;
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> Option<u32> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Either a packed number or a comma separated list of class names,
/// `!` marking a failsafe entry.
fn parse_order(value: &str) -> Option<u32> {
    if value.starts_with(|c: char| c.is_ascii_digit()) {
        return parse_number(value);
    }

    let mut entries: ArrayVec<BootEntry, MAX_BOOT_ENTRIES> = ArrayVec::new();
    for name in value.split(',').filter(|name| !name.is_empty()) {
        let (name, failsafe) = match name.strip_suffix('!') {
            Some(name) => (name, true),
            None => (name, false),
        };
        let class = DeviceClass::from_name(name)?;
        let entry = if failsafe { BootEntry::failsafe(class) } else { BootEntry::new(class) };
        entries.try_push(entry).ok()?;
    }
    Some(crate::boot_order::encode(&entries))
}

/// Answer to the interactive boot prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSelection {
    /// Boot nothing; the firmware exits
    Quit,
    /// Keep the configured order
    Default,
    Network,
    Disk,
    Floppy,
}

impl BootSelection {
    /// Map a key press; letters are case insensitive
    pub fn from_key(key: u8) -> Option<Self> {
        match key.to_ascii_uppercase() {
            b'Q' => Some(BootSelection::Quit),
            b'\n' | b'\r' => Some(BootSelection::Default),
            b'N' => Some(BootSelection::Network),
            b'D' => Some(BootSelection::Disk),
            b'F' => Some(BootSelection::Floppy),
            _ => None,
        }
    }

    /// Override the configured order and index
    pub fn apply(self, config: &mut BootConfig) {
        let only = |class: u32| class | (BOOT_NOTHING << BOOT_BITS);
        let order = match self {
            BootSelection::Default => return,
            BootSelection::Quit => BOOT_NOTHING,
            BootSelection::Network => only(BOOT_NIC),
            BootSelection::Disk => only(BOOT_DISK),
            BootSelection::Floppy => only(BOOT_FLOPPY),
        };
        config.boot_order = order;
        config.boot_index = 0;
    }
}
