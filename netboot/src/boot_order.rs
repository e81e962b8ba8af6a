//! Boot order codec
//!
//! The boot priority is configured as one packed `u32`: an array of
//! `BOOT_BITS`-wide fields, lowest field first. The low bits of a field
//! select the device class, the high bit is the failsafe flag.
//!
//! ```text
//!  31      28 27      24        7       4 3  2     0
//! +----------+----------+ ... +----------+--+-------+
//! | entry 7  | entry 6  |     | entry 1  |F | class |
//! +----------+----------+ ... +----------+--+-------+
//! ```
//!
//! Decoding is total: every bit pattern yields a valid, possibly empty,
//! [`BootOrder`].

use core::fmt;

use arrayvec::ArrayVec;
use bitflags::bitflags;
use static_assertions::const_assert;

/// Width of one packed boot entry
pub const BOOT_BITS: u32 = 4;
/// Mask selecting one packed field
pub const BOOT_MASK: u32 = (1 << BOOT_BITS) - 1;
/// Mask selecting the device class within a field
pub const BOOT_TYPE_MASK: u32 = (1 << (BOOT_BITS - 1)) - 1;
/// Failsafe bit within a field
pub const BOOT_FAILSAFE: u32 = 1 << (BOOT_BITS - 1);
/// Number of fields a packed order can hold
pub const MAX_BOOT_ENTRIES: usize = (u32::BITS / BOOT_BITS) as usize;

pub const BOOT_NIC: u32 = 0;
pub const BOOT_DISK: u32 = 1;
pub const BOOT_FLOPPY: u32 = 2;
pub const BOOT_NOTHING: u32 = 3;

/// Network first, nothing after it
pub const DEFAULT_BOOT_ORDER: u32 = BOOT_NIC | (BOOT_NOTHING << BOOT_BITS);
/// Any instance of the first class is acceptable
pub const DEFAULT_BOOT_INDEX: u32 = 0;

const_assert!(MAX_BOOT_ENTRIES * BOOT_BITS as usize == u32::BITS as usize);
const_assert!(BOOT_NOTHING <= BOOT_TYPE_MASK);
const_assert!(BOOT_TYPE_MASK & BOOT_FAILSAFE == 0);

bitflags! {
    /// Modifier bits carried by a packed field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u8 {
        const FAILSAFE = BOOT_FAILSAFE as u8;
    }
}

/// Device class selected by a boot entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DeviceClass {
    Nic = BOOT_NIC as u8,
    Disk = BOOT_DISK as u8,
    Floppy = BOOT_FLOPPY as u8,
    /// Terminates the boot order
    Nothing = BOOT_NOTHING as u8,
}

impl DeviceClass {
    /// Number of real (bootable) classes
    pub const COUNT: usize = BOOT_NOTHING as usize;

    /// Real classes in registry order
    pub const ALL: [DeviceClass; Self::COUNT] = [DeviceClass::Nic, DeviceClass::Disk, DeviceClass::Floppy];

    /// Map a class type value; anything at or past `BOOT_NOTHING` is `Nothing`
    pub const fn from_type(value: u32) -> Self {
        match value & BOOT_TYPE_MASK {
            BOOT_NIC => DeviceClass::Nic,
            BOOT_DISK => DeviceClass::Disk,
            BOOT_FLOPPY => DeviceClass::Floppy,
            _ => DeviceClass::Nothing,
        }
    }

    pub const fn as_type(self) -> u32 {
        self as u32
    }

    /// Registry slot index, `None` for `Nothing`
    pub const fn index(self) -> Option<usize> {
        match self {
            DeviceClass::Nothing => None,
            other => Some(other as usize),
        }
    }

    pub const fn is_nothing(self) -> bool {
        matches!(self, DeviceClass::Nothing)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DeviceClass::Nic => "nic",
            DeviceClass::Disk => "disk",
            DeviceClass::Floppy => "floppy",
            DeviceClass::Nothing => "nothing",
        }
    }

    /// Parse a class name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nic" | "net" | "network" => Some(DeviceClass::Nic),
            "disk" | "hd" => Some(DeviceClass::Disk),
            "floppy" | "fd" => Some(DeviceClass::Floppy),
            "nothing" | "none" => Some(DeviceClass::Nothing),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded (device class, failsafe) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BootEntry {
    pub class: DeviceClass,
    pub flags: EntryFlags,
}

impl BootEntry {
    pub const fn new(class: DeviceClass) -> Self {
        Self { class, flags: EntryFlags::empty() }
    }

    pub const fn failsafe(class: DeviceClass) -> Self {
        Self { class, flags: EntryFlags::FAILSAFE }
    }

    /// Decode a single packed field
    pub fn from_field(field: u32) -> Self {
        let field = field & BOOT_MASK;
        Self {
            class: DeviceClass::from_type(field),
            flags: EntryFlags::from_bits_truncate(field as u8),
        }
    }

    /// Pack into a single field
    pub fn field(&self) -> u32 {
        (self.class.as_type() & BOOT_TYPE_MASK) | self.flags.bits() as u32
    }

    pub fn is_failsafe(&self) -> bool {
        self.flags.contains(EntryFlags::FAILSAFE)
    }
}

impl fmt::Display for BootEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_failsafe() {
            write!(f, "{}!", self.class)
        } else {
            write!(f, "{}", self.class)
        }
    }
}

/// Ordered, immutable sequence of boot entries
///
/// Holds only real classes: decoding stops at the first `Nothing`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BootOrder {
    entries: ArrayVec<BootEntry, MAX_BOOT_ENTRIES>,
}

impl BootOrder {
    /// Decode a packed boot order
    pub fn decode(order: u32) -> Self {
        let mut entries = ArrayVec::new();
        for i in 0..MAX_BOOT_ENTRIES {
            let entry = BootEntry::from_field(order >> (i as u32 * BOOT_BITS));
            if entry.class.is_nothing() {
                break;
            }
            entries.push(entry);
        }
        Self { entries }
    }

    /// Build an order from explicit entries
    ///
    /// Entries after the first `Nothing` and past `MAX_BOOT_ENTRIES` are
    /// dropped, the same way the packed form would lose them.
    pub fn from_entries(list: &[BootEntry]) -> Self {
        let entries = list
            .iter()
            .copied()
            .take_while(|entry| !entry.class.is_nothing())
            .take(MAX_BOOT_ENTRIES)
            .collect();
        Self { entries }
    }

    /// Pack back into the configuration form
    pub fn encode(&self) -> u32 {
        encode(&self.entries)
    }

    pub fn get(&self, index: usize) -> Option<BootEntry> {
        self.entries.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BootEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[BootEntry] {
        &self.entries
    }
}

impl fmt::Display for BootOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("nothing");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Decode a packed boot order
pub fn decode(order: u32) -> BootOrder {
    BootOrder::decode(order)
}

/// Pack entries, terminating with `Nothing` while room remains
pub fn encode(entries: &[BootEntry]) -> u32 {
    let mut order = 0u32;
    let mut slot = 0usize;
    for entry in entries.iter().take(MAX_BOOT_ENTRIES) {
        if entry.class.is_nothing() {
            break;
        }
        order |= entry.field() << (slot as u32 * BOOT_BITS);
        slot += 1;
    }
    if slot < MAX_BOOT_ENTRIES {
        order |= BOOT_NOTHING << (slot as u32 * BOOT_BITS);
    }
    order
}
