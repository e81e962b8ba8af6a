//! Device class registry
//!
//! A fixed table mapping each real [`DeviceClass`] to the driver operation
//! set for that class and to the shared device slot it operates on. The
//! table is filled once by [`RegistryBuilder`] and frozen afterwards;
//! precedence between classes comes only from the boot order.

use alloc::boxed::Box;
use alloc::string::String;

use crate::boot_order::DeviceClass;
use crate::device::{Device, DeviceSlot};
use crate::error::{BootError, Result};
use crate::image::LoadedImage;

/// Operation set of one device class
///
/// Drivers read and write the [`Device`] only during a call and never
/// retain it.
pub trait DeviceClassOps {
    /// Driver name for status reporting
    fn name(&self) -> &'static str;

    /// Look for an instance according to `device.probe_state`.
    ///
    /// On `First` start from the first instance, on `Next` advance past
    /// `device.type_index`, on `Awake` re-wake the current one. On success
    /// `device.type_index` names the instance found. An absent device is
    /// `Err(BootError::ProbeFailed)`.
    fn probe(&mut self, device: &mut Device) -> Result<()>;

    /// Class specific setup between probe and load (e.g. address acquisition)
    fn load_configuration(&mut self, device: &mut Device) -> Result<()>;

    /// Retrieve a bootable image (e.g. via TFTP or from a boot sector)
    fn load(&mut self, device: &mut Device) -> Result<LoadedImage>;

    /// Quiesce the device before the next attempt
    fn disable(&mut self, device: &mut Device);

    /// Human readable description of the probed instance
    fn describe(&self, device: &Device) -> String;
}

struct ClassEntry {
    slot: DeviceSlot,
    ops: Box<dyn DeviceClassOps>,
}

/// Collects driver registrations before the loop starts
#[derive(Default)]
pub struct RegistryBuilder {
    entries: [Option<ClassEntry>; DeviceClass::COUNT],
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the operation set for a class
    pub fn register(mut self, class: DeviceClass, slot: DeviceSlot, ops: Box<dyn DeviceClassOps>) -> Result<Self> {
        let index = class.index().ok_or(BootError::InvalidDeviceClass)?;
        if self.entries[index].is_some() {
            return Err(BootError::DriverAlreadyRegistered(class));
        }
        log::debug!("registry: {} -> {} ({:?})", class, ops.name(), slot);
        self.entries[index] = Some(ClassEntry { slot, ops });
        Ok(self)
    }

    pub fn build(self) -> DeviceClassRegistry {
        DeviceClassRegistry { entries: self.entries }
    }
}

/// Frozen class → operations table
pub struct DeviceClassRegistry {
    entries: [Option<ClassEntry>; DeviceClass::COUNT],
}

impl DeviceClassRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn entry(&self, class: DeviceClass) -> Result<&ClassEntry> {
        let index = class.index().ok_or(BootError::InvalidDeviceClass)?;
        self.entries[index].as_ref().ok_or(BootError::DriverNotRegistered(class))
    }

    /// Operation set for a class. Looking up `Nothing` is a caller error.
    pub fn lookup(&mut self, class: DeviceClass) -> Result<&mut dyn DeviceClassOps> {
        let index = class.index().ok_or(BootError::InvalidDeviceClass)?;
        match self.entries[index].as_mut() {
            Some(entry) => Ok(entry.ops.as_mut()),
            None => Err(BootError::DriverNotRegistered(class)),
        }
    }

    /// Device slot a class operates on
    pub fn slot(&self, class: DeviceClass) -> Result<DeviceSlot> {
        self.entry(class).map(|entry| entry.slot)
    }

    /// Driver name for a class, if one is registered
    pub fn driver_name(&self, class: DeviceClass) -> Option<&'static str> {
        self.entry(class).ok().map(|entry| entry.ops.name())
    }

    pub fn is_registered(&self, class: DeviceClass) -> bool {
        self.entry(class).is_ok()
    }

    pub fn registered_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }
}
