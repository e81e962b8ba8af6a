//! Loaded boot image contract

use alloc::boxed::Box;

use crate::boot_order::DeviceClass;
use crate::context::ExitHandle;

/// Context handed to an image's boot entry point
#[derive(Debug, Clone)]
pub struct ImageContext {
    /// Class the image was loaded from
    pub class: DeviceClass,
    /// Instance the image was loaded from
    pub type_index: u32,
    /// Lets a returning image ask the firmware to stop
    pub exit: ExitHandle,
}

/// An image produced by a successful load
pub trait BootImage {
    /// Image format name, e.g. "ELF" or "PXE"
    fn name(&self) -> &'static str;

    /// Transfer control to the image.
    ///
    /// A real image does not return. `false` means the image refused to
    /// start; any return is a failure of the boot attempt.
    fn boot(&mut self, context: &ImageContext) -> bool;
}

pub type LoadedImage = Box<dyn BootImage>;
