//! NOS netboot - boot device orchestration engine
//!
//! The engine decides which boot device to try next and drives each
//! candidate through probe, configuration and image load until an image
//! takes over the machine. Device drivers, image formats and the lifecycle
//! hooks of the surrounding firmware are supplied by the embedder.
//!
//! # Architecture
//!
//! - **Boot order**: the packed per-nibble boot order and its decoding
//! - **Registry**: device class to driver operations table
//! - **Boot stage**: the boot iteration state machine
//! - **Controller**: the top-level loop with deferred exit and restart
//! - **Host**: init/reset/exit hooks, idle and console reporting
//!
//! # Usage
//!
//! ```rust,ignore
//! use nos_netboot::{BootConfig, BootController, DeviceClass, DeviceClassRegistry, DeviceSlot};
//!
//! let registry = DeviceClassRegistry::builder()
//!     .register(DeviceClass::Nic, DeviceSlot::Network, Box::new(nic_driver))?
//!     .build();
//! let mut config = BootConfig::default();
//! config.apply_cmdline_flags("order=nic,disk index=1");
//!
//! let status = BootController::new(config, registry, host).run();
//! ```

#![no_std]

extern crate alloc;

pub mod boot_log;
pub mod boot_order;
pub mod boot_stage;
pub mod config;
pub mod context;
pub mod controller;
pub mod device;
pub mod error;
pub mod host;
pub mod image;
pub mod registry;
pub mod status;

pub use boot_order::{BootEntry, BootOrder, DeviceClass, EntryFlags};
pub use boot_stage::{BootState, BootStats, ResumeTarget};
pub use config::{BootConfig, BootSelection};
pub use context::{ExecutionContext, ExitHandle};
pub use controller::BootController;
pub use device::{Device, DeviceSlot, ProbeState};
pub use error::{BootError, Result};
pub use host::{HookKind, HookTable, HookedHost, Host};
pub use image::{BootImage, ImageContext, LoadedImage};
pub use registry::{DeviceClassOps, DeviceClassRegistry, RegistryBuilder};
pub use status::BootEvent;
