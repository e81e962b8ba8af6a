//! Boot loop scenarios against fake and mock drivers

mod common;

use std::time::Duration;

use common::{FakeDriver, TestHost, entries, journal, order, registry};
use mockall::mock;
use mockall::predicate::eq;
use nos_netboot::*;

mock! {
    pub Driver {}
    impl DeviceClassOps for Driver {
        fn name(&self) -> &'static str;
        fn probe(&mut self, device: &mut Device) -> Result<()>;
        fn load_configuration(&mut self, device: &mut Device) -> Result<()>;
        fn load(&mut self, device: &mut Device) -> Result<LoadedImage>;
        fn disable(&mut self, device: &mut Device);
        fn describe(&self, device: &Device) -> String;
    }
}

mock! {
    pub Firmware {}
    impl Host for Firmware {
        fn call_init_functions(&mut self);
        fn call_exit_functions(&mut self);
        fn call_reset_functions(&mut self);
        fn idle(&mut self, delay: Duration);
        fn report(&mut self, event: &BootEvent);
    }
}

fn probes(journal: &common::Journal) -> Vec<String> {
    entries(journal).into_iter().filter(|line| line.starts_with("probe ")).collect()
}

#[test]
fn test_absent_nic_retries_forever() {
    let journal = journal();
    let registry = registry(vec![(DeviceClass::Nic, FakeDriver::new("nic", 0, &journal))]);
    let mut controller = BootController::new(order(&[DeviceClass::Nic]), registry, TestHost::new(&journal));
    let handle = controller.exit_handle();
    controller.host_mut().stop_after_idles(3, 1, handle);

    assert_eq!(controller.run(), 1);

    let host = controller.host();
    assert_eq!(host.idles, 3);
    assert_eq!(host.count(&BootEvent::NoMoreDevices), 3);
    assert_eq!(probes(&journal), vec!["probe nic first -> none"; 3]);
    assert_eq!(controller.stats().passes, 3);
    assert!(entries(&journal).contains(&"idle 2s".to_string()));
}

#[test]
fn test_failed_probe_disables_device() {
    let journal = journal();
    let registry = registry(vec![(DeviceClass::Nic, FakeDriver::new("nic", 0, &journal))]);
    let mut controller = BootController::new(order(&[DeviceClass::Nic]), registry, TestHost::new(&journal));
    let handle = controller.exit_handle();
    controller.host_mut().stop_after_idles(1, 0, handle);

    assert_eq!(controller.run(), 0);

    let log = entries(&journal);
    let probe = log.iter().position(|line| line == "probe nic first -> none").unwrap();
    assert_eq!(log[probe + 1], "disable nic#0");
    assert_eq!(log.iter().filter(|line| line.starts_with("disable")).count(), 1);
    assert!(!controller.device().is_bound());
}

#[test]
fn test_second_class_boots_after_first_fails() {
    let journal = journal();
    let registry = registry(vec![
        (DeviceClass::Nic, FakeDriver::new("nic", 0, &journal)),
        (DeviceClass::Disk, FakeDriver::new("disk", 1, &journal).image(true, Some(0))),
    ]);
    let config = order(&[DeviceClass::Nic, DeviceClass::Disk]);
    let mut controller = BootController::new(config, registry, TestHost::new(&journal));

    assert_eq!(controller.run(), 0);

    let log = entries(&journal);
    let boot = log.iter().position(|line| line == "boot disk#0").unwrap();
    assert_eq!(log[..boot].iter().filter(|line| line.starts_with("probe nic")).count(), 1);
    assert!(log[boot..].iter().all(|line| !line.starts_with("probe nic")));
    assert_eq!(log.last().map(String::as_str), Some("exit"));

    let host = controller.host();
    assert!(host.events.contains(&BootEvent::DeviceFound {
        driver: "disk",
        class: DeviceClass::Disk,
        description: "instance 0".to_string(),
    }));
    assert_eq!(host.count(&BootEvent::ImageLoaded { name: "fake" }), 1);
    assert_eq!(host.idles, 0);
}

#[test]
fn test_wrong_index_exhausts_first_class() {
    let journal = journal();
    let registry = registry(vec![(DeviceClass::Disk, FakeDriver::new("disk", 1, &journal))]);
    let config = order(&[DeviceClass::Disk]).with_index(1);
    let mut controller = BootController::new(config, registry, TestHost::new(&journal));
    let handle = controller.exit_handle();
    controller.host_mut().stop_after_idles(1, 0, handle);

    assert_eq!(controller.run(), 0);

    assert_eq!(probes(&journal), ["probe disk first -> 0", "probe disk next -> none"]);
    assert!(!entries(&journal).iter().any(|line| line.starts_with("configure")));

    let lines = controller.host().lines();
    assert!(lines.contains(&"Wrong index".to_string()));
    assert!(lines.contains(&"No more boot devices".to_string()));
    assert_eq!(controller.stats().wrong_index, 1);
}

#[test]
fn test_wrong_index_only_checked_for_first_class() {
    let journal = journal();
    let registry = registry(vec![
        (DeviceClass::Nic, FakeDriver::new("nic", 0, &journal)),
        (DeviceClass::Disk, FakeDriver::new("disk", 1, &journal).image(true, Some(3))),
    ]);
    let config = order(&[DeviceClass::Nic, DeviceClass::Disk]).with_index(2);
    let mut controller = BootController::new(config, registry, TestHost::new(&journal));

    assert_eq!(controller.run(), 3);
    assert!(entries(&journal).contains(&"boot disk#0".to_string()));
    assert_eq!(controller.stats().wrong_index, 0);
}

#[test]
fn test_returning_image_moves_to_next_candidate() {
    let journal = journal();
    let registry = registry(vec![
        (DeviceClass::Disk, FakeDriver::new("disk", 1, &journal).image(false, None)),
        (DeviceClass::Nic, FakeDriver::new("nic", 1, &journal).image(true, Some(0))),
    ]);
    let config = order(&[DeviceClass::Disk, DeviceClass::Nic]);
    let mut controller = BootController::new(config, registry, TestHost::new(&journal));

    assert_eq!(controller.run(), 0);

    let log = entries(&journal);
    let disk = log.iter().position(|line| line == "boot disk#0").unwrap();
    let nic = log.iter().position(|line| line == "boot nic#0").unwrap();
    assert!(disk < nic);
    assert!(log[disk..nic].contains(&"probe disk next -> none".to_string()));

    let host = controller.host();
    assert_eq!(host.count(&BootEvent::ImageReturned { name: "fake", started: false }), 1);
    assert!(host.lines().contains(&"...boot failed: image returned".to_string()));
    assert_eq!(controller.stats().images_booted, 2);
    assert_eq!(controller.stats().images_returned, 2);
}

#[test]
fn test_empty_order_exits_without_probing() {
    let mut driver = MockDriver::new();
    driver.expect_name().return_const("nic");
    driver.expect_probe().never();
    driver.expect_disable().never();

    let mut host = MockFirmware::new();
    host.expect_call_init_functions().times(1).return_const(());
    host.expect_call_reset_functions().times(1..).return_const(());
    host.expect_idle().never();
    host.expect_report().with(eq(BootEvent::Exiting { status: 0 })).times(1).return_const(());
    host.expect_call_exit_functions().times(1).return_const(());

    let registry = DeviceClassRegistry::builder()
        .register(DeviceClass::Nic, DeviceSlot::Network, Box::new(driver))
        .unwrap()
        .build();
    let config = BootConfig::new().with_order(boot_order::BOOT_NOTHING);

    let mut controller = BootController::new(config, registry, host);
    assert_eq!(controller.run(), 0);
    assert_eq!(controller.stats().attempts, 0);
}

#[test]
fn test_failed_probe_skips_configuration() {
    let mut nic = MockDriver::new();
    nic.expect_name().return_const("nic");
    nic.expect_probe().times(1).returning(|_| Err(BootError::ProbeFailed));
    nic.expect_load_configuration().never();
    nic.expect_load().never();
    nic.expect_disable().times(1).return_const(());

    let mut disk = MockDriver::new();
    disk.expect_name().return_const("disk");
    disk.expect_probe()
        .withf(|device| device.probe_state == ProbeState::First && device.class == DeviceClass::Disk)
        .times(1)
        .returning(|device| {
            device.type_index = 4;
            Ok(())
        });
    disk.expect_describe().returning(|device| format!("unit {}", device.type_index));
    disk.expect_load_configuration().times(1).returning(|_| Err(BootError::Exit(9)));
    disk.expect_load().never();
    disk.expect_disable().withf(|device| device.type_index == 4).times(1..).return_const(());

    let registry = DeviceClassRegistry::builder()
        .register(DeviceClass::Nic, DeviceSlot::Network, Box::new(nic))
        .unwrap()
        .register(DeviceClass::Disk, DeviceSlot::Disk, Box::new(disk))
        .unwrap()
        .build();
    let journal = journal();
    let config = order(&[DeviceClass::Nic, DeviceClass::Disk]);
    let mut controller = BootController::new(config, registry, TestHost::new(&journal));

    assert_eq!(controller.run(), 9);
    let host = controller.host();
    assert!(host.lines().contains(&"disk disk has unit 4".to_string()));
    assert!(host.events.iter().any(|event| matches!(
        event,
        BootEvent::ProbeFailed { class: DeviceClass::Nic, error: BootError::ProbeFailed }
    )));
    assert_eq!(controller.stats().configuration_failures, 0);
}

#[test]
fn test_skip_resets_after_exhaustion() {
    let journal = journal();
    let registry = registry(vec![
        (DeviceClass::Nic, FakeDriver::new("nic", 0, &journal)),
        (DeviceClass::Floppy, FakeDriver::new("floppy", 0, &journal)),
    ]);
    let config = order(&[DeviceClass::Nic, DeviceClass::Floppy]);
    let mut controller = BootController::new(config, registry, TestHost::new(&journal));
    let handle = controller.exit_handle();
    controller.host_mut().stop_after_idles(2, 0, handle);

    assert_eq!(controller.run(), 0);
    assert_eq!(
        probes(&journal),
        [
            "probe nic first -> none",
            "probe floppy first -> none",
            "probe nic first -> none",
            "probe floppy first -> none",
        ]
    );
    assert_eq!(controller.stats().passes, 2);
    assert_eq!(controller.host().count(&BootEvent::NoMoreDevices), 2);
}

#[test]
fn test_load_failure_tries_next_instance() {
    let journal = journal();
    let disk = FakeDriver::new("disk", 2, &journal)
        .load_results([Err(BootError::FileNotFound)])
        .image(true, Some(0));
    let registry = registry(vec![(DeviceClass::Disk, disk)]);
    let mut controller = BootController::new(order(&[DeviceClass::Disk]), registry, TestHost::new(&journal));

    assert_eq!(controller.run(), 0);

    let log = entries(&journal);
    assert!(log.contains(&"load disk#0".to_string()));
    assert!(log.contains(&"boot disk#1".to_string()));
    assert!(!log.contains(&"boot disk#0".to_string()));
    let lines = controller.host().lines();
    assert!(lines.contains(&"...load failed: Boot file not found".to_string()));
    assert!(lines.contains(&"<abort>".to_string()));
}
