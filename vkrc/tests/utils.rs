mod common;

use ash::vk;
use common::*;
use std::ffi::CString;
use vkrc::utils::{create_device_with_queue, create_semaphore, select_physical_device};

#[test]
fn discrete_gpu_is_preferred() {
    let (instance, _recorder) = fake_instance();
    let (physical_device, family) =
        select_physical_device(&instance, vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
            .unwrap();
    assert_eq!(
        physical_device.device_type(),
        vk::PhysicalDeviceType::DISCRETE_GPU
    );
    assert_eq!(family, GRAPHICS_FAMILY);
}

#[test]
fn queue_flags_narrow_the_selection() {
    let mut cpu_only_transfer = integrated_gpu();
    cpu_only_transfer.queue_families[0].queue_flags = vk::QueueFlags::TRANSFER;
    let (instance, _recorder) = fake_instance_with(vec![cpu_only_transfer, integrated_gpu()]);

    let (physical_device, _) = select_physical_device(&instance, vk::QueueFlags::GRAPHICS).unwrap();
    assert!(instance
        .physical_device(1)
        .map_or(false, |pd| pd.vk_handle() == physical_device.vk_handle()));

    assert!(select_physical_device(&instance, vk::QueueFlags::SPARSE_BINDING).is_none());
}

#[test]
fn no_physical_device() {
    let (instance, _recorder) = fake_instance_with(vec![]);
    assert_eq!(instance.number_of_physical_devices(), 0);
    assert!(select_physical_device(&instance, vk::QueueFlags::GRAPHICS).is_none());
}

#[test]
fn device_with_a_single_queue() {
    let (instance, recorder) = fake_instance();
    let (physical_device, family) =
        select_physical_device(&instance, vk::QueueFlags::GRAPHICS).unwrap();
    let extensions = [CString::new("VK_KHR_swapchain").unwrap()];
    let (device, queue) = create_device_with_queue(&physical_device, family, &extensions).unwrap();

    assert_eq!(queue.family_index(), family);
    assert!(device.is_extension_enabled(&extensions[0]));
    assert_eq!(device.create_info().queue_create_infos.len(), 1);

    let semaphore = create_semaphore(&device).unwrap();
    drop(semaphore);
    assert_eq!(recorder.destroyed_count("semaphore"), 1);
}
