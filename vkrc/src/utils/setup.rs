use crate::{
    DeviceCreateInfo, DeviceHandle, DeviceQueueCreateInfo, InstanceHandle, PhysicalDeviceHandle,
    QueueHandle, Result,
};
use ash::vk;
use std::ffi::CString;

fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 3,
        _ => 4,
    }
}

/// 適当なphysical deviceを選択する関数
///
/// `queue_flags`をすべて満たすqueue familyを持つものの中から、
/// discrete GPU、integrated GPU、その他の順に優先して選ぶ。
/// 選んだphysical deviceと、条件を満たす最初のqueue familyのindexを返す。
pub fn select_physical_device(
    instance: &InstanceHandle,
    queue_flags: vk::QueueFlags,
) -> Option<(PhysicalDeviceHandle, u32)> {
    instance
        .physical_devices()
        .iter()
        .filter_map(|physical_device| {
            let family = physical_device
                .queue_family_properties()
                .iter()
                .position(|p| p.queue_count > 0 && p.queue_flags.contains(queue_flags))?;
            Some((physical_device.clone(), family as u32))
        })
        .min_by_key(|(physical_device, _)| device_type_rank(physical_device.device_type()))
}

/// queue familyから一つだけqueueを取得するDeviceを作成する関数
pub fn create_device_with_queue(
    physical_device: &PhysicalDeviceHandle,
    queue_family_index: u32,
    enabled_extensions: &[CString],
) -> Result<(DeviceHandle, QueueHandle)> {
    let create_info = DeviceCreateInfo {
        queue_create_infos: vec![DeviceQueueCreateInfo::new(queue_family_index, 1)],
        enabled_extensions: enabled_extensions.to_vec(),
        enabled_features: None,
    };
    let device = physical_device.create_device(&create_info)?;
    let queue = device.get_queue(queue_family_index, 0)?;
    tracing::info!(
        "Selected {} (queue family {})",
        physical_device.device_name(),
        queue_family_index
    );
    Ok((device, queue))
}
