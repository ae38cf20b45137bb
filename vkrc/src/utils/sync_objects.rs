use crate::{DeviceHandle, FenceHandle, Result, SemaphoreHandle};
use ash::vk;

/// Fenceを作成する関数
pub fn create_fence(device: &DeviceHandle) -> Result<FenceHandle> {
    let create_info = vk::FenceCreateInfo::builder();
    device.create_fence(&create_info)
}

/// シグナル状態のFenceを作成する関数
pub fn create_signaled_fence(device: &DeviceHandle) -> Result<FenceHandle> {
    let create_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
    device.create_fence(&create_info)
}

/// Semaphoreを作成する関数
pub fn create_semaphore(device: &DeviceHandle) -> Result<SemaphoreHandle> {
    let create_info = vk::SemaphoreCreateInfo::builder();
    device.create_semaphore(&create_info)
}
