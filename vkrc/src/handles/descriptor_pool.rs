//! 参照カウンタで管理して、参照がすべて破棄された際に
//! DescriptorPoolの破棄の処理まで行うDescriptorPoolHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt};
use ash::vk;
use parking_lot::Mutex;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::DescriptorPool
pub struct DescriptorPool {
    base: DeviceObjectBase<vk::DescriptorPool>,
    flags: vk::DescriptorPoolCreateFlags,
    max_sets: u32,
    // 確保中のdescriptor setの数
    allocated_sets: Mutex<u32>,
}

/// DescriptorPoolを参照カウントで管理するためのハンドル
pub type DescriptorPoolHandle = RefCounted<DescriptorPool>;

impl DescriptorPool {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::DescriptorPoolCreateInfo,
    ) -> Result<DescriptorPoolHandle> {
        let descriptor_pool = unsafe { device.bindings().create_descriptor_pool(create_info) }
            .check("vkCreateDescriptorPool")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, descriptor_pool),
            flags: create_info.flags,
            max_sets: create_info.max_sets,
            allocated_sets: Mutex::new(0),
        }))
    }

    /// vk::DescriptorPoolを取得する
    pub fn vk_handle(&self) -> vk::DescriptorPool {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 確保できるdescriptor setの最大数
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    /// 作成時のフラグ
    pub fn flags(&self) -> vk::DescriptorPoolCreateFlags {
        self.flags
    }

    /// descriptor setを個別に解放できるかどうか
    pub fn can_free_descriptor_sets(&self) -> bool {
        self.flags
            .contains(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
    }

    /// 確保中のdescriptor setの数
    pub fn allocated_set_count(&self) -> u32 {
        *self.allocated_sets.lock()
    }

    pub(crate) fn reserve_sets(&self, count: u32) -> Result<()> {
        let mut allocated = self.allocated_sets.lock();
        if allocated.saturating_add(count) > self.max_sets {
            return Err(Error::ValidationFailed(format!(
                "Descriptor pool can allocate {} set(s) but {} are allocated and {} were requested",
                self.max_sets, *allocated, count
            )));
        }
        *allocated += count;
        Ok(())
    }

    pub(crate) fn release_sets(&self, count: u32) {
        let mut allocated = self.allocated_sets.lock();
        *allocated = allocated.saturating_sub(count);
    }
}

// Debugトレイトの実装
impl Debug for DescriptorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorPool")
            .field("handle", &self.vk_handle())
            .field("max_sets", &self.max_sets)
            .field("allocated_sets", &self.allocated_set_count())
            .finish()
    }
}

// Drop時にdescriptor poolを破棄する
impl Drop for DescriptorPool {
    fn drop(&mut self) {
        let descriptor_pool = self.vk_handle();
        self.base.destroy_with("descriptor pool", |device| unsafe {
            device.bindings().destroy_descriptor_pool(descriptor_pool)
        });
    }
}
