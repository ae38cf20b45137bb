//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Semaphoreの破棄の処理まで行うSemaphoreHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Semaphore
pub struct Semaphore {
    base: DeviceObjectBase<vk::Semaphore>,
}

/// Semaphoreを参照カウントで管理するためのハンドル
pub type SemaphoreHandle = RefCounted<Semaphore>;

impl Semaphore {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::SemaphoreCreateInfo,
    ) -> Result<SemaphoreHandle> {
        let semaphore = unsafe { device.bindings().create_semaphore(create_info) }
            .check("vkCreateSemaphore")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, semaphore),
        }))
    }

    /// vk::Semaphoreを取得する
    pub fn vk_handle(&self) -> vk::Semaphore {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }
}

// Debugトレイトの実装
impl Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にsemaphoreを破棄する
impl Drop for Semaphore {
    fn drop(&mut self) {
        let semaphore = self.vk_handle();
        self.base.destroy_with("semaphore", |device| unsafe {
            device.bindings().destroy_semaphore(semaphore)
        });
    }
}
