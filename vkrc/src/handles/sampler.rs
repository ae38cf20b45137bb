//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Samplerの破棄の処理まで行うSamplerHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Sampler
pub struct Sampler {
    base: DeviceObjectBase<vk::Sampler>,
}

/// Samplerを参照カウントで管理するためのハンドル
pub type SamplerHandle = RefCounted<Sampler>;

impl Sampler {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::SamplerCreateInfo,
    ) -> Result<SamplerHandle> {
        let sampler =
            unsafe { device.bindings().create_sampler(create_info) }.check("vkCreateSampler")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, sampler),
        }))
    }

    /// vk::Samplerを取得する
    pub fn vk_handle(&self) -> vk::Sampler {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }
}

// Debugトレイトの実装
impl Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にsamplerを破棄する
impl Drop for Sampler {
    fn drop(&mut self) {
        let sampler = self.vk_handle();
        self.base.destroy_with("sampler", |device| unsafe {
            device.bindings().destroy_sampler(sampler)
        });
    }
}
