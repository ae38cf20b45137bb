//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Fenceの破棄の処理まで行うFenceHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Fence
pub struct Fence {
    base: DeviceObjectBase<vk::Fence>,
}

/// Fenceを参照カウントで管理するためのハンドル
pub type FenceHandle = RefCounted<Fence>;

impl Fence {
    pub(crate) fn new(device: &Device, create_info: &vk::FenceCreateInfo) -> Result<FenceHandle> {
        let fence =
            unsafe { device.bindings().create_fence(create_info) }.check("vkCreateFence")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, fence),
        }))
    }

    /// vk::Fenceを取得する
    pub fn vk_handle(&self) -> vk::Fence {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// シグナルされるまで最大`timeout`ナノ秒待つ。タイムアウトした場合は`Ok(false)`を返す。
    pub fn wait(&self, timeout: u64) -> Result<bool> {
        self.base.with_device("Fence", |device| {
            match unsafe {
                device
                    .bindings()
                    .wait_for_fences(&[self.vk_handle()], true, timeout)
            } {
                Ok(()) => Ok(true),
                Err(vk::Result::TIMEOUT) => Ok(false),
                Err(result) => Err(Error::Vulkan {
                    call: "vkWaitForFences",
                    result,
                }),
            }
        })
    }

    /// 非シグナル状態に戻す
    pub fn reset(&self) -> Result<()> {
        self.base.with_device("Fence", |device| {
            unsafe { device.bindings().reset_fences(&[self.vk_handle()]) }.check("vkResetFences")
        })
    }

    /// シグナル状態かどうか
    pub fn is_signaled(&self) -> Result<bool> {
        self.base.with_device("Fence", |device| {
            unsafe { device.bindings().get_fence_status(self.vk_handle()) }
                .check("vkGetFenceStatus")
        })
    }
}

// Debugトレイトの実装
impl Debug for Fence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fence")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にfenceを破棄する
impl Drop for Fence {
    fn drop(&mut self) {
        let fence = self.vk_handle();
        self.base.destroy_with("fence", |device| unsafe {
            device.bindings().destroy_fence(fence)
        });
    }
}
