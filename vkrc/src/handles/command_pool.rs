//! 参照カウンタで管理して、参照がすべて破棄された際に
//! CommandPoolの破棄の処理まで行うCommandPoolHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::CommandPool
pub struct CommandPool {
    base: DeviceObjectBase<vk::CommandPool>,
    queue_family_index: u32,
    flags: vk::CommandPoolCreateFlags,
}

/// CommandPoolを参照カウントで管理するためのハンドル
pub type CommandPoolHandle = RefCounted<CommandPool>;

impl CommandPool {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::CommandPoolCreateInfo,
    ) -> Result<CommandPoolHandle> {
        let command_pool = unsafe { device.bindings().create_command_pool(create_info) }
            .check("vkCreateCommandPool")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, command_pool),
            queue_family_index: create_info.queue_family_index,
            flags: create_info.flags,
        }))
    }

    /// vk::CommandPoolを取得する
    pub fn vk_handle(&self) -> vk::CommandPool {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 作成時のqueue family
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// 作成時のフラグ
    pub fn flags(&self) -> vk::CommandPoolCreateFlags {
        self.flags
    }

    /// poolから確保したCommandBufferをすべてリセットする
    pub fn reset(&self, flags: vk::CommandPoolResetFlags) -> Result<()> {
        self.base.with_device("CommandPool", |device| {
            unsafe {
                device
                    .bindings()
                    .reset_command_pool(self.vk_handle(), flags)
            }
            .check("vkResetCommandPool")
        })
    }
}

// Debugトレイトの実装
impl Debug for CommandPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPool")
            .field("handle", &self.vk_handle())
            .field("queue_family_index", &self.queue_family_index)
            .finish()
    }
}

// Drop時にcommand poolを破棄する
impl Drop for CommandPool {
    fn drop(&mut self) {
        let command_pool = self.vk_handle();
        self.base.destroy_with("command pool", |device| unsafe {
            device.bindings().destroy_command_pool(command_pool)
        });
    }
}
