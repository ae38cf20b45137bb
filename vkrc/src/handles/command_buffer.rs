//! 参照カウンタで管理して、参照がすべて破棄された際に
//! CommandBufferの解放の処理まで行うCommandBufferHandleを定義する。

use crate::{
    CommandPoolHandle, Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt,
};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::CommandBuffer
pub struct CommandBuffer {
    base: DeviceObjectBase<vk::CommandBuffer>,
    // command bufferより先にpoolが破棄されないように保持しておく
    command_pool: CommandPoolHandle,
    level: vk::CommandBufferLevel,
}

/// CommandBufferを参照カウントで管理するためのハンドル
pub type CommandBufferHandle = RefCounted<CommandBuffer>;

impl CommandBuffer {
    pub(crate) fn allocate(
        device: &Device,
        command_pool: &CommandPoolHandle,
        level: vk::CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<CommandBufferHandle>> {
        device.ensure_owned("CommandPool", command_pool.device())?;
        if count == 0 {
            return Err(Error::ValidationFailed(
                "At least one command buffer must be allocated".into(),
            ));
        }
        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(command_pool.vk_handle())
            .level(level)
            .command_buffer_count(count);
        let command_buffers = unsafe { device.bindings().allocate_command_buffers(&allocate_info) }
            .check("vkAllocateCommandBuffers")?;
        Ok(command_buffers
            .into_iter()
            .map(|command_buffer| {
                RefCounted::new(Self {
                    base: DeviceObjectBase::new(device, command_buffer),
                    command_pool: command_pool.clone(),
                    level,
                })
            })
            .collect())
    }

    /// vk::CommandBufferを取得する
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 確保元のCommandPool
    pub fn command_pool(&self) -> &CommandPoolHandle {
        &self.command_pool
    }

    /// primaryかsecondaryか
    pub fn level(&self) -> vk::CommandBufferLevel {
        self.level
    }

    /// 記録を開始する
    pub fn begin(&self, flags: vk::CommandBufferUsageFlags) -> Result<()> {
        self.base.with_device("CommandBuffer", |device| {
            let begin_info = vk::CommandBufferBeginInfo::builder().flags(flags);
            unsafe {
                device
                    .bindings()
                    .begin_command_buffer(self.vk_handle(), &begin_info)
            }
            .check("vkBeginCommandBuffer")
        })
    }

    /// 記録を終了する
    pub fn end(&self) -> Result<()> {
        self.base.with_device("CommandBuffer", |device| {
            unsafe { device.bindings().end_command_buffer(self.vk_handle()) }
                .check("vkEndCommandBuffer")
        })
    }

    /// 記録した内容をリセットする
    pub fn reset(&self, flags: vk::CommandBufferResetFlags) -> Result<()> {
        self.base.with_device("CommandBuffer", |device| {
            unsafe {
                device
                    .bindings()
                    .reset_command_buffer(self.vk_handle(), flags)
            }
            .check("vkResetCommandBuffer")
        })
    }
}

// Debugトレイトの実装
impl Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("handle", &self.vk_handle())
            .field("level", &self.level)
            .finish()
    }
}

// Drop時にcommand bufferをpoolに返す
impl Drop for CommandBuffer {
    fn drop(&mut self) {
        let command_buffer = self.vk_handle();
        let command_pool = self.command_pool.vk_handle();
        self.base.destroy_with("command buffer", |device| unsafe {
            device
                .bindings()
                .free_command_buffers(command_pool, &[command_buffer])
        });
    }
}
