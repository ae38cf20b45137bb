//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Bufferの破棄の処理まで行うBufferHandleを定義する。

use crate::{
    Device, DeviceHandle, DeviceMemoryHandle, DeviceObjectBase, Error, Result, VkResultExt,
};
use ash::vk;
use parking_lot::Mutex;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Buffer
pub struct Buffer {
    base: DeviceObjectBase<vk::Buffer>,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    // bindしたメモリはbufferより先に解放されないように保持しておく
    memory: Mutex<Option<(DeviceMemoryHandle, vk::DeviceSize)>>,
}

/// Bufferを参照カウントで管理するためのハンドル
pub type BufferHandle = RefCounted<Buffer>;

impl Buffer {
    pub(crate) fn new(device: &Device, create_info: &vk::BufferCreateInfo) -> Result<BufferHandle> {
        let buffer =
            unsafe { device.bindings().create_buffer(create_info) }.check("vkCreateBuffer")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, buffer),
            size: create_info.size,
            usage: create_info.usage,
            memory: Mutex::new(None),
        }))
    }

    /// vk::Bufferを取得する
    pub fn vk_handle(&self) -> vk::Buffer {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 作成時のサイズ
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// 作成時のusage
    pub fn usage(&self) -> vk::BufferUsageFlags {
        self.usage
    }

    /// メモリ要件を取得する
    pub fn memory_requirements(&self) -> Result<vk::MemoryRequirements> {
        self.base.with_device("Buffer", |device| {
            Ok(unsafe {
                device
                    .bindings()
                    .get_buffer_memory_requirements(self.vk_handle())
            })
        })
    }

    /// メモリをbindする。bindしたメモリはこのBufferが破棄されるまで保持される。
    pub fn bind_memory(&self, memory: &DeviceMemoryHandle, offset: vk::DeviceSize) -> Result<()> {
        self.base.with_device("Buffer", |device| {
            device.ensure_owned("DeviceMemory", memory.device())?;
            let mut bound = self.memory.lock();
            if bound.is_some() {
                return Err(Error::ValidationFailed(
                    "Buffer memory is already bound".into(),
                ));
            }
            unsafe {
                device
                    .bindings()
                    .bind_buffer_memory(self.vk_handle(), memory.vk_handle(), offset)
            }
            .check("vkBindBufferMemory")?;
            *bound = Some((memory.clone(), offset));
            Ok(())
        })
    }

    /// bindされているメモリとオフセットを取得する
    pub fn memory(&self) -> Option<(DeviceMemoryHandle, vk::DeviceSize)> {
        self.memory.lock().clone()
    }
}

// Debugトレイトの実装
impl Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.vk_handle())
            .field("size", &self.size)
            .field("usage", &self.usage)
            .finish()
    }
}

// Drop時にbufferを破棄する。メモリはその後に手放される。
impl Drop for Buffer {
    fn drop(&mut self) {
        let buffer = self.vk_handle();
        self.base.destroy_with("buffer", |device| unsafe {
            device.bindings().destroy_buffer(buffer)
        });
    }
}
