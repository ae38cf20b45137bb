//! 参照カウンタで管理して、参照がすべて破棄された際に
//! BufferViewの破棄の処理まで行うBufferViewHandleを定義する。

use crate::{BufferHandle, Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// texel bufferのvk::BufferView
pub struct BufferView {
    base: DeviceObjectBase<vk::BufferView>,
    // viewより先にbufferが破棄されないように保持しておく
    buffer: BufferHandle,
    format: vk::Format,
    offset: vk::DeviceSize,
    range: vk::DeviceSize,
}

/// BufferViewを参照カウントで管理するためのハンドル
pub type BufferViewHandle = RefCounted<BufferView>;

impl BufferView {
    pub(crate) fn new(
        device: &Device,
        buffer: &BufferHandle,
        create_info: &vk::BufferViewCreateInfo,
    ) -> Result<BufferViewHandle> {
        device.ensure_owned("Buffer", buffer.device())?;
        if create_info.offset >= buffer.size() {
            return Err(Error::ValidationFailed(format!(
                "Buffer view offset {} is out of buffer of size {}",
                create_info.offset,
                buffer.size()
            )));
        }
        let create_info = vk::BufferViewCreateInfo {
            buffer: buffer.vk_handle(),
            ..*create_info
        };
        let buffer_view = unsafe { device.bindings().create_buffer_view(&create_info) }
            .check("vkCreateBufferView")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, buffer_view),
            buffer: buffer.clone(),
            format: create_info.format,
            offset: create_info.offset,
            range: create_info.range,
        }))
    }

    /// vk::BufferViewを取得する
    pub fn vk_handle(&self) -> vk::BufferView {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// viewの元になっているBuffer
    pub fn buffer(&self) -> &BufferHandle {
        &self.buffer
    }

    /// フォーマット
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// bufferの先頭からのオフセット
    pub fn offset(&self) -> vk::DeviceSize {
        self.offset
    }

    /// viewの大きさ。`vk::WHOLE_SIZE`のこともある。
    pub fn range(&self) -> vk::DeviceSize {
        self.range
    }
}

// Debugトレイトの実装
impl Debug for BufferView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("handle", &self.vk_handle())
            .field("buffer", &self.buffer.vk_handle())
            .field("format", &self.format)
            .finish()
    }
}

// Drop時にbuffer viewを破棄する。bufferはその後に手放される。
impl Drop for BufferView {
    fn drop(&mut self) {
        let buffer_view = self.vk_handle();
        self.base.destroy_with("buffer view", |device| unsafe {
            device.bindings().destroy_buffer_view(buffer_view)
        });
    }
}
