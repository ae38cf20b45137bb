//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Imageの破棄の処理まで行うImageHandleを定義する。

use crate::{
    Device, DeviceHandle, DeviceMemoryHandle, DeviceObjectBase, Error, Result, VkResultExt,
};
use ash::vk;
use parking_lot::Mutex;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Image
pub struct Image {
    base: DeviceObjectBase<vk::Image>,
    image_type: vk::ImageType,
    format: vk::Format,
    extent: vk::Extent3D,
    mip_levels: u32,
    array_layers: u32,
    usage: vk::ImageUsageFlags,
    // bindしたメモリはimageより先に解放されないように保持しておく
    memory: Mutex<Option<(DeviceMemoryHandle, vk::DeviceSize)>>,
}

/// Imageを参照カウントで管理するためのハンドル
pub type ImageHandle = RefCounted<Image>;

impl Image {
    pub(crate) fn new(device: &Device, create_info: &vk::ImageCreateInfo) -> Result<ImageHandle> {
        let image =
            unsafe { device.bindings().create_image(create_info) }.check("vkCreateImage")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, image),
            image_type: create_info.image_type,
            format: create_info.format,
            extent: create_info.extent,
            mip_levels: create_info.mip_levels,
            array_layers: create_info.array_layers,
            usage: create_info.usage,
            memory: Mutex::new(None),
        }))
    }

    /// vk::Imageを取得する
    pub fn vk_handle(&self) -> vk::Image {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 作成時のimage type
    pub fn image_type(&self) -> vk::ImageType {
        self.image_type
    }

    /// 作成時のフォーマット
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// 作成時のサイズ
    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }

    /// mipレベル数
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// レイヤー数
    pub fn array_layers(&self) -> u32 {
        self.array_layers
    }

    /// 作成時のusage
    pub fn usage(&self) -> vk::ImageUsageFlags {
        self.usage
    }

    /// メモリ要件を取得する
    pub fn memory_requirements(&self) -> Result<vk::MemoryRequirements> {
        self.base.with_device("Image", |device| {
            Ok(unsafe {
                device
                    .bindings()
                    .get_image_memory_requirements(self.vk_handle())
            })
        })
    }

    /// メモリをbindする。bindしたメモリはこのImageが破棄されるまで保持される。
    pub fn bind_memory(&self, memory: &DeviceMemoryHandle, offset: vk::DeviceSize) -> Result<()> {
        self.base.with_device("Image", |device| {
            device.ensure_owned("DeviceMemory", memory.device())?;
            let mut bound = self.memory.lock();
            if bound.is_some() {
                return Err(Error::ValidationFailed(
                    "Image memory is already bound".into(),
                ));
            }
            unsafe {
                device
                    .bindings()
                    .bind_image_memory(self.vk_handle(), memory.vk_handle(), offset)
            }
            .check("vkBindImageMemory")?;
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
impl Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("handle", &self.vk_handle())
            .field("format", &self.format)
            .field("extent", &self.extent)
            .finish()
    }
}

// Drop時にimageを破棄する
impl Drop for Image {
    fn drop(&mut self) {
        let image = self.vk_handle();
        self.base.destroy_with("image", |device| unsafe {
            device.bindings().destroy_image(image)
        });
    }
}
