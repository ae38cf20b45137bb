//! 参照カウンタで管理して、参照がすべて破棄された際に
//! ImageViewの破棄の処理まで行うImageViewHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, ImageHandle, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::ImageView
pub struct ImageView {
    base: DeviceObjectBase<vk::ImageView>,
    // viewより先にimageが破棄されないように保持しておく
    image: ImageHandle,
    view_type: vk::ImageViewType,
    format: vk::Format,
}

/// ImageViewを参照カウントで管理するためのハンドル
pub type ImageViewHandle = RefCounted<ImageView>;

impl ImageView {
    pub(crate) fn new(
        device: &Device,
        image: &ImageHandle,
        create_info: &vk::ImageViewCreateInfo,
    ) -> Result<ImageViewHandle> {
        device.ensure_owned("Image", image.device())?;
        let create_info = vk::ImageViewCreateInfo {
            image: image.vk_handle(),
            ..*create_info
        };
        let image_view = unsafe { device.bindings().create_image_view(&create_info) }
            .check("vkCreateImageView")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, image_view),
            image: image.clone(),
            view_type: create_info.view_type,
            format: create_info.format,
        }))
    }

    /// vk::ImageViewを取得する
    pub fn vk_handle(&self) -> vk::ImageView {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// viewの元になっているImage
    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    /// view type
    pub fn view_type(&self) -> vk::ImageViewType {
        self.view_type
    }

    /// フォーマット
    pub fn format(&self) -> vk::Format {
        self.format
    }
}

// Debugトレイトの実装
impl Debug for ImageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageView")
            .field("handle", &self.vk_handle())
            .field("image", &self.image.vk_handle())
            .finish()
    }
}

// Drop時にimage viewを破棄する。imageはその後に手放される。
impl Drop for ImageView {
    fn drop(&mut self) {
        let image_view = self.vk_handle();
        self.base.destroy_with("image view", |device| unsafe {
            device.bindings().destroy_image_view(image_view)
        });
    }
}
