//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Framebufferの破棄の処理まで行うFramebufferHandleを定義する。

use crate::{
    Device, DeviceHandle, DeviceObjectBase, Error, ImageViewHandle, RenderPassHandle, Result,
    VkResultExt,
};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Framebuffer
pub struct Framebuffer {
    base: DeviceObjectBase<vk::Framebuffer>,
    // framebufferより先に破棄されないように保持しておく
    render_pass: RenderPassHandle,
    attachments: Vec<ImageViewHandle>,
    extent: vk::Extent2D,
    layers: u32,
}

/// Framebufferを参照カウントで管理するためのハンドル
pub type FramebufferHandle = RefCounted<Framebuffer>;

impl Framebuffer {
    pub(crate) fn new(
        device: &Device,
        render_pass: &RenderPassHandle,
        attachments: &[ImageViewHandle],
        extent: vk::Extent2D,
        layers: u32,
    ) -> Result<FramebufferHandle> {
        device.ensure_owned("RenderPass", render_pass.device())?;
        for attachment in attachments {
            device.ensure_owned("ImageView", attachment.device())?;
        }
        if attachments.len() != render_pass.attachment_count() as usize {
            return Err(Error::ValidationFailed(format!(
                "Render pass expects {} attachment(s) but {} were given",
                render_pass.attachment_count(),
                attachments.len()
            )));
        }

        let views = attachments
            .iter()
            .map(|a| a.vk_handle())
            .collect::<Vec<_>>();
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass.vk_handle())
            .attachments(&views)
            .width(extent.width)
            .height(extent.height)
            .layers(layers);
        let framebuffer = unsafe { device.bindings().create_framebuffer(&create_info) }
            .check("vkCreateFramebuffer")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, framebuffer),
            render_pass: render_pass.clone(),
            attachments: attachments.to_vec(),
            extent,
            layers,
        }))
    }

    /// vk::Framebufferを取得する
    pub fn vk_handle(&self) -> vk::Framebuffer {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 作成時のRenderPass
    pub fn render_pass(&self) -> &RenderPassHandle {
        &self.render_pass
    }

    /// attachmentのImageView
    pub fn attachments(&self) -> &[ImageViewHandle] {
        &self.attachments
    }

    /// サイズ
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// レイヤー数
    pub fn layers(&self) -> u32 {
        self.layers
    }
}

impl Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("handle", &self.vk_handle())
            .field("extent", &self.extent)
            .finish()
    }
}

// Drop時にframebufferを破棄する。render passとattachmentはその後に手放される。
impl Drop for Framebuffer {
    fn drop(&mut self) {
        let framebuffer = self.vk_handle();
        self.base.destroy_with("framebuffer", |device| unsafe {
            device.bindings().destroy_framebuffer(framebuffer)
        });
    }
}
