//! 参照カウンタで管理して、参照がすべて破棄された際に
//! RenderPassの破棄の処理まで行うRenderPassHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::RenderPass
pub struct RenderPass {
    base: DeviceObjectBase<vk::RenderPass>,
    attachment_count: u32,
    subpass_count: u32,
}

/// RenderPassを参照カウントで管理するためのハンドル
pub type RenderPassHandle = RefCounted<RenderPass>;

impl RenderPass {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::RenderPassCreateInfo,
    ) -> Result<RenderPassHandle> {
        let render_pass = unsafe { device.bindings().create_render_pass(create_info) }
            .check("vkCreateRenderPass")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, render_pass),
            attachment_count: create_info.attachment_count,
            subpass_count: create_info.subpass_count,
        }))
    }

    /// vk::RenderPassを取得する
    pub fn vk_handle(&self) -> vk::RenderPass {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// attachmentの数
    pub fn attachment_count(&self) -> u32 {
        self.attachment_count
    }

    /// subpassの数
    pub fn subpass_count(&self) -> u32 {
        self.subpass_count
    }
}

impl Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にrender passを破棄する
impl Drop for RenderPass {
    fn drop(&mut self) {
        let render_pass = self.vk_handle();
        self.base.destroy_with("render pass", |device| unsafe {
            device.bindings().destroy_render_pass(render_pass)
        });
    }
}
