//! 参照カウンタで管理して、参照がすべて破棄された際に
//! PipelineLayoutの破棄の処理まで行うPipelineLayoutHandleを定義する。

use crate::{
    DescriptorSetLayoutHandle, Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt,
};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::PipelineLayout
pub struct PipelineLayout {
    base: DeviceObjectBase<vk::PipelineLayout>,
    // layoutより先に破棄されないように保持しておく
    set_layouts: Vec<DescriptorSetLayoutHandle>,
    push_constant_ranges: Vec<vk::PushConstantRange>,
}

/// PipelineLayoutを参照カウントで管理するためのハンドル
pub type PipelineLayoutHandle = RefCounted<PipelineLayout>;

impl PipelineLayout {
    pub(crate) fn new(
        device: &Device,
        set_layouts: &[DescriptorSetLayoutHandle],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> Result<PipelineLayoutHandle> {
        for set_layout in set_layouts {
            device.ensure_owned("DescriptorSetLayout", set_layout.device())?;
        }
        let raw_set_layouts = set_layouts
            .iter()
            .map(|l| l.vk_handle())
            .collect::<Vec<_>>();
        let create_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&raw_set_layouts)
            .push_constant_ranges(push_constant_ranges);
        let layout = unsafe { device.bindings().create_pipeline_layout(&create_info) }
            .check("vkCreatePipelineLayout")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, layout),
            set_layouts: set_layouts.to_vec(),
            push_constant_ranges: push_constant_ranges.to_vec(),
        }))
    }

    /// vk::PipelineLayoutを取得する
    pub fn vk_handle(&self) -> vk::PipelineLayout {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// DescriptorSetLayoutのリスト
    pub fn set_layouts(&self) -> &[DescriptorSetLayoutHandle] {
        &self.set_layouts
    }

    /// push constantの範囲
    pub fn push_constant_ranges(&self) -> &[vk::PushConstantRange] {
        &self.push_constant_ranges
    }
}

impl Debug for PipelineLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("handle", &self.vk_handle())
            .field("set_layouts", &self.set_layouts.len())
            .finish()
    }
}

// Drop時にpipeline layoutを破棄する
impl Drop for PipelineLayout {
    fn drop(&mut self) {
        let layout = self.vk_handle();
        self.base.destroy_with("pipeline layout", |device| unsafe {
            device.bindings().destroy_pipeline_layout(layout)
        });
    }
}
