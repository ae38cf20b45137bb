//! 参照カウンタで管理して、参照がすべて破棄された際に
//! ComputePipelineの破棄の処理まで行うComputePipelineHandleを定義する。

use crate::{
    Device, DeviceHandle, DeviceObjectBase, Error, PipelineCacheHandle, PipelineLayoutHandle,
    Result, ShaderModuleHandle, VkResultExt,
};
use ash::vk;
use refcounted::RefCounted;
use std::{ffi::CStr, fmt::Debug};

/// compute pipelineのvk::Pipeline
pub struct ComputePipeline {
    base: DeviceObjectBase<vk::Pipeline>,
    // pipelineより先に破棄されないように保持しておく
    layout: PipelineLayoutHandle,
}

/// ComputePipelineを参照カウントで管理するためのハンドル
pub type ComputePipelineHandle = RefCounted<ComputePipeline>;

impl ComputePipeline {
    pub(crate) fn new(
        device: &Device,
        layout: &PipelineLayoutHandle,
        shader_module: &ShaderModuleHandle,
        entry_point: &CStr,
        pipeline_cache: Option<&PipelineCacheHandle>,
    ) -> Result<ComputePipelineHandle> {
        device.ensure_owned("PipelineLayout", layout.device())?;
        device.ensure_owned("ShaderModule", shader_module.device())?;
        if let Some(pipeline_cache) = pipeline_cache {
            device.ensure_owned("PipelineCache", pipeline_cache.device())?;
        }

        let stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(shader_module.vk_handle())
            .name(entry_point)
            .build();
        let create_info = vk::ComputePipelineCreateInfo::builder()
            .stage(stage)
            .layout(layout.vk_handle())
            .build();
        let pipeline_cache = pipeline_cache.map_or(vk::PipelineCache::null(), |c| c.vk_handle());
        let pipelines = unsafe {
            device
                .bindings()
                .create_compute_pipelines(pipeline_cache, &[create_info])
        }
        .check("vkCreateComputePipelines")?;
        let pipeline = pipelines.into_iter().next().ok_or(Error::Vulkan {
            call: "vkCreateComputePipelines",
            result: vk::Result::ERROR_UNKNOWN,
        })?;

        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, pipeline),
            layout: layout.clone(),
        }))
    }

    /// vk::Pipelineを取得する
    pub fn vk_handle(&self) -> vk::Pipeline {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// PipelineLayout
    pub fn layout(&self) -> &PipelineLayoutHandle {
        &self.layout
    }
}

impl Debug for ComputePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputePipeline")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にpipelineを破棄する。layoutはその後に手放される。
impl Drop for ComputePipeline {
    fn drop(&mut self) {
        let pipeline = self.vk_handle();
        self.base.destroy_with("compute pipeline", |device| unsafe {
            device.bindings().destroy_pipeline(pipeline)
        });
    }
}
