//! 参照カウンタで管理して、参照がすべて破棄された際に
//! GraphicsPipelineの破棄の処理まで行うGraphicsPipelineHandleを定義する。

use crate::{
    Device, DeviceHandle, DeviceObjectBase, Error, PipelineCacheHandle, PipelineLayoutHandle,
    RenderPassHandle, Result, VkResultExt,
};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// graphics pipelineのvk::Pipeline
pub struct GraphicsPipeline {
    base: DeviceObjectBase<vk::Pipeline>,
    // pipelineより先に破棄されないように保持しておく
    layout: PipelineLayoutHandle,
    render_pass: RenderPassHandle,
    subpass: u32,
}

/// GraphicsPipelineを参照カウントで管理するためのハンドル
pub type GraphicsPipelineHandle = RefCounted<GraphicsPipeline>;

impl GraphicsPipeline {
    /// `create_info`の`layout`、`render_pass`、`subpass`は引数の値で上書きされる。
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::GraphicsPipelineCreateInfo,
        layout: &PipelineLayoutHandle,
        render_pass: &RenderPassHandle,
        subpass: u32,
        pipeline_cache: Option<&PipelineCacheHandle>,
    ) -> Result<GraphicsPipelineHandle> {
        device.ensure_owned("PipelineLayout", layout.device())?;
        device.ensure_owned("RenderPass", render_pass.device())?;
        if let Some(pipeline_cache) = pipeline_cache {
            device.ensure_owned("PipelineCache", pipeline_cache.device())?;
        }
        if create_info.stage_count == 0 {
            return Err(Error::ValidationFailed(
                "Graphics pipeline requires at least one shader stage".into(),
            ));
        }
        if subpass >= render_pass.subpass_count() {
            return Err(Error::ValidationFailed(format!(
                "Subpass {} is out of range for a render pass with {} subpass(es)",
                subpass,
                render_pass.subpass_count()
            )));
        }

        let create_info = vk::GraphicsPipelineCreateInfo {
            layout: layout.vk_handle(),
            render_pass: render_pass.vk_handle(),
            subpass,
            ..*create_info
        };
        let pipeline_cache = pipeline_cache.map_or(vk::PipelineCache::null(), |c| c.vk_handle());
        let pipelines = unsafe {
            device
                .bindings()
                .create_graphics_pipelines(pipeline_cache, &[create_info])
        }
        .check("vkCreateGraphicsPipelines")?;
        let pipeline = pipelines.into_iter().next().ok_or(Error::Vulkan {
            call: "vkCreateGraphicsPipelines",
            result: vk::Result::ERROR_UNKNOWN,
        })?;

        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, pipeline),
            layout: layout.clone(),
            render_pass: render_pass.clone(),
            subpass,
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

    /// 作成時に指定したRenderPass
    pub fn render_pass(&self) -> &RenderPassHandle {
        &self.render_pass
    }

    /// 作成時に指定したsubpassのindex
    pub fn subpass(&self) -> u32 {
        self.subpass
    }
}

impl Debug for GraphicsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsPipeline")
            .field("handle", &self.vk_handle())
            .field("subpass", &self.subpass)
            .finish()
    }
}

// Drop時にpipelineを破棄する。layoutとrender passはその後に手放される。
impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        let pipeline = self.vk_handle();
        self.base.destroy_with("graphics pipeline", |device| unsafe {
            device.bindings().destroy_pipeline(pipeline)
        });
    }
}
