//! 参照カウンタで管理して、参照がすべて破棄された際に
//! PipelineCacheの破棄の処理まで行うPipelineCacheHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::PipelineCache
///
/// pipelineの作成時に渡すだけなので、作成されたpipelineはcacheを保持しない。
pub struct PipelineCache {
    base: DeviceObjectBase<vk::PipelineCache>,
}

/// PipelineCacheを参照カウントで管理するためのハンドル
pub type PipelineCacheHandle = RefCounted<PipelineCache>;

impl PipelineCache {
    pub(crate) fn new(device: &Device, initial_data: &[u8]) -> Result<PipelineCacheHandle> {
        let create_info = vk::PipelineCacheCreateInfo::builder().initial_data(initial_data);
        let pipeline_cache = unsafe { device.bindings().create_pipeline_cache(&create_info) }
            .check("vkCreatePipelineCache")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, pipeline_cache),
        }))
    }

    /// vk::PipelineCacheを取得する
    pub fn vk_handle(&self) -> vk::PipelineCache {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 次回の起動時に`initial_data`として渡せるcacheの中身を取得する
    pub fn data(&self) -> Result<Vec<u8>> {
        self.base.with_device("PipelineCache", |device| {
            unsafe { device.bindings().get_pipeline_cache_data(self.vk_handle()) }
                .check("vkGetPipelineCacheData")
        })
    }
}

// Debugトレイトの実装
impl Debug for PipelineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineCache")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にpipeline cacheを破棄する
impl Drop for PipelineCache {
    fn drop(&mut self) {
        let pipeline_cache = self.vk_handle();
        self.base.destroy_with("pipeline cache", |device| unsafe {
            device.bindings().destroy_pipeline_cache(pipeline_cache)
        });
    }
}
