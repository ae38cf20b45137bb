//! 参照カウンタで管理して、参照がすべて破棄された際に
//! QueryPoolの破棄の処理まで行うQueryPoolHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::QueryPool
pub struct QueryPool {
    base: DeviceObjectBase<vk::QueryPool>,
    query_type: vk::QueryType,
    query_count: u32,
}

/// QueryPoolを参照カウントで管理するためのハンドル
pub type QueryPoolHandle = RefCounted<QueryPool>;

impl QueryPool {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::QueryPoolCreateInfo,
    ) -> Result<QueryPoolHandle> {
        if create_info.query_count == 0 {
            return Err(Error::ValidationFailed(
                "Query pool must have at least one query".into(),
            ));
        }
        let query_pool = unsafe { device.bindings().create_query_pool(create_info) }
            .check("vkCreateQueryPool")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, query_pool),
            query_type: create_info.query_type,
            query_count: create_info.query_count,
        }))
    }

    /// vk::QueryPoolを取得する
    pub fn vk_handle(&self) -> vk::QueryPool {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// queryの種類
    pub fn query_type(&self) -> vk::QueryType {
        self.query_type
    }

    /// queryの数
    pub fn query_count(&self) -> u32 {
        self.query_count
    }
}

impl Debug for QueryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPool")
            .field("handle", &self.vk_handle())
            .field("query_type", &self.query_type)
            .field("query_count", &self.query_count)
            .finish()
    }
}

impl Drop for QueryPool {
    fn drop(&mut self) {
        let query_pool = self.vk_handle();
        self.base.destroy_with("query pool", |device| unsafe {
            device.bindings().destroy_query_pool(query_pool)
        });
    }
}
