//! Deviceの作成時に取得されるQueueを定義する。

use crate::{
    CommandBufferHandle, Device, DeviceHandle, DeviceObjectBase, FenceHandle, Result,
    SemaphoreHandle, VkResultExt,
};
use ash::vk;
use parking_lot::Mutex;
use refcounted::RefCounted;
use std::fmt::Debug;

/// `Queue::submit`に渡すsubmitの内容
#[derive(Debug, Clone, Default)]
pub struct SubmitInfo {
    /// 待つSemaphoreと、待つパイプラインステージ
    pub wait_semaphores: Vec<(SemaphoreHandle, vk::PipelineStageFlags)>,
    /// 実行するCommandBuffer
    pub command_buffers: Vec<CommandBufferHandle>,
    /// 完了時にシグナルするSemaphore
    pub signal_semaphores: Vec<SemaphoreHandle>,
}

/// vk::Queue
///
/// queueはDeviceと一緒に破棄されるので、Drop時の破棄処理は持たない。
pub struct Queue {
    base: DeviceObjectBase<vk::Queue>,
    family_index: u32,
    queue_index: u32,
    flags: vk::QueueFlags,
    // vkQueueSubmitなどはqueueの外部同期が必要
    lock: Mutex<()>,
}

/// Queueを参照カウントで管理するためのハンドル
pub type QueueHandle = RefCounted<Queue>;

impl Queue {
    pub(crate) fn new(
        device: &Device,
        queue: vk::Queue,
        family_index: u32,
        queue_index: u32,
        flags: vk::QueueFlags,
    ) -> QueueHandle {
        RefCounted::new(Self {
            base: DeviceObjectBase::new(device, queue),
            family_index,
            queue_index,
            flags,
            lock: Mutex::new(()),
        })
    }

    /// vk::Queueを取得する
    pub fn vk_handle(&self) -> vk::Queue {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// queue familyのindex
    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    /// queue family内でのindex
    pub fn queue_index(&self) -> u32 {
        self.queue_index
    }

    /// queue familyの対応している機能
    pub fn flags(&self) -> vk::QueueFlags {
        self.flags
    }

    /// CommandBufferをsubmitする。`fence`は完了時にシグナルされる。
    pub fn submit(&self, submit_info: &SubmitInfo, fence: Option<&FenceHandle>) -> Result<()> {
        self.base.with_device("Queue", |device| {
            if let Some(fence) = fence {
                device.ensure_owned("Fence", fence.device())?;
            }

            let wait_semaphores = submit_info
                .wait_semaphores
                .iter()
                .map(|(s, _)| s.vk_handle())
                .collect::<Vec<_>>();
            let wait_dst_stage_mask = submit_info
                .wait_semaphores
                .iter()
                .map(|(_, stage)| *stage)
                .collect::<Vec<_>>();
            let command_buffers = submit_info
                .command_buffers
                .iter()
                .map(|c| c.vk_handle())
                .collect::<Vec<_>>();
            let signal_semaphores = submit_info
                .signal_semaphores
                .iter()
                .map(|s| s.vk_handle())
                .collect::<Vec<_>>();
            let submit = vk::SubmitInfo::builder()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_dst_stage_mask)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores)
                .build();
            let fence = fence.map_or(vk::Fence::null(), |f| f.vk_handle());

            let _lock = self.lock.lock();
            unsafe { device.bindings().queue_submit(self.vk_handle(), &[submit], fence) }
                .check("vkQueueSubmit")
        })
    }

    /// queueの処理がすべて終わるまで待つ
    pub fn wait_idle(&self) -> Result<()> {
        self.base.with_device("Queue", |device| {
            let _lock = self.lock.lock();
            unsafe { device.bindings().queue_wait_idle(self.vk_handle()) }
                .check("vkQueueWaitIdle")
        })
    }
}

// Debugトレイトの実装
impl Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("handle", &self.vk_handle())
            .field("family_index", &self.family_index)
            .field("queue_index", &self.queue_index)
            .finish()
    }
}
