//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Eventの破棄の処理まで行うEventHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::Event
pub struct Event {
    base: DeviceObjectBase<vk::Event>,
}

/// Eventを参照カウントで管理するためのハンドル
pub type EventHandle = RefCounted<Event>;

impl Event {
    pub(crate) fn new(device: &Device, create_info: &vk::EventCreateInfo) -> Result<EventHandle> {
        let event =
            unsafe { device.bindings().create_event(create_info) }.check("vkCreateEvent")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, event),
        }))
    }

    /// vk::Eventを取得する
    pub fn vk_handle(&self) -> vk::Event {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// hostからシグナル状態にする
    pub fn set(&self) -> Result<()> {
        self.base.with_device("Event", |device| {
            unsafe { device.bindings().set_event(self.vk_handle()) }.check("vkSetEvent")
        })
    }

    /// hostから非シグナル状態に戻す
    pub fn reset(&self) -> Result<()> {
        self.base.with_device("Event", |device| {
            unsafe { device.bindings().reset_event(self.vk_handle()) }.check("vkResetEvent")
        })
    }

    /// シグナル状態かどうか
    pub fn is_set(&self) -> Result<bool> {
        self.base.with_device("Event", |device| {
            unsafe { device.bindings().get_event_status(self.vk_handle()) }
                .check("vkGetEventStatus")
        })
    }
}

// Debugトレイトの実装
impl Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にeventを破棄する
impl Drop for Event {
    fn drop(&mut self) {
        let event = self.vk_handle();
        self.base.destroy_with("event", |device| unsafe {
            device.bindings().destroy_event(event)
        });
    }
}
