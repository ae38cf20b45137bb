//! Instanceから列挙されたPhysicalDeviceと、Deviceの作成時の設定を定義する。

use crate::{
    Device, DeviceHandle, DeviceWeakHandle, Error, Instance, InstanceHandle, InstanceObjectBase,
    ParentObject, Result, VkResultExt,
};
use ash::vk;
use parking_lot::Mutex;
use refcounted::{EmbeddedEntry, EmbeddedRefCount, EmbeddedRefCounted, WeakRef};
use std::{
    ffi::{CStr, CString},
    fmt::Debug,
};

/// 一つのqueue familyから取得するqueueの設定
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceQueueCreateInfo {
    /// queue familyのindex
    pub queue_family_index: u32,
    /// 取得するqueueごとの優先度。要素数がqueueの数になる。
    pub queue_priorities: Vec<f32>,
}
impl DeviceQueueCreateInfo {
    /// 優先度1.0のqueueを`queue_count`個取得する設定を作る
    pub fn new(queue_family_index: u32, queue_count: usize) -> Self {
        Self {
            queue_family_index,
            queue_priorities: vec![1.0; queue_count],
        }
    }
}

/// Deviceの作成時の設定
#[derive(Debug, Clone, Default)]
pub struct DeviceCreateInfo {
    /// 取得するqueue
    pub queue_create_infos: Vec<DeviceQueueCreateInfo>,
    /// 有効にするdevice拡張
    pub enabled_extensions: Vec<CString>,
    /// 有効にするdevice features
    pub enabled_features: Option<vk::PhysicalDeviceFeatures>,
}
impl DeviceCreateInfo {
    /// 拡張が有効になるかどうか
    pub fn is_extension_enabled(&self, name: &CStr) -> bool {
        self.enabled_extensions.iter().any(|e| e.as_c_str() == name)
    }
}

pub(crate) fn find_memory_type_index(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    flags: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = (memory_properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
    memory_properties.memory_types[..count]
        .iter()
        .enumerate()
        .find(|&(i, memory_type)| {
            type_bits & (1_u32 << i) != 0 && memory_type.property_flags.contains(flags)
        })
        .map(|(i, _)| i as u32)
}

/// vk::PhysicalDeviceと、そのプロパティ類を保持する
pub struct PhysicalDevice {
    embedded: EmbeddedEntry,
    base: InstanceObjectBase<vk::PhysicalDevice>,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    queue_family_properties: Vec<vk::QueueFamilyProperties>,
    created_devices: Mutex<Vec<DeviceWeakHandle>>,
}

/// PhysicalDeviceを参照カウントで管理するためのハンドル
pub type PhysicalDeviceHandle = EmbeddedRefCounted<PhysicalDevice>;
/// PhysicalDeviceへの弱参照
pub type PhysicalDeviceWeakHandle = WeakRef<PhysicalDevice>;

impl PhysicalDevice {
    pub(crate) fn new(instance: &Instance, handle: vk::PhysicalDevice) -> PhysicalDeviceHandle {
        let bindings = instance.bindings();
        let (properties, features, memory_properties, queue_family_properties) = unsafe {
            (
                bindings.get_physical_device_properties(handle),
                bindings.get_physical_device_features(handle),
                bindings.get_physical_device_memory_properties(handle),
                bindings.get_physical_device_queue_family_properties(handle),
            )
        };
        PhysicalDevice::create_new(PhysicalDevice {
            embedded: EmbeddedEntry::new(),
            base: InstanceObjectBase::new(instance, handle),
            properties,
            features,
            memory_properties,
            queue_family_properties,
            created_devices: Mutex::new(vec![]),
        })
    }

    /// vk::PhysicalDeviceを取得する
    pub fn vk_handle(&self) -> vk::PhysicalDevice {
        self.base.vk_handle()
    }

    /// 生成元のInstanceを取得する
    pub fn instance(&self) -> Option<InstanceHandle> {
        self.base.instance()
    }

    /// VkPhysicalDeviceProperties
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    /// VkPhysicalDeviceFeatures
    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }

    /// VkPhysicalDeviceMemoryProperties
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// queue familyごとのプロパティ
    pub fn queue_family_properties(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_family_properties
    }

    /// デバイスの種類
    pub fn device_type(&self) -> vk::PhysicalDeviceType {
        self.properties.device_type
    }

    /// デバイス名
    pub fn device_name(&self) -> String {
        let bytes = self
            .properties
            .device_name
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect::<Vec<_>>();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// フォーマットのプロパティを問い合わせる
    pub fn format_properties(&self, format: vk::Format) -> Result<vk::FormatProperties> {
        self.base.with_parent("PhysicalDevice", |instance| {
            Ok(unsafe {
                instance
                    .bindings()
                    .get_physical_device_format_properties(self.vk_handle(), format)
            })
        })
    }

    /// `type_bits`に含まれ、`flags`をすべて満たす最初のメモリタイプのindexを返す
    pub fn memory_type_index(
        &self,
        type_bits: u32,
        flags: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        find_memory_type_index(&self.memory_properties, type_bits, flags)
    }

    /// このPhysicalDeviceから作られ、まだ生きているDeviceの数
    pub fn live_device_count(&self) -> usize {
        self.created_devices
            .lock()
            .iter()
            .filter(|device| device.is_valid())
            .count()
    }

    fn validate_device_create_info(&self, create_info: &DeviceCreateInfo) -> Result<()> {
        if create_info.queue_create_infos.is_empty() {
            return Err(Error::ValidationFailed(
                "At least one queue must be requested".into(),
            ));
        }
        for (i, queue_info) in create_info.queue_create_infos.iter().enumerate() {
            let family = queue_info.queue_family_index;
            let Some(properties) = self.queue_family_properties.get(family as usize) else {
                return Err(Error::ValidationFailed(format!(
                    "Queue family {} does not exist on {}",
                    family,
                    self.device_name()
                )));
            };
            if create_info.queue_create_infos[..i]
                .iter()
                .any(|q| q.queue_family_index == family)
            {
                return Err(Error::ValidationFailed(format!(
                    "Queue family {} is requested more than once",
                    family
                )));
            }
            let count = queue_info.queue_priorities.len();
            if count == 0 || count > properties.queue_count as usize {
                return Err(Error::ValidationFailed(format!(
                    "Queue family {} supports 1..={} queues but {} were requested",
                    family, properties.queue_count, count
                )));
            }
            if let Some(priority) = queue_info
                .queue_priorities
                .iter()
                .find(|p| !(0.0..=1.0).contains(*p))
            {
                return Err(Error::ValidationFailed(format!(
                    "Queue priority {} is outside of [0, 1]",
                    priority
                )));
            }
        }
        Ok(())
    }

    /// Deviceを作成する
    ///
    /// queueの要求はVulkanを呼ぶ前に検査し、不正であれば`Error::ValidationFailed`を返す。
    pub fn create_device(&self, create_info: &DeviceCreateInfo) -> Result<DeviceHandle> {
        self.validate_device_create_info(create_info)?;

        let queue_create_infos = create_info
            .queue_create_infos
            .iter()
            .map(|q| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(q.queue_family_index)
                    .queue_priorities(&q.queue_priorities)
                    .build()
            })
            .collect::<Vec<_>>();
        let extension_names = create_info
            .enabled_extensions
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<_>>();
        let device_create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names);
        let device_create_info = match &create_info.enabled_features {
            Some(features) => device_create_info.enabled_features(features),
            None => device_create_info,
        };

        let bindings = self.base.with_parent("PhysicalDevice", |instance| {
            unsafe {
                instance
                    .bindings()
                    .create_device(self.vk_handle(), &device_create_info)
            }
            .check("vkCreateDevice")
        })?;
        let device = Device::new(self, bindings, create_info.clone());

        let mut created_devices = self.created_devices.lock();
        created_devices.retain(|d| d.is_valid());
        created_devices.push(device.downgrade());

        Ok(device)
    }
}

impl EmbeddedRefCount for PhysicalDevice {
    fn embedded_entry(&self) -> &EmbeddedEntry {
        &self.embedded
    }
}

impl ParentObject for PhysicalDevice {
    const NAME: &'static str = "PhysicalDevice";
}

// Debugトレイトの実装
impl Debug for PhysicalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDevice")
            .field("handle", &self.vk_handle())
            .field("name", &self.device_name())
            .field("device_type", &self.device_type())
            .finish()
    }
}
