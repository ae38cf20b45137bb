//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Instanceの破棄の処理まで行うInstanceHandleを定義する。

use crate::{
    AshInstanceBindings, InstanceBindings, ObjectBase, ParentObject, PhysicalDevice,
    PhysicalDeviceHandle, Result, VkResultExt,
};
use ash::{extensions::ext::DebugUtils, vk};
use refcounted::{EmbeddedEntry, EmbeddedRefCount, EmbeddedRefCounted, WeakRef};
use std::{
    ffi::{CStr, CString},
    fmt::Debug,
    sync::OnceLock,
};

#[cfg(feature = "validation")]
const ENABLE_VALIDATION_LAYERS: bool = true;
#[cfg(not(feature = "validation"))]
const ENABLE_VALIDATION_LAYERS: bool = false;

const VALIDATION: &[u8] = b"VK_LAYER_KHRONOS_validation\0";
const DEFAULT_NAME: &[u8] = b"vkrc\0";

fn static_cstring(bytes: &'static [u8]) -> CString {
    // 末尾にだけNULを持つ定数からしか呼ばない
    unsafe { CStr::from_bytes_with_nul_unchecked(bytes) }.to_owned()
}

/// Instanceの作成時の設定
#[derive(Debug, Clone)]
pub struct InstanceCreateInfo {
    /// アプリケーション名
    pub application_name: CString,
    /// アプリケーションのバージョン
    pub application_version: u32,
    /// エンジン名
    pub engine_name: CString,
    /// エンジンのバージョン
    pub engine_version: u32,
    /// 使用するVulkanのAPIバージョン
    pub api_version: u32,
    /// 有効にするinstance拡張
    pub enabled_extensions: Vec<CString>,
    /// 有効にするレイヤー
    pub enabled_layers: Vec<CString>,
    /// debug utilsのmessengerを作成してtracingにメッセージを流すかどうか
    pub debug_utils: bool,
}
impl Default for InstanceCreateInfo {
    fn default() -> Self {
        let enabled_layers = if ENABLE_VALIDATION_LAYERS {
            vec![static_cstring(VALIDATION)]
        } else {
            vec![]
        };
        Self {
            application_name: static_cstring(DEFAULT_NAME),
            application_version: vk::make_api_version(0, 1, 0, 0),
            engine_name: static_cstring(DEFAULT_NAME),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_2,
            enabled_extensions: vec![],
            enabled_layers,
            debug_utils: ENABLE_VALIDATION_LAYERS,
        }
    }
}
impl InstanceCreateInfo {
    /// 拡張が有効になるかどうか。`debug_utils`がtrueならVK_EXT_debug_utilsも有効。
    pub fn is_extension_enabled(&self, name: &CStr) -> bool {
        (self.debug_utils && name == DebugUtils::name())
            || self.enabled_extensions.iter().any(|e| e.as_c_str() == name)
    }
}

/// vk::Instanceと、そこから列挙されたPhysicalDeviceを保持する
pub struct Instance {
    embedded: EmbeddedEntry,
    base: ObjectBase<vk::Instance>,
    bindings: Box<dyn InstanceBindings>,
    create_info: InstanceCreateInfo,
    physical_devices: OnceLock<Vec<PhysicalDeviceHandle>>,
}

/// Instanceを参照カウントで管理するためのハンドル
pub type InstanceHandle = EmbeddedRefCounted<Instance>;
/// Instanceへの弱参照
pub type InstanceWeakHandle = WeakRef<Instance>;

impl Instance {
    /// Vulkanのローダーを読み込んでInstanceを作成する
    pub fn load(create_info: InstanceCreateInfo) -> anyhow::Result<InstanceHandle> {
        let bindings = AshInstanceBindings::new(&create_info)?;
        Ok(Self::with_bindings(Box::new(bindings), create_info)?)
    }

    /// 作成済みのinstanceのディスパッチテーブルからInstanceを作成し、PhysicalDeviceを列挙する
    pub fn with_bindings(
        bindings: Box<dyn InstanceBindings>,
        create_info: InstanceCreateInfo,
    ) -> Result<InstanceHandle> {
        let handle = bindings.handle();
        let instance = Instance::create_new(Instance {
            embedded: EmbeddedEntry::new(),
            base: ObjectBase::new(handle),
            bindings,
            create_info,
            physical_devices: OnceLock::new(),
        });

        // 失敗した場合はinstanceのDropで破棄される
        let physical_devices = instance.retrieve_physical_devices()?;
        tracing::debug!(
            "Created instance {:?} with {} physical device(s)",
            handle,
            physical_devices.len()
        );
        let _ = instance.physical_devices.set(physical_devices);

        Ok(instance)
    }

    fn retrieve_physical_devices(&self) -> Result<Vec<PhysicalDeviceHandle>> {
        let handles = unsafe { self.bindings.enumerate_physical_devices() }
            .check("vkEnumeratePhysicalDevices")?;
        Ok(handles
            .into_iter()
            .map(|handle| PhysicalDevice::new(self, handle))
            .collect())
    }

    /// vk::Instanceを取得する
    pub fn vk_handle(&self) -> vk::Instance {
        self.base.vk_handle()
    }

    /// VkObjectType
    pub fn object_type(&self) -> vk::ObjectType {
        self.base.object_type()
    }

    /// instanceのディスパッチテーブル
    pub fn bindings(&self) -> &dyn InstanceBindings {
        self.bindings.as_ref()
    }

    /// 作成時の設定
    pub fn create_info(&self) -> &InstanceCreateInfo {
        &self.create_info
    }

    /// 拡張が有効かどうか
    pub fn is_extension_enabled(&self, name: &CStr) -> bool {
        self.create_info.is_extension_enabled(name)
    }

    /// 列挙されたPhysicalDevice
    pub fn physical_devices(&self) -> &[PhysicalDeviceHandle] {
        self.physical_devices
            .get()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// PhysicalDeviceの数
    pub fn number_of_physical_devices(&self) -> usize {
        self.physical_devices().len()
    }

    /// `index`番目のPhysicalDeviceを取得する
    pub fn physical_device(&self, index: usize) -> Option<PhysicalDeviceHandle> {
        self.physical_devices().get(index).cloned()
    }
}

impl EmbeddedRefCount for Instance {
    fn embedded_entry(&self) -> &EmbeddedEntry {
        &self.embedded
    }
}

impl ParentObject for Instance {
    const NAME: &'static str = "Instance";
}

// Debugトレイトの実装
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.vk_handle())
            .field("physical_devices", &self.number_of_physical_devices())
            .finish()
    }
}

// Drop時にPhysicalDeviceを手放してからinstanceを破棄する
impl Drop for Instance {
    fn drop(&mut self) {
        if let Some(physical_devices) = self.physical_devices.take() {
            for physical_device in &physical_devices {
                let live = physical_device.live_device_count();
                if live > 0 {
                    tracing::warn!(
                        "Instance {:?} is being destroyed while {} device(s) created from {} are still alive",
                        self.vk_handle(),
                        live,
                        physical_device.device_name()
                    );
                }
            }
        }
        tracing::debug!("Dropping instance {:?}", self.vk_handle());
        unsafe { self.bindings.destroy_instance() };
    }
}
