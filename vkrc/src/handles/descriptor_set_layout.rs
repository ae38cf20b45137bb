//! 参照カウンタで管理して、参照がすべて破棄された際に
//! DescriptorSetLayoutの破棄の処理まで行うDescriptorSetLayoutHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

/// DescriptorSetLayoutの一つのbinding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    /// binding番号
    pub binding: u32,
    /// descriptorの種類
    pub descriptor_type: vk::DescriptorType,
    /// 配列の要素数
    pub descriptor_count: u32,
    /// 参照するshader stage
    pub stage_flags: vk::ShaderStageFlags,
}

/// vk::DescriptorSetLayout
pub struct DescriptorSetLayout {
    base: DeviceObjectBase<vk::DescriptorSetLayout>,
    bindings: Vec<DescriptorBinding>,
}

/// DescriptorSetLayoutを参照カウントで管理するためのハンドル
pub type DescriptorSetLayoutHandle = RefCounted<DescriptorSetLayout>;

impl DescriptorSetLayout {
    pub(crate) fn new(
        device: &Device,
        create_info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> Result<DescriptorSetLayoutHandle> {
        let bindings = if create_info.p_bindings.is_null() {
            vec![]
        } else {
            unsafe {
                std::slice::from_raw_parts(
                    create_info.p_bindings,
                    create_info.binding_count as usize,
                )
            }
            .iter()
            .map(|b| DescriptorBinding {
                binding: b.binding,
                descriptor_type: b.descriptor_type,
                descriptor_count: b.descriptor_count,
                stage_flags: b.stage_flags,
            })
            .collect()
        };
        let layout = unsafe { device.bindings().create_descriptor_set_layout(create_info) }
            .check("vkCreateDescriptorSetLayout")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, layout),
            bindings,
        }))
    }

    /// vk::DescriptorSetLayoutを取得する
    pub fn vk_handle(&self) -> vk::DescriptorSetLayout {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// bindingの数
    pub fn binding_count(&self) -> u32 {
        self.bindings.len() as u32
    }

    /// bindingのリスト
    pub fn bindings(&self) -> &[DescriptorBinding] {
        &self.bindings
    }

    /// `binding`番のbinding
    pub fn binding(&self, binding: u32) -> Option<&DescriptorBinding> {
        self.bindings.iter().find(|b| b.binding == binding)
    }
}

impl Debug for DescriptorSetLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSetLayout")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        let layout = self.vk_handle();
        self.base.destroy_with("descriptor set layout", |device| unsafe {
            device.bindings().destroy_descriptor_set_layout(layout)
        });
    }
}
