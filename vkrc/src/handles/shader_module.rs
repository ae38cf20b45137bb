//! 参照カウンタで管理して、参照がすべて破棄された際に
//! ShaderModuleの破棄の処理まで行うShaderModuleHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt};
use ash::vk;
use refcounted::RefCounted;
use std::fmt::Debug;

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// vk::ShaderModule
pub struct ShaderModule {
    base: DeviceObjectBase<vk::ShaderModule>,
}

/// ShaderModuleを参照カウントで管理するためのハンドル
pub type ShaderModuleHandle = RefCounted<ShaderModule>;

impl ShaderModule {
    pub(crate) fn new(device: &Device, code: &[u32]) -> Result<ShaderModuleHandle> {
        if code.first() != Some(&SPIRV_MAGIC) {
            return Err(Error::ValidationFailed(
                "Shader code does not start with the SPIR-V magic number".into(),
            ));
        }
        let create_info = vk::ShaderModuleCreateInfo::builder().code(code);
        let shader_module = unsafe { device.bindings().create_shader_module(&create_info) }
            .check("vkCreateShaderModule")?;
        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, shader_module),
        }))
    }

    /// vk::ShaderModuleを取得する
    pub fn vk_handle(&self) -> vk::ShaderModule {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }
}

impl Debug for ShaderModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderModule")
            .field("handle", &self.vk_handle())
            .finish()
    }
}

// Drop時にshader moduleを破棄する
impl Drop for ShaderModule {
    fn drop(&mut self) {
        let shader_module = self.vk_handle();
        self.base.destroy_with("shader module", |device| unsafe {
            device.bindings().destroy_shader_module(shader_module)
        });
    }
}
