//! 参照カウンタで管理して、参照がすべて破棄された際に
//! DescriptorSetをpoolに返すDescriptorSetHandleを定義する。

use crate::{
    BufferHandle, BufferViewHandle, DescriptorPoolHandle, DescriptorSetLayoutHandle, Device,
    DeviceHandle, DeviceObjectBase, Error, ImageViewHandle, Result, SamplerHandle, VkResultExt,
};
use ash::vk;
use parking_lot::Mutex;
use refcounted::RefCounted;
use std::{collections::BTreeMap, fmt::Debug};

// 書き込んだdescriptorが参照しているリソース
#[allow(dead_code)]
enum BoundResource {
    Buffer(BufferHandle),
    Image {
        image_view: Option<ImageViewHandle>,
        sampler: Option<SamplerHandle>,
    },
    TexelBuffer(BufferViewHandle),
}

/// vk::DescriptorSet
///
/// 書き込んだBufferやImageViewは、上書きされるかsetが破棄されるまで保持する。
pub struct DescriptorSet {
    base: DeviceObjectBase<vk::DescriptorSet>,
    // setより先に破棄されないように保持しておく
    descriptor_pool: DescriptorPoolHandle,
    layout: DescriptorSetLayoutHandle,
    // (binding, array element)ごとのリソース
    bound: Mutex<BTreeMap<(u32, u32), BoundResource>>,
}

/// DescriptorSetを参照カウントで管理するためのハンドル
pub type DescriptorSetHandle = RefCounted<DescriptorSet>;

impl DescriptorSet {
    pub(crate) fn allocate(
        device: &Device,
        descriptor_pool: &DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        device.ensure_owned("DescriptorPool", descriptor_pool.device())?;
        for layout in layouts {
            device.ensure_owned("DescriptorSetLayout", layout.device())?;
        }
        if layouts.is_empty() {
            return Err(Error::ValidationFailed(
                "At least one descriptor set layout must be given".into(),
            ));
        }

        let count = layouts.len() as u32;
        descriptor_pool.reserve_sets(count)?;
        let raw_layouts = layouts.iter().map(|l| l.vk_handle()).collect::<Vec<_>>();
        let allocate_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(descriptor_pool.vk_handle())
            .set_layouts(&raw_layouts);
        let descriptor_sets =
            match unsafe { device.bindings().allocate_descriptor_sets(&allocate_info) } {
                Ok(descriptor_sets) => descriptor_sets,
                Err(result) => {
                    descriptor_pool.release_sets(count);
                    return Err(Error::Vulkan {
                        call: "vkAllocateDescriptorSets",
                        result,
                    });
                }
            };

        Ok(descriptor_sets
            .into_iter()
            .zip(layouts)
            .map(|(descriptor_set, layout)| {
                RefCounted::new(Self {
                    base: DeviceObjectBase::new(device, descriptor_set),
                    descriptor_pool: descriptor_pool.clone(),
                    layout: layout.clone(),
                    bound: Mutex::new(BTreeMap::new()),
                })
            })
            .collect())
    }

    /// vk::DescriptorSetを取得する
    pub fn vk_handle(&self) -> vk::DescriptorSet {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 確保元のDescriptorPool
    pub fn descriptor_pool(&self) -> &DescriptorPoolHandle {
        &self.descriptor_pool
    }

    /// 確保時に指定したDescriptorSetLayout
    pub fn layout(&self) -> &DescriptorSetLayoutHandle {
        &self.layout
    }

    /// 書き込み済みのdescriptorの数
    pub fn written_descriptor_count(&self) -> usize {
        self.bound.lock().len()
    }

    fn check_binding(
        &self,
        binding: u32,
        array_element: u32,
        descriptor_type: vk::DescriptorType,
    ) -> Result<()> {
        let Some(layout_binding) = self.layout.binding(binding) else {
            return Err(Error::ValidationFailed(format!(
                "Binding {} does not exist in the descriptor set layout",
                binding
            )));
        };
        if layout_binding.descriptor_type != descriptor_type {
            return Err(Error::ValidationFailed(format!(
                "Binding {} expects {:?} but {:?} was given",
                binding, layout_binding.descriptor_type, descriptor_type
            )));
        }
        if array_element >= layout_binding.descriptor_count {
            return Err(Error::ValidationFailed(format!(
                "Array element {} is out of range for binding {} ({} descriptor(s))",
                array_element, binding, layout_binding.descriptor_count
            )));
        }
        Ok(())
    }

    // 書き込みとリソースの保持をまとめて行う
    fn write(&self, device: &Device, write: vk::WriteDescriptorSet, resource: BoundResource) {
        // 同じsetへの書き込みは直列にする
        let mut bound = self.bound.lock();
        unsafe { device.bindings().update_descriptor_sets(&[write], &[]) };
        bound.insert((write.dst_binding, write.dst_array_element), resource);
    }

    /// uniform bufferやstorage bufferのdescriptorを書き込む
    pub fn write_buffer(
        &self,
        binding: u32,
        array_element: u32,
        descriptor_type: vk::DescriptorType,
        buffer: &BufferHandle,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    ) -> Result<()> {
        self.check_binding(binding, array_element, descriptor_type)?;
        self.base.with_device("DescriptorSet", |device| {
            device.ensure_owned("Buffer", buffer.device())?;
            let buffer_info = [vk::DescriptorBufferInfo {
                buffer: buffer.vk_handle(),
                offset,
                range,
            }];
            let write = vk::WriteDescriptorSet::builder()
                .dst_set(self.vk_handle())
                .dst_binding(binding)
                .dst_array_element(array_element)
                .descriptor_type(descriptor_type)
                .buffer_info(&buffer_info)
                .build();
            self.write(device, write, BoundResource::Buffer(buffer.clone()));
            Ok(())
        })
    }

    /// sampled imageやsamplerのdescriptorを書き込む
    ///
    /// descriptorの種類によって`image_view`と`sampler`のどちらか、または両方を指定する。
    pub fn write_image(
        &self,
        binding: u32,
        array_element: u32,
        descriptor_type: vk::DescriptorType,
        image_view: Option<&ImageViewHandle>,
        sampler: Option<&SamplerHandle>,
        image_layout: vk::ImageLayout,
    ) -> Result<()> {
        self.check_binding(binding, array_element, descriptor_type)?;
        if image_view.is_none() && sampler.is_none() {
            return Err(Error::ValidationFailed(
                "Either an image view or a sampler must be given".into(),
            ));
        }
        self.base.with_device("DescriptorSet", |device| {
            if let Some(image_view) = image_view {
                device.ensure_owned("ImageView", image_view.device())?;
            }
            if let Some(sampler) = sampler {
                device.ensure_owned("Sampler", sampler.device())?;
            }
            let image_info = [vk::DescriptorImageInfo {
                sampler: sampler.map_or(vk::Sampler::null(), |s| s.vk_handle()),
                image_view: image_view.map_or(vk::ImageView::null(), |v| v.vk_handle()),
                image_layout,
            }];
            let write = vk::WriteDescriptorSet::builder()
                .dst_set(self.vk_handle())
                .dst_binding(binding)
                .dst_array_element(array_element)
                .descriptor_type(descriptor_type)
                .image_info(&image_info)
                .build();
            self.write(
                device,
                write,
                BoundResource::Image {
                    image_view: image_view.cloned(),
                    sampler: sampler.cloned(),
                },
            );
            Ok(())
        })
    }

    /// texel bufferのdescriptorを書き込む
    pub fn write_texel_buffer(
        &self,
        binding: u32,
        array_element: u32,
        descriptor_type: vk::DescriptorType,
        buffer_view: &BufferViewHandle,
    ) -> Result<()> {
        self.check_binding(binding, array_element, descriptor_type)?;
        self.base.with_device("DescriptorSet", |device| {
            device.ensure_owned("BufferView", buffer_view.device())?;
            let texel_buffer_view = [buffer_view.vk_handle()];
            let write = vk::WriteDescriptorSet::builder()
                .dst_set(self.vk_handle())
                .dst_binding(binding)
                .dst_array_element(array_element)
                .descriptor_type(descriptor_type)
                .texel_buffer_view(&texel_buffer_view)
                .build();
            self.write(device, write, BoundResource::TexelBuffer(buffer_view.clone()));
            Ok(())
        })
    }
}

// Debugトレイトの実装
impl Debug for DescriptorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorSet")
            .field("handle", &self.vk_handle())
            .field("written", &self.written_descriptor_count())
            .finish()
    }
}

// Drop時にsetをpoolに返す。
// 個別に解放できないpoolの場合はpoolの破棄時にまとめて解放される。
impl Drop for DescriptorSet {
    fn drop(&mut self) {
        if !self.descriptor_pool.can_free_descriptor_sets() {
            return;
        }
        let descriptor_set = self.vk_handle();
        let descriptor_pool = self.descriptor_pool.vk_handle();
        self.base.destroy_with("descriptor set", |device| {
            if let Err(e) = unsafe {
                device
                    .bindings()
                    .free_descriptor_sets(descriptor_pool, &[descriptor_set])
            } {
                tracing::warn!("Failed to free descriptor set {:?}: {e}", descriptor_set);
            }
        });
        self.descriptor_pool.release_sets(1);
    }
}
