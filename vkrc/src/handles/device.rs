//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Deviceの破棄の処理まで行うDeviceHandleを定義する。

use crate::{
    Buffer, BufferHandle, BufferView, BufferViewHandle, CommandBuffer, CommandBufferHandle,
    CommandPool, CommandPoolHandle, ComputePipeline, ComputePipelineHandle, DescriptorPool,
    DescriptorPoolHandle, DescriptorSet, DescriptorSetHandle, DescriptorSetLayout,
    DescriptorSetLayoutHandle, DeviceBindings, DeviceCreateInfo, DeviceMemory, DeviceMemoryHandle,
    Error, Event, EventHandle, Fence, FenceHandle, Framebuffer, FramebufferHandle,
    GraphicsPipeline, GraphicsPipelineHandle, Image, ImageHandle, ImageView, ImageViewHandle,
    ParentObject, PhysicalDevice, PhysicalDeviceHandle, PhysicalDeviceObjectBase, PipelineCache,
    PipelineCacheHandle, PipelineLayout, PipelineLayoutHandle, QueryPool, QueryPoolHandle, Queue,
    QueueHandle, RenderPass, RenderPassHandle, Result, Sampler, SamplerHandle, Semaphore,
    SemaphoreHandle, ShaderModule, ShaderModuleHandle, VkResultExt,
};
use super::physical_device::find_memory_type_index;
use ash::vk;
use refcounted::{EmbeddedEntry, EmbeddedRefCount, EmbeddedRefCounted, WeakRef};
use std::{ffi::CStr, fmt::Debug, ptr::NonNull, sync::OnceLock};

struct QueueFamily {
    family_index: u32,
    queues: Vec<QueueHandle>,
}

/// vk::Deviceと、そのディスパッチテーブル、取得済みのqueueを保持する
pub struct Device {
    embedded: EmbeddedEntry,
    base: PhysicalDeviceObjectBase<vk::Device>,
    bindings: Box<dyn DeviceBindings>,
    create_info: DeviceCreateInfo,
    // Instanceが先に破棄されても使えるようにPhysicalDeviceから写しておく
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    queue_family_properties: Vec<vk::QueueFamilyProperties>,
    queue_families: OnceLock<Vec<QueueFamily>>,
}

/// Deviceを参照カウントで管理するためのハンドル
pub type DeviceHandle = EmbeddedRefCounted<Device>;
/// Deviceへの弱参照
pub type DeviceWeakHandle = WeakRef<Device>;

impl Device {
    pub(crate) fn new(
        physical_device: &PhysicalDevice,
        bindings: Box<dyn DeviceBindings>,
        create_info: DeviceCreateInfo,
    ) -> DeviceHandle {
        let handle = bindings.handle();
        let device = Device::create_new(Device {
            embedded: EmbeddedEntry::new(),
            base: PhysicalDeviceObjectBase::new(physical_device, handle),
            bindings,
            create_info,
            memory_properties: *physical_device.memory_properties(),
            queue_family_properties: physical_device.queue_family_properties().to_vec(),
            queue_families: OnceLock::new(),
        });

        // queueの取得
        let queue_families = device
            .create_info
            .queue_create_infos
            .iter()
            .map(|queue_info| {
                let family_index = queue_info.queue_family_index;
                let flags = device.queue_family_properties[family_index as usize].queue_flags;
                let queues = (0..queue_info.queue_priorities.len() as u32)
                    .map(|queue_index| {
                        let queue =
                            unsafe { device.bindings.get_device_queue(family_index, queue_index) };
                        Queue::new(&device, queue, family_index, queue_index, flags)
                    })
                    .collect();
                QueueFamily {
                    family_index,
                    queues,
                }
            })
            .collect();
        let _ = device.queue_families.set(queue_families);

        tracing::debug!(
            "Created device {:?} on {}",
            handle,
            physical_device.device_name()
        );
        device
    }

    /// vk::Deviceを取得する
    pub fn vk_handle(&self) -> vk::Device {
        self.base.vk_handle()
    }

    /// VkObjectType
    pub fn object_type(&self) -> vk::ObjectType {
        self.base.object_type()
    }

    /// 生成元のPhysicalDeviceを取得する
    pub fn physical_device(&self) -> Option<PhysicalDeviceHandle> {
        self.base.physical_device()
    }

    /// deviceのディスパッチテーブル
    pub fn bindings(&self) -> &dyn DeviceBindings {
        self.bindings.as_ref()
    }

    /// 作成時の設定
    pub fn create_info(&self) -> &DeviceCreateInfo {
        &self.create_info
    }

    /// 作成時のPhysicalDeviceのメモリプロパティ
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// 作成時のPhysicalDeviceのqueue familyごとのプロパティ
    pub fn queue_family_properties(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_family_properties
    }

    /// `type_bits`に含まれ、`flags`をすべて満たす最初のメモリタイプのindexを返す
    ///
    /// PhysicalDeviceが破棄された後でも使える。
    pub fn memory_type_index(&self, type_bits: u32, flags: vk::MemoryPropertyFlags) -> Option<u32> {
        find_memory_type_index(&self.memory_properties, type_bits, flags)
    }

    /// 拡張が有効かどうか
    pub fn is_extension_enabled(&self, name: &CStr) -> bool {
        self.create_info.is_extension_enabled(name)
    }

    /// `what`がこのDeviceから作られたObjectであることを確認する
    pub(crate) fn ensure_owned(&self, what: &str, owner: Option<DeviceHandle>) -> Result<()> {
        let this = NonNull::from(self);
        match owner {
            Some(owner) if owner.as_ptr() == Some(this) => Ok(()),
            Some(_) => Err(Error::ValidationFailed(format!(
                "{} was created from a different device",
                what
            ))),
            None => Err(Error::ParentDestroyed("Device")),
        }
    }

    // queue

    /// 作成時に取得したqueueを返す
    ///
    /// 作成時に要求していないqueue familyやindexを指定すると`Error::ValidationFailed`を返す。
    pub fn get_queue(&self, queue_family_index: u32, queue_index: u32) -> Result<QueueHandle> {
        let family = self
            .queue_families
            .get()
            .and_then(|families| {
                families
                    .iter()
                    .find(|f| f.family_index == queue_family_index)
            })
            .ok_or_else(|| {
                Error::ValidationFailed(format!(
                    "Queue family {} was not requested when the device was created",
                    queue_family_index
                ))
            })?;
        family
            .queues
            .get(queue_index as usize)
            .cloned()
            .ok_or_else(|| {
                Error::ValidationFailed(format!(
                    "Queue index {} is out of range for queue family {} ({} queue(s) created)",
                    queue_index,
                    queue_family_index,
                    family.queues.len()
                ))
            })
    }

    /// deviceの処理がすべて終わるまで待つ
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.bindings.device_wait_idle() }.check("vkDeviceWaitIdle")
    }

    // 空でなく、すべてこのDeviceのFenceであることを確認してからvk::Fenceに変換する
    fn fence_handles(&self, fences: &[FenceHandle]) -> Result<Vec<vk::Fence>> {
        if fences.is_empty() {
            return Err(Error::ValidationFailed(
                "At least one fence must be given".into(),
            ));
        }
        fences
            .iter()
            .map(|fence| {
                self.ensure_owned("Fence", fence.device())?;
                Ok(fence.vk_handle())
            })
            .collect()
    }

    /// Fenceを待つ。タイムアウトした場合は`Ok(false)`を返す。
    pub fn wait_for_fences(
        &self,
        fences: &[FenceHandle],
        wait_all: bool,
        timeout: u64,
    ) -> Result<bool> {
        let fences = self.fence_handles(fences)?;
        match unsafe { self.bindings.wait_for_fences(&fences, wait_all, timeout) } {
            Ok(()) => Ok(true),
            Err(vk::Result::TIMEOUT) => Ok(false),
            Err(result) => Err(Error::Vulkan {
                call: "vkWaitForFences",
                result,
            }),
        }
    }

    /// Fenceを非シグナル状態に戻す
    pub fn reset_fences(&self, fences: &[FenceHandle]) -> Result<()> {
        let fences = self.fence_handles(fences)?;
        unsafe { self.bindings.reset_fences(&fences) }.check("vkResetFences")
    }

    // create系

    /// Bufferを作成する
    pub fn create_buffer(&self, create_info: &vk::BufferCreateInfo) -> Result<BufferHandle> {
        Buffer::new(self, create_info)
    }

    /// Imageを作成する
    pub fn create_image(&self, create_info: &vk::ImageCreateInfo) -> Result<ImageHandle> {
        Image::new(self, create_info)
    }

    /// `image`のImageViewを作成する。`create_info.image`は無視される。
    pub fn create_image_view(
        &self,
        image: &ImageHandle,
        create_info: &vk::ImageViewCreateInfo,
    ) -> Result<ImageViewHandle> {
        ImageView::new(self, image, create_info)
    }

    /// `buffer`のBufferViewを作成する。`create_info.buffer`は無視される。
    pub fn create_buffer_view(
        &self,
        buffer: &BufferHandle,
        create_info: &vk::BufferViewCreateInfo,
    ) -> Result<BufferViewHandle> {
        BufferView::new(self, buffer, create_info)
    }

    /// Samplerを作成する
    pub fn create_sampler(&self, create_info: &vk::SamplerCreateInfo) -> Result<SamplerHandle> {
        Sampler::new(self, create_info)
    }

    /// DeviceMemoryを確保する
    pub fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> Result<DeviceMemoryHandle> {
        DeviceMemory::new(self, allocate_info)
    }

    /// Fenceを作成する
    pub fn create_fence(&self, create_info: &vk::FenceCreateInfo) -> Result<FenceHandle> {
        Fence::new(self, create_info)
    }

    /// Semaphoreを作成する
    pub fn create_semaphore(
        &self,
        create_info: &vk::SemaphoreCreateInfo,
    ) -> Result<SemaphoreHandle> {
        Semaphore::new(self, create_info)
    }

    /// Eventを作成する
    pub fn create_event(&self, create_info: &vk::EventCreateInfo) -> Result<EventHandle> {
        Event::new(self, create_info)
    }

    /// QueryPoolを作成する
    pub fn create_query_pool(
        &self,
        create_info: &vk::QueryPoolCreateInfo,
    ) -> Result<QueryPoolHandle> {
        QueryPool::new(self, create_info)
    }

    /// CommandPoolを作成する
    pub fn create_command_pool(
        &self,
        create_info: &vk::CommandPoolCreateInfo,
    ) -> Result<CommandPoolHandle> {
        CommandPool::new(self, create_info)
    }

    /// `command_pool`からCommandBufferを`count`個確保する。`count`は1以上。
    pub fn allocate_command_buffers(
        &self,
        command_pool: &CommandPoolHandle,
        level: vk::CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<CommandBufferHandle>> {
        CommandBuffer::allocate(self, command_pool, level, count)
    }

    /// DescriptorPoolを作成する
    pub fn create_descriptor_pool(
        &self,
        create_info: &vk::DescriptorPoolCreateInfo,
    ) -> Result<DescriptorPoolHandle> {
        DescriptorPool::new(self, create_info)
    }

    /// DescriptorSetLayoutを作成する
    pub fn create_descriptor_set_layout(
        &self,
        create_info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> Result<DescriptorSetLayoutHandle> {
        DescriptorSetLayout::new(self, create_info)
    }

    /// `descriptor_pool`から`layouts`の各layoutのDescriptorSetを確保する
    ///
    /// poolの`max_sets`を超える場合はVulkanを呼ぶ前に`Error::ValidationFailed`を返す。
    pub fn allocate_descriptor_sets(
        &self,
        descriptor_pool: &DescriptorPoolHandle,
        layouts: &[DescriptorSetLayoutHandle],
    ) -> Result<Vec<DescriptorSetHandle>> {
        DescriptorSet::allocate(self, descriptor_pool, layouts)
    }

    /// RenderPassを作成する
    pub fn create_render_pass(
        &self,
        create_info: &vk::RenderPassCreateInfo,
    ) -> Result<RenderPassHandle> {
        RenderPass::new(self, create_info)
    }

    /// Framebufferを作成する
    pub fn create_framebuffer(
        &self,
        render_pass: &RenderPassHandle,
        attachments: &[ImageViewHandle],
        extent: vk::Extent2D,
        layers: u32,
    ) -> Result<FramebufferHandle> {
        Framebuffer::new(self, render_pass, attachments, extent, layers)
    }

    /// SPIR-VのコードからShaderModuleを作成する
    pub fn create_shader_module(&self, code: &[u32]) -> Result<ShaderModuleHandle> {
        ShaderModule::new(self, code)
    }

    /// PipelineLayoutを作成する
    pub fn create_pipeline_layout(
        &self,
        set_layouts: &[DescriptorSetLayoutHandle],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> Result<PipelineLayoutHandle> {
        PipelineLayout::new(self, set_layouts, push_constant_ranges)
    }

    /// PipelineCacheを作成する。`initial_data`は以前に取得したcacheの中身か空。
    pub fn create_pipeline_cache(&self, initial_data: &[u8]) -> Result<PipelineCacheHandle> {
        PipelineCache::new(self, initial_data)
    }

    /// ComputePipelineを作成する
    pub fn create_compute_pipeline(
        &self,
        layout: &PipelineLayoutHandle,
        shader_module: &ShaderModuleHandle,
        entry_point: &CStr,
        pipeline_cache: Option<&PipelineCacheHandle>,
    ) -> Result<ComputePipelineHandle> {
        ComputePipeline::new(self, layout, shader_module, entry_point, pipeline_cache)
    }

    /// GraphicsPipelineを作成する
    ///
    /// `create_info`のshader stageやfixed functionの設定はそのまま使い、
    /// `layout`、`render_pass`、`subpass`は引数の値で上書きする。
    pub fn create_graphics_pipeline(
        &self,
        create_info: &vk::GraphicsPipelineCreateInfo,
        layout: &PipelineLayoutHandle,
        render_pass: &RenderPassHandle,
        subpass: u32,
        pipeline_cache: Option<&PipelineCacheHandle>,
    ) -> Result<GraphicsPipelineHandle> {
        GraphicsPipeline::new(
            self,
            create_info,
            layout,
            render_pass,
            subpass,
            pipeline_cache,
        )
    }
}

impl EmbeddedRefCount for Device {
    fn embedded_entry(&self) -> &EmbeddedEntry {
        &self.embedded
    }
}

impl ParentObject for Device {
    const NAME: &'static str = "Device";
}

// Debugトレイトの実装
impl Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.vk_handle())
            .field("physical_device_alive", &self.base.is_parent_alive())
            .finish()
    }
}

// Drop時にdeviceの処理を待ってからqueueを手放し、deviceを破棄する
impl Drop for Device {
    fn drop(&mut self) {
        if let Err(e) = unsafe { self.bindings.device_wait_idle() } {
            tracing::warn!(
                "Failed to wait for device {:?} before destruction: {e}",
                self.vk_handle()
            );
        }
        drop(self.queue_families.take());
        tracing::debug!("Dropping device {:?}", self.vk_handle());
        unsafe { self.bindings.destroy_device() };
    }
}
