//! Vulkanのディスパッチテーブルを抽象化したトレイトと、ashによる実装を定義する。
//!
//! ラッパーの各Objectはこのトレイトを経由してVulkanの関数を呼ぶ。
//! 実際のドライバに対しては`AshInstanceBindings`と`ash::Device`を使う。

use crate::InstanceCreateInfo;
use ash::{extensions::ext::DebugUtils, prelude::VkResult, vk};
use std::{
    borrow::Cow,
    ffi::{c_void, CStr},
};

/// instanceレベルのVulkan関数
///
/// 引数はVulkanの対応する関数と同じ規約に従う。
#[allow(missing_docs)]
pub trait InstanceBindings: Send + Sync {
    fn handle(&self) -> vk::Instance;

    unsafe fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;
    unsafe fn get_physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties;
    unsafe fn get_physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures;
    unsafe fn get_physical_device_memory_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceMemoryProperties;
    unsafe fn get_physical_device_queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties>;
    unsafe fn get_physical_device_format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> vk::FormatProperties;

    /// deviceを作成し、そのdeviceのディスパッチテーブルを返す
    unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> VkResult<Box<dyn DeviceBindings>>;

    /// instanceと、それに付随するdebug messengerなどを破棄する
    unsafe fn destroy_instance(&self);
}

/// deviceレベルのVulkan関数
///
/// 引数はVulkanの対応する関数と同じ規約に従う。
/// allocation callbacksは常にnull。
#[allow(missing_docs)]
pub trait DeviceBindings: Send + Sync {
    fn handle(&self) -> vk::Device;

    unsafe fn destroy_device(&self);
    unsafe fn device_wait_idle(&self) -> VkResult<()>;
    unsafe fn get_device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue;

    // queue
    unsafe fn queue_submit(
        &self,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> VkResult<()>;
    unsafe fn queue_wait_idle(&self, queue: vk::Queue) -> VkResult<()>;

    // buffer / image
    unsafe fn create_buffer(&self, create_info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer>;
    unsafe fn destroy_buffer(&self, buffer: vk::Buffer);
    unsafe fn get_buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements;
    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()>;
    unsafe fn create_image(&self, create_info: &vk::ImageCreateInfo) -> VkResult<vk::Image>;
    unsafe fn destroy_image(&self, image: vk::Image);
    unsafe fn get_image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements;
    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()>;
    unsafe fn create_image_view(
        &self,
        create_info: &vk::ImageViewCreateInfo,
    ) -> VkResult<vk::ImageView>;
    unsafe fn destroy_image_view(&self, image_view: vk::ImageView);
    unsafe fn create_sampler(&self, create_info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler>;
    unsafe fn destroy_sampler(&self, sampler: vk::Sampler);
    unsafe fn create_buffer_view(
        &self,
        create_info: &vk::BufferViewCreateInfo,
    ) -> VkResult<vk::BufferView>;
    unsafe fn destroy_buffer_view(&self, buffer_view: vk::BufferView);

    // memory
    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> VkResult<vk::DeviceMemory>;
    unsafe fn free_memory(&self, memory: vk::DeviceMemory);
    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void>;
    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory);
    unsafe fn flush_mapped_memory_ranges(&self, ranges: &[vk::MappedMemoryRange]) -> VkResult<()>;
    unsafe fn invalidate_mapped_memory_ranges(
        &self,
        ranges: &[vk::MappedMemoryRange],
    ) -> VkResult<()>;

    // sync objects
    unsafe fn create_fence(&self, create_info: &vk::FenceCreateInfo) -> VkResult<vk::Fence>;
    unsafe fn destroy_fence(&self, fence: vk::Fence);
    /// タイムアウトした場合は`Err(vk::Result::TIMEOUT)`を返す
    unsafe fn wait_for_fences(
        &self,
        fences: &[vk::Fence],
        wait_all: bool,
        timeout: u64,
    ) -> VkResult<()>;
    unsafe fn reset_fences(&self, fences: &[vk::Fence]) -> VkResult<()>;
    unsafe fn get_fence_status(&self, fence: vk::Fence) -> VkResult<bool>;
    unsafe fn create_semaphore(
        &self,
        create_info: &vk::SemaphoreCreateInfo,
    ) -> VkResult<vk::Semaphore>;
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);
    unsafe fn create_event(&self, create_info: &vk::EventCreateInfo) -> VkResult<vk::Event>;
    unsafe fn destroy_event(&self, event: vk::Event);
    unsafe fn get_event_status(&self, event: vk::Event) -> VkResult<bool>;
    unsafe fn set_event(&self, event: vk::Event) -> VkResult<()>;
    unsafe fn reset_event(&self, event: vk::Event) -> VkResult<()>;

    // query
    unsafe fn create_query_pool(
        &self,
        create_info: &vk::QueryPoolCreateInfo,
    ) -> VkResult<vk::QueryPool>;
    unsafe fn destroy_query_pool(&self, query_pool: vk::QueryPool);

    // command
    unsafe fn create_command_pool(
        &self,
        create_info: &vk::CommandPoolCreateInfo,
    ) -> VkResult<vk::CommandPool>;
    unsafe fn destroy_command_pool(&self, command_pool: vk::CommandPool);
    unsafe fn reset_command_pool(
        &self,
        command_pool: vk::CommandPool,
        flags: vk::CommandPoolResetFlags,
    ) -> VkResult<()>;
    unsafe fn allocate_command_buffers(
        &self,
        allocate_info: &vk::CommandBufferAllocateInfo,
    ) -> VkResult<Vec<vk::CommandBuffer>>;
    unsafe fn free_command_buffers(
        &self,
        command_pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    );
    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        begin_info: &vk::CommandBufferBeginInfo,
    ) -> VkResult<()>;
    unsafe fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()>;
    unsafe fn reset_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        flags: vk::CommandBufferResetFlags,
    ) -> VkResult<()>;

    // descriptor
    unsafe fn create_descriptor_pool(
        &self,
        create_info: &vk::DescriptorPoolCreateInfo,
    ) -> VkResult<vk::DescriptorPool>;
    unsafe fn destroy_descriptor_pool(&self, descriptor_pool: vk::DescriptorPool);
    unsafe fn create_descriptor_set_layout(
        &self,
        create_info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> VkResult<vk::DescriptorSetLayout>;
    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);
    unsafe fn allocate_descriptor_sets(
        &self,
        allocate_info: &vk::DescriptorSetAllocateInfo,
    ) -> VkResult<Vec<vk::DescriptorSet>>;
    unsafe fn free_descriptor_sets(
        &self,
        descriptor_pool: vk::DescriptorPool,
        descriptor_sets: &[vk::DescriptorSet],
    ) -> VkResult<()>;
    unsafe fn update_descriptor_sets(
        &self,
        writes: &[vk::WriteDescriptorSet],
        copies: &[vk::CopyDescriptorSet],
    );

    // render pass / pipeline
    unsafe fn create_render_pass(
        &self,
        create_info: &vk::RenderPassCreateInfo,
    ) -> VkResult<vk::RenderPass>;
    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass);
    unsafe fn create_framebuffer(
        &self,
        create_info: &vk::FramebufferCreateInfo,
    ) -> VkResult<vk::Framebuffer>;
    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);
    unsafe fn create_shader_module(
        &self,
        create_info: &vk::ShaderModuleCreateInfo,
    ) -> VkResult<vk::ShaderModule>;
    unsafe fn destroy_shader_module(&self, shader_module: vk::ShaderModule);
    unsafe fn create_pipeline_layout(
        &self,
        create_info: &vk::PipelineLayoutCreateInfo,
    ) -> VkResult<vk::PipelineLayout>;
    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);
    unsafe fn create_pipeline_cache(
        &self,
        create_info: &vk::PipelineCacheCreateInfo,
    ) -> VkResult<vk::PipelineCache>;
    unsafe fn destroy_pipeline_cache(&self, pipeline_cache: vk::PipelineCache);
    unsafe fn get_pipeline_cache_data(&self, pipeline_cache: vk::PipelineCache)
        -> VkResult<Vec<u8>>;
    /// 失敗した場合、一部だけ作成できたpipelineは破棄してから返す
    unsafe fn create_graphics_pipelines(
        &self,
        pipeline_cache: vk::PipelineCache,
        create_infos: &[vk::GraphicsPipelineCreateInfo],
    ) -> VkResult<Vec<vk::Pipeline>>;
    /// 失敗した場合、一部だけ作成できたpipelineは破棄してから返す
    unsafe fn create_compute_pipelines(
        &self,
        pipeline_cache: vk::PipelineCache,
        create_infos: &[vk::ComputePipelineCreateInfo],
    ) -> VkResult<Vec<vk::Pipeline>>;
    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline);
}

// debug utilsのコールバック関数
unsafe extern "system" fn vulkan_debug_utils_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let types = match message_types {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "GENERAL",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "PERFORMANCE",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "VALIDATION",
        _ => "UNKNOWN",
    };
    let message = if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr((*p_callback_data).p_message).to_string_lossy()
    };
    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            tracing::trace!(target: "vkrc-debug-messenger", "[{}] {}", types, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!(target: "vkrc-debug-messenger", "[{}] {}", types, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(target: "vkrc-debug-messenger", "[{}] {}", types, message)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(target: "vkrc-debug-messenger", "[{}] {}", types, message)
        }
        _ => tracing::debug!(target: "vkrc-debug-messenger", "[{}] {}", types, message),
    }

    vk::FALSE
}

/// ashでロードしたinstanceのディスパッチテーブル
pub struct AshInstanceBindings {
    // instanceより先に破棄されないように保持しておく
    _entry: ash::Entry,
    instance: ash::Instance,
    debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}
impl AshInstanceBindings {
    /// Vulkanのローダーを読み込んでinstanceを作成する
    pub fn new(create_info: &InstanceCreateInfo) -> anyhow::Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        // instanceの作成とdebug utilsの設定
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&create_info.application_name)
            .application_version(create_info.application_version)
            .engine_name(&create_info.engine_name)
            .engine_version(create_info.engine_version)
            .api_version(create_info.api_version);
        let mut debug_utils_messenger_create_info =
            vk::DebugUtilsMessengerCreateInfoEXT::builder()
                .flags(vk::DebugUtilsMessengerCreateFlagsEXT::empty())
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                )
                .pfn_user_callback(Some(vulkan_debug_utils_callback))
                .build();

        let mut extension_names = create_info
            .enabled_extensions
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<_>>();
        if create_info.debug_utils && !create_info.is_extension_enabled(DebugUtils::name()) {
            extension_names.push(DebugUtils::name().as_ptr());
        }
        let layer_names = create_info
            .enabled_layers
            .iter()
            .map(|l| l.as_ptr())
            .collect::<Vec<_>>();

        let instance_create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);
        let instance_create_info = if create_info.debug_utils {
            instance_create_info.push_next(&mut debug_utils_messenger_create_info)
        } else {
            instance_create_info
        };
        let instance = unsafe { entry.create_instance(&instance_create_info, None)? };

        // setup debug utils
        let debug_utils = if create_info.debug_utils {
            let loader = DebugUtils::new(&entry, &instance);
            let messenger = unsafe {
                loader.create_debug_utils_messenger(&debug_utils_messenger_create_info, None)
            };
            match messenger {
                Ok(messenger) => Some((loader, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        Ok(Self {
            _entry: entry,
            instance,
            debug_utils,
        })
    }

    /// ash::Instanceを取得する
    pub fn ash_instance(&self) -> &ash::Instance {
        &self.instance
    }
}

impl InstanceBindings for AshInstanceBindings {
    fn handle(&self) -> vk::Instance {
        self.instance.handle()
    }

    unsafe fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        self.instance.enumerate_physical_devices()
    }

    unsafe fn get_physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        self.instance.get_physical_device_properties(physical_device)
    }

    unsafe fn get_physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        self.instance.get_physical_device_features(physical_device)
    }

    unsafe fn get_physical_device_memory_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceMemoryProperties {
        self.instance
            .get_physical_device_memory_properties(physical_device)
    }

    unsafe fn get_physical_device_queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.instance
            .get_physical_device_queue_family_properties(physical_device)
    }

    unsafe fn get_physical_device_format_properties(
        &self,
        physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> vk::FormatProperties {
        self.instance
            .get_physical_device_format_properties(physical_device, format)
    }

    unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> VkResult<Box<dyn DeviceBindings>> {
        let device = self
            .instance
            .create_device(physical_device, create_info, None)?;
        Ok(Box::new(device))
    }

    unsafe fn destroy_instance(&self) {
        if let Some((loader, messenger)) = &self.debug_utils {
            loader.destroy_debug_utils_messenger(*messenger, None);
        }
        self.instance.destroy_instance(None);
    }
}

// 一部だけ作成に成功したpipelineは破棄しておく
unsafe fn destroy_partial_pipelines(
    device: &ash::Device,
    pipelines: Vec<vk::Pipeline>,
    result: vk::Result,
) -> vk::Result {
    for pipeline in pipelines {
        if pipeline != vk::Pipeline::null() {
            device.destroy_pipeline(pipeline, None);
        }
    }
    result
}

impl DeviceBindings for ash::Device {
    fn handle(&self) -> vk::Device {
        ash::Device::handle(self)
    }

    unsafe fn destroy_device(&self) {
        ash::Device::destroy_device(self, None)
    }

    unsafe fn device_wait_idle(&self) -> VkResult<()> {
        ash::Device::device_wait_idle(self)
    }

    unsafe fn get_device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue {
        ash::Device::get_device_queue(self, queue_family_index, queue_index)
    }

    unsafe fn queue_submit(
        &self,
        queue: vk::Queue,
        submits: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> VkResult<()> {
        ash::Device::queue_submit(self, queue, submits, fence)
    }

    unsafe fn queue_wait_idle(&self, queue: vk::Queue) -> VkResult<()> {
        ash::Device::queue_wait_idle(self, queue)
    }

    unsafe fn create_buffer(&self, create_info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer> {
        ash::Device::create_buffer(self, create_info, None)
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        ash::Device::destroy_buffer(self, buffer, None)
    }

    unsafe fn get_buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        ash::Device::get_buffer_memory_requirements(self, buffer)
    }

    unsafe fn bind_buffer_memory(
        &self,
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        ash::Device::bind_buffer_memory(self, buffer, memory, offset)
    }

    unsafe fn create_image(&self, create_info: &vk::ImageCreateInfo) -> VkResult<vk::Image> {
        ash::Device::create_image(self, create_info, None)
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        ash::Device::destroy_image(self, image, None)
    }

    unsafe fn get_image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements {
        ash::Device::get_image_memory_requirements(self, image)
    }

    unsafe fn bind_image_memory(
        &self,
        image: vk::Image,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
    ) -> VkResult<()> {
        ash::Device::bind_image_memory(self, image, memory, offset)
    }

    unsafe fn create_image_view(
        &self,
        create_info: &vk::ImageViewCreateInfo,
    ) -> VkResult<vk::ImageView> {
        ash::Device::create_image_view(self, create_info, None)
    }

    unsafe fn destroy_image_view(&self, image_view: vk::ImageView) {
        ash::Device::destroy_image_view(self, image_view, None)
    }

    unsafe fn create_sampler(&self, create_info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler> {
        ash::Device::create_sampler(self, create_info, None)
    }

    unsafe fn destroy_sampler(&self, sampler: vk::Sampler) {
        ash::Device::destroy_sampler(self, sampler, None)
    }

    unsafe fn create_buffer_view(
        &self,
        create_info: &vk::BufferViewCreateInfo,
    ) -> VkResult<vk::BufferView> {
        ash::Device::create_buffer_view(self, create_info, None)
    }

    unsafe fn destroy_buffer_view(&self, buffer_view: vk::BufferView) {
        ash::Device::destroy_buffer_view(self, buffer_view, None)
    }

    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> VkResult<vk::DeviceMemory> {
        ash::Device::allocate_memory(self, allocate_info, None)
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        ash::Device::free_memory(self, memory, None)
    }

    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> VkResult<*mut c_void> {
        ash::Device::map_memory(self, memory, offset, size, vk::MemoryMapFlags::empty())
    }

    unsafe fn unmap_memory(&self, memory: vk::DeviceMemory) {
        ash::Device::unmap_memory(self, memory)
    }

    unsafe fn flush_mapped_memory_ranges(&self, ranges: &[vk::MappedMemoryRange]) -> VkResult<()> {
        ash::Device::flush_mapped_memory_ranges(self, ranges)
    }

    unsafe fn invalidate_mapped_memory_ranges(
        &self,
        ranges: &[vk::MappedMemoryRange],
    ) -> VkResult<()> {
        ash::Device::invalidate_mapped_memory_ranges(self, ranges)
    }

    unsafe fn create_fence(&self, create_info: &vk::FenceCreateInfo) -> VkResult<vk::Fence> {
        ash::Device::create_fence(self, create_info, None)
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        ash::Device::destroy_fence(self, fence, None)
    }

    unsafe fn wait_for_fences(
        &self,
        fences: &[vk::Fence],
        wait_all: bool,
        timeout: u64,
    ) -> VkResult<()> {
        ash::Device::wait_for_fences(self, fences, wait_all, timeout)
    }

    unsafe fn reset_fences(&self, fences: &[vk::Fence]) -> VkResult<()> {
        ash::Device::reset_fences(self, fences)
    }

    unsafe fn get_fence_status(&self, fence: vk::Fence) -> VkResult<bool> {
        ash::Device::get_fence_status(self, fence)
    }

    unsafe fn create_semaphore(
        &self,
        create_info: &vk::SemaphoreCreateInfo,
    ) -> VkResult<vk::Semaphore> {
        ash::Device::create_semaphore(self, create_info, None)
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        ash::Device::destroy_semaphore(self, semaphore, None)
    }

    unsafe fn create_event(&self, create_info: &vk::EventCreateInfo) -> VkResult<vk::Event> {
        ash::Device::create_event(self, create_info, None)
    }

    unsafe fn destroy_event(&self, event: vk::Event) {
        ash::Device::destroy_event(self, event, None)
    }

    unsafe fn get_event_status(&self, event: vk::Event) -> VkResult<bool> {
        ash::Device::get_event_status(self, event)
    }

    unsafe fn set_event(&self, event: vk::Event) -> VkResult<()> {
        ash::Device::set_event(self, event)
    }

    unsafe fn reset_event(&self, event: vk::Event) -> VkResult<()> {
        ash::Device::reset_event(self, event)
    }

    unsafe fn create_query_pool(
        &self,
        create_info: &vk::QueryPoolCreateInfo,
    ) -> VkResult<vk::QueryPool> {
        ash::Device::create_query_pool(self, create_info, None)
    }

    unsafe fn destroy_query_pool(&self, query_pool: vk::QueryPool) {
        ash::Device::destroy_query_pool(self, query_pool, None)
    }

    unsafe fn create_command_pool(
        &self,
        create_info: &vk::CommandPoolCreateInfo,
    ) -> VkResult<vk::CommandPool> {
        ash::Device::create_command_pool(self, create_info, None)
    }

    unsafe fn destroy_command_pool(&self, command_pool: vk::CommandPool) {
        ash::Device::destroy_command_pool(self, command_pool, None)
    }

    unsafe fn reset_command_pool(
        &self,
        command_pool: vk::CommandPool,
        flags: vk::CommandPoolResetFlags,
    ) -> VkResult<()> {
        ash::Device::reset_command_pool(self, command_pool, flags)
    }

    unsafe fn allocate_command_buffers(
        &self,
        allocate_info: &vk::CommandBufferAllocateInfo,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        ash::Device::allocate_command_buffers(self, allocate_info)
    }

    unsafe fn free_command_buffers(
        &self,
        command_pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    ) {
        ash::Device::free_command_buffers(self, command_pool, command_buffers)
    }

    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        begin_info: &vk::CommandBufferBeginInfo,
    ) -> VkResult<()> {
        ash::Device::begin_command_buffer(self, command_buffer, begin_info)
    }

    unsafe fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VkResult<()> {
        ash::Device::end_command_buffer(self, command_buffer)
    }

    unsafe fn reset_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        flags: vk::CommandBufferResetFlags,
    ) -> VkResult<()> {
        ash::Device::reset_command_buffer(self, command_buffer, flags)
    }

    unsafe fn create_descriptor_pool(
        &self,
        create_info: &vk::DescriptorPoolCreateInfo,
    ) -> VkResult<vk::DescriptorPool> {
        ash::Device::create_descriptor_pool(self, create_info, None)
    }

    unsafe fn destroy_descriptor_pool(&self, descriptor_pool: vk::DescriptorPool) {
        ash::Device::destroy_descriptor_pool(self, descriptor_pool, None)
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        create_info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> VkResult<vk::DescriptorSetLayout> {
        ash::Device::create_descriptor_set_layout(self, create_info, None)
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        ash::Device::destroy_descriptor_set_layout(self, layout, None)
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        allocate_info: &vk::DescriptorSetAllocateInfo,
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        ash::Device::allocate_descriptor_sets(self, allocate_info)
    }

    unsafe fn free_descriptor_sets(
        &self,
        descriptor_pool: vk::DescriptorPool,
        descriptor_sets: &[vk::DescriptorSet],
    ) -> VkResult<()> {
        ash::Device::free_descriptor_sets(self, descriptor_pool, descriptor_sets)
    }

    unsafe fn update_descriptor_sets(
        &self,
        writes: &[vk::WriteDescriptorSet],
        copies: &[vk::CopyDescriptorSet],
    ) {
        ash::Device::update_descriptor_sets(self, writes, copies)
    }

    unsafe fn create_render_pass(
        &self,
        create_info: &vk::RenderPassCreateInfo,
    ) -> VkResult<vk::RenderPass> {
        ash::Device::create_render_pass(self, create_info, None)
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        ash::Device::destroy_render_pass(self, render_pass, None)
    }

    unsafe fn create_framebuffer(
        &self,
        create_info: &vk::FramebufferCreateInfo,
    ) -> VkResult<vk::Framebuffer> {
        ash::Device::create_framebuffer(self, create_info, None)
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        ash::Device::destroy_framebuffer(self, framebuffer, None)
    }

    unsafe fn create_shader_module(
        &self,
        create_info: &vk::ShaderModuleCreateInfo,
    ) -> VkResult<vk::ShaderModule> {
        ash::Device::create_shader_module(self, create_info, None)
    }

    unsafe fn destroy_shader_module(&self, shader_module: vk::ShaderModule) {
        ash::Device::destroy_shader_module(self, shader_module, None)
    }

    unsafe fn create_pipeline_layout(
        &self,
        create_info: &vk::PipelineLayoutCreateInfo,
    ) -> VkResult<vk::PipelineLayout> {
        ash::Device::create_pipeline_layout(self, create_info, None)
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        ash::Device::destroy_pipeline_layout(self, layout, None)
    }

    unsafe fn create_pipeline_cache(
        &self,
        create_info: &vk::PipelineCacheCreateInfo,
    ) -> VkResult<vk::PipelineCache> {
        ash::Device::create_pipeline_cache(self, create_info, None)
    }

    unsafe fn destroy_pipeline_cache(&self, pipeline_cache: vk::PipelineCache) {
        ash::Device::destroy_pipeline_cache(self, pipeline_cache, None)
    }

    unsafe fn get_pipeline_cache_data(
        &self,
        pipeline_cache: vk::PipelineCache,
    ) -> VkResult<Vec<u8>> {
        ash::Device::get_pipeline_cache_data(self, pipeline_cache)
    }

    unsafe fn create_graphics_pipelines(
        &self,
        pipeline_cache: vk::PipelineCache,
        create_infos: &[vk::GraphicsPipelineCreateInfo],
    ) -> VkResult<Vec<vk::Pipeline>> {
        ash::Device::create_graphics_pipelines(self, pipeline_cache, create_infos, None)
            .map_err(|(pipelines, result)| destroy_partial_pipelines(self, pipelines, result))
    }

    unsafe fn create_compute_pipelines(
        &self,
        pipeline_cache: vk::PipelineCache,
        create_infos: &[vk::ComputePipelineCreateInfo],
    ) -> VkResult<Vec<vk::Pipeline>> {
        ash::Device::create_compute_pipelines(self, pipeline_cache, create_infos, None)
            .map_err(|(pipelines, result)| destroy_partial_pipelines(self, pipelines, result))
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        ash::Device::destroy_pipeline(self, pipeline, None)
    }
}
