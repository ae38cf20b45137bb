#![allow(dead_code)]

use ash::{prelude::VkResult, vk, vk::Handle};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    ffi::c_void,
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use vkrc::{
    DeviceBindings, DeviceCreateInfo, DeviceHandle, DeviceQueueCreateInfo, Instance,
    InstanceBindings, InstanceCreateInfo, InstanceHandle,
};

pub const GRAPHICS_FAMILY: u32 = 0;
pub const TRANSFER_FAMILY: u32 = 1;

pub const HOST_COHERENT_MEMORY: u32 = 0;
pub const DEVICE_LOCAL_MEMORY: u32 = 1;
pub const HOST_CACHED_MEMORY: u32 = 2;

pub const FAKE_PIPELINE_CACHE_DATA: &[u8] = b"fake pipeline cache";

/// フェイクのディスパッチテーブルに対する呼び出しを記録する
#[derive(Default)]
pub struct Recorder {
    next_handle: AtomicU64,
    calls: Mutex<Vec<&'static str>>,
    live: Mutex<HashSet<(&'static str, u64)>>,
    destroyed: Mutex<Vec<(&'static str, u64)>>,
    failing: Mutex<HashSet<&'static str>>,
    fences: Mutex<HashMap<u64, bool>>,
    events: Mutex<HashMap<u64, bool>>,
    memory: Mutex<HashMap<u64, Box<[u8]>>>,
}
impl Recorder {
    fn call(&self, name: &'static str) -> VkResult<()> {
        self.calls.lock().push(name);
        if self.failing.lock().contains(name) {
            Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
        } else {
            Ok(())
        }
    }

    fn create<H: Handle>(&self, kind: &'static str, call: &'static str) -> VkResult<H> {
        self.call(call)?;
        let raw = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.live.lock().insert((kind, raw));
        Ok(H::from_raw(raw))
    }

    fn destroy<H: Handle>(&self, kind: &'static str, call: &'static str, handle: H) {
        let _ = self.call(call);
        let raw = handle.as_raw();
        assert!(
            self.live.lock().remove(&(kind, raw)),
            "{call} called for a {kind} that is not alive"
        );
        self.destroyed.lock().push((kind, raw));
    }

    /// `call`の呼び出しを失敗させる
    pub fn fail(&self, call: &'static str) {
        self.failing.lock().insert(call);
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn live_count(&self, kind: &str) -> usize {
        self.live.lock().iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_live<H: Handle>(&self, kind: &'static str, handle: H) -> bool {
        self.live.lock().contains(&(kind, handle.as_raw()))
    }

    pub fn destroyed_count(&self, kind: &str) -> usize {
        self.destroyed
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// 破棄された順番
    pub fn destroy_order(&self) -> Vec<&'static str> {
        self.destroyed.lock().iter().map(|(k, _)| *k).collect()
    }

    pub fn signal_fence(&self, fence: vk::Fence) {
        self.fences.lock().insert(fence.as_raw(), true);
    }

    pub fn memory_contents(&self, memory: vk::DeviceMemory) -> Vec<u8> {
        self.memory
            .lock()
            .get(&memory.as_raw())
            .map(|m| m.to_vec())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct FakePhysicalDevice {
    pub name: &'static str,
    pub device_type: vk::PhysicalDeviceType,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
}

fn queue_family(flags: vk::QueueFlags, queue_count: u32) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count,
        ..Default::default()
    }
}

pub fn integrated_gpu() -> FakePhysicalDevice {
    FakePhysicalDevice {
        name: "Fake Integrated GPU",
        device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
        queue_families: vec![queue_family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            1,
        )],
    }
}

pub fn discrete_gpu() -> FakePhysicalDevice {
    FakePhysicalDevice {
        name: "Fake Discrete GPU",
        device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
        queue_families: vec![
            queue_family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                2,
            ),
            queue_family(vk::QueueFlags::TRANSFER, 1),
        ],
    }
}

pub struct FakeInstance {
    recorder: Arc<Recorder>,
    handle: vk::Instance,
    physical_devices: Vec<(vk::PhysicalDevice, FakePhysicalDevice)>,
}
impl FakeInstance {
    pub fn new(recorder: Arc<Recorder>, physical_devices: Vec<FakePhysicalDevice>) -> Self {
        let handle = recorder
            .create("instance", "vkCreateInstance")
            .expect("instance creation does not fail");
        let physical_devices = physical_devices
            .into_iter()
            .enumerate()
            .map(|(i, pd)| (vk::PhysicalDevice::from_raw(1000 + i as u64), pd))
            .collect();
        Self {
            recorder,
            handle,
            physical_devices,
        }
    }

    fn physical_device(&self, handle: vk::PhysicalDevice) -> &FakePhysicalDevice {
        &self
            .physical_devices
            .iter()
            .find(|(h, _)| *h == handle)
            .expect("unknown physical device")
            .1
    }
}

impl InstanceBindings for FakeInstance {
    fn handle(&self) -> vk::Instance {
        self.handle
    }

    unsafe fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        self.recorder.call("vkEnumeratePhysicalDevices")?;
        Ok(self.physical_devices.iter().map(|(h, _)| *h).collect())
    }

    unsafe fn get_physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        let fake = self.physical_device(physical_device);
        let mut properties = vk::PhysicalDeviceProperties {
            device_type: fake.device_type,
            api_version: vk::API_VERSION_1_2,
            ..Default::default()
        };
        for (dst, src) in properties.device_name.iter_mut().zip(fake.name.bytes()) {
            *dst = src as _;
        }
        properties
    }

    unsafe fn get_physical_device_features(
        &self,
        _physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default()
    }

    unsafe fn get_physical_device_memory_properties(
        &self,
        _physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceMemoryProperties {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 3,
            memory_heap_count: 1,
            ..Default::default()
        };
        properties.memory_types[HOST_COHERENT_MEMORY as usize].property_flags =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        properties.memory_types[DEVICE_LOCAL_MEMORY as usize].property_flags =
            vk::MemoryPropertyFlags::DEVICE_LOCAL;
        properties.memory_types[HOST_CACHED_MEMORY as usize].property_flags =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_CACHED;
        properties.memory_heaps[0].size = 1 << 30;
        properties
    }

    unsafe fn get_physical_device_queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.physical_device(physical_device).queue_families.clone()
    }

    unsafe fn get_physical_device_format_properties(
        &self,
        _physical_device: vk::PhysicalDevice,
        format: vk::Format,
    ) -> vk::FormatProperties {
        if format == vk::Format::R8G8B8A8_UNORM {
            vk::FormatProperties {
                optimal_tiling_features: vk::FormatFeatureFlags::SAMPLED_IMAGE
                    | vk::FormatFeatureFlags::COLOR_ATTACHMENT,
                ..Default::default()
            }
        } else {
            vk::FormatProperties::default()
        }
    }

    unsafe fn create_device(
        &self,
        _physical_device: vk::PhysicalDevice,
        _create_info: &vk::DeviceCreateInfo,
    ) -> VkResult<Box<dyn DeviceBindings>> {
        let handle = self.recorder.create("device", "vkCreateDevice")?;
        Ok(Box::new(FakeDevice {
            recorder: self.recorder.clone(),
            handle,
        }))
    }

    unsafe fn destroy_instance(&self) {
        self.recorder
            .destroy("instance", "vkDestroyInstance", self.handle)
    }
}

pub struct FakeDevice {
    recorder: Arc<Recorder>,
    handle: vk::Device,
}

impl DeviceBindings for FakeDevice {
    fn handle(&self) -> vk::Device {
        self.handle
    }

    unsafe fn destroy_device(&self) {
        self.recorder
            .destroy("device", "vkDestroyDevice", self.handle)
    }

    unsafe fn device_wait_idle(&self) -> VkResult<()> {
        self.recorder.call("vkDeviceWaitIdle")
    }

    unsafe fn get_device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue {
        vk::Queue::from_raw(((queue_family_index as u64) << 32) | (queue_index as u64 + 1))
    }

    unsafe fn queue_submit(
        &self,
        _queue: vk::Queue,
        _submits: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> VkResult<()> {
        self.recorder.call("vkQueueSubmit")?;
        if fence != vk::Fence::null() {
            self.recorder.signal_fence(fence);
        }
        Ok(())
    }

    unsafe fn queue_wait_idle(&self, _queue: vk::Queue) -> VkResult<()> {
        self.recorder.call("vkQueueWaitIdle")
    }

    unsafe fn create_buffer(&self, _create_info: &vk::BufferCreateInfo) -> VkResult<vk::Buffer> {
        self.recorder.create("buffer", "vkCreateBuffer")
    }

    unsafe fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.recorder.destroy("buffer", "vkDestroyBuffer", buffer)
    }

    unsafe fn get_buffer_memory_requirements(&self, _buffer: vk::Buffer) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: 256,
            alignment: 16,
            memory_type_bits: 0b111,
        }
    }

    unsafe fn bind_buffer_memory(
        &self,
        _buffer: vk::Buffer,
        _memory: vk::DeviceMemory,
        _offset: vk::DeviceSize,
    ) -> VkResult<()> {
        self.recorder.call("vkBindBufferMemory")
    }

    unsafe fn create_image(&self, _create_info: &vk::ImageCreateInfo) -> VkResult<vk::Image> {
        self.recorder.create("image", "vkCreateImage")
    }

    unsafe fn destroy_image(&self, image: vk::Image) {
        self.recorder.destroy("image", "vkDestroyImage", image)
    }

    unsafe fn get_image_memory_requirements(&self, _image: vk::Image) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: 4096,
            alignment: 256,
            memory_type_bits: 0b010,
        }
    }

    unsafe fn bind_image_memory(
        &self,
        _image: vk::Image,
        _memory: vk::DeviceMemory,
        _offset: vk::DeviceSize,
    ) -> VkResult<()> {
        self.recorder.call("vkBindImageMemory")
    }

    unsafe fn create_image_view(
        &self,
        create_info: &vk::ImageViewCreateInfo,
    ) -> VkResult<vk::ImageView> {
        assert!(
            self.recorder.is_live("image", create_info.image),
            "image view created for a dead image"
        );
        self.recorder.create("image_view", "vkCreateImageView")
    }

    unsafe fn destroy_image_view(&self, image_view: vk::ImageView) {
        self.recorder
            .destroy("image_view", "vkDestroyImageView", image_view)
    }

    unsafe fn create_sampler(&self, _create_info: &vk::SamplerCreateInfo) -> VkResult<vk::Sampler> {
        self.recorder.create("sampler", "vkCreateSampler")
    }

    unsafe fn destroy_sampler(&self, sampler: vk::Sampler) {
        self.recorder.destroy("sampler", "vkDestroySampler", sampler)
    }

    unsafe fn create_buffer_view(
        &self,
        create_info: &vk::BufferViewCreateInfo,
    ) -> VkResult<vk::BufferView> {
        assert!(
            self.recorder.is_live("buffer", create_info.buffer),
            "buffer view created for a dead buffer"
        );
        self.recorder.create("buffer_view", "vkCreateBufferView")
    }

    unsafe fn destroy_buffer_view(&self, buffer_view: vk::BufferView) {
        self.recorder
            .destroy("buffer_view", "vkDestroyBufferView", buffer_view)
    }

    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> VkResult<vk::DeviceMemory> {
        let memory: vk::DeviceMemory = self.recorder.create("memory", "vkAllocateMemory")?;
        self.recorder.memory.lock().insert(
            memory.as_raw(),
            vec![0; allocate_info.allocation_size as usize].into_boxed_slice(),
        );
        Ok(memory)
    }

    unsafe fn free_memory(&self, memory: vk::DeviceMemory) {
        self.recorder.memory.lock().remove(&memory.as_raw());
        self.recorder.destroy("memory", "vkFreeMemory", memory)
    }

    unsafe fn map_memory(
        &self,
        memory: vk::DeviceMemory,
        offset: vk::DeviceSize,
        _size: vk::DeviceSize,
    ) -> VkResult<*mut c_void> {
        self.recorder.call("vkMapMemory")?;
        let mut memories = self.recorder.memory.lock();
        let bytes = memories
            .get_mut(&memory.as_raw())
            .ok_or(vk::Result::ERROR_MEMORY_MAP_FAILED)?;
        Ok(bytes.as_mut_ptr().add(offset as usize).cast())
    }

    unsafe fn unmap_memory(&self, _memory: vk::DeviceMemory) {
        let _ = self.recorder.call("vkUnmapMemory");
    }

    unsafe fn flush_mapped_memory_ranges(&self, _ranges: &[vk::MappedMemoryRange]) -> VkResult<()> {
        self.recorder.call("vkFlushMappedMemoryRanges")
    }

    unsafe fn invalidate_mapped_memory_ranges(
        &self,
        _ranges: &[vk::MappedMemoryRange],
    ) -> VkResult<()> {
        self.recorder.call("vkInvalidateMappedMemoryRanges")
    }

    unsafe fn create_fence(&self, create_info: &vk::FenceCreateInfo) -> VkResult<vk::Fence> {
        let fence: vk::Fence = self.recorder.create("fence", "vkCreateFence")?;
        let signaled = create_info.flags.contains(vk::FenceCreateFlags::SIGNALED);
        self.recorder.fences.lock().insert(fence.as_raw(), signaled);
        Ok(fence)
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        self.recorder.fences.lock().remove(&fence.as_raw());
        self.recorder.destroy("fence", "vkDestroyFence", fence)
    }

    unsafe fn wait_for_fences(
        &self,
        fences: &[vk::Fence],
        wait_all: bool,
        _timeout: u64,
    ) -> VkResult<()> {
        self.recorder.call("vkWaitForFences")?;
        let states = self.recorder.fences.lock();
        let signaled = |f: &vk::Fence| states.get(&f.as_raw()).copied().unwrap_or(false);
        let done = if wait_all {
            fences.iter().all(signaled)
        } else {
            fences.iter().any(signaled)
        };
        if done {
            Ok(())
        } else {
            Err(vk::Result::TIMEOUT)
        }
    }

    unsafe fn reset_fences(&self, fences: &[vk::Fence]) -> VkResult<()> {
        self.recorder.call("vkResetFences")?;
        let mut states = self.recorder.fences.lock();
        for fence in fences {
            states.insert(fence.as_raw(), false);
        }
        Ok(())
    }

    unsafe fn get_fence_status(&self, fence: vk::Fence) -> VkResult<bool> {
        self.recorder.call("vkGetFenceStatus")?;
        Ok(self
            .recorder
            .fences
            .lock()
            .get(&fence.as_raw())
            .copied()
            .unwrap_or(false))
    }

    unsafe fn create_semaphore(
        &self,
        _create_info: &vk::SemaphoreCreateInfo,
    ) -> VkResult<vk::Semaphore> {
        self.recorder.create("semaphore", "vkCreateSemaphore")
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.recorder
            .destroy("semaphore", "vkDestroySemaphore", semaphore)
    }

    unsafe fn create_event(&self, _create_info: &vk::EventCreateInfo) -> VkResult<vk::Event> {
        let event: vk::Event = self.recorder.create("event", "vkCreateEvent")?;
        self.recorder.events.lock().insert(event.as_raw(), false);
        Ok(event)
    }

    unsafe fn destroy_event(&self, event: vk::Event) {
        self.recorder.events.lock().remove(&event.as_raw());
        self.recorder.destroy("event", "vkDestroyEvent", event)
    }

    unsafe fn get_event_status(&self, event: vk::Event) -> VkResult<bool> {
        self.recorder.call("vkGetEventStatus")?;
        Ok(self
            .recorder
            .events
            .lock()
            .get(&event.as_raw())
            .copied()
            .unwrap_or(false))
    }

    unsafe fn set_event(&self, event: vk::Event) -> VkResult<()> {
        self.recorder.call("vkSetEvent")?;
        self.recorder.events.lock().insert(event.as_raw(), true);
        Ok(())
    }

    unsafe fn reset_event(&self, event: vk::Event) -> VkResult<()> {
        self.recorder.call("vkResetEvent")?;
        self.recorder.events.lock().insert(event.as_raw(), false);
        Ok(())
    }

    unsafe fn create_query_pool(
        &self,
        _create_info: &vk::QueryPoolCreateInfo,
    ) -> VkResult<vk::QueryPool> {
        self.recorder.create("query_pool", "vkCreateQueryPool")
    }

    unsafe fn destroy_query_pool(&self, query_pool: vk::QueryPool) {
        self.recorder
            .destroy("query_pool", "vkDestroyQueryPool", query_pool)
    }

    unsafe fn create_command_pool(
        &self,
        _create_info: &vk::CommandPoolCreateInfo,
    ) -> VkResult<vk::CommandPool> {
        self.recorder.create("command_pool", "vkCreateCommandPool")
    }

    unsafe fn destroy_command_pool(&self, command_pool: vk::CommandPool) {
        self.recorder
            .destroy("command_pool", "vkDestroyCommandPool", command_pool)
    }

    unsafe fn reset_command_pool(
        &self,
        _command_pool: vk::CommandPool,
        _flags: vk::CommandPoolResetFlags,
    ) -> VkResult<()> {
        self.recorder.call("vkResetCommandPool")
    }

    unsafe fn allocate_command_buffers(
        &self,
        allocate_info: &vk::CommandBufferAllocateInfo,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        (0..allocate_info.command_buffer_count)
            .map(|_| {
                self.recorder
                    .create("command_buffer", "vkAllocateCommandBuffers")
            })
            .collect()
    }

    unsafe fn free_command_buffers(
        &self,
        _command_pool: vk::CommandPool,
        command_buffers: &[vk::CommandBuffer],
    ) {
        for command_buffer in command_buffers {
            self.recorder
                .destroy("command_buffer", "vkFreeCommandBuffers", *command_buffer)
        }
    }

    unsafe fn begin_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
        _begin_info: &vk::CommandBufferBeginInfo,
    ) -> VkResult<()> {
        self.recorder.call("vkBeginCommandBuffer")
    }

    unsafe fn end_command_buffer(&self, _command_buffer: vk::CommandBuffer) -> VkResult<()> {
        self.recorder.call("vkEndCommandBuffer")
    }

    unsafe fn reset_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
        _flags: vk::CommandBufferResetFlags,
    ) -> VkResult<()> {
        self.recorder.call("vkResetCommandBuffer")
    }

    unsafe fn create_descriptor_pool(
        &self,
        _create_info: &vk::DescriptorPoolCreateInfo,
    ) -> VkResult<vk::DescriptorPool> {
        self.recorder
            .create("descriptor_pool", "vkCreateDescriptorPool")
    }

    unsafe fn destroy_descriptor_pool(&self, descriptor_pool: vk::DescriptorPool) {
        self.recorder
            .destroy("descriptor_pool", "vkDestroyDescriptorPool", descriptor_pool)
    }

    unsafe fn create_descriptor_set_layout(
        &self,
        _create_info: &vk::DescriptorSetLayoutCreateInfo,
    ) -> VkResult<vk::DescriptorSetLayout> {
        self.recorder
            .create("descriptor_set_layout", "vkCreateDescriptorSetLayout")
    }

    unsafe fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.recorder.destroy(
            "descriptor_set_layout",
            "vkDestroyDescriptorSetLayout",
            layout,
        )
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        allocate_info: &vk::DescriptorSetAllocateInfo,
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        (0..allocate_info.descriptor_set_count)
            .map(|_| {
                self.recorder
                    .create("descriptor_set", "vkAllocateDescriptorSets")
            })
            .collect()
    }

    unsafe fn free_descriptor_sets(
        &self,
        _descriptor_pool: vk::DescriptorPool,
        descriptor_sets: &[vk::DescriptorSet],
    ) -> VkResult<()> {
        for descriptor_set in descriptor_sets {
            self.recorder
                .destroy("descriptor_set", "vkFreeDescriptorSets", *descriptor_set)
        }
        Ok(())
    }

    unsafe fn update_descriptor_sets(
        &self,
        writes: &[vk::WriteDescriptorSet],
        _copies: &[vk::CopyDescriptorSet],
    ) {
        for write in writes {
            assert!(
                self.recorder.is_live("descriptor_set", write.dst_set),
                "descriptor set written after it was freed"
            );
        }
        let _ = self.recorder.call("vkUpdateDescriptorSets");
    }

    unsafe fn create_render_pass(
        &self,
        _create_info: &vk::RenderPassCreateInfo,
    ) -> VkResult<vk::RenderPass> {
        self.recorder.create("render_pass", "vkCreateRenderPass")
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.recorder
            .destroy("render_pass", "vkDestroyRenderPass", render_pass)
    }

    unsafe fn create_framebuffer(
        &self,
        _create_info: &vk::FramebufferCreateInfo,
    ) -> VkResult<vk::Framebuffer> {
        self.recorder.create("framebuffer", "vkCreateFramebuffer")
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.recorder
            .destroy("framebuffer", "vkDestroyFramebuffer", framebuffer)
    }

    unsafe fn create_shader_module(
        &self,
        _create_info: &vk::ShaderModuleCreateInfo,
    ) -> VkResult<vk::ShaderModule> {
        self.recorder.create("shader_module", "vkCreateShaderModule")
    }

    unsafe fn destroy_shader_module(&self, shader_module: vk::ShaderModule) {
        self.recorder
            .destroy("shader_module", "vkDestroyShaderModule", shader_module)
    }

    unsafe fn create_pipeline_layout(
        &self,
        _create_info: &vk::PipelineLayoutCreateInfo,
    ) -> VkResult<vk::PipelineLayout> {
        self.recorder
            .create("pipeline_layout", "vkCreatePipelineLayout")
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.recorder
            .destroy("pipeline_layout", "vkDestroyPipelineLayout", layout)
    }

    unsafe fn create_pipeline_cache(
        &self,
        _create_info: &vk::PipelineCacheCreateInfo,
    ) -> VkResult<vk::PipelineCache> {
        self.recorder
            .create("pipeline_cache", "vkCreatePipelineCache")
    }

    unsafe fn destroy_pipeline_cache(&self, pipeline_cache: vk::PipelineCache) {
        self.recorder
            .destroy("pipeline_cache", "vkDestroyPipelineCache", pipeline_cache)
    }

    unsafe fn get_pipeline_cache_data(
        &self,
        _pipeline_cache: vk::PipelineCache,
    ) -> VkResult<Vec<u8>> {
        self.recorder.call("vkGetPipelineCacheData")?;
        Ok(FAKE_PIPELINE_CACHE_DATA.to_vec())
    }

    unsafe fn create_graphics_pipelines(
        &self,
        _pipeline_cache: vk::PipelineCache,
        create_infos: &[vk::GraphicsPipelineCreateInfo],
    ) -> VkResult<Vec<vk::Pipeline>> {
        create_infos
            .iter()
            .map(|info| {
                assert!(
                    self.recorder.is_live("render_pass", info.render_pass),
                    "graphics pipeline created for a dead render pass"
                );
                self.recorder.create("pipeline", "vkCreateGraphicsPipelines")
            })
            .collect()
    }

    unsafe fn create_compute_pipelines(
        &self,
        _pipeline_cache: vk::PipelineCache,
        create_infos: &[vk::ComputePipelineCreateInfo],
    ) -> VkResult<Vec<vk::Pipeline>> {
        create_infos
            .iter()
            .map(|_| self.recorder.create("pipeline", "vkCreateComputePipelines"))
            .collect()
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.recorder
            .destroy("pipeline", "vkDestroyPipeline", pipeline)
    }
}

pub fn fake_instance_with(physical_devices: Vec<FakePhysicalDevice>) -> (InstanceHandle, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let bindings = FakeInstance::new(recorder.clone(), physical_devices);
    let instance = Instance::with_bindings(Box::new(bindings), InstanceCreateInfo::default())
        .expect("fake instance creation does not fail");
    (instance, recorder)
}

/// integrated GPU、discrete GPUの順に並んだフェイクのInstance
pub fn fake_instance() -> (InstanceHandle, Arc<Recorder>) {
    fake_instance_with(vec![integrated_gpu(), discrete_gpu()])
}

/// discrete GPUのgraphics queueを一つとtransfer queueを一つ持つDevice
pub fn fake_device() -> (InstanceHandle, DeviceHandle, Arc<Recorder>) {
    let (instance, recorder) = fake_instance();
    let physical_device = instance.physical_device(1).expect("discrete gpu");
    let device = physical_device
        .create_device(&DeviceCreateInfo {
            queue_create_infos: vec![
                DeviceQueueCreateInfo::new(GRAPHICS_FAMILY, 2),
                DeviceQueueCreateInfo::new(TRANSFER_FAMILY, 1),
            ],
            ..Default::default()
        })
        .expect("fake device creation does not fail");
    (instance, device, recorder)
}

/// tracingの出力を文字列として受け取る
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);
impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}
impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `f`の実行中に出たログを集める
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture.contents())
}
