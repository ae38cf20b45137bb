//! 参照カウンタで管理されたVulkanの各Objectと、そのHandleの型を定義する。
//!
//! Instance、PhysicalDevice、Deviceは自分自身への弱参照を子に配るので
//! `EmbeddedRefCounted`で管理し、それ以外のObjectは`RefCounted`で管理する。

mod instance;
pub use instance::{Instance, InstanceCreateInfo, InstanceHandle, InstanceWeakHandle};
mod physical_device;
pub use physical_device::{
    DeviceCreateInfo, DeviceQueueCreateInfo, PhysicalDevice, PhysicalDeviceHandle,
    PhysicalDeviceWeakHandle,
};
mod device;
pub use device::{Device, DeviceHandle, DeviceWeakHandle};
mod queue;
pub use queue::{Queue, QueueHandle, SubmitInfo};
mod device_memory;
pub use device_memory::{DeviceMemory, DeviceMemoryHandle};
mod buffer;
pub use buffer::{Buffer, BufferHandle};
mod buffer_view;
pub use buffer_view::{BufferView, BufferViewHandle};
mod image;
pub use image::{Image, ImageHandle};
mod image_view;
pub use image_view::{ImageView, ImageViewHandle};
mod sampler;
pub use sampler::{Sampler, SamplerHandle};
mod fence;
pub use fence::{Fence, FenceHandle};
mod semaphore;
pub use semaphore::{Semaphore, SemaphoreHandle};
mod event;
pub use event::{Event, EventHandle};
mod query_pool;
pub use query_pool::{QueryPool, QueryPoolHandle};
mod command_pool;
pub use command_pool::{CommandPool, CommandPoolHandle};
mod command_buffer;
pub use command_buffer::{CommandBuffer, CommandBufferHandle};
mod descriptor_pool;
pub use descriptor_pool::{DescriptorPool, DescriptorPoolHandle};
mod descriptor_set_layout;
pub use descriptor_set_layout::{DescriptorBinding, DescriptorSetLayout, DescriptorSetLayoutHandle};
mod descriptor_set;
pub use descriptor_set::{DescriptorSet, DescriptorSetHandle};
mod render_pass;
pub use render_pass::{RenderPass, RenderPassHandle};
mod framebuffer;
pub use framebuffer::{Framebuffer, FramebufferHandle};
mod shader_module;
pub use shader_module::{ShaderModule, ShaderModuleHandle};
mod pipeline_layout;
pub use pipeline_layout::{PipelineLayout, PipelineLayoutHandle};
mod pipeline_cache;
pub use pipeline_cache::{PipelineCache, PipelineCacheHandle};
mod compute_pipeline;
pub use compute_pipeline::{ComputePipeline, ComputePipelineHandle};
mod graphics_pipeline;
pub use graphics_pipeline::{GraphicsPipeline, GraphicsPipelineHandle};
