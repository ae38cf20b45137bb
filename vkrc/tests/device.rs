mod common;

use ash::vk;
use common::*;
use std::ffi::CStr;
use vkrc::{DeviceCreateInfo, DeviceQueueCreateInfo, Error, SubmitInfo};

fn expect_validation_failed<T: std::fmt::Debug>(result: vkrc::Result<T>) -> String {
    match result {
        Err(Error::ValidationFailed(message)) => message,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

fn create_device_with(queues: Vec<DeviceQueueCreateInfo>) -> vkrc::Result<vkrc::DeviceHandle> {
    let (instance, _recorder) = fake_instance();
    let physical_device = instance.physical_device(1).unwrap();
    physical_device.create_device(&DeviceCreateInfo {
        queue_create_infos: queues,
        ..Default::default()
    })
}

#[test]
fn create_device_requires_a_queue() {
    let message = expect_validation_failed(create_device_with(vec![]));
    assert!(message.contains("At least one queue"));
}

#[test]
fn create_device_rejects_unknown_queue_family() {
    let message = expect_validation_failed(create_device_with(vec![DeviceQueueCreateInfo::new(
        5, 1,
    )]));
    assert!(message.contains("Queue family 5 does not exist"));
}

#[test]
fn create_device_rejects_duplicated_queue_family() {
    let message = expect_validation_failed(create_device_with(vec![
        DeviceQueueCreateInfo::new(GRAPHICS_FAMILY, 1),
        DeviceQueueCreateInfo::new(GRAPHICS_FAMILY, 1),
    ]));
    assert!(message.contains("requested more than once"));
}

#[test]
fn create_device_rejects_too_many_queues() {
    expect_validation_failed(create_device_with(vec![DeviceQueueCreateInfo::new(
        GRAPHICS_FAMILY,
        3,
    )]));
    expect_validation_failed(create_device_with(vec![DeviceQueueCreateInfo::new(
        GRAPHICS_FAMILY,
        0,
    )]));
}

#[test]
fn create_device_rejects_invalid_priority() {
    let message = expect_validation_failed(create_device_with(vec![DeviceQueueCreateInfo {
        queue_family_index: GRAPHICS_FAMILY,
        queue_priorities: vec![1.5],
    }]));
    assert!(message.contains("outside of [0, 1]"));
}

#[test]
fn create_device_validates_before_calling_vulkan() {
    let (instance, recorder) = fake_instance();
    let physical_device = instance.physical_device(1).unwrap();
    let result = physical_device.create_device(&DeviceCreateInfo::default());
    assert!(result.is_err());
    assert_eq!(recorder.call_count("vkCreateDevice"), 0);
}

#[test]
fn create_device_failure_is_reported() {
    let (instance, recorder) = fake_instance();
    recorder.fail("vkCreateDevice");
    let physical_device = instance.physical_device(1).unwrap();
    let result = physical_device.create_device(&DeviceCreateInfo {
        queue_create_infos: vec![DeviceQueueCreateInfo::new(GRAPHICS_FAMILY, 1)],
        ..Default::default()
    });
    assert_eq!(
        result.unwrap_err(),
        Error::Vulkan {
            call: "vkCreateDevice",
            result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
        }
    );
    assert_eq!(physical_device.live_device_count(), 0);
}

#[test]
fn device_extensions_are_recorded() {
    let (instance, _recorder) = fake_instance();
    let physical_device = instance.physical_device(1).unwrap();
    let swapchain = CStr::from_bytes_with_nul(b"VK_KHR_swapchain\0").unwrap();
    let device = physical_device
        .create_device(&DeviceCreateInfo {
            queue_create_infos: vec![DeviceQueueCreateInfo::new(GRAPHICS_FAMILY, 1)],
            enabled_extensions: vec![swapchain.to_owned()],
            enabled_features: None,
        })
        .unwrap();
    assert!(device.is_extension_enabled(swapchain));
    assert!(!device.is_extension_enabled(
        CStr::from_bytes_with_nul(b"VK_KHR_ray_query\0").unwrap()
    ));
}

#[test]
fn queues_are_retrieved_at_creation() {
    let (_instance, device, _recorder) = fake_device();
    let first = device.get_queue(GRAPHICS_FAMILY, 0).unwrap();
    let second = device.get_queue(GRAPHICS_FAMILY, 1).unwrap();
    let transfer = device.get_queue(TRANSFER_FAMILY, 0).unwrap();

    assert_ne!(first.vk_handle(), second.vk_handle());
    assert_eq!(second.queue_index(), 1);
    assert_eq!(transfer.family_index(), TRANSFER_FAMILY);
    assert!(first.flags().contains(vk::QueueFlags::GRAPHICS));
    assert_eq!(transfer.flags(), vk::QueueFlags::TRANSFER);

    // 同じqueueは同じハンドルで返る
    let again = device.get_queue(GRAPHICS_FAMILY, 0).unwrap();
    assert!(vkrc::RefCounted::ptr_eq(&first, &again));
}

#[test]
fn get_queue_rejects_unrequested_queues() {
    let (_instance, device, _recorder) = fake_device();
    let message = expect_validation_failed(device.get_queue(7, 0));
    assert!(message.contains("Queue family 7 was not requested"));
    let message = expect_validation_failed(device.get_queue(TRANSFER_FAMILY, 1));
    assert!(message.contains("out of range"));
}

#[test]
fn fence_wait_times_out() {
    let (_instance, device, _recorder) = fake_device();
    let fence = device
        .create_fence(&vk::FenceCreateInfo::default())
        .unwrap();
    assert_eq!(fence.wait(0), Ok(false));
    assert_eq!(fence.is_signaled(), Ok(false));
    assert_eq!(device.wait_for_fences(&[fence.clone()], true, 0), Ok(false));
}

#[test]
fn submit_signals_fence() {
    let (_instance, device, _recorder) = fake_device();
    let queue = device.get_queue(GRAPHICS_FAMILY, 0).unwrap();
    let fence = vkrc::utils::create_fence(&device).unwrap();
    let pool = device
        .create_command_pool(
            &vk::CommandPoolCreateInfo::builder().queue_family_index(GRAPHICS_FAMILY),
        )
        .unwrap();
    let command_buffers = device
        .allocate_command_buffers(&pool, vk::CommandBufferLevel::PRIMARY, 1)
        .unwrap();
    command_buffers[0]
        .begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
        .unwrap();
    command_buffers[0].end().unwrap();

    let submit_info = SubmitInfo {
        command_buffers: command_buffers.clone(),
        ..Default::default()
    };
    queue.submit(&submit_info, Some(&fence)).unwrap();
    assert_eq!(fence.wait(u64::MAX), Ok(true));

    fence.reset().unwrap();
    assert_eq!(fence.is_signaled(), Ok(false));
}

#[test]
fn signaled_fence_is_signaled_from_the_start() {
    let (_instance, device, _recorder) = fake_device();
    let signaled = vkrc::utils::create_signaled_fence(&device).unwrap();
    let unsignaled = vkrc::utils::create_fence(&device).unwrap();
    assert_eq!(signaled.is_signaled(), Ok(true));

    let fences = [signaled.clone(), unsignaled.clone()];
    assert_eq!(device.wait_for_fences(&fences, false, 0), Ok(true));
    assert_eq!(device.wait_for_fences(&fences, true, 0), Ok(false));

    device.reset_fences(&fences).unwrap();
    assert_eq!(signaled.is_signaled(), Ok(false));
}

#[test]
fn creation_failure_returns_vulkan_error() {
    let (_instance, device, recorder) = fake_device();
    recorder.fail("vkCreateSampler");
    let result = device.create_sampler(&vk::SamplerCreateInfo::default());
    assert_eq!(
        result.unwrap_err(),
        Error::Vulkan {
            call: "vkCreateSampler",
            result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
        }
    );
    assert_eq!(recorder.live_count("sampler"), 0);
}

#[test]
fn objects_from_another_device_are_rejected() {
    let (_instance, device, _recorder) = fake_device();
    let (_other_instance, other_device, _other_recorder) = fake_device();

    let queue = device.get_queue(GRAPHICS_FAMILY, 0).unwrap();
    let foreign_fence = vkrc::utils::create_fence(&other_device).unwrap();
    let message = expect_validation_failed(queue.submit(&SubmitInfo::default(), Some(&foreign_fence)));
    assert!(message.contains("Fence was created from a different device"));

    let foreign_pool = other_device
        .create_command_pool(&vk::CommandPoolCreateInfo::default())
        .unwrap();
    expect_validation_failed(device.allocate_command_buffers(
        &foreign_pool,
        vk::CommandBufferLevel::PRIMARY,
        1,
    ));
}

#[test]
fn objects_of_a_destroyed_device_are_rejected() {
    let (_instance, device, _recorder) = fake_device();
    let (_other_instance, other_device, _other_recorder) = fake_device();
    let pool = other_device
        .create_command_pool(&vk::CommandPoolCreateInfo::default())
        .unwrap();
    drop(other_device);

    assert_eq!(
        device
            .allocate_command_buffers(&pool, vk::CommandBufferLevel::PRIMARY, 1)
            .unwrap_err(),
        Error::ParentDestroyed("Device")
    );
}

fn render_pass_with_one_attachment(device: &vkrc::DeviceHandle) -> vkrc::RenderPassHandle {
    let attachments = [vk::AttachmentDescription::builder()
        .format(vk::Format::R8G8B8A8_UNORM)
        .samples(vk::SampleCountFlags::TYPE_1)
        .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .build()];
    let color_reference = [vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    }];
    let subpasses = [vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_reference)
        .build()];
    device
        .create_render_pass(
            &vk::RenderPassCreateInfo::builder()
                .attachments(&attachments)
                .subpasses(&subpasses),
        )
        .unwrap()
}

fn color_view(device: &vkrc::DeviceHandle) -> vkrc::ImageViewHandle {
    let image = device
        .create_image(
            &vk::ImageCreateInfo::builder()
                .image_type(vk::ImageType::TYPE_2D)
                .format(vk::Format::R8G8B8A8_UNORM)
                .extent(vk::Extent3D {
                    width: 16,
                    height: 16,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .usage(vk::ImageUsageFlags::COLOR_ATTACHMENT),
        )
        .unwrap();
    device
        .create_image_view(
            &image,
            &vk::ImageViewCreateInfo::builder()
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk::Format::R8G8B8A8_UNORM),
        )
        .unwrap()
}

#[test]
fn framebuffer_checks_attachment_count() {
    let (_instance, device, recorder) = fake_device();
    let render_pass = render_pass_with_one_attachment(&device);
    assert_eq!(render_pass.attachment_count(), 1);

    let extent = vk::Extent2D {
        width: 16,
        height: 16,
    };
    let message = expect_validation_failed(device.create_framebuffer(&render_pass, &[], extent, 1));
    assert!(message.contains("expects 1 attachment(s) but 0 were given"));
    assert_eq!(recorder.call_count("vkCreateFramebuffer"), 0);

    let view = color_view(&device);
    let framebuffer = device
        .create_framebuffer(&render_pass, &[view.clone()], extent, 1)
        .unwrap();
    assert_eq!(framebuffer.extent(), extent);
    assert_eq!(framebuffer.attachments().len(), 1);

    // Framebufferはrender passとattachmentを保持する
    drop(render_pass);
    drop(view);
    assert_eq!(recorder.destroyed_count("render_pass"), 0);
    assert_eq!(recorder.destroyed_count("image_view"), 0);
    drop(framebuffer);
    assert_eq!(recorder.destroyed_count("render_pass"), 1);
    assert_eq!(recorder.destroyed_count("image_view"), 1);
    assert_eq!(recorder.destroyed_count("image"), 1);
}

const SPIRV_HEADER: [u32; 5] = [0x0723_0203, 0x0001_0000, 0, 1, 0];

#[test]
fn shader_module_checks_spirv_magic() {
    let (_instance, device, recorder) = fake_device();
    expect_validation_failed(device.create_shader_module(&[]));
    expect_validation_failed(device.create_shader_module(&[0xdead_beef, 0, 0]));
    assert_eq!(recorder.call_count("vkCreateShaderModule"), 0);

    let shader = device.create_shader_module(&SPIRV_HEADER).unwrap();
    assert!(shader.device().is_some());
}

#[test]
fn compute_pipeline_keeps_layout_alive() {
    let (_instance, device, recorder) = fake_device();
    let bindings = [vk::DescriptorSetLayoutBinding::builder()
        .binding(0)
        .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
        .descriptor_count(1)
        .stage_flags(vk::ShaderStageFlags::COMPUTE)
        .build()];
    let set_layout = device
        .create_descriptor_set_layout(
            &vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings),
        )
        .unwrap();
    assert_eq!(set_layout.binding_count(), 1);

    let layout = device
        .create_pipeline_layout(&[set_layout.clone()], &[])
        .unwrap();
    let shader = device.create_shader_module(&SPIRV_HEADER).unwrap();
    let entry_point = CStr::from_bytes_with_nul(b"main\0").unwrap();
    let pipeline = device
        .create_compute_pipeline(&layout, &shader, entry_point, None)
        .unwrap();

    drop(shader);
    drop(set_layout);
    drop(layout);
    assert_eq!(recorder.destroyed_count("shader_module"), 1);
    assert_eq!(recorder.destroyed_count("pipeline_layout"), 0);

    drop(pipeline);
    assert_eq!(
        recorder.destroy_order(),
        vec![
            "shader_module",
            "pipeline",
            "pipeline_layout",
            "descriptor_set_layout"
        ]
    );
}

#[test]
fn descriptor_pool_records_max_sets() {
    let (_instance, device, _recorder) = fake_device();
    let pool_sizes = [vk::DescriptorPoolSize {
        ty: vk::DescriptorType::STORAGE_BUFFER,
        descriptor_count: 4,
    }];
    let pool = device
        .create_descriptor_pool(
            &vk::DescriptorPoolCreateInfo::builder()
                .max_sets(2)
                .pool_sizes(&pool_sizes),
        )
        .unwrap();
    assert_eq!(pool.max_sets(), 2);
}

#[test]
fn buffer_memory_can_be_bound_once() {
    let (_instance, device, recorder) = fake_device();
    let buffer = device
        .create_buffer(
            &vk::BufferCreateInfo::builder()
                .size(256)
                .usage(vk::BufferUsageFlags::UNIFORM_BUFFER),
        )
        .unwrap();
    let requirements = buffer.memory_requirements().unwrap();
    let physical_device = device.physical_device().unwrap();
    let memory_type_index = physical_device
        .memory_type_index(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
        )
        .unwrap();
    assert_eq!(memory_type_index, HOST_COHERENT_MEMORY);

    let memory = device
        .allocate_memory(
            &vk::MemoryAllocateInfo::builder()
                .allocation_size(requirements.size)
                .memory_type_index(memory_type_index),
        )
        .unwrap();
    buffer.bind_memory(&memory, 0).unwrap();
    let message = expect_validation_failed(buffer.bind_memory(&memory, 0));
    assert!(message.contains("already bound"));

    // Bufferがメモリを保持する
    drop(memory);
    assert_eq!(recorder.destroyed_count("memory"), 0);
    let (_, offset) = buffer.memory().unwrap();
    assert_eq!(offset, 0);
    drop(buffer);
    assert_eq!(recorder.destroy_order(), vec!["buffer", "memory"]);
}

#[test]
fn image_memory_requires_matching_type() {
    let (_instance, device, _recorder) = fake_device();
    let image = device
        .create_image(
            &vk::ImageCreateInfo::builder()
                .image_type(vk::ImageType::TYPE_2D)
                .format(vk::Format::R8G8B8A8_UNORM)
                .extent(vk::Extent3D {
                    width: 32,
                    height: 32,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .usage(vk::ImageUsageFlags::SAMPLED),
        )
        .unwrap();
    assert_eq!(image.extent().width, 32);
    let requirements = image.memory_requirements().unwrap();
    let physical_device = device.physical_device().unwrap();
    assert_eq!(
        physical_device.memory_type_index(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE
        ),
        None
    );
    assert_eq!(
        physical_device.memory_type_index(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL
        ),
        Some(DEVICE_LOCAL_MEMORY)
    );
}

#[test]
fn format_properties_are_queried_from_instance() {
    let (_instance, device, _recorder) = fake_device();
    let physical_device = device.physical_device().unwrap();
    let properties = physical_device
        .format_properties(vk::Format::R8G8B8A8_UNORM)
        .unwrap();
    assert!(properties
        .optimal_tiling_features
        .contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT));
}

#[test]
fn fence_lists_must_not_be_empty() {
    let (_instance, device, recorder) = fake_device();
    let message = expect_validation_failed(device.wait_for_fences(&[], true, 0));
    assert!(message.contains("At least one fence"));
    expect_validation_failed(device.reset_fences(&[]));
    assert_eq!(recorder.call_count("vkWaitForFences"), 0);
    assert_eq!(recorder.call_count("vkResetFences"), 0);
}

#[test]
fn fences_from_another_device_are_rejected() {
    let (_instance, device, recorder) = fake_device();
    let (_other_instance, other_device, _other_recorder) = fake_device();
    let fence = vkrc::utils::create_signaled_fence(&device).unwrap();
    let foreign_fence = vkrc::utils::create_signaled_fence(&other_device).unwrap();
    let fences = [fence.clone(), foreign_fence.clone()];

    let message = expect_validation_failed(device.wait_for_fences(&fences, true, 0));
    assert!(message.contains("Fence was created from a different device"));
    expect_validation_failed(device.reset_fences(&fences));
    assert_eq!(recorder.call_count("vkWaitForFences"), 0);
    assert_eq!(recorder.call_count("vkResetFences"), 0);
    assert_eq!(fence.is_signaled(), Ok(true));

    drop(other_device);
    assert_eq!(
        device.wait_for_fences(&[foreign_fence], true, 0),
        Err(Error::ParentDestroyed("Device"))
    );
}

#[test]
fn allocating_no_command_buffers_is_rejected() {
    let (_instance, device, recorder) = fake_device();
    let pool = device
        .create_command_pool(&vk::CommandPoolCreateInfo::default())
        .unwrap();
    let message = expect_validation_failed(device.allocate_command_buffers(
        &pool,
        vk::CommandBufferLevel::PRIMARY,
        0,
    ));
    assert!(message.contains("At least one command buffer"));
    assert_eq!(recorder.call_count("vkAllocateCommandBuffers"), 0);
}

#[test]
fn event_can_be_set_and_reset_from_host() {
    let (_instance, device, recorder) = fake_device();
    let event = device.create_event(&vk::EventCreateInfo::default()).unwrap();
    assert_eq!(event.is_set(), Ok(false));
    event.set().unwrap();
    assert_eq!(event.is_set(), Ok(true));
    event.reset().unwrap();
    assert_eq!(event.is_set(), Ok(false));

    drop(device);
    assert_eq!(event.set(), Err(Error::ParentDestroyed("Device")));
    drop(event);
    assert_eq!(recorder.destroyed_count("event"), 0);
}

#[test]
fn query_pool_requires_queries() {
    let (_instance, device, recorder) = fake_device();
    expect_validation_failed(device.create_query_pool(
        &vk::QueryPoolCreateInfo::builder().query_type(vk::QueryType::TIMESTAMP),
    ));
    assert_eq!(recorder.call_count("vkCreateQueryPool"), 0);

    let query_pool = device
        .create_query_pool(
            &vk::QueryPoolCreateInfo::builder()
                .query_type(vk::QueryType::TIMESTAMP)
                .query_count(4),
        )
        .unwrap();
    assert_eq!(query_pool.query_type(), vk::QueryType::TIMESTAMP);
    assert_eq!(query_pool.query_count(), 4);
    drop(query_pool);
    assert_eq!(recorder.destroyed_count("query_pool"), 1);
}

#[test]
fn buffer_view_keeps_buffer_alive() {
    let (_instance, device, recorder) = fake_device();
    let buffer = device
        .create_buffer(
            &vk::BufferCreateInfo::builder()
                .size(256)
                .usage(vk::BufferUsageFlags::UNIFORM_TEXEL_BUFFER),
        )
        .unwrap();
    let message = expect_validation_failed(device.create_buffer_view(
        &buffer,
        &vk::BufferViewCreateInfo::builder()
            .format(vk::Format::R32_SFLOAT)
            .offset(256)
            .range(vk::WHOLE_SIZE),
    ));
    assert!(message.contains("out of buffer"));

    let view = device
        .create_buffer_view(
            &buffer,
            &vk::BufferViewCreateInfo::builder()
                .format(vk::Format::R32_SFLOAT)
                .offset(0)
                .range(vk::WHOLE_SIZE),
        )
        .unwrap();
    assert_eq!(view.format(), vk::Format::R32_SFLOAT);
    assert_eq!(view.buffer().vk_handle(), buffer.vk_handle());

    drop(buffer);
    assert_eq!(recorder.destroyed_count("buffer"), 0);
    drop(view);
    assert_eq!(recorder.destroy_order(), vec!["buffer_view", "buffer"]);
}
