//! 参照カウンタで管理して、参照がすべて破棄された際に
//! DeviceMemoryの解放の処理まで行うDeviceMemoryHandleを定義する。

use crate::{Device, DeviceHandle, DeviceObjectBase, Error, Result, VkResultExt};
use ash::vk;
use parking_lot::Mutex;
use refcounted::RefCounted;
use std::fmt::Debug;

/// vk::DeviceMemory
pub struct DeviceMemory {
    base: DeviceObjectBase<vk::DeviceMemory>,
    size: vk::DeviceSize,
    memory_type_index: u32,
    property_flags: vk::MemoryPropertyFlags,
    // 同じメモリを同時に二重にmapしないようにする
    map_lock: Mutex<()>,
}

/// DeviceMemoryを参照カウントで管理するためのハンドル
pub type DeviceMemoryHandle = RefCounted<DeviceMemory>;

impl DeviceMemory {
    pub(crate) fn new(
        device: &Device,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> Result<DeviceMemoryHandle> {
        let memory_properties = device.memory_properties();
        let memory_type_count =
            (memory_properties.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
        let property_flags = memory_properties.memory_types[..memory_type_count]
            .get(allocate_info.memory_type_index as usize)
            .map(|memory_type| memory_type.property_flags)
            .ok_or_else(|| {
                Error::ValidationFailed(format!(
                    "Memory type index {} is out of range ({} memory types)",
                    allocate_info.memory_type_index, memory_type_count
                ))
            })?;

        let memory = unsafe { device.bindings().allocate_memory(allocate_info) }
            .check("vkAllocateMemory")?;

        Ok(RefCounted::new(Self {
            base: DeviceObjectBase::new(device, memory),
            size: allocate_info.allocation_size,
            memory_type_index: allocate_info.memory_type_index,
            property_flags,
            map_lock: Mutex::new(()),
        }))
    }

    /// vk::DeviceMemoryを取得する
    pub fn vk_handle(&self) -> vk::DeviceMemory {
        self.base.vk_handle()
    }

    /// DeviceHandleを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.base.device()
    }

    /// 確保したサイズ
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// メモリタイプのindex
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// メモリタイプのプロパティ
    pub fn property_flags(&self) -> vk::MemoryPropertyFlags {
        self.property_flags
    }

    fn check_host_range(&self, offset: vk::DeviceSize, len: usize) -> Result<()> {
        if !self
            .property_flags
            .contains(vk::MemoryPropertyFlags::HOST_VISIBLE)
        {
            return Err(Error::ValidationFailed(
                "Device memory is not host visible".into(),
            ));
        }
        if offset.saturating_add(len as vk::DeviceSize) > self.size {
            return Err(Error::ValidationFailed(format!(
                "Range {}..{} is out of device memory of size {}",
                offset,
                offset.saturating_add(len as vk::DeviceSize),
                self.size
            )));
        }
        Ok(())
    }

    fn whole_range(&self) -> vk::MappedMemoryRange {
        vk::MappedMemoryRange::builder()
            .memory(self.vk_handle())
            .offset(0)
            .size(vk::WHOLE_SIZE)
            .build()
    }

    /// `data`を`offset`の位置に書き込む
    ///
    /// HOST_VISIBLEなメモリに対してのみ使える。HOST_COHERENTでなければflushまで行う。
    pub fn write<T: bytemuck::Pod>(&self, offset: vk::DeviceSize, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.check_host_range(offset, bytes.len())?;

        self.base.with_device("DeviceMemory", |device| {
            let _lock = self.map_lock.lock();
            let bindings = device.bindings();
            unsafe {
                let ptr = bindings
                    .map_memory(self.vk_handle(), 0, vk::WHOLE_SIZE)
                    .check("vkMapMemory")?;
                std::ptr::copy_nonoverlapping(
                    bytes.as_ptr(),
                    ptr.cast::<u8>().add(offset as usize),
                    bytes.len(),
                );
                let result = if self
                    .property_flags
                    .contains(vk::MemoryPropertyFlags::HOST_COHERENT)
                {
                    Ok(())
                } else {
                    bindings
                        .flush_mapped_memory_ranges(&[self.whole_range()])
                        .check("vkFlushMappedMemoryRanges")
                };
                bindings.unmap_memory(self.vk_handle());
                result
            }
        })
    }

    /// `offset`の位置から`out`の大きさ分を読み込む
    ///
    /// HOST_VISIBLEなメモリに対してのみ使える。HOST_COHERENTでなければinvalidateしてから読む。
    pub fn read<T: bytemuck::Pod>(&self, offset: vk::DeviceSize, out: &mut [T]) -> Result<()> {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(out);
        self.check_host_range(offset, bytes.len())?;

        self.base.with_device("DeviceMemory", |device| {
            let _lock = self.map_lock.lock();
            let bindings = device.bindings();
            unsafe {
                let ptr = bindings
                    .map_memory(self.vk_handle(), 0, vk::WHOLE_SIZE)
                    .check("vkMapMemory")?;
                let result = if self
                    .property_flags
                    .contains(vk::MemoryPropertyFlags::HOST_COHERENT)
                {
                    Ok(())
                } else {
                    bindings
                        .invalidate_mapped_memory_ranges(&[self.whole_range()])
                        .check("vkInvalidateMappedMemoryRanges")
                };
                if result.is_ok() {
                    std::ptr::copy_nonoverlapping(
                        ptr.cast::<u8>().add(offset as usize),
                        bytes.as_mut_ptr(),
                        bytes.len(),
                    );
                }
                bindings.unmap_memory(self.vk_handle());
                result
            }
        })
    }
}

// Debugトレイトの実装
impl Debug for DeviceMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceMemory")
            .field("handle", &self.vk_handle())
            .field("size", &self.size)
            .field("property_flags", &self.property_flags)
            .finish()
    }
}

// Drop時にメモリを解放する
impl Drop for DeviceMemory {
    fn drop(&mut self) {
        let memory = self.vk_handle();
        self.base.destroy_with("device memory", |device| unsafe {
            device.bindings().free_memory(memory)
        });
    }
}
