//! 各Objectが共通して持つVulkanハンドルと、生成元への弱参照をまとめた構造体を定義する。

use crate::{Device, DeviceHandle, Error, Instance, InstanceHandle, PhysicalDevice};
use crate::{PhysicalDeviceHandle, Result};
use ash::vk;
use refcounted::{EmbeddedRefCount, EmbeddedRefCounted, WeakRef};
use std::fmt::Debug;

/// 子のObjectから弱参照で参照される生成元のObject
pub trait ParentObject: EmbeddedRefCount {
    /// ログやエラーに使う名前
    const NAME: &'static str;
}

/// Vulkanハンドルを保持する
#[derive(Debug, Clone, Copy)]
pub struct ObjectBase<H> {
    handle: H,
}
impl<H: vk::Handle + Copy> ObjectBase<H> {
    /// ハンドルを包む
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    /// Vulkanハンドルを取得する
    pub fn vk_handle(&self) -> H {
        self.handle
    }

    /// VkObjectType
    pub fn object_type(&self) -> vk::ObjectType {
        H::TYPE
    }
}

/// Vulkanハンドルと、生成元のObjectへの弱参照を保持する
pub struct ParentedObjectBase<P: ParentObject, H> {
    base: ObjectBase<H>,
    parent: WeakRef<P>,
}
impl<P: ParentObject, H: vk::Handle + Copy + Debug> ParentedObjectBase<P, H> {
    /// `parent`への弱参照を取って作成する
    pub fn new(parent: &P, handle: H) -> Self {
        Self {
            base: ObjectBase::new(handle),
            parent: parent.get_weak_reference(),
        }
    }

    /// Vulkanハンドルを取得する
    pub fn vk_handle(&self) -> H {
        self.base.vk_handle()
    }

    /// VkObjectType
    pub fn object_type(&self) -> vk::ObjectType {
        self.base.object_type()
    }

    /// 生成元への強参照を一時的に取得する。破棄済みならNone。
    pub fn parent(&self) -> Option<EmbeddedRefCounted<P>> {
        let parent = self.parent.upgrade();
        if parent.is_valid() {
            Some(parent.into())
        } else {
            None
        }
    }

    /// 生成元がまだ生きているかどうか
    pub fn is_parent_alive(&self) -> bool {
        self.parent.is_valid()
    }

    /// 生成元が生きていれば`f`を呼ぶ。
    /// 破棄済みであれば警告を出して`Error::ParentDestroyed`を返す。
    pub fn with_parent<R>(&self, what: &'static str, f: impl FnOnce(&P) -> Result<R>) -> Result<R> {
        match self.parent() {
            Some(parent) => f(&*parent),
            None => {
                tracing::warn!(
                    "Attempted to use {} {:?} after its {} was destroyed",
                    what,
                    self.vk_handle(),
                    P::NAME
                );
                Err(Error::ParentDestroyed(P::NAME))
            }
        }
    }

    /// Dropから呼ぶ。生成元が生きていれば`f`で破棄し、
    /// 破棄済みであれば警告を出して破棄をスキップする。
    pub fn destroy_with(&self, what: &'static str, f: impl FnOnce(&P)) {
        match self.parent() {
            Some(parent) => {
                tracing::debug!("Dropping {} {:?}", what, self.vk_handle());
                f(&*parent);
            }
            None => tracing::warn!(
                "Attempted to destroy {} {:?} after its {} was destroyed",
                what,
                self.vk_handle(),
                P::NAME
            ),
        }
    }
}

impl<P: ParentObject, H: Debug> Debug for ParentedObjectBase<P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParentedObjectBase")
            .field("handle", &self.base.handle)
            .field("parent", &P::NAME)
            .field("parent_alive", &self.parent.is_valid())
            .finish()
    }
}

/// Instanceから作られたObjectの共通部分
pub type InstanceObjectBase<H> = ParentedObjectBase<Instance, H>;
/// PhysicalDeviceから作られたObjectの共通部分
pub type PhysicalDeviceObjectBase<H> = ParentedObjectBase<PhysicalDevice, H>;
/// Deviceから作られたObjectの共通部分
pub type DeviceObjectBase<H> = ParentedObjectBase<Device, H>;

impl<H: vk::Handle + Copy + Debug> ParentedObjectBase<Instance, H> {
    /// 生成元のInstanceを取得する
    pub fn instance(&self) -> Option<InstanceHandle> {
        self.parent()
    }
}

impl<H: vk::Handle + Copy + Debug> ParentedObjectBase<PhysicalDevice, H> {
    /// 生成元のPhysicalDeviceを取得する
    pub fn physical_device(&self) -> Option<PhysicalDeviceHandle> {
        self.parent()
    }
}

impl<H: vk::Handle + Copy + Debug> ParentedObjectBase<Device, H> {
    /// 生成元のDeviceを取得する
    pub fn device(&self) -> Option<DeviceHandle> {
        self.parent()
    }

    /// `with_parent`を参照
    pub fn with_device<R>(
        &self,
        what: &'static str,
        f: impl FnOnce(&Device) -> Result<R>,
    ) -> Result<R> {
        self.with_parent(what, f)
    }
}
