//! Vulkanの各Objectを参照カウンタで管理して、参照がすべて破棄された際に
//! 自動で各種destroy処理を行うようにしたラッパー。
//!
//! Instance → PhysicalDevice → Device → 各Object という生成の順に強参照を下向きに持ち、
//! 上向き(生成元)へは弱参照だけを持つ。
//! そのため、生成元がすでに破棄されていた場合の操作は警告を出してエラーを返し、
//! destroyの処理はスキップされる。
//!
//! Vulkanの呼び出しは[`InstanceBindings`]/[`DeviceBindings`]のディスパッチテーブルを経由する。
#![warn(missing_docs)]

mod error;
pub use error::{Error, Result, VkResultExt};

mod dispatch;
pub use dispatch::{AshInstanceBindings, DeviceBindings, InstanceBindings};

mod object_base;
pub use object_base::{
    DeviceObjectBase, InstanceObjectBase, ObjectBase, ParentObject, ParentedObjectBase,
    PhysicalDeviceObjectBase,
};

pub mod handles;
pub use handles::*;

pub mod utils;

pub use ash::vk;
pub use refcounted::{EmbeddedRefCounted, RefCounted, WeakRef};
