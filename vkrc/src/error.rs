//! vkrcのエラー型

use ash::{prelude::VkResult, vk};
use thiserror::Error;

/// Vulkanオブジェクトの操作で発生するエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Vulkanの関数が失敗した
    #[error("Vulkan error in {call}: {result}")]
    Vulkan {
        /// 失敗した関数名
        call: &'static str,
        /// 返されたVkResult
        result: vk::Result,
    },
    /// Vulkanを呼ぶ前の引数チェックで不正な要求を検出した
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    /// 生成元のオブジェクトがすでに破棄されている
    #[error("{0} has already been destroyed")]
    ParentDestroyed(&'static str),
}

/// vkrcのResult型
pub type Result<T> = std::result::Result<T, Error>;

/// `VkResult`に呼び出した関数名を付けて`Error`に変換する
pub trait VkResultExt<T> {
    /// 失敗していれば`Error::Vulkan`に変換する
    fn check(self, call: &'static str) -> Result<T>;
}
impl<T> VkResultExt<T> for VkResult<T> {
    fn check(self, call: &'static str) -> Result<T> {
        self.map_err(|result| Error::Vulkan { call, result })
    }
}
