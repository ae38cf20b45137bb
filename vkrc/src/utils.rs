//! Vulkanの標準以上の便利関数

mod sync_objects;
pub use sync_objects::*;

mod setup;
pub use setup::*;
