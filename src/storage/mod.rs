// 照片存储抽象层模块

pub mod factory;
pub mod local;
pub mod oss;
pub mod traits;

pub use factory::create_storage;
pub use traits::{is_flat_key, Storage};
