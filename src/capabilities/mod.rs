//! 能力层模块
//!
//! 能力注册表、组合引擎以及内置的序列化能力

pub mod registry;
pub mod compose;
pub mod serialization;

// 重新导出核心组件
pub use registry::*;
pub use compose::*;
pub use serialization::{DeserializeRecord, SerializeRecord, DESERIALIZE, SERIALIZE};
