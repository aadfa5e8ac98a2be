//! 核心基础层模块
//!
//! 类模型、实例以及字段元数据存储

pub mod class;
pub mod instance;
pub mod metadata;

// 重新导出核心组件
pub use class::*;
pub use instance::*;
pub use metadata::{annotate, DefaultValue, FieldMetadata, FieldOptions};
