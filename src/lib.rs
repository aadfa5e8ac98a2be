//! FeatureForge - 能力组合与元数据驱动的记录序列化引擎
//!
//! 类在定义时声明字段及其元数据，再通过组合引擎叠加具名能力，
//! 得到一个全新的派生类。
//!
//! # 架构分层
//!
//! - **类型层**: 动态值、字段槽位、可选包装能力
//! - **核心层**: 类模型、实例、字段元数据存储
//! - **能力层**: 能力注册表、组合引擎、内置 `Serialize` / `Deserialize`
//! - **匹配器**: `Option` / `Result` 的两态分支
//!
//! # 使用顺序
//!
//! 先完成所有能力注册和字段标注，再开始组合与实例化。
//!
//! ```
//! use feature_forge::*;
//! use serde_json::json;
//!
//! let base = ClassBuilder::new("Account")
//!     .field("id", FieldKind::Plain)
//!     .field_with("balance", FieldKind::Plain, FieldOptions::new().rename("bal"))
//!     .build();
//! let account = compose(&base, &[SERIALIZE, DESERIALIZE]);
//!
//! let instance = account.from_object(&json!({"id": "1", "balance": 5})).unwrap();
//! let record = instance.serialize().unwrap();
//! assert_eq!(record["bal"], json!(5));
//! ```

pub mod types;
pub mod error;
pub mod core;
pub mod capabilities;
pub mod matcher;
pub mod config;

// 重新导出核心类型
pub use crate::types::*;
pub use crate::error::*;
pub use crate::core::*;
pub use crate::capabilities::*;
pub use matcher::{match_with, on, Matchable, Matcher, Pattern};
pub use config::{ConfigManager, ForgeConfig};

/// 框架信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FRAMEWORK_NAME: &str = "FeatureForge";

/// 初始化日志系统并把注册表配置应用到进程级注册表
///
/// 可重复调用；日志订阅器只会安装一次。
pub fn initialize(config: &ForgeConfig) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.logging.level))
        .with_target(config.logging.verbose)
        .try_init();

    global_registry().set_config(config.registry.clone());

    tracing::info!("Initializing {} v{}", FRAMEWORK_NAME, VERSION);
    tracing::info!("Registered capabilities: {:?}", global_registry().names());

    Ok(())
}
