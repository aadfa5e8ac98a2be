//! FeatureForge 错误处理系统
//!
//! 统一的错误类型和错误处理机制

use thiserror::Error;

/// 框架统一错误类型
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Capability '{name}' is already registered")]
    CapabilityAlreadyRegistered { name: String },

    #[error("Unknown capability: {name}")]
    UnknownCapability { name: String },

    #[error("Class '{class}' has no method '{method}'")]
    MethodNotFound { class: String, method: String },

    #[error("No matching pattern")]
    NoMatchingPattern,

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ForgeError {
    /// 创建重复注册错误
    pub fn already_registered(name: &str) -> Self {
        Self::CapabilityAlreadyRegistered {
            name: name.to_string(),
        }
    }

    /// 创建未知能力错误
    pub fn unknown_capability(name: &str) -> Self {
        Self::UnknownCapability {
            name: name.to_string(),
        }
    }

    /// 创建方法缺失错误
    pub fn method_not_found(class: &str, method: &str) -> Self {
        Self::MethodNotFound {
            class: class.to_string(),
            method: method.to_string(),
        }
    }

    /// 创建参数错误
    pub fn invalid_argument(message: &str) -> Self {
        Self::InvalidArgument {
            message: message.to_string(),
        }
    }

    /// 创建配置相关错误
    pub fn config(message: &str) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ForgeError>;
