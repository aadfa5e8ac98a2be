//! FeatureForge 配置管理系统
//!
//! 支持 YAML / TOML 配置：注册表策略、组合策略与日志

use crate::capabilities::compose::{ComposePolicy, CompositionConfig};
use crate::capabilities::registry::RegistryConfig;
use crate::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 框架配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// 框架基础设置
    pub framework: FrameworkSettings,
    /// 能力注册表配置
    pub registry: RegistryConfig,
    /// 组合配置
    pub composition: CompositionConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 框架基础设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSettings {
    /// 框架名称
    pub name: String,
    /// 版本
    pub version: String,
}

impl Default for FrameworkSettings {
    fn default() -> Self {
        Self {
            name: crate::FRAMEWORK_NAME.to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否输出目标模块
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            verbose: false,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// 按扩展名判断格式
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            other => Err(ForgeError::config(&format!(
                "Unsupported config file extension: {:?}",
                other
            ))),
        }
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ForgeConfig,
}

impl ConfigManager {
    /// 创建默认配置
    pub fn new_default() -> Self {
        Self {
            config: ForgeConfig::default(),
        }
    }

    pub fn from_config(config: ForgeConfig) -> Self {
        Self { config }
    }

    /// 从 YAML 字符串解析
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ForgeConfig = serde_yaml::from_str(content)?;
        Ok(Self { config })
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ForgeConfig = toml::from_str(content)?;
        Ok(Self { config })
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = ConfigFormat::from_path(&path)?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ForgeError::config(&format!("Failed to read config file: {}", e))
        })?;

        match format {
            ConfigFormat::Yaml => Self::from_yaml_str(&content),
            ConfigFormat::Toml => Self::from_toml_str(&content),
        }
    }

    /// 保存配置到文件（YAML）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_yaml_string()?).map_err(|e| {
            ForgeError::config(&format!("Failed to write config file: {}", e))
        })?;
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.config)?)
    }

    /// 获取配置
    pub fn get_config(&self) -> &ForgeConfig {
        &self.config
    }

    /// 获取可变配置
    pub fn get_config_mut(&mut self) -> &mut ForgeConfig {
        &mut self.config
    }

    pub fn compose_policy(&self) -> ComposePolicy {
        self.config.composition.policy
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.config.framework.name.trim().is_empty() {
            return Err(ForgeError::config("Framework name cannot be empty"));
        }

        if self.config.framework.version.trim().is_empty() {
            return Err(ForgeError::config("Framework version cannot be empty"));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

/// 生成默认配置文件
pub fn generate_default_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigManager::new_default().save_to_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_manager_default() {
        let config_manager = ConfigManager::new_default();
        let config = config_manager.get_config();

        assert_eq!(config.framework.name, "FeatureForge");
        assert!(!config.registry.allow_overwrite);
        assert_eq!(config.composition.policy, ComposePolicy::Lenient);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config_manager.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("forge.yaml");

        let mut config_manager = ConfigManager::new_default();
        config_manager.get_config_mut().composition.policy = ComposePolicy::Strict;
        config_manager.save_to_file(&path).unwrap();

        let loaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(loaded.get_config(), config_manager.get_config());
        assert_eq!(loaded.compose_policy(), ComposePolicy::Strict);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "registry:\n  allow_overwrite: true\n";
        let config_manager = ConfigManager::from_yaml_str(yaml).unwrap();
        let config = config_manager.get_config();

        assert!(config.registry.allow_overwrite);
        assert_eq!(config.composition.policy, ComposePolicy::Lenient);
        assert_eq!(config.framework.name, "FeatureForge");
    }

    #[test]
    fn test_toml_config() {
        let content = r#"
[composition]
policy = "Strict"

[logging]
level = "Debug"
verbose = true
"#;
        let config_manager = ConfigManager::from_toml_str(content).unwrap();
        assert_eq!(config_manager.compose_policy(), ComposePolicy::Strict);
        assert_eq!(config_manager.get_config().logging.level, LogLevel::Debug);
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
    }

    #[test]
    fn test_toml_file_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("forge.toml");
        std::fs::write(&path, "[registry]\nallow_overwrite = true\n").unwrap();

        let loaded = ConfigManager::load_from_file(&path).unwrap();
        assert!(loaded.get_config().registry.allow_overwrite);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ConfigManager::load_from_file("forge.ini");
        assert!(matches!(result, Err(ForgeError::Config { .. })));
    }

    #[test]
    fn test_validation_rejects_empty_name() {
        let mut config_manager = ConfigManager::new_default();
        config_manager.get_config_mut().framework.name = "  ".to_string();
        assert!(config_manager.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ConfigManager::from_yaml_str("composition: [unclosed");
        assert!(matches!(result, Err(ForgeError::Yaml(_))));
    }
}
