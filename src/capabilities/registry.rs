//! 能力注册表
//!
//! 能力名 → 能力描述符的映射。进程级注册表在首次访问时创建并注册内置能力。
//!
//! 生命周期分两个阶段：初始化阶段完成所有 `register` 调用，之后才开始
//! `compose`。运行时不强制这个顺序。

use crate::capabilities::serialization;
use crate::core::class::{Prototype, TypeTable};
use crate::core::instance::Instance;
use crate::{ForgeError, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 扩展原型的钩子
pub type PrototypeHook = Arc<dyn Fn(&mut Prototype) + Send + Sync>;

/// 扩展类型方法的钩子
pub type TypeHook = Arc<dyn Fn(&mut TypeTable) + Send + Sync>;

/// 实例初始化钩子
pub type InstanceInitHook = Arc<dyn Fn(&mut Instance) + Send + Sync>;

/// 进程级注册表
static GLOBAL_REGISTRY: Lazy<CapabilityRegistry> = Lazy::new(|| {
    let registry = CapabilityRegistry::new(RegistryConfig::default());
    if let Err(e) = serialization::register_builtin(&registry) {
        error!("Failed to register built-in capabilities: {}", e);
    }
    registry
});

/// 能力描述符
///
/// 所有钩子都是可选的；没有钩子的描述符合法但不产生任何效果。
#[derive(Clone)]
pub struct CapabilityDescriptor {
    name: String,
    extend_instance_behavior: Option<PrototypeHook>,
    extend_type_behavior: Option<TypeHook>,
    on_instance_init: Option<InstanceInitHook>,
}

impl CapabilityDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extend_instance_behavior: None,
            extend_type_behavior: None,
            on_instance_init: None,
        }
    }

    pub fn with_instance_behavior<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Prototype) + Send + Sync + 'static,
    {
        self.extend_instance_behavior = Some(Arc::new(hook));
        self
    }

    pub fn with_type_behavior<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TypeTable) + Send + Sync + 'static,
    {
        self.extend_type_behavior = Some(Arc::new(hook));
        self
    }

    pub fn with_instance_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Instance) + Send + Sync + 'static,
    {
        self.on_instance_init = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extend_instance_behavior(&self) -> Option<&PrototypeHook> {
        self.extend_instance_behavior.as_ref()
    }

    pub fn extend_type_behavior(&self) -> Option<&TypeHook> {
        self.extend_type_behavior.as_ref()
    }

    pub fn on_instance_init(&self) -> Option<&InstanceInitHook> {
        self.on_instance_init.as_ref()
    }

    /// 是否不含任何钩子
    pub fn is_inert(&self) -> bool {
        self.extend_instance_behavior.is_none()
            && self.extend_type_behavior.is_none()
            && self.on_instance_init.is_none()
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .field("extend_instance_behavior", &self.extend_instance_behavior.is_some())
            .field("extend_type_behavior", &self.extend_type_behavior.is_some())
            .field("on_instance_init", &self.on_instance_init.is_some())
            .finish()
    }
}

/// 注册表配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 是否允许同名能力覆盖注册（后注册者生效）
    pub allow_overwrite: bool,
}

/// 能力注册表
#[derive(Clone)]
pub struct CapabilityRegistry {
    /// 已注册的能力
    capabilities: Arc<RwLock<HashMap<String, Arc<CapabilityDescriptor>>>>,
    /// 注册表配置
    config: Arc<RwLock<RegistryConfig>>,
}

impl CapabilityRegistry {
    /// 创建新的能力注册表
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            capabilities: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 注册能力
    pub fn register(&self, descriptor: CapabilityDescriptor) -> Result<()> {
        let allow_overwrite = self.config.read().allow_overwrite;
        let name = descriptor.name().to_string();

        let mut capabilities = self.capabilities.write();
        if capabilities.contains_key(&name) {
            if !allow_overwrite {
                return Err(ForgeError::already_registered(&name));
            }
            warn!("Capability '{}' re-registered, previous descriptor replaced", name);
        }
        capabilities.insert(name.clone(), Arc::new(descriptor));

        info!("Capability '{}' registered", name);
        Ok(())
    }

    /// 查找能力
    pub fn lookup(&self, name: &str) -> Option<Arc<CapabilityDescriptor>> {
        self.capabilities.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.read().contains_key(name)
    }

    /// 已注册的能力名（排序后）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.capabilities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.read().is_empty()
    }

    pub fn config(&self) -> RegistryConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: RegistryConfig) {
        *self.config.write() = config;
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .field("config", &self.config())
            .finish()
    }
}

/// 进程级注册表（已包含 `Serialize` 与 `Deserialize`）
pub fn global_registry() -> &'static CapabilityRegistry {
    &GLOBAL_REGISTRY
}

/// 向进程级注册表注册能力
pub fn register(descriptor: CapabilityDescriptor) -> Result<()> {
    global_registry().register(descriptor)
}

/// 在进程级注册表中查找能力
pub fn lookup(name: &str) -> Option<Arc<CapabilityDescriptor>> {
    global_registry().lookup(name)
}
