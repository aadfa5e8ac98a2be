//! 组合引擎
//!
//! 给定基类和有序能力名列表，生成一个新的派生类：依次应用每个能力的
//! 原型钩子和类型钩子，并在每次构造时按顺序运行其初始化钩子。

use crate::capabilities::registry::{global_registry, CapabilityRegistry};
use crate::core::class::{Class, ClassBuilder};
use crate::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 未知能力的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComposePolicy {
    /// 记录警告并跳过
    #[default]
    Lenient,
    /// 返回错误
    Strict,
}

/// 组合配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    pub policy: ComposePolicy,
}

/// 组合器
#[derive(Debug, Clone)]
pub struct Composer {
    registry: CapabilityRegistry,
    policy: ComposePolicy,
}

impl Composer {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            policy: ComposePolicy::default(),
        }
    }

    /// 基于进程级注册表的组合器
    pub fn global() -> Self {
        Self::new(global_registry().clone())
    }

    pub fn from_config(registry: CapabilityRegistry, config: &CompositionConfig) -> Self {
        Self::new(registry).with_policy(config.policy)
    }

    pub fn with_policy(mut self, policy: ComposePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ComposePolicy {
        self.policy
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// 按当前策略组合
    pub fn compose<S: AsRef<str>>(&self, base: &Class, features: &[S]) -> Result<Class> {
        if self.policy == ComposePolicy::Strict {
            if let Some(missing) = features
                .iter()
                .map(AsRef::as_ref)
                .find(|name| !self.registry.contains(name))
            {
                return Err(ForgeError::unknown_capability(missing));
            }
        }
        Ok(self.compose_lenient(base, features))
    }

    /// 宽松组合：未知能力只记录警告，不会失败
    pub fn compose_lenient<S: AsRef<str>>(&self, base: &Class, features: &[S]) -> Class {
        let names: Vec<String> = features.iter().map(|name| name.as_ref().to_string()).collect();

        let mut builder = ClassBuilder::new(base.name())
            .extends(base)
            .with_capabilities(names.clone(), self.registry.clone());

        for name in &names {
            let Some(descriptor) = self.registry.lookup(name) else {
                warn!("Capability '{}' is not registered, skipped while composing '{}'", name, base.name());
                continue;
            };

            if let Some(hook) = descriptor.extend_instance_behavior() {
                hook(builder.prototype_mut());
            }
            if let Some(hook) = descriptor.extend_type_behavior() {
                hook(builder.type_table_mut());
            }
            debug!("Applied capability '{}' to '{}'", name, base.name());
        }

        builder.build()
    }
}

/// 使用进程级注册表宽松组合
pub fn compose<S: AsRef<str>>(base: &Class, features: &[S]) -> Class {
    Composer::global().compose_lenient(base, features)
}
