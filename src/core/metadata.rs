//! 字段元数据存储
//!
//! 以 (类标识, 字段名) 为键的进程级侧表，保存重命名、默认值和转换函数。
//! 元数据属于类的 schema，被该类的所有实例共享；派生类读取时沿父类链合并。

use crate::core::class::Class;
use crate::types::{ClassId, Value};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 序列化时的单向值转换
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// 默认值工厂
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// 全局元数据表，条目随最后一个类句柄释放而移除
static FIELD_METADATA: Lazy<DashMap<ClassId, FieldMetadata>> = Lazy::new(DashMap::new);

/// 字段默认值：普通值或零参数工厂
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(DefaultFactory),
}

impl DefaultValue {
    /// 产出默认值；工厂每次调用都会重新执行
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// 单个字段的选项
#[derive(Clone, Default)]
pub struct FieldOptions {
    /// 外部键名
    pub rename: Option<String>,
    /// 默认值
    pub default: Option<DefaultValue>,
    /// 仅在序列化时应用的转换
    pub transform: Option<TransformFn>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, key: &str) -> Self {
        self.rename = Some(key.to_string());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// 字段在记录中的键名
    pub fn external_key<'a>(&'a self, field: &'a str) -> &'a str {
        self.rename.as_deref().unwrap_or(field)
    }

    /// 应用转换（未声明时原样返回）
    pub fn apply_transform(&self, value: Value) -> Value {
        match &self.transform {
            Some(transform) => transform(value),
            None => value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rename.is_none() && self.default.is_none() && self.transform.is_none()
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("rename", &self.rename)
            .field("default", &self.default)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .finish()
    }
}

/// 一个类的字段元数据表（按首次声明顺序）
#[derive(Debug, Clone, Default)]
pub struct FieldMetadata {
    entries: Vec<(String, FieldOptions)>,
}

impl FieldMetadata {
    /// 插入或替换字段选项，替换时保持原位置
    pub fn insert(&mut self, field: &str, options: FieldOptions) {
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = options,
            None => self.entries.push((field.to_string(), options)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldOptions> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, options)| options)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldOptions)> {
        self.entries.iter().map(|(name, options)| (name.as_str(), options))
    }

    /// rename 为 `key` 的字段名
    pub fn rename_owner(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, options)| options.rename.as_deref() == Some(key))
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 为类的字段附加选项
///
/// 同一字段重复声明时后写覆盖。
pub fn annotate(class: &Class, field: &str, options: FieldOptions) {
    debug!("Annotating field '{}.{}': {:?}", class.name(), field, options);
    FIELD_METADATA
        .entry(class.id())
        .or_default()
        .insert(field, options);
}

/// 读取类的完整元数据表（沿父类链合并，近者优先）
pub fn read(class: &Class) -> FieldMetadata {
    let mut chain: Vec<&Class> = class.ancestry().collect();
    chain.reverse();

    let mut merged = FieldMetadata::default();
    for current in chain {
        if let Some(table) = FIELD_METADATA.get(&current.id()) {
            for (field, options) in table.value().iter() {
                merged.insert(field, options.clone());
            }
        }
    }
    merged
}

/// 移除类的元数据表
pub(crate) fn forget(id: ClassId) {
    if FIELD_METADATA.remove(&id).is_some() {
        debug!("Field metadata for class {} released", id);
    }
}

/// 读取单个字段的选项，缺失时为空选项
pub fn options_for(class: &Class, field: &str) -> FieldOptions {
    read(class).get(field).cloned().unwrap_or_default()
}
