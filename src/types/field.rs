//! 字段声明类型

use super::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// 字段声明类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldKind {
    /// 普通值
    #[default]
    Plain,
    /// 可选包装值
    Optional,
}

impl FieldKind {
    /// 把外部传入的值转换为该类型的字段槽位
    ///
    /// 可选字段收到 `null` 时为空，其余值被包装。
    pub fn coerce(self, value: Value) -> FieldValue {
        match self {
            FieldKind::Plain => FieldValue::Value(value),
            FieldKind::Optional if value.is_null() => FieldValue::Optional(None),
            FieldKind::Optional => FieldValue::Optional(Some(value)),
        }
    }
}

/// 类字段声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// 字段名
    pub name: String,
    /// 声明类型
    pub kind: FieldKind,
    /// 字段初始值，缺省时字段为未定义
    pub initializer: Option<Value>,
}

impl FieldDecl {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            initializer: None,
        }
    }

    pub fn with_initializer(mut self, value: Value) -> Self {
        self.initializer = Some(value);
        self
    }

    /// 构造时的初始槽位
    pub fn initial_slot(&self) -> FieldValue {
        match &self.initializer {
            Some(value) => self.kind.coerce(value.clone()),
            None => FieldValue::Undefined,
        }
    }
}
