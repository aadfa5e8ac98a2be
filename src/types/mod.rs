//! FeatureForge 核心数据类型模块
//!
//! 动态值模型：实例字段、记录以及可选包装值的统一表示

pub mod field;

// 重新导出所有公共类型
pub use field::*;

use serde_json::Map;

/// 统一的动态值类型
pub type Value = serde_json::Value;

/// 键值记录 - 序列化的输出与反序列化的输入（保持插入顺序）
pub type Record = Map<String, Value>;

/// 类唯一标识符
pub type ClassId = uuid::Uuid;

/// 能力名称
pub type CapabilityName = String;

/// 可选包装能力
///
/// 序列化器只通过这个契约识别"可选值"，而不是依赖某个具体类型。
pub trait OptionLike {
    /// 是否持有值
    fn is_present(&self) -> bool;

    /// 取出内部值，缺失时返回 `fallback`
    fn value_or(&self, fallback: Value) -> Value;
}

impl OptionLike for Option<Value> {
    fn is_present(&self) -> bool {
        self.is_some()
    }

    fn value_or(&self, fallback: Value) -> Value {
        self.clone().unwrap_or(fallback)
    }
}

/// 实例字段槽位
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// 已声明但从未赋值
    #[default]
    Undefined,
    /// 普通值
    Value(Value),
    /// 可选包装值
    Optional(Option<Value>),
}

impl FieldValue {
    /// 构造持有值的可选字段
    pub fn some(value: impl Into<Value>) -> Self {
        Self::Optional(Some(value.into()))
    }

    /// 构造空的可选字段
    pub fn none() -> Self {
        Self::Optional(None)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// 普通值或可选字段中的值
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Optional(inner) => inner.as_ref(),
            Self::Undefined => None,
        }
    }

    /// 可选包装能力检查
    pub fn as_option_like(&self) -> Option<&dyn OptionLike> {
        match self {
            Self::Optional(inner) => Some(inner),
            _ => None,
        }
    }

    /// 转换为记录中的值；未定义字段返回 `None`
    pub fn to_record_value(&self) -> Option<Value> {
        if let Some(option) = self.as_option_like() {
            return Some(option.value_or(Value::Null));
        }
        match self {
            Self::Value(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Option<Value>> for FieldValue {
    fn from(value: Option<Value>) -> Self {
        Self::Optional(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_like_unwrap() {
        let present: Option<Value> = Some(json!(7));
        let empty: Option<Value> = None;

        assert!(present.is_present());
        assert_eq!(present.value_or(Value::Null), json!(7));
        assert!(!empty.is_present());
        assert_eq!(empty.value_or(json!("fallback")), json!("fallback"));
    }

    #[test]
    fn test_field_value_record_conversion() {
        assert_eq!(FieldValue::from(json!("a")).to_record_value(), Some(json!("a")));
        assert_eq!(FieldValue::some(3).to_record_value(), Some(json!(3)));
        assert_eq!(FieldValue::none().to_record_value(), Some(Value::Null));
        assert_eq!(FieldValue::Undefined.to_record_value(), None);
    }

    #[test]
    fn test_only_optional_is_option_like() {
        assert!(FieldValue::none().as_option_like().is_some());
        assert!(FieldValue::from(json!(null)).as_option_like().is_none());
        assert!(FieldValue::Undefined.as_option_like().is_none());
    }
}
