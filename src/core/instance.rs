//! 类实例

use crate::core::class::Class;
use crate::types::*;
use crate::{ForgeError, Result};
use std::fmt;

/// 类实例：所属类 + 按插入顺序排列的自有字段
#[derive(Clone)]
pub struct Instance {
    class: Class,
    fields: Vec<(String, FieldValue)>,
}

impl Instance {
    pub(crate) fn bare(class: Class) -> Self {
        Self {
            class,
            fields: Vec::new(),
        }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// 普通值或可选字段中持有的值
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_value)
    }

    /// 可选字段的内容；字段不是可选包装时返回 `None`
    pub fn optional(&self, name: &str) -> Option<Option<&Value>> {
        match self.get(name)? {
            FieldValue::Optional(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// 写入字段槽位；已有字段保持原位置
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// 按字段声明类型写入外部值（可选字段会被包装）
    pub fn assign(&mut self, name: &str, value: Value) {
        let slot = self.class.field_kind(name).coerce(value);
        self.set(name, slot);
    }

    pub fn responds_to(&self, method: &str) -> bool {
        self.class.has_method(method)
    }

    /// 调用原型方法
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let function = self
            .class
            .find_method(method)
            .ok_or_else(|| ForgeError::method_not_found(self.class.name(), method))?;
        function(self, args)
    }

    /// 以字段原名展开为普通对象，可作为 `from` 的源
    pub fn to_object(&self) -> Value {
        let record: Record = self
            .fields
            .iter()
            .filter_map(|(name, slot)| slot.to_record_value().map(|value| (name.clone(), value)))
            .collect();
        Value::Object(record)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.fields == other.fields
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.class.name());
        for (name, value) in &self.fields {
            debug.field(name, value);
        }
        debug.finish()
    }
}
