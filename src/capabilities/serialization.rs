//! 序列化 / 反序列化能力
//!
//! - `Serialize` 安装实例方法 `serialize`：实例 → 记录，应用 rename 和 transform。
//! - `Deserialize` 安装类型方法 `deserialize`（按 rename 映射）和 `from`
//!   （按同名字段复制，不查 rename），并在每次构造时填充字段默认值。
//!
//! 格式是宽松的：多余的键被忽略，缺失的键保持构造时的值，这里的操作都不会失败。

use crate::capabilities::registry::{CapabilityDescriptor, CapabilityRegistry};
use crate::core::class::Class;
use crate::core::instance::Instance;
use crate::core::metadata;
use crate::types::{FieldValue, Record, Value};
use crate::{ForgeError, Result};
use tracing::debug;

/// 序列化能力名
pub const SERIALIZE: &str = "Serialize";
/// 反序列化能力名
pub const DESERIALIZE: &str = "Deserialize";

pub const SERIALIZE_METHOD: &str = "serialize";
pub const DESERIALIZE_METHOD: &str = "deserialize";
pub const FROM_METHOD: &str = "from";

/// 经由已安装的 `serialize` 方法把实例转为记录
pub trait SerializeRecord {
    /// 未组合 `Serialize` 能力时返回 `MethodNotFound`
    fn serialize(&self) -> Result<Record>;
}

impl SerializeRecord for Instance {
    fn serialize(&self) -> Result<Record> {
        match self.call(SERIALIZE_METHOD, &[])? {
            Value::Object(record) => Ok(record),
            other => Err(ForgeError::invalid_argument(&format!(
                "serialize returned a non-record value: {}",
                other
            ))),
        }
    }
}

/// 经由已安装的 `deserialize` / `from` 类型方法构造实例
pub trait DeserializeRecord {
    fn deserialize(&self, data: &Record) -> Result<Instance>;

    /// 按同名字段复制，不查 rename
    fn from_object(&self, source: &Value) -> Result<Instance>;
}

impl DeserializeRecord for Class {
    fn deserialize(&self, data: &Record) -> Result<Instance> {
        self.call_type_method(DESERIALIZE_METHOD, &Value::Object(data.clone()))
    }

    fn from_object(&self, source: &Value) -> Result<Instance> {
        self.call_type_method(FROM_METHOD, source)
    }
}

/// `Serialize` 能力描述符
pub fn serialize_descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::new(SERIALIZE).with_instance_behavior(|prototype| {
        prototype.define(SERIALIZE_METHOD, |instance, _args| {
            Ok(Value::Object(serialize_instance(instance)))
        });
    })
}

/// `Deserialize` 能力描述符
pub fn deserialize_descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::new(DESERIALIZE)
        .with_type_behavior(|type_table| {
            type_table.define(DESERIALIZE_METHOD, |class, data| Ok(deserialize_record(class, data)));
            type_table.define(FROM_METHOD, |class, source| Ok(copy_from(class, source)));
        })
        .with_instance_init(apply_field_defaults)
}

/// 注册内置能力
pub fn register_builtin(registry: &CapabilityRegistry) -> Result<()> {
    registry.register(serialize_descriptor())?;
    registry.register(deserialize_descriptor())?;
    Ok(())
}

/// 实例 → 记录
///
/// 未定义字段不输出；可选包装值被展开为内部值或 `null`，transform 作用于展开后的值。
pub fn serialize_instance(instance: &Instance) -> Record {
    let metadata = metadata::read(instance.class());
    let mut record = Record::new();

    for (name, slot) in instance.fields() {
        let Some(value) = slot.to_record_value() else {
            continue;
        };
        match metadata.get(name) {
            Some(options) => {
                record.insert(
                    options.external_key(name).to_string(),
                    options.apply_transform(value),
                );
            }
            None => {
                record.insert(name.to_string(), value);
            }
        }
    }

    record
}

/// 记录 → 实例
///
/// 先零参数构造（默认值在此时生效），再赋值：优先取 rename 键，缺失时回退到字段
/// 原名。被 rename 占用的键只写入声明 rename 的字段；transform 不会被反向应用。
pub fn deserialize_record(class: &Class, data: &Value) -> Instance {
    let mut instance = class.new_instance();
    let Some(record) = data.as_object() else {
        debug!("Non-record payload for '{}' treated as empty", class.name());
        return instance;
    };

    let metadata = metadata::read(class);

    let mut targets: Vec<String> = instance.field_names().map(str::to_string).collect();
    for (field, _) in metadata.iter() {
        if !targets.iter().any(|target| target == field) {
            targets.push(field.to_string());
        }
    }

    for field in &targets {
        let renamed = metadata
            .get(field)
            .and_then(|options| options.rename.as_deref())
            .and_then(|key| record.get(key));

        // 同名键被其他字段的 rename 占用时只归那个字段
        let value = renamed.or_else(|| match metadata.rename_owner(field) {
            Some(owner) if owner != field.as_str() => None,
            _ => record.get(field.as_str()),
        });

        if let Some(value) = value {
            instance.assign(field, value.clone());
        }
    }

    instance
}

/// 按同名字段从源对象复制
///
/// 只复制目标实例上已存在的字段，不查 rename。
pub fn copy_from(class: &Class, source: &Value) -> Instance {
    let mut instance = class.new_instance();
    let Some(object) = source.as_object() else {
        debug!("Non-object source for '{}' ignored", class.name());
        return instance;
    };

    for (key, value) in object {
        if instance.has_field(key) {
            instance.assign(key, value.clone());
        }
    }

    instance
}

/// 为未定义的字段填充声明的默认值
pub fn apply_field_defaults(instance: &mut Instance) {
    let metadata = metadata::read(instance.class());

    for (field, options) in metadata.iter() {
        let Some(default) = &options.default else {
            continue;
        };
        let missing = instance.get(field).map_or(true, FieldValue::is_undefined);
        if missing {
            instance.assign(field, default.produce());
        }
    }
}
