//! 类模型
//!
//! `Class` 是不可变的类型对象：声明字段、构造函数、原型方法、类型方法，
//! 以及组合时请求的能力列表。派生类总是新建，从不修改已有的类。

use crate::capabilities::registry::CapabilityRegistry;
use crate::core::instance::Instance;
use crate::core::metadata::{self, FieldMetadata, FieldOptions};
use crate::types::*;
use crate::{ForgeError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 实例方法
pub type MethodFn = Arc<dyn Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync>;

/// 类型方法（静态方法），以所属类和一个参数构造实例
pub type TypeMethodFn = Arc<dyn Fn(&Class, &Value) -> Result<Instance> + Send + Sync>;

/// 构造函数：在字段声明之后运行
pub type ConstructorFn = Arc<dyn Fn(&mut Instance, &[Value]) + Send + Sync>;

/// 原型方法表
#[derive(Clone, Default)]
pub struct Prototype {
    methods: HashMap<String, MethodFn>,
}

impl Prototype {
    /// 定义方法：不存在则新增，存在则覆盖。返回是否发生了覆盖
    pub fn define<F>(&mut self, name: &str, method: F) -> bool
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let replaced = self
            .methods
            .insert(name.to_string(), Arc::new(method))
            .is_some();
        if replaced {
            debug!("Method '{}' overwritten", name);
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// 方法名（排序后）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// 类型方法表
#[derive(Clone, Default)]
pub struct TypeTable {
    methods: HashMap<String, TypeMethodFn>,
}

impl TypeTable {
    /// 定义类型方法，语义同 [`Prototype::define`]
    pub fn define<F>(&mut self, name: &str, method: F) -> bool
    where
        F: Fn(&Class, &Value) -> Result<Instance> + Send + Sync + 'static,
    {
        let replaced = self
            .methods
            .insert(name.to_string(), Arc::new(method))
            .is_some();
        if replaced {
            debug!("Type method '{}' overwritten", name);
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&TypeMethodFn> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

struct ClassInner {
    id: ClassId,
    name: String,
    parent: Option<Class>,
    fields: Vec<FieldDecl>,
    constructor: Option<ConstructorFn>,
    prototype: Prototype,
    type_table: TypeTable,
    /// 组合时请求的能力（按顺序）
    features: Vec<CapabilityName>,
    /// 构造时解析初始化钩子所用的注册表
    registry: Option<CapabilityRegistry>,
}

impl Drop for ClassInner {
    fn drop(&mut self) {
        metadata::forget(self.id);
    }
}

/// 类句柄，克隆代价很低
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    pub fn id(&self) -> ClassId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&Class> {
        self.inner.parent.as_ref()
    }

    /// 自身及所有祖先（由近到远）
    pub fn ancestry(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |class| class.parent())
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ancestry().any(|class| class.id() == other.id())
    }

    /// 组合时请求的能力名
    pub fn features(&self) -> &[CapabilityName] {
        &self.inner.features
    }

    /// 本类自己声明的字段
    pub fn declared_fields(&self) -> &[FieldDecl] {
        &self.inner.fields
    }

    /// 沿继承链查找字段声明（近者优先）
    pub fn field_decl(&self, name: &str) -> Option<&FieldDecl> {
        self.ancestry()
            .find_map(|class| class.inner.fields.iter().find(|decl| decl.name == name))
    }

    /// 字段声明类型，未声明的字段视为普通值
    pub fn field_kind(&self, name: &str) -> FieldKind {
        self.field_decl(name)
            .map(|decl| decl.kind)
            .unwrap_or_default()
    }

    pub fn metadata(&self) -> FieldMetadata {
        metadata::read(self)
    }

    /// 本类自己的原型方法
    pub fn own_methods(&self) -> &Prototype {
        &self.inner.prototype
    }

    /// 本类自己的类型方法
    pub fn own_type_methods(&self) -> &TypeTable {
        &self.inner.type_table
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodFn> {
        self.ancestry()
            .find_map(|class| class.inner.prototype.get(name))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.find_method(name).is_some()
    }

    pub fn find_type_method(&self, name: &str) -> Option<&TypeMethodFn> {
        self.ancestry()
            .find_map(|class| class.inner.type_table.get(name))
    }

    pub fn has_type_method(&self, name: &str) -> bool {
        self.find_type_method(name).is_some()
    }

    /// 以给定参数构造实例
    pub fn instantiate(&self, args: &[Value]) -> Instance {
        let mut instance = Instance::bare(self.clone());
        self.initialize(&mut instance, args);
        instance
    }

    /// 零参数构造
    pub fn new_instance(&self) -> Instance {
        self.instantiate(&[])
    }

    /// 构造链：父类 → 字段声明 → 构造函数 → 能力初始化钩子
    fn initialize(&self, instance: &mut Instance, args: &[Value]) {
        if let Some(parent) = &self.inner.parent {
            parent.initialize(instance, args);
        }

        for decl in &self.inner.fields {
            instance.set(&decl.name, decl.initial_slot());
        }

        if let Some(constructor) = &self.inner.constructor {
            constructor(instance, args);
        }

        if let Some(registry) = &self.inner.registry {
            for name in &self.inner.features {
                // 描述符在锁外调用
                let Some(descriptor) = registry.lookup(name) else {
                    continue;
                };
                if let Some(hook) = descriptor.on_instance_init() {
                    hook(instance);
                }
            }
        }
    }

    /// 调用类型方法
    pub fn call_type_method(&self, name: &str, arg: &Value) -> Result<Instance> {
        let method = self
            .find_type_method(name)
            .ok_or_else(|| ForgeError::method_not_found(self.name(), name))?;
        method(self, arg)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(Class::name))
            .field("fields", &self.inner.fields)
            .field("methods", &self.inner.prototype)
            .field("type_methods", &self.inner.type_table)
            .field("features", &self.inner.features)
            .finish()
    }
}

/// 类构建器 - 在定义时一次性声明字段及其元数据
pub struct ClassBuilder {
    name: String,
    parent: Option<Class>,
    fields: Vec<FieldDecl>,
    annotations: Vec<(String, FieldOptions)>,
    constructor: Option<ConstructorFn>,
    prototype: Prototype,
    type_table: TypeTable,
    features: Vec<CapabilityName>,
    registry: Option<CapabilityRegistry>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            fields: Vec::new(),
            annotations: Vec::new(),
            constructor: None,
            prototype: Prototype::default(),
            type_table: TypeTable::default(),
            features: Vec::new(),
            registry: None,
        }
    }

    pub fn extends(mut self, parent: &Class) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// 声明未初始化字段
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDecl::new(name, kind));
        self
    }

    /// 声明字段并附加元数据
    pub fn field_with(mut self, name: &str, kind: FieldKind, options: FieldOptions) -> Self {
        self.fields.push(FieldDecl::new(name, kind));
        self.annotations.push((name.to_string(), options));
        self
    }

    /// 声明带初始值的字段
    pub fn field_decl(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    /// 只附加元数据，不声明字段
    pub fn annotate(mut self, name: &str, options: FieldOptions) -> Self {
        self.annotations.push((name.to_string(), options));
        self
    }

    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.prototype.define(name, method);
        self
    }

    pub fn type_method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&Class, &Value) -> Result<Instance> + Send + Sync + 'static,
    {
        self.type_table.define(name, method);
        self
    }

    pub(crate) fn with_capabilities(
        mut self,
        features: Vec<CapabilityName>,
        registry: CapabilityRegistry,
    ) -> Self {
        self.features = features;
        self.registry = Some(registry);
        self
    }

    pub(crate) fn prototype_mut(&mut self) -> &mut Prototype {
        &mut self.prototype
    }

    pub(crate) fn type_table_mut(&mut self) -> &mut TypeTable {
        &mut self.type_table
    }

    /// 生成类并写入字段元数据
    pub fn build(self) -> Class {
        let class = Class {
            inner: Arc::new(ClassInner {
                id: Uuid::new_v4(),
                name: self.name,
                parent: self.parent,
                fields: self.fields,
                constructor: self.constructor,
                prototype: self.prototype,
                type_table: self.type_table,
                features: self.features,
                registry: self.registry,
            }),
        };

        for (field, options) in self.annotations {
            metadata::annotate(&class, &field, options);
        }

        debug!("Built class '{}' ({})", class.name(), class.id());
        class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point_class() -> Class {
        ClassBuilder::new("Point")
            .field("x", FieldKind::Plain)
            .field("y", FieldKind::Plain)
            .field_decl(FieldDecl::new("label", FieldKind::Optional).with_initializer(json!(null)))
            .constructor(|instance, args| {
                if let Some(x) = args.first() {
                    instance.set("x", x.clone());
                }
                if let Some(y) = args.get(1) {
                    instance.set("y", y.clone());
                }
            })
            .method("sum", |instance, _args| {
                let x = instance.value("x").and_then(Value::as_i64).unwrap_or(0);
                let y = instance.value("y").and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(x + y))
            })
            .build()
    }

    #[test]
    fn test_instantiate_runs_constructor() {
        let class = point_class();
        let point = class.instantiate(&[json!(2), json!(3)]);

        assert_eq!(point.value("x"), Some(&json!(2)));
        assert_eq!(point.get("label"), Some(&FieldValue::none()));
        assert_eq!(point.call("sum", &[]).unwrap(), json!(5));
    }

    #[test]
    fn test_declared_fields_start_undefined() {
        let point = point_class().new_instance();

        assert!(point.has_field("x"));
        assert!(point.get("x").unwrap().is_undefined());
        let names: Vec<&str> = point.field_names().collect();
        assert_eq!(names, vec!["x", "y", "label"]);
    }

    #[test]
    fn test_subclass_chain() {
        let base = point_class();
        let child = ClassBuilder::new("Point3")
            .extends(&base)
            .field("z", FieldKind::Plain)
            .build();

        let point = child.instantiate(&[json!(1), json!(1)]);
        assert_eq!(point.call("sum", &[]).unwrap(), json!(2));
        assert!(point.has_field("z"));
        assert!(child.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&child));
        assert_eq!(child.field_kind("label"), FieldKind::Optional);
        assert_eq!(child.field_kind("unknown"), FieldKind::Plain);
        assert!(child.own_methods().is_empty());
    }

    #[test]
    fn test_missing_type_method() {
        let class = point_class();
        let result = class.call_type_method("deserialize", &Value::Object(Record::new()));
        assert!(matches!(result, Err(ForgeError::MethodNotFound { .. })));
    }

    #[test]
    fn test_prototype_define_overwrites() {
        let mut prototype = Prototype::default();
        assert!(!prototype.define("greet", |_, _| Ok(json!("hi"))));
        assert!(prototype.define("greet", |_, _| Ok(json!("hello"))));
        assert_eq!(prototype.len(), 1);
        assert_eq!(prototype.names(), vec!["greet"]);
    }

    #[test]
    fn test_type_method_dispatch() {
        let class = ClassBuilder::new("Counter")
            .field("count", FieldKind::Plain)
            .type_method("starting_at", |class, arg| {
                let mut instance = class.new_instance();
                instance.set("count", arg.clone());
                Ok(instance)
            })
            .build();

        let counter = class.call_type_method("starting_at", &json!(9)).unwrap();
        assert_eq!(counter.value("count"), Some(&json!(9)));
        assert!(class.has_type_method("starting_at"));
        assert_eq!(counter.class(), &class);
    }
}
