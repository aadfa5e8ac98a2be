//! 两态值匹配器
//!
//! 对 `Option` 与 `Result` 做分支：链式 `on(value).some(..).none(..).default(..)`，
//! 或一次性传入 [`Pattern`] 的 `match_with`。第一个适用的处理器生效，之后同类
//! 处理器不再执行。

use crate::{ForgeError, Result};
use std::convert::Infallible;

/// 两态值的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant<T, E> {
    Some(T),
    None,
    Ok(T),
    Err(E),
}

/// 可匹配的两态值
pub trait Matchable {
    type Value;
    type Error;

    fn into_variant(self) -> Variant<Self::Value, Self::Error>;
}

impl<T> Matchable for Option<T> {
    type Value = T;
    type Error = Infallible;

    fn into_variant(self) -> Variant<T, Infallible> {
        match self {
            Some(value) => Variant::Some(value),
            None => Variant::None,
        }
    }
}

impl<T, E> Matchable for std::result::Result<T, E> {
    type Value = T;
    type Error = E;

    fn into_variant(self) -> Variant<T, E> {
        match self {
            Ok(value) => Variant::Ok(value),
            Err(error) => Variant::Err(error),
        }
    }
}

/// 链式匹配器
pub struct Matcher<T, E, R> {
    variant: Option<Variant<T, E>>,
    result: Option<R>,
}

/// 开始匹配
pub fn on<M: Matchable, R>(value: M) -> Matcher<M::Value, M::Error, R> {
    Matcher {
        variant: Some(value.into_variant()),
        result: None,
    }
}

impl<T, E, R> Matcher<T, E, R> {
    /// 尚无结果且状态满足时取出值
    fn take_if(&mut self, accepts: fn(&Variant<T, E>) -> bool) -> Option<Variant<T, E>> {
        if self.result.is_some() {
            return None;
        }
        match &self.variant {
            Some(variant) if accepts(variant) => self.variant.take(),
            _ => None,
        }
    }

    pub fn some<F: FnOnce(T) -> R>(mut self, handler: F) -> Self {
        if let Some(Variant::Some(value)) = self.take_if(|v| matches!(v, Variant::Some(_))) {
            self.result = Some(handler(value));
        }
        self
    }

    pub fn none<F: FnOnce() -> R>(mut self, handler: F) -> Self {
        if let Some(Variant::None) = self.take_if(|v| matches!(v, Variant::None)) {
            self.result = Some(handler());
        }
        self
    }

    pub fn ok<F: FnOnce(T) -> R>(mut self, handler: F) -> Self {
        if let Some(Variant::Ok(value)) = self.take_if(|v| matches!(v, Variant::Ok(_))) {
            self.result = Some(handler(value));
        }
        self
    }

    pub fn err<F: FnOnce(E) -> R>(mut self, handler: F) -> Self {
        if let Some(Variant::Err(error)) = self.take_if(|v| matches!(v, Variant::Err(_))) {
            self.result = Some(handler(error));
        }
        self
    }

    pub fn is_matched(&self) -> bool {
        self.result.is_some()
    }

    /// 返回已匹配的结果，否则调用 `fallback`
    pub fn default<F: FnOnce() -> R>(self, fallback: F) -> R {
        self.result.unwrap_or_else(fallback)
    }

    /// 返回已匹配的结果，否则报 `NoMatchingPattern`
    pub fn resolve(self) -> Result<R> {
        self.result.ok_or(ForgeError::NoMatchingPattern)
    }
}

type Handler<'a, A, R> = Box<dyn FnOnce(A) -> R + 'a>;
type Thunk<'a, R> = Box<dyn FnOnce() -> R + 'a>;

/// 具名处理器集合
pub struct Pattern<'a, T, E, R> {
    some: Option<Handler<'a, T, R>>,
    none: Option<Thunk<'a, R>>,
    ok: Option<Handler<'a, T, R>>,
    err: Option<Handler<'a, E, R>>,
    default: Option<Thunk<'a, R>>,
}

impl<'a, T, E, R> Pattern<'a, T, E, R> {
    pub fn new() -> Self {
        Self {
            some: None,
            none: None,
            ok: None,
            err: None,
            default: None,
        }
    }

    pub fn some(mut self, handler: impl FnOnce(T) -> R + 'a) -> Self {
        self.some = Some(Box::new(handler));
        self
    }

    pub fn none(mut self, handler: impl FnOnce() -> R + 'a) -> Self {
        self.none = Some(Box::new(handler));
        self
    }

    pub fn ok(mut self, handler: impl FnOnce(T) -> R + 'a) -> Self {
        self.ok = Some(Box::new(handler));
        self
    }

    pub fn err(mut self, handler: impl FnOnce(E) -> R + 'a) -> Self {
        self.err = Some(Box::new(handler));
        self
    }

    pub fn default(mut self, handler: impl FnOnce() -> R + 'a) -> Self {
        self.default = Some(Box::new(handler));
        self
    }
}

impl<'a, T, E, R> Default for Pattern<'a, T, E, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// 按具名处理器匹配：状态处理器优先，其次 `default`，都没有时报错
pub fn match_with<M: Matchable, R>(
    value: M,
    pattern: Pattern<'_, M::Value, M::Error, R>,
) -> Result<R> {
    let handled = match value.into_variant() {
        Variant::Some(value) => pattern.some.map(|handler| handler(value)),
        Variant::None => pattern.none.map(|handler| handler()),
        Variant::Ok(value) => pattern.ok.map(|handler| handler(value)),
        Variant::Err(error) => pattern.err.map(|handler| handler(error)),
    };

    match handled {
        Some(result) => Ok(result),
        None => pattern
            .default
            .map(|handler| handler())
            .ok_or(ForgeError::NoMatchingPattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::compose::compose;
    use crate::capabilities::serialization::DESERIALIZE;
    use crate::core::class::ClassBuilder;
    use crate::core::metadata::FieldOptions;
    use crate::types::FieldKind;

    #[test]
    fn test_first_matching_handler_wins() {
        let result = on(Some(42))
            .some(|v| v + 1)
            .some(|v| v * 2)
            .none(|| 0)
            .default(|| -1);
        assert_eq!(result, 43);
    }

    #[test]
    fn test_none_and_default() {
        let empty: Option<i32> = None;
        assert_eq!(on(empty).some(|v| v).none(|| 0).default(|| -1), 0);
        assert_eq!(on(empty).some(|v| v).default(|| -1), -1);
    }

    #[test]
    fn test_result_handlers() {
        let success: std::result::Result<i32, String> = Ok(2);
        let failure: std::result::Result<i32, String> = Err("boom".to_string());

        assert_eq!(on(success).ok(|v| v * 10).err(|_| 0).default(|| -1), 20);
        assert_eq!(
            on(failure).ok(|v| v.to_string()).err(|e| e.to_uppercase()).default(String::new),
            "BOOM"
        );
    }

    #[test]
    fn test_option_never_matches_result_handlers() {
        let matcher = on(Some(1)).ok(|v| v).err(|_| 0);
        assert!(!matcher.is_matched());
        assert!(matches!(matcher.resolve(), Err(ForgeError::NoMatchingPattern)));
    }

    #[test]
    fn test_resolve_after_match() {
        assert_eq!(on(Some("x")).some(|v| v.len()).resolve().unwrap(), 1);
    }

    #[test]
    fn test_pattern_fallthrough_to_default() {
        let result = match_with(Some(42), Pattern::new().default(|| "D"));
        assert_eq!(result.unwrap(), "D");
    }

    #[test]
    fn test_pattern_state_handler_precedes_default() {
        let result = match_with(Some(42), Pattern::new().some(|v: i32| v * 2).default(|| 0));
        assert_eq!(result.unwrap(), 84);

        let failure: std::result::Result<i32, &str> = Err("bad");
        let result = match_with(failure, Pattern::new().ok(|v: i32| v).err(|e: &str| e.len() as i32));
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_empty_pattern_fails_for_every_value() {
        let cases: Vec<Result<()>> = vec![
            match_with(Some(1), Pattern::new()),
            match_with(None::<i32>, Pattern::new()),
            match_with(Ok::<i32, ()>(1), Pattern::new()),
            match_with(Err::<i32, ()>(()), Pattern::new()),
        ];
        for case in cases {
            assert!(matches!(case, Err(ForgeError::NoMatchingPattern)));
        }
    }

    #[test]
    fn test_match_on_optional_field() {
        let base = ClassBuilder::new("Profile")
            .field_with("nickname", FieldKind::Optional, FieldOptions::new().default_value("ada"))
            .build();
        let profile = compose(&base, &[DESERIALIZE]).new_instance();

        let greeting = on(profile.optional("nickname").flatten())
            .some(|name| format!("hi {}", name.as_str().unwrap_or_default()))
            .none(|| "hi stranger".to_string())
            .default(String::new);
        assert_eq!(greeting, "hi ada");

        let label = match_with(
            profile.optional("missing").flatten(),
            Pattern::new().some(|_| "set").none(|| "unset"),
        );
        assert_eq!(label.unwrap(), "unset");
    }
}
