use std::{
    any::{type_name, Any},
    fmt,
    sync::Arc,
};

/// Полезная нагрузка события произвольного типа.
///
/// Хаб не заглядывает внутрь: значение только передаётся обработчикам.
/// Клонирование увеличивает счётчик ссылок, данные не копируются.
#[derive(Clone, Default)]
pub struct Payload {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
            type_name: type_name::<T>(),
        }
    }

    /// Пустая нагрузка.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.as_deref().is_some_and(|v| v.is::<T>())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone()?.downcast::<T>().ok()
    }

    /// Имя типа значения, `"()"` для пустой нагрузки.
    pub fn type_name(&self) -> &'static str {
        if self.value.is_some() {
            self.type_name
        } else {
            "()"
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.type_name()).finish()
    }
}
