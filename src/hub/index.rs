use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{
    sublist::{merge, SubList},
    SubId, Subscription,
};
use crate::{Topic, ANY};

/// Многоуровневый индекс подписок.
///
/// Подписка с атрибутами `{k1=v1, k2=v2}` лежит в `all`, в
/// `by_key_value[k1][v1]`, `by_key_value[k2][v2]`, `by_key[k1]` и
/// `by_key[k2]`. Подписка без атрибутов лежит в `all` и `empty`.
/// Опустевшие корзины удаляются сразу.
#[derive(Debug, Default)]
pub(crate) struct Index {
    all: SubList,
    /// Точные пары ключ/значение (включая значение `*`)
    by_key_value: FxHashMap<String, FxHashMap<String, SubList>>,
    /// Все подписки, упоминающие ключ, с любым значением
    by_key: FxHashMap<String, SubList>,
    /// Подписки без атрибутов
    empty: SubList,
    capacity: usize,
}

impl Index {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            all: SubList::with_capacity(capacity),
            capacity,
            ..Self::default()
        }
    }

    pub fn insert(
        &mut self,
        sub: Arc<Subscription>,
    ) {
        for attr in sub.topic() {
            self.by_key_value
                .entry(attr.key().to_owned())
                .or_default()
                .entry(attr.value().to_owned())
                .or_default()
                .add(Arc::clone(&sub));

            self.by_key
                .entry(attr.key().to_owned())
                .or_default()
                .add(Arc::clone(&sub));
        }

        if sub.topic().is_empty() {
            self.empty.add(Arc::clone(&sub));
        }

        self.all.add(sub);
    }

    /// Удаляет подписку из всех структур. Неизвестный id — не ошибка.
    pub fn remove(
        &mut self,
        id: SubId,
    ) -> Option<Arc<Subscription>> {
        let sub = self.all.remove(id)?;

        for attr in sub.topic() {
            if let Some(values) = self.by_key_value.get_mut(attr.key()) {
                if let Some(sl) = values.get_mut(attr.value()) {
                    sl.remove(id);
                    if sl.is_empty() {
                        values.remove(attr.value());
                    }
                }
                if values.is_empty() {
                    self.by_key_value.remove(attr.key());
                }
            }

            if let Some(sl) = self.by_key.get_mut(attr.key()) {
                sl.remove(id);
                if sl.is_empty() {
                    self.by_key.remove(attr.key());
                }
            }
        }

        if sub.topic().is_empty() {
            self.empty.remove(id);
        }

        Some(sub)
    }

    /// Заменяет все структуры пустыми.
    pub fn clear(&mut self) {
        *self = Self::with_capacity(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn contains(
        &self,
        id: SubId,
    ) -> bool {
        self.all.find(id).is_some()
    }

    /// Корзины, в которых могут найтись подписки для события с топиком
    /// `topic`.
    ///
    /// Для значения `*` в событии берётся вся корзина ключа; иначе
    /// точное значение и шаблон `*` подписчиков. Подписки без атрибутов
    /// подходят всегда.
    pub fn candidates<'a>(
        &'a self,
        topic: &Topic,
    ) -> Vec<&'a SubList> {
        let mut candidates = Vec::with_capacity(topic.len() * 2 + 1);

        for attr in topic {
            if attr.is_any() {
                if let Some(sl) = self.by_key.get(attr.key()) {
                    candidates.push(sl);
                }
                continue;
            }

            if let Some(values) = self.by_key_value.get(attr.key()) {
                if let Some(sl) = values.get(attr.value()) {
                    candidates.push(sl);
                }
                if let Some(sl) = values.get(ANY) {
                    candidates.push(sl);
                }
            }
        }

        if !self.empty.is_empty() {
            candidates.push(&self.empty);
        }

        candidates
    }

    /// Подписки, чей шаблон удовлетворяет `topic`, по возрастанию id.
    ///
    /// Индекс сужает выборку, но может дать ложные кандидаты (подписка с
    /// несколькими атрибутами, из которых совпал только один), поэтому
    /// каждый кандидат проверяется полным `Topic::matches`.
    pub fn matches<'a>(
        &'a self,
        topic: &'a Topic,
    ) -> impl Iterator<Item = &'a Arc<Subscription>> + 'a {
        merge(self.candidates(topic)).filter(move |sub| sub.topic().matches(topic))
    }

    #[cfg(test)]
    pub fn key_value_bucket(
        &self,
        key: &str,
        value: &str,
    ) -> Option<&SubList> {
        self.by_key_value.get(key)?.get(value)
    }

    #[cfg(test)]
    pub fn key_bucket(
        &self,
        key: &str,
    ) -> Option<&SubList> {
        self.by_key.get(key)
    }

    #[cfg(test)]
    pub fn empty_len(&self) -> usize {
        self.empty.len()
    }

    /// Количество корзин каждого уровня: (ключи в `by_key_value`,
    /// корзины значений, `by_key`).
    #[cfg(test)]
    pub fn bucket_counts(&self) -> (usize, usize, usize) {
        let values = self.by_key_value.values().map(|v| v.len()).sum();
        (self.by_key_value.len(), values, self.by_key.len())
    }
}
