use std::sync::Arc;

use super::{SubId, Subscription};

/// Список подписок, упорядоченный по возрастанию [`SubId`].
///
/// Поиск двоичный, вставка и удаление сдвигают хвост. Уникальность id
/// обеспечивает вызывающий код: сам список дубли не отсекает.
#[derive(Debug, Default, Clone)]
pub(crate) struct SubList {
    subs: Vec<Arc<Subscription>>,
}

impl SubList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subs: Vec::with_capacity(capacity),
        }
    }

    /// Первая позиция с id >= `id`.
    fn lower_bound(
        &self,
        id: SubId,
    ) -> usize {
        self.subs.partition_point(|s| s.id() < id)
    }

    pub fn add(
        &mut self,
        sub: Arc<Subscription>,
    ) {
        let idx = self.lower_bound(sub.id());
        self.subs.insert(idx, sub);
    }

    /// Удаляет подписку по id. Отсутствующий id игнорируется.
    pub fn remove(
        &mut self,
        id: SubId,
    ) -> Option<Arc<Subscription>> {
        let idx = self.find(id)?;
        Some(self.subs.remove(idx))
    }

    pub fn find(
        &self,
        id: SubId,
    ) -> Option<usize> {
        let idx = self.lower_bound(id);
        match self.subs.get(idx) {
            Some(sub) if sub.id() == id => Some(idx),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub fn as_slice(&self) -> &[Arc<Subscription>] {
        &self.subs
    }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<u64> {
        self.subs.iter().map(|s| s.id().get()).collect()
    }
}

/// Ленивое k-путевое слияние упорядоченных списков.
///
/// Выдаёт каждую подписку один раз в порядке возрастания id, даже если она
/// лежит в нескольких списках. Потребитель может остановиться в любой
/// момент, оставшиеся элементы не просматриваются.
pub(crate) struct MergeIter<'a> {
    lists: Vec<&'a [Arc<Subscription>]>,
    cursors: Vec<usize>,
    last: Option<SubId>,
}

pub(crate) fn merge<'a>(lists: Vec<&'a SubList>) -> MergeIter<'a> {
    let lists: Vec<_> = lists
        .into_iter()
        .map(SubList::as_slice)
        .filter(|l| !l.is_empty())
        .collect();
    let cursors = vec![0; lists.len()];
    MergeIter {
        lists,
        cursors,
        last: None,
    }
}

impl<'a> Iterator for MergeIter<'a> {
    type Item = &'a Arc<Subscription>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Списков мало (атрибуты события + 1), линейный выбор
            // минимума дешевле кучи.
            let mut smallest: Option<(usize, &'a Arc<Subscription>)> = None;
            for (i, &list) in self.lists.iter().enumerate() {
                if let Some(sub) = list.get(self.cursors[i]) {
                    if smallest.is_none_or(|(_, s)| sub.id() < s.id()) {
                        smallest = Some((i, sub));
                    }
                }
            }

            let (i, sub) = smallest?;
            self.cursors[i] += 1;

            if self.last == Some(sub.id()) {
                continue;
            }
            self.last = Some(sub.id());
            return Some(sub);
        }
    }
}
