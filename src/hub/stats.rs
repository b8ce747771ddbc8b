use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::subscription::Delivery;

/// Счётчики доставки хаба.
#[derive(Debug, Default)]
pub struct HubStats {
    /// Количество вызовов `publish`
    published: AtomicU64,
    /// Успешные вызовы обработчиков
    delivered: AtomicU64,
    /// Обработчик вернул ошибку или задача доставки запаниковала
    failed: AtomicU64,
    /// Повторные доставки одноразовым подпискам, которые были подавлены
    skipped: AtomicU64,
    /// Одноразовые подписки, удалённые после доставки
    auto_removed: AtomicU64,
}

/// Снимок [`HubStats`] на момент вызова.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub published: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
    pub auto_removed: u64,
}

impl HubStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(
        &self,
        delivery: Delivery,
    ) {
        let counter = match delivery {
            Delivery::Delivered => &self.delivered,
            Delivery::Failed => &self.failed,
            Delivery::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_auto_removed(&self) {
        self.auto_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            auto_removed: self.auto_removed.load(Ordering::Relaxed),
        }
    }
}
