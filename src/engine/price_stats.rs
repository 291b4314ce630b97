// ==========================================
// 家教平台排课引擎 - 价格分档统计
// ==========================================
// 在线估计器: 每次发布记录一次价格，O(1) 更新，不保存历史
// 结果用于搜索筛选面板的 5 档价格边界
// 注意: 这是近似估计而非真实分位数，递推公式需保持原样以兼容已有分档
// ==========================================

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::OfferingKind;

// 分档系数（正态分布 20/40/60/80 分位近似）
const TIER20_FACTOR: f64 = -0.67;
const TIER40_FACTOR: f64 = -0.26;
const TIER60_FACTOR: f64 = 0.26;
const TIER80_FACTOR: f64 = 0.67;

// ==========================================
// PriceStatisticsAccumulator - 单类别累加器
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStatisticsAccumulator {
    pub count: u64,
    pub sum: f64,
    pub lower_median: f64,
    pub upper_median: f64,
    pub mean: f64,
    pub deviation: f64,
    pub tier20: f64,
    pub tier40: f64,
    pub tier60: f64,
    pub tier80: f64,
}

impl PriceStatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次价格观测
    pub fn record(&mut self, price: f64) {
        self.count += 1;
        self.sum += price;

        self.lower_median = if self.count % 2 == 1 {
            price
        } else {
            (self.lower_median + self.upper_median) / 2.0
        };
        self.upper_median = price;

        let count = self.count as f64;
        self.mean = self.sum / count;

        let spread = (self.mean - price).abs();
        self.deviation = if self.count == 1 {
            spread
        } else {
            (self.deviation + spread) / (count - 1.0)
        };

        self.tier20 = self.mean + self.deviation * TIER20_FACTOR;
        self.tier40 = self.mean + self.deviation * TIER40_FACTOR;
        self.tier60 = self.mean + self.deviation * TIER60_FACTOR;
        self.tier80 = self.mean + self.deviation * TIER80_FACTOR;
    }

    /// 四档边界，升序
    pub fn tiers(&self) -> [f64; 4] {
        let mut tiers = [self.tier20, self.tier40, self.tier60, self.tier80];
        tiers.sort_by(f64::total_cmp);
        tiers
    }

    /// 筛选面板价格数组 [t20, t40, 中位, t60, t80]，升序
    pub fn filter_prices(&self) -> [f64; 5] {
        let mut prices = [
            self.tier20,
            self.tier40,
            (self.lower_median + self.upper_median) / 2.0,
            self.tier60,
            self.tier80,
        ];
        prices.sort_by(f64::total_cmp);
        prices
    }

    /// 只读快照
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

// ==========================================
// PriceStatisticsRegistry - 按类别的进程级统计
// ==========================================
// 每个类别一把锁；record 在单个临界区内完成全部更新
#[derive(Debug, Default)]
pub struct PriceStatisticsRegistry {
    course: Mutex<PriceStatisticsAccumulator>,
    private_lesson: Mutex<PriceStatisticsAccumulator>,
}

impl PriceStatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // 累加器的每次更新都是纯算术，中毒后状态仍一致，直接取回
    fn lock(&self, kind: OfferingKind) -> MutexGuard<'_, PriceStatisticsAccumulator> {
        let cell = match kind {
            OfferingKind::Course => &self.course,
            OfferingKind::PrivateLesson => &self.private_lesson,
        };
        cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, kind: OfferingKind, price: f64) {
        let mut acc = self.lock(kind);
        acc.record(price);
        tracing::debug!(
            kind = %kind,
            price,
            count = acc.count,
            mean = acc.mean,
            "价格统计已更新"
        );
    }

    pub fn tiers(&self, kind: OfferingKind) -> [f64; 4] {
        self.lock(kind).tiers()
    }

    pub fn filter_prices(&self, kind: OfferingKind) -> [f64; 5] {
        self.lock(kind).filter_prices()
    }

    pub fn snapshot(&self, kind: OfferingKind) -> PriceStatisticsAccumulator {
        self.lock(kind).snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fresh_accumulator_is_zeroed() {
        let acc = PriceStatisticsAccumulator::new();
        assert_eq!(acc.count, 0);
        assert_eq!(acc.tiers(), [0.0; 4]);
        assert_eq!(acc.filter_prices(), [0.0; 5]);
    }

    #[test]
    fn test_single_observation_collapses_tiers() {
        let mut acc = PriceStatisticsAccumulator::new();
        acc.record(100.0);
        assert_eq!(acc.tiers(), [100.0; 4]);
        assert_eq!(acc.lower_median, 100.0);
        assert_eq!(acc.upper_median, 100.0);
    }

    #[test]
    fn test_two_observations() {
        let mut acc = PriceStatisticsAccumulator::new();
        acc.record(100.0);
        acc.record(200.0);

        assert_eq!(acc.count, 2);
        assert!(approx(acc.sum, 300.0));
        assert!(approx(acc.mean, 150.0));
        assert!(approx(acc.deviation, 50.0));
        assert!(approx(acc.upper_median, 200.0));
        assert!(approx(acc.lower_median, 100.0));

        let tiers = acc.tiers();
        assert!(approx(tiers[0], 116.5));
        assert!(approx(tiers[1], 137.0));
        assert!(approx(tiers[2], 163.0));
        assert!(approx(tiers[3], 183.5));

        let prices = acc.filter_prices();
        assert!(approx(prices[2], 150.0));
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_registry_keeps_categories_independent() {
        let registry = PriceStatisticsRegistry::new();
        registry.record(OfferingKind::Course, 80.0);
        assert_eq!(registry.snapshot(OfferingKind::Course).count, 1);
        assert_eq!(registry.snapshot(OfferingKind::PrivateLesson).count, 0);
        assert_eq!(registry.tiers(OfferingKind::PrivateLesson), [0.0; 4]);
    }
}
