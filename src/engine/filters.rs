// ==========================================
// 家教平台排课引擎 - 筛选面板与首页推荐
// ==========================================
// 筛选: 学科、年级来自目录端口；价格边界来自进程级价格统计
// 推荐: 已发布课程按热度降序，附列表页派生字段
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{FilterResponse, Offering, OfferingKind, Slot};
use crate::engine::error::SchedulingResult;
use crate::engine::ports::OfferingStore;
use crate::engine::price_stats::PriceStatisticsRegistry;

/// 列表页课程摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingSummary {
    pub offering_id: String,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub kind: OfferingKind,
    pub price: f64,
    pub price_per_hour: Option<f64>,
    pub first_date: Option<NaiveDate>,
    pub first_time: Option<NaiveTime>,
    pub week_length: Option<u32>,
    pub enrolled_in_first_slot: u32,
    pub popularity: i64,
}

impl From<&Offering> for OfferingSummary {
    fn from(o: &Offering) -> Self {
        let first = o.slots.first();
        Self {
            offering_id: o.offering_id.clone(),
            title: o.title.clone(),
            subject: o.subject.clone(),
            grade: o.grade.clone(),
            kind: o.kind,
            price: o.price,
            price_per_hour: o.price_per_hour(),
            first_date: first.map(|s| s.anchor().date()),
            first_time: first.map(|s| s.anchor().time()),
            week_length: first.and_then(Slot::as_course).map(|c| c.week_length),
            enrolled_in_first_slot: o.enrolled_in_first_slot(),
            popularity: o.popularity,
        }
    }
}

// ==========================================
// FilterService
// ==========================================
pub struct FilterService {
    offerings: Arc<dyn OfferingStore>,
    price_stats: Arc<PriceStatisticsRegistry>,
}

impl FilterService {
    pub fn new(offerings: Arc<dyn OfferingStore>, price_stats: Arc<PriceStatisticsRegistry>) -> Self {
        Self {
            offerings,
            price_stats,
        }
    }

    /// 筛选面板数据
    ///
    /// # 参数
    /// - `kind`: 价格分档使用哪一类统计
    pub fn filters(&self, kind: OfferingKind) -> SchedulingResult<FilterResponse> {
        Ok(FilterResponse {
            subjects: self.offerings.list_subjects()?,
            grades: self.offerings.list_grades()?,
            prices: self.price_stats.filter_prices(kind),
        })
    }

    /// 四档价格边界（升序）
    pub fn tiers(&self, kind: OfferingKind) -> [f64; 4] {
        self.price_stats.tiers(kind)
    }

    /// 首页热门课程（仅包含有时段的已发布课程）
    pub fn popular_offerings(&self, limit: usize) -> SchedulingResult<Vec<OfferingSummary>> {
        let offerings = self.offerings.find_most_popular(limit)?;
        Ok(offerings.iter().map(OfferingSummary::from).collect())
    }
}
