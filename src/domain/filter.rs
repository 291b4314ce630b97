// ==========================================
// 家教平台排课引擎 - 筛选面板输出
// ==========================================

use serde::{Deserialize, Serialize};

/// 筛选面板数据: 学科、年级、5 档价格边界（升序）
///
/// 由外部检索层与全文检索结果合并后返回前端
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    pub subjects: Vec<String>,
    pub grades: Vec<String>,
    pub prices: [f64; 5],
}
