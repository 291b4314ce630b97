// ==========================================
// 家教平台排课引擎 - 排课配置
// ==========================================
// 来源: config_kv 表 (scope_id='global')，缺省键回退默认值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// 排课配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub min_duration_minutes: i32,       // 发布时单次课最短时长
    pub record_price_on_republish: bool, // 编辑后再次发布是否重复计入价格统计
    pub locale: String,                  // 界面语言 bg / en
    pub log_format: LogFormat,           // 日志格式
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_duration_minutes: 30,
            record_price_on_republish: true,
            locale: "bg".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SchedulingConfig::default();
        assert_eq!(cfg.min_duration_minutes, 30);
        assert!(cfg.record_price_on_republish);
        assert_eq!(cfg.locale, "bg");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let cfg: SchedulingConfig = serde_json::from_str(r#"{"log_format":"json"}"#).unwrap();
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.min_duration_minutes, 30);
    }
}
