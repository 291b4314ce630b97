// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持保加利亚语（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedLocale {
    Bulgarian,
    English,
}

impl SupportedLocale {
    pub fn code(&self) -> &'static str {
        match self {
            SupportedLocale::Bulgarian => "bg",
            SupportedLocale::English => "en",
        }
    }

    /// 解析语言代码（"bg" / "en"，兼容 "en-US" 这类区域后缀）
    pub fn parse(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "bg" => Some(SupportedLocale::Bulgarian),
            "en" => Some(SupportedLocale::English),
            _ => None,
        }
    }
}

impl Default for SupportedLocale {
    fn default() -> Self {
        SupportedLocale::Bulgarian
    }
}

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"bg" 或 "en"）；不支持的代码回退到默认语言
pub fn set_locale(locale: &str) {
    let resolved = SupportedLocale::parse(locale).unwrap_or_else(|| {
        tracing::warn!(locale, "不支持的语言代码，回退到默认语言");
        SupportedLocale::default()
    });
    rust_i18n::set_locale(resolved.code());
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，占位符格式 %{name}）
///
/// # 示例
/// ```no_run
/// use tutoring_scheduler::i18n::t_with_args;
/// let msg = t_with_args("schedule.malformed_hour", &[("value", "25:00")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// locale 为全局状态，测试默认并行执行，这里串行化
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
