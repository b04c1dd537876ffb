// ==========================================
// 经营看板数据导入系统 - 国际化 (i18n)
// ==========================================
// 职责: 上传结果提示文案的中英文切换
// 资源: locales/zh-CN.yml（默认）、locales/en.yml
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 按键取当前语言文案
///
/// # 示例
/// ```no_run
/// use bizops_import::i18n::t;
/// let msg = t("report.kind.duplicate");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息，按 `%{name}` 占位符替换参数
///
/// # 示例
/// ```no_run
/// use bizops_import::i18n::t_with_args;
/// let msg = t_with_args("report.row_error", &[("row", "3"), ("kind", "重复"), ("message", "EMP010")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}
