// ==========================================
// 经营看板数据导入系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / 空值标准化 / 数值解析 / 词表映射 / 布尔解析
// 宽松模式: 非法数值 → 0，未知枚举 → 默认值
// 严格模式: 同样的输入返回 InvalidValue 行级错误
// ==========================================

use crate::domain::types::ValidationMode;
use crate::domain::upload::{RowErrorKind, ValidationError};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '￥'];

// 逗号只允许作为三位一组的千分位
static THOUSANDS_GROUPED: OnceLock<Option<Regex>> = OnceLock::new();

fn is_thousands_grouped(text: &str) -> bool {
    THOUSANDS_GROUPED
        .get_or_init(|| Regex::new(r"^[-+]?\d{1,3}(,\d{3})+(\.\d+)?$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner {
    mode: ValidationMode,
}

impl DataCleaner {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn is_strict(&self) -> bool {
        self.mode == ValidationMode::Strict
    }

    fn invalid(row_number: usize, field: &str, raw: &str, expected: &str) -> ValidationError {
        ValidationError::new(
            row_number,
            RowErrorKind::InvalidValue,
            format!("{} 取值非法: '{}'（期望 {}）", field, raw, expected),
        )
        .with_field(field)
    }

    /// 空白 → None，其余 TRIM
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 去掉货币符号、末尾百分号后按 f64 解析
    ///
    /// 逗号仅在构成合法千分位时剔除；"1,5"、"1,2,3" 视为无法解析
    pub fn parse_number(raw: &str) -> Option<f64> {
        let mut cleaned: String = raw
            .trim()
            .trim_end_matches('%')
            .chars()
            .filter(|c| !CURRENCY_SYMBOLS.contains(c) && !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        if cleaned.contains(',') {
            if !is_thousands_grouped(&cleaned) {
                return None;
            }
            cleaned.retain(|c| c != ',');
        }
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// 数值单元格（空白 → 0）
    pub fn number(
        &self,
        row_number: usize,
        field: &str,
        value: Option<&str>,
    ) -> Result<f64, ValidationError> {
        let Some(raw) = self.normalize_null(value) else {
            return Ok(0.0);
        };
        match Self::parse_number(&raw) {
            Some(v) => Ok(v),
            None if self.is_strict() => Err(Self::invalid(row_number, field, &raw, "数值")),
            None => {
                debug!(row_number, field, raw = %raw, "非数值单元格按 0 处理");
                Ok(0.0)
            }
        }
    }

    /// 可选数值单元格（空白 → None）
    pub fn optional_number(
        &self,
        row_number: usize,
        field: &str,
        value: Option<&str>,
    ) -> Result<Option<f64>, ValidationError> {
        match self.normalize_null(value) {
            None => Ok(None),
            Some(raw) => self.number(row_number, field, Some(&raw)).map(Some),
        }
    }

    /// 词表映射（空白 → 默认值；未知 → 默认值或 InvalidValue）
    pub fn vocab<T: Copy>(
        &self,
        row_number: usize,
        field: &str,
        value: Option<&str>,
        lookup: impl Fn(&str) -> Option<T>,
        default: T,
    ) -> Result<T, ValidationError> {
        let Some(raw) = self.normalize_null(value) else {
            return Ok(default);
        };
        match lookup(&raw) {
            Some(v) => Ok(v),
            None if self.is_strict() => Err(Self::invalid(row_number, field, &raw, "固定词表取值")),
            None => {
                debug!(row_number, field, raw = %raw, "未知词表取值按默认值处理");
                Ok(default)
            }
        }
    }

    /// 在职标志（空白 → true）
    pub fn active_flag(
        &self,
        row_number: usize,
        field: &str,
        value: Option<&str>,
    ) -> Result<bool, ValidationError> {
        let Some(raw) = self.normalize_null(value) else {
            return Ok(true);
        };
        match raw.to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" | "active" | "是" => Ok(true),
            "no" | "n" | "false" | "0" | "inactive" | "否" => Ok(false),
            _ if self.is_strict() => Err(Self::invalid(row_number, field, &raw, "yes/no")),
            _ => Ok(true),
        }
    }

    /// 邮箱统一小写
    pub fn email(&self, value: Option<&str>) -> Option<String> {
        self.normalize_null(value).map(|v| v.to_lowercase())
    }
}
