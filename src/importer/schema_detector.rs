// ==========================================
// 经营看板数据导入系统 - 表头识别
// ==========================================
// 职责: 表头行 → ColumnLayout
// 规则:
// - 表头规整: 小写，'_' / '-' 视为空格，连续空白合并
// - 两轮匹配: 先精确匹配候选片段，再做子串匹配
// - 字段按声明顺序认领列，同一列不会绑定两个字段
// - KPI 月份列按位置推断（指标名列与数据类型列之间）
// 红线: 任何必需列缺失都在处理首行数据之前失败
// ==========================================

use crate::domain::kpi::MONTHS_PER_YEAR;
use crate::domain::upload::ColumnLayout;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FieldSpec, ImportProfile, MonthSpan};
use std::collections::HashSet;
use tracing::debug;

/// 表头文本规整
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct SchemaDetector;

impl SchemaDetector {
    /// 根据画像识别列布局
    pub fn detect(profile: &dyn ImportProfile, header: &[String]) -> ImportResult<ColumnLayout> {
        let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
        let mut claimed: HashSet<usize> = HashSet::new();
        let mut layout = ColumnLayout::new();
        let fields = profile.fields();

        match profile.month_span() {
            Some(span) => {
                let (span_fields, rest): (Vec<&FieldSpec>, Vec<&FieldSpec>) = fields
                    .iter()
                    .partition(|f| f.key == span.start_field || f.key == span.end_field);

                // 先定位区间两端，月份列预留后其余字段只能认领区间外的列
                Self::claim_fields(&span_fields, &normalized, &mut claimed, &mut layout)?;
                Self::ensure_required(fields, &layout)?;
                let months = Self::month_columns(span, &layout)?;
                claimed.extend(months.iter().copied());
                layout.set_month_columns(months);
                Self::claim_fields(&rest, &normalized, &mut claimed, &mut layout)?;
            }
            None => {
                let all: Vec<&FieldSpec> = fields.iter().collect();
                Self::claim_fields(&all, &normalized, &mut claimed, &mut layout)?;
            }
        }

        Self::ensure_required(fields, &layout)?;
        debug!(kind = %profile.kind(), columns = header.len(), months = layout.month_columns().len(), "表头识别完成");
        Ok(layout)
    }

    fn claim_fields(
        fields: &[&FieldSpec],
        normalized: &[String],
        claimed: &mut HashSet<usize>,
        layout: &mut ColumnLayout,
    ) -> ImportResult<()> {
        // 第一轮: 精确匹配
        for field in fields {
            let exact: Vec<usize> = normalized
                .iter()
                .enumerate()
                .filter(|(idx, h)| !claimed.contains(idx) && field.fragments.contains(&h.as_str()))
                .map(|(idx, _)| idx)
                .collect();
            match exact.as_slice() {
                [] => {}
                [idx] => {
                    layout.bind(field.key, *idx);
                    claimed.insert(*idx);
                }
                [first, second, ..] => {
                    return Err(ImportError::AmbiguousColumn {
                        field: field.label.to_string(),
                        first: first + 1,
                        second: second + 1,
                    });
                }
            }
        }

        // 第二轮: 子串匹配（片段优先级优先，其次靠左）
        for field in fields {
            if layout.index_of(field.key).is_some() {
                continue;
            }
            let found = field.fragments.iter().find_map(|fragment| {
                normalized
                    .iter()
                    .enumerate()
                    .find(|(idx, h)| !claimed.contains(idx) && h.contains(fragment))
                    .map(|(idx, _)| idx)
            });
            if let Some(idx) = found {
                layout.bind(field.key, idx);
                claimed.insert(idx);
            }
        }
        Ok(())
    }

    /// 必需列全部命中，否则一次性列出全部缺失列
    fn ensure_required(fields: &[FieldSpec], layout: &ColumnLayout) -> ImportResult<()> {
        let missing: Vec<String> = fields
            .iter()
            .filter(|f| f.column_required && layout.index_of(f.key).is_none())
            .map(|f| f.label.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns { missing })
        }
    }

    fn month_columns(span: MonthSpan, layout: &ColumnLayout) -> ImportResult<Vec<usize>> {
        let (Some(start), Some(end)) = (layout.index_of(span.start_field), layout.index_of(span.end_field))
        else {
            return Err(ImportError::InvalidLayout("月份区间端点未定位".to_string()));
        };
        if end < start {
            return Err(ImportError::InvalidLayout(
                "数据类型列位于指标名称列左侧".to_string(),
            ));
        }
        let months: Vec<usize> = (start + 1..end).collect();
        if months.is_empty() {
            return Err(ImportError::InvalidLayout(
                "指标名称列与数据类型列之间没有月份列".to_string(),
            ));
        }
        if months.len() > MONTHS_PER_YEAR {
            return Err(ImportError::InvalidLayout(format!(
                "月份列数量 {} 超过 {}",
                months.len(),
                MONTHS_PER_YEAR
            )));
        }
        Ok(months)
    }
}
