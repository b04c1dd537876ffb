// ==========================================
// 经营看板数据导入系统 - KPI 指标领域模型
// ==========================================
// 用途: KPI 上传的标准化结果 + 仓储层落库实体
// 对齐: schema kpi_metric 表
// ==========================================

use crate::domain::types::{BusinessUnit, MetricUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一年的月份数（KPI 月度列上限）
pub const MONTHS_PER_YEAR: usize = 12;

/// 月份表头（模板生成与日志使用）
pub const MONTH_LABELS: [&str; MONTHS_PER_YEAR] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ==========================================
// KpiMetricRecord - KPI 指标观测（标准化后）
// ==========================================
// 红线: (business_unit, name) 在批次内与已知记录中唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiMetricRecord {
    pub business_unit: BusinessUnit,            // 所属事业部（上传时选定）
    pub name: String,                           // 指标名称（业务主键）
    pub monthly_values: [f64; MONTHS_PER_YEAR], // 1~12 月数值（未上传的月份为 0）
    pub target: Option<f64>,                    // 年度目标
    pub unit: MetricUnit,                       // 数据类型/单位
    pub category: Option<String>,               // 指标分类
}

impl KpiMetricRecord {
    /// 已上传月份的合计
    pub fn year_to_date(&self) -> f64 {
        self.monthly_values.iter().sum()
    }
}

// ==========================================
// KpiMetric - KPI 指标（已落库）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiMetric {
    pub metric_id: String,          // UUID
    pub record: KpiMetricRecord,    // 指标内容
    pub created_at: DateTime<Utc>,  // 创建时间
    pub updated_at: DateTime<Utc>,  // 更新时间
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_to_date() {
        let mut monthly_values = [0.0; MONTHS_PER_YEAR];
        monthly_values[0] = 10.0;
        monthly_values[1] = 5.5;
        let record = KpiMetricRecord {
            business_unit: BusinessUnit::Sales,
            name: "Revenue".to_string(),
            monthly_values,
            target: None,
            unit: MetricUnit::Currency,
            category: None,
        };
        assert_eq!(record.year_to_date(), 15.5);
    }
}
