// ==========================================
// 经营看板数据导入系统 - 领域模型层
// ==========================================
// 职责: 定义导入相关实体、固定词表、上传汇总
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod employee;
pub mod kpi;
pub mod types;
pub mod upload;

// 重导出核心类型
pub use employee::{Employee, EmployeeRecord};
pub use kpi::{KpiMetric, KpiMetricRecord, MONTHS_PER_YEAR, MONTH_LABELS};
pub use types::{BusinessUnit, DuplicatePolicy, MetricUnit, RecordKind, Role, ValidationMode};
pub use upload::{
    AcceptedRow, ColumnLayout, NormalizedRecord, ParsedSheet, ProvisioningOutcome, RawRow,
    RowErrorKind, UploadHistory, UploadSummary, ValidationError,
};
