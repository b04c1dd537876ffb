// ==========================================
// 经营看板数据导入系统 - 上传领域模型
// ==========================================
// 用途: 一次上传生命周期内的行、列布局、行级错误、汇总与历史
// 红线: 行号统一使用 1 起始的"显示行号"（表头为第 1 行）
// ==========================================

use crate::domain::employee::EmployeeRecord;
use crate::domain::kpi::KpiMetricRecord;
use crate::domain::types::RecordKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

// ==========================================
// RawRow - 原始数据行
// ==========================================
// 只在一次上传内存活，标准化后丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,  // 显示行号（与用户打开源文件看到的一致）
    pub cells: Vec<String>, // 按列位置排列的单元格文本（已 TRIM）
}

impl RawRow {
    pub fn new(row_number: usize, cells: Vec<String>) -> Self {
        Self { row_number, cells }
    }

    /// 取指定列的非空文本
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

// ==========================================
// ParsedSheet - 文件解析结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub header: Vec<String>, // 表头行
    pub rows: Vec<RawRow>,   // 数据行（已跳过全空行）
}

// ==========================================
// ColumnLayout - 逻辑字段 → 列下标
// ==========================================
// 每次上传根据表头推导一次
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    fields: HashMap<&'static str, usize>,
    month_columns: Vec<usize>,
}

impl ColumnLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, field: &'static str, index: usize) {
        self.fields.insert(field, index);
    }

    pub fn set_month_columns(&mut self, columns: Vec<usize>) {
        self.month_columns = columns;
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.get(field).copied()
    }

    pub fn is_bound(&self, column: usize) -> bool {
        self.fields.values().any(|&c| c == column)
    }

    pub fn month_columns(&self) -> &[usize] {
        &self.month_columns
    }

    /// 读取逻辑字段对应的非空单元格
    pub fn cell<'a>(&self, row: &'a RawRow, field: &str) -> Option<&'a str> {
        self.index_of(field).and_then(|idx| row.cell(idx))
    }
}

// ==========================================
// RowErrorKind - 行级错误类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    MissingField, // 必填字段缺失
    Duplicate,    // 标识重复（批次内或已存在）
    InvalidValue, // 严格模式下的非法取值
    WriteFailed,  // 落库失败
    Cancelled,    // 上传被取消，未尝试写入
}

// ==========================================
// ValidationError - 行级错误
// ==========================================
// 非致命: 该行跳过，批次继续
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_number: usize,          // 显示行号
    pub kind: RowErrorKind,         // 错误类型
    pub field: Option<String>,      // 相关字段（如可定位）
    pub identifier: Option<String>, // 员工编号/指标名（如可解析）
    pub message: String,            // 错误描述
}

impl ValidationError {
    pub fn new(row_number: usize, kind: RowErrorKind, message: impl Into<String>) -> Self {
        Self {
            row_number,
            kind,
            field: None,
            identifier: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

// ==========================================
// NormalizedRecord - 标准化记录（按记录族打标签）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizedRecord {
    Kpi(KpiMetricRecord),
    Employee(EmployeeRecord),
}

impl NormalizedRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            NormalizedRecord::Kpi(_) => RecordKind::KpiMetric,
            NormalizedRecord::Employee(_) => RecordKind::Employee,
        }
    }

    /// 业务标识（员工编号 / 指标名）
    pub fn identifier(&self) -> &str {
        match self {
            NormalizedRecord::Kpi(r) => &r.name,
            NormalizedRecord::Employee(r) => &r.employee_code,
        }
    }
}

// ==========================================
// AcceptedRow - 通过校验的行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRow {
    pub row_number: usize,
    pub record: NormalizedRecord,
    pub is_update: bool, // 命中已知记录（仅 UPDATE 策略下出现）
}

// ==========================================
// ProvisioningOutcome - 员工创建后的两阶段结果
// ==========================================
// 记录创建 / 身份开通 / 邀请邮件 三个环节分别可见
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningOutcome {
    pub row_number: usize,
    pub employee_code: String,
    pub record_created: bool,
    pub identity_provisioned: bool,
    pub notification_sent: bool,
    pub error: Option<String>,
}

impl ProvisioningOutcome {
    pub fn is_complete(&self) -> bool {
        self.record_created && self.identity_provisioned && self.notification_sent
    }
}

// ==========================================
// UploadSummary - 上传汇总
// ==========================================
// 创建后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub upload_id: String,                      // UUID
    pub kind: RecordKind,                       // 记录族
    pub file_name: Option<String>,              // 源文件名
    pub total_rows: usize,                      // 数据行总数（不含表头与全空行）
    pub successful_imports: usize,              // 成功写入
    pub failed_imports: usize,                  // 失败（校验 + 写入 + 取消）
    pub created: usize,                         // 其中新建
    pub updated: usize,                         // 其中更新
    pub errors: Vec<ValidationError>,           // 按行号排序的错误明细
    pub provisioning: Vec<ProvisioningOutcome>, // 员工身份开通结果
    pub cancelled: bool,                        // 是否被取消
    pub started_at: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

impl UploadSummary {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ==========================================
// UploadHistory - 会话内上传历史
// ==========================================
// 有界、最新在前，不落库
#[derive(Debug, Clone)]
pub struct UploadHistory {
    limit: usize,
    entries: VecDeque<UploadSummary>,
}

impl UploadHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 调整上限（超出部分丢弃最旧的记录）
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.entries.truncate(self.limit);
    }

    pub fn push(&mut self, summary: UploadSummary) {
        self.entries.push_front(summary);
        self.entries.truncate(self.limit);
    }

    pub fn entries(&self) -> impl Iterator<Item = &UploadSummary> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&UploadSummary> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
