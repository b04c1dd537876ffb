// ==========================================
// 经营看板数据导入系统 - 导入管道 Trait
// ==========================================
// 职责: 定义文件解析与导入画像接口（不包含实现）
// 一条通用管道服务 KPI 与员工两个记录族，差异全部收敛在 ImportProfile
// ==========================================

use crate::domain::types::RecordKind;
use crate::domain::upload::{ColumnLayout, NormalizedRecord, ParsedSheet, RawRow, ValidationError};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::repository::record_store::StoreScope;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件 → 表头 + 原始数据行
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头与数据行
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 表头 + 数据行（全空行已跳过，行号保持原位）
    /// - Err: ParseError 类错误（文件不存在/格式不支持/无法解码）
    fn parse_rows(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

// ==========================================
// FieldSpec - 逻辑字段描述
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,                   // 逻辑字段键（与 KnownRecords 字段键一致）
    pub label: &'static str,                 // 对外展示的列名（缺列提示用）
    pub fragments: &'static [&'static str],  // 表头候选片段（已规整为小写、空格分隔）
    pub column_required: bool,               // 表头必须包含该列
    pub value_required: bool,                // 每行该列必须非空
    pub unique: bool,                        // 批次内 + 已知记录中唯一
}

impl FieldSpec {
    pub const fn required(
        key: &'static str,
        label: &'static str,
        fragments: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            fragments,
            column_required: true,
            value_required: true,
            unique: false,
        }
    }

    pub const fn optional(
        key: &'static str,
        label: &'static str,
        fragments: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            fragments,
            column_required: false,
            value_required: false,
            unique: false,
        }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 列必须存在，但单元格允许为空
    pub const fn blank_allowed(mut self) -> Self {
        self.value_required = false;
        self
    }
}

// ==========================================
// MonthSpan - 按位置推断的月份列区间
// ==========================================
// 月份列 = start 列与 end 列之间（不含两端）的全部列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    pub start_field: &'static str,
    pub end_field: &'static str,
}

// ==========================================
// ImportProfile Trait
// ==========================================
// 用途: 记录族画像（字段词表、唯一键、标准化规则）
// 实现者: KpiImportProfile, EmployeeImportProfile
pub trait ImportProfile: Send + Sync {
    fn kind(&self) -> RecordKind;

    /// 字段描述（声明顺序即列认领顺序）
    fn fields(&self) -> &[FieldSpec];

    /// 位置推断的月份区间（仅 KPI）
    fn month_span(&self) -> Option<MonthSpan> {
        None
    }

    /// 已知记录快照的读取范围
    fn store_scope(&self) -> StoreScope;

    /// 行 → 标准化记录
    ///
    /// # 返回
    /// - Err(ValidationError): 严格模式下的非法取值
    fn normalize(
        &self,
        row: &RawRow,
        layout: &ColumnLayout,
        cleaner: &DataCleaner,
    ) -> Result<NormalizedRecord, ValidationError>;

    /// 行内标识（错误信息里引用）
    fn identifier_of<'a>(&self, row: &'a RawRow, layout: &ColumnLayout) -> Option<&'a str> {
        self.fields()
            .iter()
            .find(|f| f.unique)
            .and_then(|f| layout.cell(row, f.key))
    }
}
