// ==========================================
// 经营看板数据导入系统 - 导入模块错误类型
// ==========================================
// 致命错误（解析/表头）在任何写入之前返回；行级错误不走这里
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件解析错误（ParseError）=====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无表头行")]
    EmptyFile,

    // ===== 表头/列布局错误（SchemaError）=====
    #[error("缺少必需列: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("列布局错误: {0}")]
    InvalidLayout(String),

    #[error("表头重复 (字段 {field}): 第 {first} 列与第 {second} 列")]
    AmbiguousColumn {
        field: String,
        first: usize,
        second: usize,
    },

    // ===== 协作方错误 =====
    #[error("读取已知记录失败: {0}")]
    KnownRecordsUnavailable(String),

    #[error("模板生成失败: {0}")]
    TemplateError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 文件无法解码为行（ParseError 类）
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::EmptyFile
        )
    }

    /// 表头列布局无法解析（SchemaError 类）
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ImportError::MissingColumns { .. }
                | ImportError::InvalidLayout(_)
                | ImportError::AmbiguousColumn { .. }
        )
    }

    /// 缺失列名（仅 MissingColumns 有值）
    pub fn missing_columns(&self) -> &[String] {
        match self {
            ImportError::MissingColumns { missing } => missing,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::TemplateError(err.to_string())
    }
}

// 实现 From<RepositoryError>（仅用于批次开始前读取已知记录）
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::KnownRecordsUnavailable(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
