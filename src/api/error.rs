// ==========================================
// 经营看板数据导入系统 - API 层错误
// ==========================================
// 职责: 汇总下层错误为面向上传方的提示
// 约定: ParseError / SchemaError 表示整批被拒，未发生任何写入
// ==========================================

use crate::config::error::ConfigError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("已有上传正在处理中，请等待完成或取消后再试")]
    UploadInProgress,

    // ===== 整批拒绝 =====
    #[error("文件无法读取: {0}")]
    ParseError(String),

    #[error("表头不符合模板: {message}")]
    SchemaError {
        message: String,
        missing: Vec<String>,
    },

    #[error("上传失败: {0}")]
    ImportError(String),

    // ===== 调用方输入 =====
    #[error("参数无效: {0}")]
    InvalidInput(String),

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("与已有数据冲突: {0}")]
    Conflict(String),

    // ===== 基础设施 =====
    #[error("配置读取失败: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库不可用: {0}")]
    DatabaseUnavailable(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 缺失列名（仅 SchemaError 有值）
    pub fn missing_columns(&self) -> &[String] {
        match self {
            ApiError::SchemaError { missing, .. } => missing,
            _ => &[],
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_parse_error() {
            return ApiError::ParseError(err.to_string());
        }
        if err.is_schema_error() {
            return ApiError::SchemaError {
                missing: err.missing_columns().to_vec(),
                message: err.to_string(),
            };
        }
        match err {
            ImportError::KnownRecordsUnavailable(msg) => ApiError::DatabaseUnavailable(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RepositoryError::DatabaseConnectionError(_) | RepositoryError::LockError(_) => {
                ApiError::DatabaseUnavailable(err.to_string())
            }
            RepositoryError::UniqueConstraintViolation(_)
            | RepositoryError::ForeignKeyViolation(_) => ApiError::Conflict(err.to_string()),
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidValue { .. } | ConfigError::UnknownKey(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            other => ApiError::ConfigError(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_keeps_missing_columns() {
        let api_err: ApiError = ImportError::MissingColumns {
            missing: vec!["Employee_Code".to_string()],
        }
        .into();
        assert_eq!(api_err.missing_columns(), &["Employee_Code".to_string()]);
        assert!(api_err.to_string().contains("Employee_Code"));
    }

    #[test]
    fn test_parse_error_mapping() {
        let api_err: ApiError = ImportError::UnsupportedFormat("txt".to_string()).into();
        assert!(matches!(api_err, ApiError::ParseError(_)));
        assert!(api_err.missing_columns().is_empty());
    }

    #[test]
    fn test_repository_error_mapping() {
        let api_err: ApiError = RepositoryError::UniqueConstraintViolation("email".to_string()).into();
        assert!(matches!(api_err, ApiError::Conflict(_)));

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseUnavailable(_)));
    }

    #[test]
    fn test_config_error_mapping() {
        let api_err: ApiError = ConfigError::UnknownKey("x".to_string()).into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));
    }
}
