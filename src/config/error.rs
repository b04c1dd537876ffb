// ==========================================
// 经营看板数据导入系统 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置库访问失败: {0}")]
    DatabaseError(String),

    #[error("锁获取失败: {0}")]
    LockError(String),

    #[error("配置值非法 (key: {key}): {value}")]
    InvalidValue { key: String, value: String },

    #[error("未知配置项: {0}")]
    UnknownKey(String),

    #[error("配置快照序列化失败: {0}")]
    SnapshotError(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::DatabaseError(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ConfigError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        ConfigError::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::SnapshotError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
