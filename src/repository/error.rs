// ==========================================
// 经营看板数据导入系统 - 仓储层错误类型
// ==========================================
// 唯一约束由数据库兜底（客户端去重只是快照预检）
// 约束冲突按 SQLite 扩展错误码识别
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接不可用: {0}")]
    DatabaseConnectionError(String),

    #[error("连接锁已失效: {0}")]
    LockError(String),

    #[error("SQL 执行失败: {0}")]
    DatabaseQueryError(String),

    // 编号/邮箱/指标名已被占用
    #[error("唯一约束冲突: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束冲突: {0}")]
    ForeignKeyViolation(String),

    #[error("字段 {field} 取值无法读取: {message}")]
    FieldValueError { field: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let detail = msg.clone().unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(detail)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(detail),
                    ffi::SQLITE_CANTOPEN | ffi::SQLITE_BUSY => {
                        RepositoryError::DatabaseConnectionError(detail)
                    }
                    _ => RepositoryError::DatabaseQueryError(detail),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "record".to_string(),
                id: "-".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RepositoryError::LockError(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_codes_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY, email TEXT UNIQUE);
             CREATE TABLE child (id TEXT, parent_id TEXT REFERENCES parent(id));
             INSERT INTO parent VALUES ('p1', 'a@x.com');",
        )
        .unwrap();

        let dup = conn
            .execute("INSERT INTO parent VALUES ('p2', 'a@x.com')", [])
            .unwrap_err();
        assert!(matches!(
            RepositoryError::from(dup),
            RepositoryError::UniqueConstraintViolation(_)
        ));

        let orphan = conn
            .execute("INSERT INTO child VALUES ('c1', 'missing')", [])
            .unwrap_err();
        assert!(matches!(
            RepositoryError::from(orphan),
            RepositoryError::ForeignKeyViolation(_)
        ));
    }
}
