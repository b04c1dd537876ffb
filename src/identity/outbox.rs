// ==========================================
// 经营看板数据导入系统 - 身份开通发件箱实现
// ==========================================
// 身份与邀请写入 identity_account / credential_invite 表，
// 由外部邮件任务读取 PENDING 邀请并投递
// ==========================================

use crate::domain::employee::EmployeeRecord;
use crate::identity::{IdentityProvisioner, ProvisionError};
use crate::repository::employee_repo::EmployeeRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// OutboxProvisioner
// ==========================================
pub struct OutboxProvisioner {
    conn: Arc<Mutex<Connection>>,
    employee_repo: Arc<dyn EmployeeRepository>,
}

impl OutboxProvisioner {
    pub fn new(conn: Arc<Mutex<Connection>>, employee_repo: Arc<dyn EmployeeRepository>) -> Self {
        Self {
            conn,
            employee_repo,
        }
    }

    fn identity_error(employee: &EmployeeRecord, message: impl ToString) -> ProvisionError {
        ProvisionError::IdentityFailed {
            email: employee.email.clone(),
            message: message.to_string(),
        }
    }

    fn insert_identity(&self, employee: &EmployeeRecord) -> Result<String, ProvisionError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Self::identity_error(employee, format!("锁获取失败: {}", e)))?;

        // 同邮箱已开通过身份则复用
        let existing = conn
            .query_row(
                "SELECT identity_id FROM identity_account WHERE email = ?1",
                params![employee.email],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| Self::identity_error(employee, e))?;
        if let Some(identity_id) = existing {
            return Ok(identity_id);
        }

        let identity_id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO identity_account (identity_id, email, employee_code, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![identity_id, employee.email, employee.employee_code, Utc::now()],
        )
        .map_err(|e| Self::identity_error(employee, e))?;

        Ok(identity_id)
    }

    /// 待投递邀请数量
    pub fn count_pending_invites(&self) -> Result<usize, ProvisionError> {
        let conn = self.conn.lock().map_err(|e| ProvisionError::NotificationFailed {
            email: String::new(),
            message: format!("锁获取失败: {}", e),
        })?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM credential_invite WHERE status = 'PENDING'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| ProvisionError::NotificationFailed {
                email: String::new(),
                message: e.to_string(),
            })?;
        Ok(count as usize)
    }
}

#[async_trait]
impl IdentityProvisioner for OutboxProvisioner {
    async fn provision_identity(&self, employee: &EmployeeRecord) -> Result<String, ProvisionError> {
        let identity_id = self.insert_identity(employee)?;
        self.employee_repo
            .set_identity(&employee.employee_code, &identity_id)
            .await
            .map_err(|e| Self::identity_error(employee, e))?;
        debug!(employee_code = %employee.employee_code, identity_id = %identity_id, "身份已开通");
        Ok(identity_id)
    }

    async fn send_credential_invite(
        &self,
        employee: &EmployeeRecord,
        identity_id: &str,
    ) -> Result<(), ProvisionError> {
        let notification_error = |message: String| ProvisionError::NotificationFailed {
            email: employee.email.clone(),
            message,
        };

        let conn = self
            .conn
            .lock()
            .map_err(|e| notification_error(format!("锁获取失败: {}", e)))?;
        conn.execute(
            "INSERT INTO credential_invite (invite_id, identity_id, email, token, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5)",
            params![
                Uuid::new_v4().to_string(),
                identity_id,
                employee.email,
                Uuid::new_v4().simple().to_string(),
                Utc::now(),
            ],
        )
        .map_err(|e| notification_error(e.to_string()))?;

        debug!(employee_code = %employee.employee_code, "凭据设置邀请已入队");
        Ok(())
    }
}

// ==========================================
// DisabledProvisioner - 配置关闭邀请时使用
// ==========================================
pub struct DisabledProvisioner;

#[async_trait]
impl IdentityProvisioner for DisabledProvisioner {
    async fn provision_identity(&self, _employee: &EmployeeRecord) -> Result<String, ProvisionError> {
        Err(ProvisionError::Disabled)
    }

    async fn send_credential_invite(
        &self,
        _employee: &EmployeeRecord,
        _identity_id: &str,
    ) -> Result<(), ProvisionError> {
        Err(ProvisionError::Disabled)
    }
}
