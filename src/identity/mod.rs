// ==========================================
// 经营看板数据导入系统 - 身份开通与邀请通知
// ==========================================
// 职责: 员工记录新建成功后，开通认证身份并发送凭据设置邀请
// 红线: 这里的失败不回滚员工记录，只体现在两阶段结果里
// ==========================================

pub mod outbox;

pub use outbox::{DisabledProvisioner, OutboxProvisioner};

use crate::domain::employee::EmployeeRecord;
use async_trait::async_trait;
use thiserror::Error;

/// 身份开通/通知错误类型
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("身份开通已停用")]
    Disabled,

    #[error("身份开通失败 ({email}): {message}")]
    IdentityFailed { email: String, message: String },

    #[error("邀请通知发送失败 ({email}): {message}")]
    NotificationFailed { email: String, message: String },
}

// ==========================================
// IdentityProvisioner Trait
// ==========================================
// 实现者: OutboxProvisioner（落 SQLite 发件箱）、DisabledProvisioner
#[async_trait]
pub trait IdentityProvisioner: Send + Sync {
    /// 开通认证身份
    ///
    /// # 返回
    /// - Ok(identity_id)
    async fn provision_identity(&self, employee: &EmployeeRecord) -> Result<String, ProvisionError>;

    /// 发送凭据设置邀请
    async fn send_credential_invite(
        &self,
        employee: &EmployeeRecord,
        identity_id: &str,
    ) -> Result<(), ProvisionError>;
}
