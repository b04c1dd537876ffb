// ==========================================
// 经营看板数据导入系统 - 落库分发器
// ==========================================
// 职责: 已通过校验的记录逐条新建/更新
// 红线:
// - 严格串行: 上一条写入完成后才发起下一条
// - 取消不打断进行中的写入，已落库的行如实计为成功
// - 每行只尝试一次，不重试；失败记为 WriteFailed 后继续
// - 员工新建成功后做身份开通 + 邀请，失败不影响该行成功状态
// ==========================================

use crate::domain::employee::EmployeeRecord;
use crate::domain::upload::{
    AcceptedRow, NormalizedRecord, ProvisioningOutcome, RowErrorKind, ValidationError,
};
use crate::identity::{IdentityProvisioner, ProvisionError};
use crate::importer::cancel::CancelHandle;
use crate::repository::record_store::{describe_write_error, RecordStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// 单行分发结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Created(Option<ProvisioningOutcome>),
    Updated,
    Failed(ValidationError),
    Cancelled(ValidationError),
}

pub struct UpsertDispatcher {
    store: Arc<dyn RecordStore>,
    provisioner: Arc<dyn IdentityProvisioner>,
}

impl UpsertDispatcher {
    pub fn new(store: Arc<dyn RecordStore>, provisioner: Arc<dyn IdentityProvisioner>) -> Self {
        Self { store, provisioner }
    }

    pub fn cancelled_error(row_number: usize, identifier: Option<&str>) -> ValidationError {
        let err = ValidationError::new(row_number, RowErrorKind::Cancelled, "上传已取消，该行未写入");
        match identifier {
            Some(id) => err.with_identifier(id),
            None => err,
        }
    }

    /// 分发一行
    pub async fn dispatch(&self, row: &AcceptedRow, cancel: &CancelHandle) -> DispatchOutcome {
        let identifier = row.record.identifier();
        if cancel.is_cancelled() {
            return DispatchOutcome::Cancelled(Self::cancelled_error(row.row_number, Some(identifier)));
        }

        // 已发起的写入必须等到结果返回，取消只在行与行之间生效
        let result = if row.is_update {
            self.store.update(&row.record).await
        } else {
            self.store.create(&row.record).await
        };

        if let Err(e) = result {
            warn!(row_number = row.row_number, identifier, error = %e, "记录写入失败");
            return DispatchOutcome::Failed(
                ValidationError::new(row.row_number, RowErrorKind::WriteFailed, describe_write_error(&e))
                    .with_identifier(identifier),
            );
        }

        debug!(row_number = row.row_number, identifier, is_update = row.is_update, "记录已写入");
        if row.is_update {
            return DispatchOutcome::Updated;
        }

        let provisioning = match &row.record {
            NormalizedRecord::Employee(employee) => Some(self.provision(row.row_number, employee).await),
            NormalizedRecord::Kpi(_) => None,
        };
        DispatchOutcome::Created(provisioning)
    }

    /// 身份开通 → 邀请通知（两阶段分别记录）
    async fn provision(&self, row_number: usize, employee: &EmployeeRecord) -> ProvisioningOutcome {
        let mut outcome = ProvisioningOutcome {
            row_number,
            employee_code: employee.employee_code.clone(),
            record_created: true,
            identity_provisioned: false,
            notification_sent: false,
            error: None,
        };

        let identity_id = match self.provisioner.provision_identity(employee).await {
            Ok(id) => id,
            Err(ProvisionError::Disabled) => {
                debug!(row_number, employee_code = %employee.employee_code, "身份开通已停用，跳过");
                return outcome;
            }
            Err(e) => {
                warn!(row_number, employee_code = %employee.employee_code, error = %e, "身份开通失败");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };
        outcome.identity_provisioned = true;

        match self.provisioner.send_credential_invite(employee, &identity_id).await {
            Ok(()) => outcome.notification_sent = true,
            Err(e) => {
                warn!(row_number, employee_code = %employee.employee_code, error = %e, "邀请通知发送失败");
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }
}
