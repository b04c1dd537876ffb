// ==========================================
// Mock 身份开通 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use bizops_import::domain::employee::EmployeeRecord;
use bizops_import::identity::{IdentityProvisioner, ProvisionError};
use std::collections::HashSet;
use std::sync::Mutex;

/// 记录调用；可指定邮箱开通失败或全部通知失败
#[derive(Default)]
pub struct RecordingProvisioner {
    pub identities: Mutex<Vec<String>>,
    pub invites: Mutex<Vec<String>>,
    fail_identity_for: HashSet<String>,
    fail_notifications: bool,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_identity_for(emails: &[&str]) -> Self {
        Self {
            fail_identity_for: emails.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_notifications() -> Self {
        Self {
            fail_notifications: true,
            ..Self::default()
        }
    }

    pub fn invite_count(&self) -> usize {
        self.invites.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvisioner for RecordingProvisioner {
    async fn provision_identity(&self, employee: &EmployeeRecord) -> Result<String, ProvisionError> {
        if self.fail_identity_for.contains(&employee.email) {
            return Err(ProvisionError::IdentityFailed {
                email: employee.email.clone(),
                message: "identity service rejected the account".to_string(),
            });
        }
        self.identities.lock().unwrap().push(employee.email.clone());
        Ok(format!("id-{}", employee.employee_code))
    }

    async fn send_credential_invite(
        &self,
        employee: &EmployeeRecord,
        _identity_id: &str,
    ) -> Result<(), ProvisionError> {
        if self.fail_notifications {
            return Err(ProvisionError::NotificationFailed {
                email: employee.email.clone(),
                message: "smtp unavailable".to_string(),
            });
        }
        self.invites.lock().unwrap().push(employee.email.clone());
        Ok(())
    }
}
