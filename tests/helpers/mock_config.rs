// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use bizops_import::config::{ConfigResult, ImportConfigReader};
use bizops_import::domain::types::{BusinessUnit, DuplicatePolicy, Role, ValidationMode};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub validation_mode: ValidationMode,
    pub duplicate_policy: DuplicatePolicy,
    pub default_role: Role,
    pub default_business_unit: BusinessUnit,
    pub history_limit: usize,
    pub send_credential_invites: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::Permissive,
            duplicate_policy: DuplicatePolicy::Reject,
            default_role: Role::Associate,
            default_business_unit: BusinessUnit::Sales,
            history_limit: 20,
            send_credential_invites: true,
        }
    }
}

impl MockConfig {
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history_limit: limit,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_validation_mode(&self) -> ConfigResult<ValidationMode> {
        Ok(self.validation_mode)
    }

    async fn get_duplicate_policy(&self) -> ConfigResult<DuplicatePolicy> {
        Ok(self.duplicate_policy)
    }

    async fn get_default_role(&self) -> ConfigResult<Role> {
        Ok(self.default_role)
    }

    async fn get_default_business_unit(&self) -> ConfigResult<BusinessUnit> {
        Ok(self.default_business_unit)
    }

    async fn get_history_limit(&self) -> ConfigResult<usize> {
        Ok(self.history_limit)
    }

    async fn get_send_credential_invites(&self) -> ConfigResult<bool> {
        Ok(self.send_credential_invites)
    }
}
