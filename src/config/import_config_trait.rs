// ==========================================
// 经营看板数据导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::types::{BusinessUnit, DuplicatePolicy, Role, ValidationMode};
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）；测试中用 MockConfig
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 校验模式
    ///
    /// # 默认值
    /// - PERMISSIVE（非法数值按 0，未知枚举按默认值）
    async fn get_validation_mode(&self) -> ConfigResult<ValidationMode>;

    /// 已存在记录的处理策略
    ///
    /// # 默认值
    /// - REJECT（重复上传同一文件不产生写入）
    async fn get_duplicate_policy(&self) -> ConfigResult<DuplicatePolicy>;

    /// 未识别/空白角色的默认值
    ///
    /// # 默认值
    /// - Associate
    async fn get_default_role(&self) -> ConfigResult<Role>;

    /// 未识别/空白事业部的默认值
    ///
    /// # 默认值
    /// - sales
    async fn get_default_business_unit(&self) -> ConfigResult<BusinessUnit>;

    /// 会话内上传历史保留条数
    ///
    /// # 默认值
    /// - 20
    async fn get_history_limit(&self) -> ConfigResult<usize>;

    /// 新建员工后是否开通身份并发送凭据邀请
    ///
    /// # 默认值
    /// - true
    async fn get_send_credential_invites(&self) -> ConfigResult<bool>;
}
