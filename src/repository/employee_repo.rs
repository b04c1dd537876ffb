// ==========================================
// 经营看板数据导入系统 - 员工 Repository Trait
// ==========================================
// 职责: 定义员工数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::employee::{Employee, EmployeeRecord};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// EmployeeRepository Trait
// ==========================================
// 实现者: EmployeeRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// 新建员工；上级邮箱能解析到现有员工时回填上级编号
    ///
    /// # 返回
    /// - Ok(employee_id)
    /// - Err(UniqueConstraintViolation): 编号或邮箱已被占用
    async fn insert_employee(&self, record: &EmployeeRecord) -> RepositoryResult<String>;

    /// 按员工编号更新
    ///
    /// # 返回
    /// - Err(NotFound): 编号不存在
    async fn update_employee(&self, record: &EmployeeRecord) -> RepositoryResult<()>;

    /// 按员工编号查询（大小写不敏感）
    async fn find_by_code(&self, employee_code: &str) -> RepositoryResult<Option<Employee>>;

    /// 按邮箱查询
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Employee>>;

    /// 全部员工的 (编号, 邮箱)，按编号排序
    async fn list_code_emails(&self) -> RepositoryResult<Vec<(String, String)>>;

    /// 回填认证身份 ID
    async fn set_identity(&self, employee_code: &str, identity_id: &str) -> RepositoryResult<()>;

    /// 统计员工数量
    async fn count_employees(&self) -> RepositoryResult<usize>;
}
