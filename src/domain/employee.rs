// ==========================================
// 经营看板数据导入系统 - 员工领域模型
// ==========================================
// 用途: 员工上传的标准化结果 + 仓储层落库实体
// 对齐: schema employee 表
// ==========================================

use crate::domain::types::{BusinessUnit, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// EmployeeRecord - 员工档案（标准化后）
// ==========================================
// 红线: employee_code / email 在批次内与已知记录中唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    // ===== 主键 =====
    pub employee_code: String, // 员工编号

    // ===== 必填信息 =====
    pub first_name: String,
    pub last_name: String,
    pub email: String, // 小写存储

    // ===== 可选信息 =====
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub business_unit: BusinessUnit,   // 未识别 → 默认事业部
    pub manager_email: Option<String>, // 上级邮箱（落库时解析为上级编号）
    pub hire_date: Option<String>,     // 原样透传，不做格式校验
    pub role: Role,                    // 未识别 → 默认角色
    pub is_active: bool,               // 空值视为在职
    pub phone: Option<String>,
    pub location: Option<String>,
}

impl EmployeeRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==========================================
// Employee - 员工（已落库）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,                   // UUID
    pub record: EmployeeRecord,                // 档案内容
    pub manager_code: Option<String>,          // 上级员工编号（按邮箱解析，解析不到为空）
    pub identity_id: Option<String>,           // 认证身份 ID（开通后回填）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
