// ==========================================
// 经营看板数据导入系统 - 领域类型定义
// ==========================================
// 职责: 固定词表枚举（角色/事业部/指标单位）与导入模式开关
// 红线: 词表外取值只能落到默认值或被拒绝，不得原样入库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 把词表原始值规整为匹配用的形式（小写、去空白与分隔符）
fn vocab_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-' && *c != '.')
        .collect()
}

// ==========================================
// 导入记录族 (Record Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    KpiMetric, // KPI 指标月度数据
    Employee,  // 员工档案
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::KpiMetric => write!(f, "KPI_METRIC"),
            RecordKind::Employee => write!(f, "EMPLOYEE"),
        }
    }
}

// ==========================================
// 员工角色 (Role)
// ==========================================
// 词表: Associate / Lead / Manager / Director / VP / CXO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Associate,
    Lead,
    Manager,
    Director,
    VP,
    CXO,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Associate,
        Role::Lead,
        Role::Manager,
        Role::Director,
        Role::VP,
        Role::CXO,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Associate => "Associate",
            Role::Lead => "Lead",
            Role::Manager => "Manager",
            Role::Director => "Director",
            Role::VP => "VP",
            Role::CXO => "CXO",
        }
    }

    /// 词表匹配（大小写不敏感，含常见别名）；匹配不到返回 None
    pub fn from_vocab(raw: &str) -> Option<Self> {
        match vocab_key(raw).as_str() {
            "associate" => Some(Role::Associate),
            "lead" | "teamlead" => Some(Role::Lead),
            "manager" => Some(Role::Manager),
            "director" => Some(Role::Director),
            "vp" | "vicepresident" => Some(Role::VP),
            "cxo" | "ceo" | "cfo" | "coo" | "cto" => Some(Role::CXO),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 事业部 (Business Unit)
// ==========================================
// 序列化格式: 小写代码（与数据库一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessUnit {
    #[default]
    Sales,
    Marketing,
    Operations,
    Finance,
    Hr,
    Technology,
}

impl BusinessUnit {
    pub const ALL: [BusinessUnit; 6] = [
        BusinessUnit::Sales,
        BusinessUnit::Marketing,
        BusinessUnit::Operations,
        BusinessUnit::Finance,
        BusinessUnit::Hr,
        BusinessUnit::Technology,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            BusinessUnit::Sales => "sales",
            BusinessUnit::Marketing => "marketing",
            BusinessUnit::Operations => "operations",
            BusinessUnit::Finance => "finance",
            BusinessUnit::Hr => "hr",
            BusinessUnit::Technology => "technology",
        }
    }

    pub fn from_vocab(raw: &str) -> Option<Self> {
        match vocab_key(raw).as_str() {
            "sales" => Some(BusinessUnit::Sales),
            "marketing" | "mkt" => Some(BusinessUnit::Marketing),
            "operations" | "ops" => Some(BusinessUnit::Operations),
            "finance" | "fin" => Some(BusinessUnit::Finance),
            "hr" | "humanresources" | "people" => Some(BusinessUnit::Hr),
            "technology" | "tech" | "it" | "engineering" => Some(BusinessUnit::Technology),
            _ => None,
        }
    }

    /// 模板示例指标名（无线上数据时用于生成占位行）
    pub fn sample_metrics(&self) -> &'static [&'static str] {
        match self {
            BusinessUnit::Sales => &["Revenue", "New Customers", "Win Rate", "Average Deal Size"],
            BusinessUnit::Marketing => &["Leads Generated", "Cost Per Lead", "Conversion Rate", "Website Visits"],
            BusinessUnit::Operations => &["Orders Fulfilled", "On-Time Delivery", "Inventory Turnover", "Defect Rate"],
            BusinessUnit::Finance => &["Operating Margin", "Cash Balance", "Days Sales Outstanding", "Operating Expenses"],
            BusinessUnit::Hr => &["Headcount", "Attrition Rate", "Time To Hire", "Training Hours"],
            BusinessUnit::Technology => &["System Uptime", "Deployments", "Open Incidents", "Mean Time To Recovery"],
        }
    }
}

impl fmt::Display for BusinessUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 指标单位 (Metric Unit)
// ==========================================
// KPI 表中 "Data Type" 列的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricUnit {
    #[default]
    Number,
    Percentage,
    Currency,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Number => "number",
            MetricUnit::Percentage => "percentage",
            MetricUnit::Currency => "currency",
        }
    }

    pub fn from_vocab(raw: &str) -> Option<Self> {
        match vocab_key(raw).as_str() {
            "number" | "numeric" | "count" | "#" | "integer" => Some(MetricUnit::Number),
            "percentage" | "percent" | "%" | "pct" | "rate" => Some(MetricUnit::Percentage),
            "currency" | "money" | "amount" | "$" | "usd" => Some(MetricUnit::Currency),
            _ => None,
        }
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 校验模式 (Validation Mode)
// ==========================================
// PERMISSIVE: 非法数值 → 0，未知枚举 → 默认值
// STRICT: 同样的输入记为行级错误并跳过该行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationMode {
    #[default]
    Permissive,
    Strict,
}

impl ValidationMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "PERMISSIVE" => Some(ValidationMode::Permissive),
            "STRICT" => Some(ValidationMode::Strict),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Permissive => write!(f, "PERMISSIVE"),
            ValidationMode::Strict => write!(f, "STRICT"),
        }
    }
}

// ==========================================
// 重复主键策略 (Duplicate Policy)
// ==========================================
// REJECT: 已存在的标识记为重复错误（重复上传不产生任何写入）
// UPDATE: 已存在的标识走更新；同批次内重复始终拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Update,
}

impl DuplicatePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "REJECT" => Some(DuplicatePolicy::Reject),
            "UPDATE" => Some(DuplicatePolicy::Update),
            _ => None,
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "REJECT"),
            DuplicatePolicy::Update => write!(f, "UPDATE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_vocab() {
        assert_eq!(Role::from_vocab("manager"), Some(Role::Manager));
        assert_eq!(Role::from_vocab("  Vice President "), Some(Role::VP));
        assert_eq!(Role::from_vocab("Intern"), None);
        assert_eq!(Role::default(), Role::Associate);
    }

    #[test]
    fn test_business_unit_vocab() {
        assert_eq!(BusinessUnit::from_vocab("OPS"), Some(BusinessUnit::Operations));
        assert_eq!(BusinessUnit::from_vocab("Human_Resources"), Some(BusinessUnit::Hr));
        assert_eq!(BusinessUnit::from_vocab("legal"), None);
        assert_eq!(BusinessUnit::default().code(), "sales");
    }

    #[test]
    fn test_metric_unit_vocab() {
        assert_eq!(MetricUnit::from_vocab("%"), Some(MetricUnit::Percentage));
        assert_eq!(MetricUnit::from_vocab("Currency"), Some(MetricUnit::Currency));
        assert_eq!(MetricUnit::from_vocab("weird"), None);
    }

    #[test]
    fn test_mode_and_policy_parse() {
        assert_eq!(ValidationMode::parse("strict"), Some(ValidationMode::Strict));
        assert_eq!(DuplicatePolicy::parse(" update "), Some(DuplicatePolicy::Update));
        assert_eq!(DuplicatePolicy::parse("merge"), None);
    }
}
