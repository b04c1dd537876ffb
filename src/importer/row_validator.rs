// ==========================================
// 经营看板数据导入系统 - 行校验器
// ==========================================
// 职责: 必填字段 + 唯一字段（批次内 / 已知记录）校验
// 规则:
// - 唯一性比较大小写不敏感
// - REJECT 策略: 命中已知记录记为重复
// - UPDATE 策略: 主标识命中已知记录 → 走更新；次级唯一字段单独命中仍记为重复
// - 更新时次级唯一字段属于另一条已知记录 → 记为重复
// - 批次内重复始终拒绝
// 红线: 校验失败只跳过该行，不中断批次
// ==========================================

use crate::domain::types::DuplicatePolicy;
use crate::domain::upload::{ColumnLayout, RawRow, RowErrorKind, ValidationError};
use crate::importer::importer_trait::{FieldSpec, ImportProfile};
use crate::repository::record_store::KnownRecords;
use std::collections::HashMap;

/// 校验通过后的写入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
    Create,
    Update,
}

pub struct RowValidator {
    fields: Vec<FieldSpec>,
    known: KnownRecords,
    policy: DuplicatePolicy,
    // 字段键 → (小写取值 → 首次出现的行号)
    accepted: HashMap<&'static str, HashMap<String, usize>>,
}

impl RowValidator {
    pub fn new(profile: &dyn ImportProfile, known: KnownRecords, policy: DuplicatePolicy) -> Self {
        Self {
            fields: profile.fields().to_vec(),
            known,
            policy,
            accepted: HashMap::new(),
        }
    }

    fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    fn key(value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// 已知取值归属于另一主标识时返回该标识
    fn foreign_owner(&self, field: &str, value: &str, identifier: Option<&str>) -> Option<&str> {
        let owner = self.known.owner(field, value)?;
        let own_key = identifier.map(Self::key);
        (own_key.as_deref() != Some(owner)).then_some(owner)
    }

    /// 校验一行（不登记，登记见 accept）
    pub fn check(&self, row: &RawRow, layout: &ColumnLayout) -> Result<WriteIntent, ValidationError> {
        let row_number = row.row_number;
        let identifier = self
            .unique_fields()
            .next()
            .and_then(|f| layout.cell(row, f.key));

        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.value_required && layout.cell(row, f.key).is_none())
            .map(|f| f.label)
            .collect();
        if let Some(first) = missing.first() {
            let err = ValidationError::new(
                row_number,
                RowErrorKind::MissingField,
                format!("缺少必填字段: {}", missing.join(", ")),
            )
            .with_field(*first);
            return Err(match identifier {
                Some(id) => err.with_identifier(id),
                None => err,
            });
        }

        let mut intent = WriteIntent::Create;
        for (position, field) in self.unique_fields().enumerate() {
            let Some(value) = layout.cell(row, field.key) else {
                continue;
            };
            let duplicate = |message: String| {
                let err = ValidationError::new(row_number, RowErrorKind::Duplicate, message)
                    .with_field(field.label);
                match identifier {
                    Some(id) => err.with_identifier(id),
                    None => err,
                }
            };

            if let Some(first_row) = self
                .accepted
                .get(field.key)
                .and_then(|seen| seen.get(&Self::key(value)))
            {
                return Err(duplicate(format!(
                    "{} '{}' 在本次上传中重复（首次出现在第 {} 行）",
                    field.label, value, first_row
                )));
            }

            if self.known.contains(field.key, value) {
                let is_primary = position == 0;
                match self.policy {
                    DuplicatePolicy::Update if is_primary => intent = WriteIntent::Update,
                    DuplicatePolicy::Update if intent == WriteIntent::Update => {
                        if let Some(owner) = self.foreign_owner(field.key, value, identifier) {
                            return Err(duplicate(format!(
                                "{} '{}' 已属于其他记录 {}",
                                field.label, value, owner
                            )));
                        }
                    }
                    _ => {
                        return Err(duplicate(format!("{} '{}' 已存在", field.label, value)));
                    }
                }
            }
        }

        Ok(intent)
    }

    /// 登记已接受行的唯一字段取值
    pub fn accept(&mut self, row: &RawRow, layout: &ColumnLayout) {
        for field in self.fields.iter().filter(|f| f.unique) {
            if let Some(value) = layout.cell(row, field.key) {
                self.accepted
                    .entry(field.key)
                    .or_default()
                    .entry(Self::key(value))
                    .or_insert(row.row_number);
            }
        }
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.values().map(HashMap::len).max().unwrap_or(0)
    }
}
