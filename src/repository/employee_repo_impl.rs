// ==========================================
// 经营看板数据导入系统 - 员工 Repository 实现
// ==========================================
// 职责: 实现员工数据访问（使用 rusqlite）
// 约束: 所有查询使用参数化
// ==========================================

use crate::domain::employee::{Employee, EmployeeRecord};
use crate::domain::types::{BusinessUnit, Role};
use crate::repository::employee_repo::EmployeeRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "employee_id, employee_code, first_name, last_name, email, \
                              job_title, department, business_unit, manager_email, manager_code, \
                              hire_date, role, is_active, phone, location, identity_id, \
                              created_at, updated_at";

/// 员工编号比较键（大小写不敏感）
pub(crate) fn employee_code_key(code: &str) -> String {
    code.trim().to_lowercase()
}

// ==========================================
// EmployeeRepositoryImpl
// ==========================================
pub struct EmployeeRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepositoryImpl {
    /// 从共享连接创建（连接需已完成建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
        let business_unit: String = row.get(7)?;
        let role: String = row.get(11)?;
        Ok(Employee {
            employee_id: row.get(0)?,
            record: EmployeeRecord {
                employee_code: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                email: row.get(4)?,
                job_title: row.get(5)?,
                department: row.get(6)?,
                business_unit: BusinessUnit::from_vocab(&business_unit).unwrap_or_default(),
                manager_email: row.get(8)?,
                hire_date: row.get(10)?,
                role: Role::from_vocab(&role).unwrap_or_default(),
                is_active: row.get::<_, i64>(12)? != 0,
                phone: row.get(13)?,
                location: row.get(14)?,
            },
            manager_code: row.get(9)?,
            identity_id: row.get(15)?,
            created_at: row.get::<_, DateTime<Utc>>(16)?,
            updated_at: row.get::<_, DateTime<Utc>>(17)?,
        })
    }

    /// 上级邮箱 → 上级员工编号（查不到返回 None）
    fn resolve_manager_code(
        conn: &Connection,
        manager_email: Option<&str>,
    ) -> RepositoryResult<Option<String>> {
        let Some(email) = manager_email else {
            return Ok(None);
        };
        let code = conn
            .query_row(
                "SELECT employee_code FROM employee WHERE email = ?1",
                params![email.trim().to_lowercase()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(code)
    }
}

#[async_trait]
impl EmployeeRepository for EmployeeRepositoryImpl {
    async fn insert_employee(&self, record: &EmployeeRecord) -> RepositoryResult<String> {
        let conn = self.conn.lock()?;
        let employee_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let manager_code = Self::resolve_manager_code(&conn, record.manager_email.as_deref())?;

        conn.execute(
            r#"
            INSERT INTO employee (
                employee_id, employee_code, code_key, first_name, last_name, email,
                job_title, department, business_unit, manager_email, manager_code,
                hire_date, role, is_active, phone, location, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                employee_id,
                record.employee_code,
                employee_code_key(&record.employee_code),
                record.first_name,
                record.last_name,
                record.email,
                record.job_title,
                record.department,
                record.business_unit.code(),
                record.manager_email,
                manager_code,
                record.hire_date,
                record.role.as_str(),
                record.is_active as i64,
                record.phone,
                record.location,
                now,
                now,
            ],
        )?;

        Ok(employee_id)
    }

    async fn update_employee(&self, record: &EmployeeRecord) -> RepositoryResult<()> {
        let conn = self.conn.lock()?;
        let manager_code = Self::resolve_manager_code(&conn, record.manager_email.as_deref())?;

        let affected = conn.execute(
            r#"
            UPDATE employee
            SET first_name = ?1, last_name = ?2, email = ?3, job_title = ?4, department = ?5,
                business_unit = ?6, manager_email = ?7, manager_code = ?8, hire_date = ?9,
                role = ?10, is_active = ?11, phone = ?12, location = ?13, updated_at = ?14
            WHERE code_key = ?15
            "#,
            params![
                record.first_name,
                record.last_name,
                record.email,
                record.job_title,
                record.department,
                record.business_unit.code(),
                record.manager_email,
                manager_code,
                record.hire_date,
                record.role.as_str(),
                record.is_active as i64,
                record.phone,
                record.location,
                Utc::now(),
                employee_code_key(&record.employee_code),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: record.employee_code.clone(),
            });
        }
        Ok(())
    }

    async fn find_by_code(&self, employee_code: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.conn.lock()?;
        let sql = format!("SELECT {} FROM employee WHERE code_key = ?1", SELECT_COLUMNS);
        let employee = conn
            .query_row(&sql, params![employee_code_key(employee_code)], Self::map_row)
            .optional()?;
        Ok(employee)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.conn.lock()?;
        let sql = format!("SELECT {} FROM employee WHERE email = ?1", SELECT_COLUMNS);
        let employee = conn
            .query_row(&sql, params![email.trim().to_lowercase()], Self::map_row)
            .optional()?;
        Ok(employee)
    }

    async fn list_code_emails(&self) -> RepositoryResult<Vec<(String, String)>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare("SELECT employee_code, email FROM employee ORDER BY code_key")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }

    async fn set_identity(&self, employee_code: &str, identity_id: &str) -> RepositoryResult<()> {
        let conn = self.conn.lock()?;
        let affected = conn.execute(
            "UPDATE employee SET identity_id = ?1, updated_at = ?2 WHERE code_key = ?3",
            params![identity_id, Utc::now(), employee_code_key(employee_code)],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: employee_code.to_string(),
            });
        }
        Ok(())
    }

    async fn count_employees(&self) -> RepositoryResult<usize> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM employee", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
