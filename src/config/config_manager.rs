// ==========================================
// 经营看板数据导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (scope_id = 'global')
// 缺省: 表中无记录时使用 config_keys::DEFAULTS
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::types::{BusinessUnit, DuplicatePolicy, Role, ValidationMode};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const VALIDATION_MODE: &str = "validation_mode";
    pub const DUPLICATE_POLICY: &str = "duplicate_policy";
    pub const DEFAULT_ROLE: &str = "default_role";
    pub const DEFAULT_BUSINESS_UNIT: &str = "default_business_unit";
    pub const HISTORY_LIMIT: &str = "history_limit";
    pub const SEND_CREDENTIAL_INVITES: &str = "send_credential_invites";

    /// (键, 默认值)
    pub const DEFAULTS: [(&str, &str); 6] = [
        (VALIDATION_MODE, "PERMISSIVE"),
        (DUPLICATE_POLICY, "REJECT"),
        (DEFAULT_ROLE, "Associate"),
        (DEFAULT_BUSINESS_UNIT, "sales"),
        (HISTORY_LIMIT, "20"),
        (SEND_CREDENTIAL_INVITES, "true"),
    ];

    pub fn default_for(key: &str) -> Option<&'static str> {
        DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

const MAX_HISTORY_LIMIT: usize = 500;

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_history_limit(raw: &str) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|v| (1..=MAX_HISTORY_LIMIT).contains(v))
}

/// 校验并规整配置值（写入前调用）
fn canonical_value(key: &str, raw: &str) -> ConfigResult<String> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    };
    let value = match key {
        config_keys::VALIDATION_MODE => ValidationMode::parse(raw).ok_or_else(invalid)?.to_string(),
        config_keys::DUPLICATE_POLICY => DuplicatePolicy::parse(raw).ok_or_else(invalid)?.to_string(),
        config_keys::DEFAULT_ROLE => Role::from_vocab(raw).ok_or_else(invalid)?.as_str().to_string(),
        config_keys::DEFAULT_BUSINESS_UNIT => {
            BusinessUnit::from_vocab(raw).ok_or_else(invalid)?.code().to_string()
        }
        config_keys::HISTORY_LIMIT => parse_history_limit(raw).ok_or_else(invalid)?.to_string(),
        config_keys::SEND_CREDENTIAL_INVITES => parse_bool(raw).ok_or_else(invalid)?.to_string(),
        other => return Err(ConfigError::UnknownKey(other.to_string())),
    };
    Ok(value)
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 按数据库路径创建（需已完成建表）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn.lock()?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_config_or_default(&self, key: &str) -> ConfigResult<String> {
        match self.get_global_config_value(key)? {
            Some(value) => Ok(value),
            None => config_keys::default_for(key)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string())),
        }
    }

    /// 读取并解析；库中取值非法时告警并回退默认值
    fn read_parsed<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> ConfigResult<T> {
        let raw = self.get_config_or_default(key)?;
        if let Some(value) = parse(&raw) {
            return Ok(value);
        }
        warn!(config_key = key, raw_value = %raw, "配置值非法，使用默认值");
        config_keys::default_for(key)
            .and_then(|d| parse(d))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
    }

    /// 写入配置（校验后规整存储）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<String> {
        let canonical = canonical_value(key, value)?;
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, canonical, Utc::now()],
        )?;
        info!(config_key = key, value = %canonical, "配置已更新");
        Ok(canonical)
    }

    /// 生效配置快照（库中值覆盖默认值，JSON）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let mut effective: BTreeMap<String, String> = config_keys::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let conn = self.conn.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            effective.insert(key, value);
        }

        Ok(serde_json::to_string_pretty(&effective)?)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_validation_mode(&self) -> ConfigResult<ValidationMode> {
        self.read_parsed(config_keys::VALIDATION_MODE, ValidationMode::parse)
    }

    async fn get_duplicate_policy(&self) -> ConfigResult<DuplicatePolicy> {
        self.read_parsed(config_keys::DUPLICATE_POLICY, DuplicatePolicy::parse)
    }

    async fn get_default_role(&self) -> ConfigResult<Role> {
        self.read_parsed(config_keys::DEFAULT_ROLE, Role::from_vocab)
    }

    async fn get_default_business_unit(&self) -> ConfigResult<BusinessUnit> {
        self.read_parsed(config_keys::DEFAULT_BUSINESS_UNIT, BusinessUnit::from_vocab)
    }

    async fn get_history_limit(&self) -> ConfigResult<usize> {
        self.read_parsed(config_keys::HISTORY_LIMIT, parse_history_limit)
    }

    async fn get_send_credential_invites(&self) -> ConfigResult<bool> {
        self.read_parsed(config_keys::SEND_CREDENTIAL_INVITES, parse_bool)
    }
}
