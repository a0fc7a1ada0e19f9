// ==========================================
// 多学院教务系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 当前仅使用 global)
// ==========================================

use crate::config::catalog_config_trait::CatalogConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::{EmptyDuplicatePolicy, NullSectionPolicy};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 写入 action_log 载荷, 记录执行计划时生效的策略
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

/// 解析布尔型配置（1/0/true/false/yes/no）
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl CatalogConfigReader for ConfigManager {
    fn get_null_section_policy(&self) -> Result<NullSectionPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::NULL_SECTION_POLICY,
            NullSectionPolicy::Grouped.to_db_str(),
        )?;
        Ok(NullSectionPolicy::from_str(&value))
    }

    fn get_empty_duplicate_policy(&self) -> Result<EmptyDuplicatePolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::EMPTY_DUPLICATE_POLICY,
            EmptyDuplicatePolicy::KeepOldest.to_db_str(),
        )?;
        Ok(EmptyDuplicatePolicy::from_str(&value))
    }

    fn is_action_log_enabled(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ACTION_LOG_ENABLED, "1")?;
        match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => {
                tracing::warn!(
                    config_key = config_keys::ACTION_LOG_ENABLED,
                    value = %value,
                    "配置值无法解析为布尔, 使用默认值 true"
                );
                Ok(true)
            }
        }
    }

    fn get_default_actor(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_ACTOR, "system")?;
        let trimmed = value.trim();
        Ok(if trimmed.is_empty() { "system".to_string() } else { trimmed.to_string() })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 去重策略
    pub const NULL_SECTION_POLICY: &str = "reconcile.null_section_policy";
    pub const EMPTY_DUPLICATE_POLICY: &str = "reconcile.empty_duplicate_policy";

    // 审计
    pub const ACTION_LOG_ENABLED: &str = "audit.action_log_enabled";
    pub const DEFAULT_ACTOR: &str = "audit.default_actor";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = crate::db::open_in_memory_catalog().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = setup();
        assert_eq!(config.get_null_section_policy().unwrap(), NullSectionPolicy::Grouped);
        assert_eq!(
            config.get_empty_duplicate_policy().unwrap(),
            EmptyDuplicatePolicy::KeepOldest
        );
        assert!(config.is_action_log_enabled().unwrap());
        assert_eq!(config.get_default_actor().unwrap(), "system");
    }

    #[test]
    fn test_overrides_from_config_kv() {
        let config = setup();
        config.set_global_value(config_keys::NULL_SECTION_POLICY, "SINGLETON").unwrap();
        config.set_global_value(config_keys::EMPTY_DUPLICATE_POLICY, "report").unwrap();
        config.set_global_value(config_keys::ACTION_LOG_ENABLED, "false").unwrap();
        config.set_global_value(config_keys::DEFAULT_ACTOR, " registrar ").unwrap();

        assert_eq!(config.get_null_section_policy().unwrap(), NullSectionPolicy::Singleton);
        assert_eq!(config.get_empty_duplicate_policy().unwrap(), EmptyDuplicatePolicy::Report);
        assert!(!config.is_action_log_enabled().unwrap());
        assert_eq!(config.get_default_actor().unwrap(), "registrar");

        // UPSERT 覆盖
        config.set_global_value(config_keys::ACTION_LOG_ENABLED, "1").unwrap();
        assert!(config.is_action_log_enabled().unwrap());
    }

    #[test]
    fn test_unparseable_bool_falls_back_to_default() {
        let config = setup();
        config.set_global_value(config_keys::ACTION_LOG_ENABLED, "maybe").unwrap();
        assert!(config.is_action_log_enabled().unwrap());
    }

    #[test]
    fn test_config_snapshot() {
        let config = setup();
        config.set_global_value(config_keys::DEFAULT_ACTOR, "admin").unwrap();
        let snapshot: serde_json::Value =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot[config_keys::DEFAULT_ACTOR], "admin");
    }
}
