// ==========================================
// 多学院教务系统 - 配置层
// ==========================================
// 职责: 去重策略与审计配置, 缺省值内置
// 存储: config_kv 表
// ==========================================

pub mod catalog_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use catalog_config_trait::CatalogConfigReader;
pub use config_manager::{config_keys, ConfigManager};
