// ==========================================
// 多学院教务系统 - 教务配置读取 Trait
// ==========================================
// 职责: 定义资格/去重引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{EmptyDuplicatePolicy, NullSectionPolicy};
use std::error::Error;

// ==========================================
// CatalogConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait CatalogConfigReader: Send + Sync {
    // ===== 去重策略 =====

    /// 无班级开课的分组方式
    ///
    /// # 默认值
    /// - GROUPED（所有无班级开课归入 "None" 组）
    fn get_null_section_policy(&self) -> Result<NullSectionPolicy, Box<dyn Error>>;

    /// 同班级多条开课均无选课时的处理方式
    ///
    /// # 默认值
    /// - KEEP_OLDEST
    fn get_empty_duplicate_policy(&self) -> Result<EmptyDuplicatePolicy, Box<dyn Error>>;

    // ===== 审计 =====

    /// 执行计划时是否写 action_log
    ///
    /// # 默认值
    /// - true
    fn is_action_log_enabled(&self) -> Result<bool, Box<dyn Error>>;

    /// 未显式指定操作人时使用的名字
    ///
    /// # 默认值
    /// - "system"
    fn get_default_actor(&self) -> Result<String, Box<dyn Error>>;
}
