// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use college_erp::config::CatalogConfigReader;
use college_erp::domain::types::{EmptyDuplicatePolicy, NullSectionPolicy};
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub null_section_policy: NullSectionPolicy,
    pub empty_duplicate_policy: EmptyDuplicatePolicy,
    pub action_log_enabled: bool,
    pub default_actor: String,
    /// 为 true 时所有读取返回错误
    pub broken: bool,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            null_section_policy: NullSectionPolicy::Grouped,
            empty_duplicate_policy: EmptyDuplicatePolicy::KeepOldest,
            action_log_enabled: true,
            default_actor: "mock".to_string(),
            broken: false,
        }
    }

    pub fn singleton_nulls() -> Self {
        let mut config = Self::default();
        config.null_section_policy = NullSectionPolicy::Singleton;
        config
    }

    pub fn report_empty_duplicates() -> Self {
        let mut config = Self::default();
        config.empty_duplicate_policy = EmptyDuplicatePolicy::Report;
        config
    }

    pub fn without_action_log() -> Self {
        let mut config = Self::default();
        config.action_log_enabled = false;
        config
    }

    pub fn broken() -> Self {
        let mut config = Self::default();
        config.broken = true;
        config
    }

    fn check(&self) -> Result<(), Box<dyn Error>> {
        if self.broken {
            return Err("mock config unavailable".into());
        }
        Ok(())
    }
}

impl CatalogConfigReader for MockConfig {
    fn get_null_section_policy(&self) -> Result<NullSectionPolicy, Box<dyn Error>> {
        self.check()?;
        Ok(self.null_section_policy)
    }

    fn get_empty_duplicate_policy(&self) -> Result<EmptyDuplicatePolicy, Box<dyn Error>> {
        self.check()?;
        Ok(self.empty_duplicate_policy)
    }

    fn is_action_log_enabled(&self) -> Result<bool, Box<dyn Error>> {
        self.check()?;
        Ok(self.action_log_enabled)
    }

    fn get_default_actor(&self) -> Result<String, Box<dyn Error>> {
        self.check()?;
        Ok(self.default_actor.clone())
    }
}
