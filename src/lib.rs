// ==========================================
// 多学院教务系统 - 核心库
// ==========================================
// 范围: 选课资格计算 + 开课去重 + 选课补录
// 技术栈: Rust + SQLite (rusqlite)
// 系统定位: 维护工具 (默认预演, 显式执行)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CourseType, EmptyDuplicatePolicy, NullSectionPolicy, SectionKey};

// 领域实体
pub use domain::{
    ActionLog, ActionType, ApplyReport, Course, EligibilityReport, EnrollmentPlan,
    ReconciliationPlan, Student,
};

// 仓储
pub use repository::{ActionLogRepository, CatalogStore, SqliteCatalogStore};

// 配置
pub use config::{CatalogConfigReader, ConfigManager};

// 引擎
pub use engine::{
    CourseAuditor, EligibilityResolver, EngineError, EnrollmentPlanner, OfferingReconciler,
    PlanExecutor,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "多学院教务系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(db::CURRENT_SCHEMA_VERSION, 1);
    }
}
