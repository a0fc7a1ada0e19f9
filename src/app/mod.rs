// ==========================================
// 多学院教务系统 - 应用层
// ==========================================
// 职责: 装配数据库/仓储/引擎, 供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
