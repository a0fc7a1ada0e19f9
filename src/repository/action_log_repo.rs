// ==========================================
// 多学院教务系统 - 操作日志数据仓储
// ==========================================
// 对齐: v0.1_catalog.sql action_log 表
// 红线: 所有执行步骤的写入必须记录
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;
pub(crate) use self::core::insert_action_log;
