// ==========================================
// 多学院教务系统 - 引擎层
// ==========================================
// 职责: 实现选课资格与开课去重规则, 不拼 SQL
// 红线: Engine 不拼 SQL; Store 句柄每次调用显式传入
// 红线: 计划与执行分离, 计划只是数据
// ==========================================

pub mod course_audit;
pub mod eligibility;
pub mod eligibility_core;
pub mod enrollment;
pub mod error;
pub mod plan_executor;
pub mod reconcile;
pub mod reconcile_core;

// 重导出核心引擎
pub use course_audit::CourseAuditor;
pub use eligibility::EligibilityResolver;
pub use eligibility_core::EligibilityCore;
pub use enrollment::EnrollmentPlanner;
pub use error::{EngineError, EngineResult};
pub use plan_executor::PlanExecutor;
pub use reconcile::OfferingReconciler;
pub use reconcile_core::ReconcileCore;
