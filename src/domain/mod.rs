// ==========================================
// 多学院教务系统 - 领域模型层
// ==========================================
// 职责: 定义教务目录实体、资格与去重计划的数据结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod catalog;
pub mod eligibility;
pub mod enrollment;
pub mod reconciliation;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use catalog::{
    AcademicYear, Course, Department, DuplicateCourse, EnrollmentRecord, NewEnrollment,
    NewStudent, OfferingSummary, Student,
};
pub use eligibility::{EligibilityReport, EligibleStudent, StudentEligibility, StudentFilter};
pub use enrollment::{EnrollmentApplyReport, EnrollmentPlan};
pub use reconciliation::{
    ActionOutcome, ActionReport, ApplyReport, CatalogOp, FailureKind, GroupReport,
    Migration, MissingOffering, OpStatus, PlanGroup, PlannedDeletion, ReconcileConflict,
    ReconciliationPlan,
};
pub use types::{
    AcademicYearId, CollegeId, CourseId, CourseType, DepartmentId, EmptyDuplicatePolicy,
    EnrollmentId, NullSectionPolicy, OfferingId, SectionId, SectionKey, Semester, StudentId,
    TeacherId,
};
