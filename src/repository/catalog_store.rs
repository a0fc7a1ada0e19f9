// ==========================================
// 多学院教务系统 - 教务目录 Store Trait
// ==========================================
// 职责: 定义资格/去重引擎所需的数据访问接口（不包含实现）
// 红线: Store 不含业务规则，只做数据查询与写入
// 约束: 引擎每次调用都显式传入 Store 句柄, 不使用全局单例
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::catalog::{
    AcademicYear, Course, Department, DuplicateCourse, EnrollmentRecord, NewEnrollment,
    OfferingSummary, Student,
};
use crate::domain::eligibility::StudentFilter;
use crate::domain::reconciliation::{CatalogOp, OpStatus};
use crate::domain::types::{
    AcademicYearId, CourseId, DepartmentId, EnrollmentId, OfferingId, Semester, StudentId,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::BTreeSet;

// ==========================================
// GroupFailure - 事务组失败信息
// ==========================================
// 事务已回滚; index 指向失败的操作,
// None 表示失败发生在操作之外（取锁/开启事务/审计日志/提交）
#[derive(Debug)]
pub struct GroupFailure {
    pub index: Option<usize>,
    pub error: RepositoryError,
}

// ==========================================
// CatalogStore Trait
// ==========================================
// 实现者: SqliteCatalogStore（使用 rusqlite）
pub trait CatalogStore: Send + Sync {
    // ===== 课程与目录 =====

    /// 按院系 + 课程代码查找课程
    ///
    /// # 说明
    /// 历史数据存在同院系重复代码, 此时返回 id 最小的一条
    fn find_course(&self, code: &str, department_id: DepartmentId) -> RepositoryResult<Option<Course>>;

    /// 按 id 查找课程
    fn find_course_by_id(&self, course_id: CourseId) -> RepositoryResult<Option<Course>>;

    /// 按学院代码 + 院系代码查找院系
    fn find_department(
        &self,
        college_code: &str,
        department_code: &str,
    ) -> RepositoryResult<Option<Department>>;

    /// 按标签查找学年（如 "2024-25"）
    fn find_academic_year(&self, label: &str) -> RepositoryResult<Option<AcademicYear>>;

    /// 列出院系内重复的课程代码（department_id 为 None 时全库）
    fn list_course_duplicates(
        &self,
        department_id: Option<DepartmentId>,
    ) -> RepositoryResult<Vec<DuplicateCourse>>;

    // ===== 开课 =====

    /// 列出 (course, semester, academic_year) 下的全部开课, 含选课人数, 按 id 升序
    fn list_offerings(
        &self,
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
    ) -> RepositoryResult<Vec<OfferingSummary>>;

    // ===== 学生 =====

    /// 按过滤条件列出学生, 按 id 升序
    fn list_students(&self, filter: &StudentFilter) -> RepositoryResult<Vec<Student>>;

    fn find_student(&self, student_id: StudentId) -> RepositoryResult<Option<Student>>;

    // ===== 选课 =====

    /// 学生在本课程本学期（任意开课、任意学年）的选课数
    fn count_enrollments_for_course_semester(
        &self,
        course_id: CourseId,
        semester: Semester,
        student_id: StudentId,
    ) -> RepositoryResult<i64>;

    /// 本课程本学期已有选课的学生集合（count 的批量形式）
    fn enrolled_student_ids(
        &self,
        course_id: CourseId,
        semester: Semester,
    ) -> RepositoryResult<BTreeSet<StudentId>>;

    /// 列出给定开课下的全部选课, 附学生登记班级, 按 id 升序
    fn list_enrollments(&self, offering_ids: &[OfferingId]) -> RepositoryResult<Vec<EnrollmentRecord>>;

    // ===== 写入 =====

    /// 删除开课
    ///
    /// # 返回
    /// - Err(NotFound): 开课不存在
    /// - Err(ForeignKeyViolation): 仍有选课指向该开课
    fn delete_offering(&self, offering_id: OfferingId) -> RepositoryResult<()>;

    /// 修改选课所属开课
    fn update_enrollment_offering(
        &self,
        enrollment_id: EnrollmentId,
        new_offering_id: OfferingId,
    ) -> RepositoryResult<()>;

    /// 在单个事务中按顺序执行一组操作
    ///
    /// # 参数
    /// - audit: 审计日志, 与操作同事务写入, 同提交同回滚
    ///
    /// # 返回
    /// - Ok(Vec<OpStatus>): 全部成功并已提交, 与 ops 一一对应
    /// - Err(GroupFailure): 第一个失败的操作及原因, 事务已回滚
    fn apply_group(
        &self,
        ops: &[CatalogOp],
        audit: Option<&ActionLog>,
    ) -> Result<Vec<OpStatus>, GroupFailure>;

    /// 在单个事务中批量插入选课（审计日志同事务写入）
    fn insert_enrollments(
        &self,
        enrollments: &[NewEnrollment],
        audit: Option<&ActionLog>,
    ) -> RepositoryResult<usize>;
}
