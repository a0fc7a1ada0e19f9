// ==========================================
// 多学院教务系统 - 选课资格引擎
// ==========================================
// 职责: 计算某课程某学期可选且尚未选课的学生
// 输入: course + course_department_restriction + student + enrollment
// 输出: 学生ID集合 / 带展示字段的资格报告 / 单人判定
// 红线: 只读, 不写库; Store 句柄由调用方显式传入
// ==========================================

use crate::domain::eligibility::{EligibilityReport, EligibleStudent, StudentEligibility};
use crate::domain::catalog::Course;
use crate::domain::types::{CourseId, Semester, StudentId};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::EligibilityCore;
use crate::repository::CatalogStore;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

// ==========================================
// EligibilityResolver - 选课资格引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct EligibilityResolver;

impl EligibilityResolver {
    pub fn new() -> Self {
        Self
    }

    /// 计算可选学生ID集合
    ///
    /// # 返回
    /// - Err(NotFound): 课程不存在
    /// - 尚无开课时, 已选集合为空, 基础过滤命中的学生全部可选
    #[instrument(skip(self, store))]
    pub fn resolve_eligible<S>(
        &self,
        store: &S,
        course_id: CourseId,
        semester: Semester,
    ) -> EngineResult<BTreeSet<StudentId>>
    where
        S: CatalogStore + ?Sized,
    {
        let report = self.resolve_eligible_detailed(store, course_id, semester)?;
        Ok(report.students.into_iter().map(|s| s.student_id).collect())
    }

    /// 计算可选学生, 附姓名/邮箱/班级等展示字段
    #[instrument(skip(self, store))]
    pub fn resolve_eligible_detailed<S>(
        &self,
        store: &S,
        course_id: CourseId,
        semester: Semester,
    ) -> EngineResult<EligibilityReport>
    where
        S: CatalogStore + ?Sized,
    {
        // === 步骤 1: 加载课程 ===
        let course = load_course(store, course_id)?;

        // === 步骤 2: 基础过滤（学院/学期/院系/限制名单） ===
        let filter = EligibilityCore::student_filter_for(&course, semester);
        let candidates = store.list_students(&filter)?;
        debug!(
            course_code = %course.code,
            course_type = %course.course_type,
            candidate_count = candidates.len(),
            "基础过滤完成"
        );

        // === 步骤 3: 剔除已选本课程本学期的学生 ===
        let enrolled = store.enrolled_student_ids(course_id, semester)?;
        let remaining = EligibilityCore::exclude_enrolled(&candidates, &enrolled);
        let already_enrolled_count = candidates.len() - remaining.len();

        let students: Vec<EligibleStudent> = remaining
            .into_iter()
            .map(|s| EligibleStudent {
                student_id: s.id,
                name: s.name.clone(),
                email: s.email.clone(),
                department_id: s.department_id,
                section_name: s.section_name.clone(),
            })
            .collect();

        info!(
            course_code = %course.code,
            semester,
            eligible = students.len(),
            already_enrolled = already_enrolled_count,
            "选课资格计算完成"
        );

        Ok(EligibilityReport {
            course_id,
            course_code: course.code,
            semester,
            filter,
            candidate_count: candidates.len(),
            already_enrolled_count,
            students,
        })
    }

    /// 判定单个学生能否选课
    ///
    /// # 返回
    /// - Err(NotFound): 课程或学生不存在
    #[instrument(skip(self, store))]
    pub fn check_student<S>(
        &self,
        store: &S,
        course_id: CourseId,
        semester: Semester,
        student_id: StudentId,
    ) -> EngineResult<StudentEligibility>
    where
        S: CatalogStore + ?Sized,
    {
        let course = load_course(store, course_id)?;
        let student = store
            .find_student(student_id)?
            .ok_or_else(|| EngineError::not_found("student", student_id))?;

        let already_enrolled =
            store.count_enrollments_for_course_semester(course_id, semester, student_id)? > 0;

        let verdict = EligibilityCore::verdict_for(&course, semester, &student, already_enrolled);
        debug!(student_id, verdict = ?verdict, reason = verdict.reason(), "单人资格判定");
        Ok(verdict)
    }
}

fn load_course<S>(store: &S, course_id: CourseId) -> EngineResult<Course>
where
    S: CatalogStore + ?Sized,
{
    store
        .find_course_by_id(course_id)?
        .ok_or_else(|| EngineError::not_found("course", course_id))
}
