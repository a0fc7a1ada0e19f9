// ==========================================
// 多学院教务系统 - Eligibility Core 纯函数库
// ==========================================
// 职责: 选课资格的过滤条件构造、单人判定、已选剔除
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::catalog::{Course, Student};
use crate::domain::eligibility::{StudentEligibility, StudentFilter};
use crate::domain::types::{Semester, StudentId};
use std::collections::BTreeSet;

// ==========================================
// EligibilityCore - 纯函数工具类
// ==========================================
pub struct EligibilityCore;

impl EligibilityCore {
    /// 构造学生基础过滤条件
    ///
    /// # 规则
    /// 1. college = course.department.college, semester = 目标学期
    /// 2. core / department_elective → 仅限开课院系
    /// 3. open_elective → 排除限制名单中的院系, 其余院系均可
    pub fn student_filter_for(course: &Course, semester: Semester) -> StudentFilter {
        if course.course_type.is_department_bound() {
            return StudentFilter {
                college_id: course.college_id,
                semester,
                department_id: Some(course.department_id),
                excluded_department_ids: Vec::new(),
            };
        }

        let mut excluded = course.restricted_department_ids.clone();
        excluded.sort_unstable();
        excluded.dedup();

        StudentFilter {
            college_id: course.college_id,
            semester,
            department_id: None,
            excluded_department_ids: excluded,
        }
    }

    /// 判定单个学生（规则顺序与 student_filter_for 一致, 最后检查已选）
    pub fn verdict_for(
        course: &Course,
        semester: Semester,
        student: &Student,
        already_enrolled: bool,
    ) -> StudentEligibility {
        let filter = Self::student_filter_for(course, semester);

        if student.college_id != filter.college_id {
            return StudentEligibility::WrongCollege;
        }
        if student.semester != filter.semester {
            return StudentEligibility::WrongSemester;
        }
        if let Some(dept) = filter.department_id {
            if student.department_id != dept {
                return StudentEligibility::WrongDepartment;
            }
        }
        if filter.excluded_department_ids.contains(&student.department_id) {
            return StudentEligibility::RestrictedDepartment;
        }
        if already_enrolled {
            return StudentEligibility::AlreadyEnrolled;
        }
        StudentEligibility::Eligible
    }

    /// 从候选学生中剔除已选本课程本学期的学生
    pub fn exclude_enrolled<'a>(
        candidates: &'a [Student],
        enrolled: &BTreeSet<StudentId>,
    ) -> Vec<&'a Student> {
        candidates
            .iter()
            .filter(|s| !enrolled.contains(&s.id))
            .collect()
    }
}
