// ==========================================
// 多学院教务系统 - 选课补录计划模型
// ==========================================
// 用途: 把可选课学生分配到本班级的规范开课
// ==========================================

use crate::domain::catalog::NewEnrollment;
use crate::domain::types::{AcademicYearId, CourseId, Semester, StudentId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentPlan {
    pub course_id: CourseId,
    pub semester: Semester,
    pub academic_year_id: AcademicYearId,
    pub to_enroll: Vec<NewEnrollment>,
    /// 学生班级下没有开课: (section_name, student_ids)
    pub missing_offerings: Vec<(String, Vec<StudentId>)>,
    /// 学生档案无班级, 无法分配
    pub unassigned: Vec<StudentId>,
    /// 学生班级下存在未裁决的重复开课, 需先去重: (section_name, student_ids)
    pub blocked: Vec<(String, Vec<StudentId>)>,
}

impl EnrollmentPlan {
    pub fn is_empty(&self) -> bool {
        self.to_enroll.is_empty()
            && self.missing_offerings.is_empty()
            && self.unassigned.is_empty()
            && self.blocked.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentApplyReport {
    pub inserted: usize,
    pub action_id: Option<String>,
}
