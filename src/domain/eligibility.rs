// ==========================================
// 多学院教务系统 - 选课资格领域模型
// ==========================================

use crate::domain::types::{CollegeId, CourseId, DepartmentId, Semester, StudentId};
use serde::{Deserialize, Serialize};

// ==========================================
// StudentFilter - 学生基础过滤条件
// ==========================================
// 用途: 资格引擎生成, 由仓储翻译为参数化查询
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFilter {
    pub college_id: CollegeId,
    pub semester: Semester,
    /// Some: 仅限该院系（必修/院系选修）
    pub department_id: Option<DepartmentId>,
    /// 排除这些院系（公共选修限制名单）
    pub excluded_department_ids: Vec<DepartmentId>,
}

// ==========================================
// EligibleStudent - 可选课学生（含展示字段）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleStudent {
    pub student_id: StudentId,
    pub name: String,
    pub email: Option<String>,
    pub department_id: DepartmentId,
    pub section_name: Option<String>,
}

// ==========================================
// EligibilityReport - 资格计算结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub course_id: CourseId,
    pub course_code: String,
    pub semester: Semester,
    pub filter: StudentFilter,
    pub candidate_count: usize,      // 基础过滤命中人数
    pub already_enrolled_count: usize, // 其中已选本课程本学期的人数
    pub students: Vec<EligibleStudent>, // 按 student_id 升序
}

// ==========================================
// StudentEligibility - 单个学生的判定结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentEligibility {
    Eligible,
    WrongCollege,
    WrongSemester,
    WrongDepartment,
    RestrictedDepartment,
    AlreadyEnrolled,
}

impl StudentEligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, StudentEligibility::Eligible)
    }

    /// 判定原因（面向用户的说明）
    pub fn reason(&self) -> &'static str {
        match self {
            StudentEligibility::Eligible => "可选",
            StudentEligibility::WrongCollege => "学生不属于开课学院",
            StudentEligibility::WrongSemester => "学生当前学期与开课学期不符",
            StudentEligibility::WrongDepartment => "必修/院系选修仅限开课院系学生",
            StudentEligibility::RestrictedDepartment => "学生所在院系在公共选修限制名单中",
            StudentEligibility::AlreadyEnrolled => "学生已选本课程本学期的某个开课",
        }
    }
}
