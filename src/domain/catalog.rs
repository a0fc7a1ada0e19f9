// ==========================================
// 多学院教务系统 - 教务目录实体
// ==========================================
// 对齐: migrations/v0.1_catalog.sql
// 红线: 实体只承载数据, 不含查询与规则
// ==========================================

use crate::domain::types::{
    AcademicYearId, CollegeId, CourseId, CourseType, DepartmentId, EnrollmentId, OfferingId,
    SectionId, Semester, StudentId, TeacherId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub college_id: CollegeId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub label: String, // 如 "2024-25"
    pub is_current: bool,
}

// ==========================================
// Course - 课程
// ==========================================
// college_id 随院系一并读出, 资格计算需要 course.department.college
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub course_type: CourseType,
    pub department_id: DepartmentId,
    pub college_id: CollegeId,
    pub year_level: i64,
    /// 公共选修的限制院系（这些院系的学生不可选）
    pub restricted_department_ids: Vec<DepartmentId>,
}

// ==========================================
// OfferingSummary - 开课（含选课人数）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferingSummary {
    pub id: OfferingId,
    pub course_id: CourseId,
    pub semester: Semester,
    pub academic_year_id: AcademicYearId,
    pub section_id: Option<SectionId>,
    pub section_name: Option<String>,
    pub teacher_id: Option<TeacherId>,
    pub enrollment_count: i64,
}

impl OfferingSummary {
    pub fn is_populated(&self) -> bool {
        self.enrollment_count > 0
    }
}

// ==========================================
// Student - 学生
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub college_id: CollegeId,
    pub department_id: DepartmentId,
    pub section_id: Option<SectionId>,
    pub section_name: Option<String>,
    pub semester: Semester,
    pub batch_year: i64,
    pub name: String,
    pub email: Option<String>,
}

// ==========================================
// EnrollmentRecord - 选课记录（附学生登记班级）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub offering_id: OfferingId,
    /// 学生档案中登记的班级名称
    pub student_section_name: Option<String>,
}

/// 待插入的选课记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student_id: StudentId,
    pub offering_id: OfferingId,
}

// ==========================================
// DuplicateCourse - 院系内重复课程代码
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCourse {
    pub department_id: DepartmentId,
    pub code: String,
    /// (course_id, 该课程下的开课数), 按 id 升序
    pub courses: Vec<(CourseId, i64)>,
}

/// 待插入的学生档案（初始化/演示数据用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub college_id: CollegeId,
    pub department_id: DepartmentId,
    pub section_id: Option<SectionId>,
    pub semester: Semester,
    pub batch_year: i64,
    pub name: String,
    pub email: Option<String>,
}
