// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use college_erp::domain::types::{CollegeId, DepartmentId, SectionId, Semester};
use college_erp::domain::NewStudent;

// ==========================================
// NewStudent 构建器
// ==========================================

pub struct StudentBuilder {
    college_id: CollegeId,
    department_id: DepartmentId,
    section_id: Option<SectionId>,
    semester: Semester,
    batch_year: i64,
    name: String,
    email: Option<String>,
}

impl StudentBuilder {
    pub fn new(name: &str, college_id: CollegeId, department_id: DepartmentId) -> Self {
        Self {
            college_id,
            department_id,
            section_id: None,
            semester: 5,
            batch_year: 2022,
            name: name.to_string(),
            email: Some(format!("{}@college.example", name)),
        }
    }

    pub fn section(mut self, section_id: SectionId) -> Self {
        self.section_id = Some(section_id);
        self
    }

    pub fn semester(mut self, semester: Semester) -> Self {
        self.semester = semester;
        self
    }

    pub fn batch_year(mut self, year: i64) -> Self {
        self.batch_year = year;
        self
    }

    pub fn no_email(mut self) -> Self {
        self.email = None;
        self
    }

    pub fn build(self) -> NewStudent {
        NewStudent {
            college_id: self.college_id,
            department_id: self.department_id,
            section_id: self.section_id,
            semester: self.semester,
            batch_year: self.batch_year,
            name: self.name,
            email: self.email,
        }
    }
}
