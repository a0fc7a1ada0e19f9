// ==========================================
// 教务目录 - 建档写入（初始化脚本 / 演示数据 / 测试）
// ==========================================
// 红线: 只做插入, 不做任何校验以外的规则
// ==========================================

use super::SqliteCatalogStore;
use crate::domain::catalog::NewStudent;
use crate::domain::types::{
    AcademicYearId, CollegeId, CourseId, CourseType, DepartmentId, EnrollmentId, OfferingId,
    SectionId, Semester, StudentId, TeacherId,
};
use crate::repository::error::RepositoryResult;
use rusqlite::params;

impl SqliteCatalogStore {
    pub fn insert_college(&self, code: &str, name: &str) -> RepositoryResult<CollegeId> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO college (code, name) VALUES (?1, ?2)",
            params![code, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_department(
        &self,
        college_id: CollegeId,
        code: &str,
        name: &str,
    ) -> RepositoryResult<DepartmentId> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO department (college_id, code, name) VALUES (?1, ?2, ?3)",
            params![college_id, code, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_section(&self, department_id: DepartmentId, name: &str) -> RepositoryResult<SectionId> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO section (department_id, name) VALUES (?1, ?2)",
            params![department_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_academic_year(&self, label: &str, is_current: bool) -> RepositoryResult<AcademicYearId> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO academic_year (label, is_current) VALUES (?1, ?2)",
            params![label, is_current as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_teacher(&self, name: &str) -> RepositoryResult<TeacherId> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO teacher (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_course(
        &self,
        department_id: DepartmentId,
        code: &str,
        name: &str,
        course_type: CourseType,
        year_level: i64,
    ) -> RepositoryResult<CourseId> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO course (department_id, code, name, course_type, year_level)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![department_id, code, name, course_type.to_db_str(), year_level],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 为公共选修添加限制院系
    pub fn add_course_restriction(
        &self,
        course_id: CourseId,
        department_id: DepartmentId,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO course_department_restriction (course_id, department_id) VALUES (?1, ?2)",
            params![course_id, department_id],
        )?;
        Ok(())
    }

    pub fn insert_student(&self, student: &NewStudent) -> RepositoryResult<StudentId> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO student (
                college_id, department_id, section_id, semester, batch_year, name, email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                student.college_id,
                student.department_id,
                student.section_id,
                student.semester,
                student.batch_year,
                student.name,
                student.email,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入开课（受 ux_offering_slot 唯一索引约束）
    pub fn insert_offering(
        &self,
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
        section_id: Option<SectionId>,
        teacher_id: Option<TeacherId>,
    ) -> RepositoryResult<OfferingId> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO course_offering (course_id, semester, academic_year_id, section_id, teacher_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![course_id, semester, academic_year_id, section_id, teacher_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_enrollment(
        &self,
        student_id: StudentId,
        offering_id: OfferingId,
    ) -> RepositoryResult<EnrollmentId> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO enrollment (student_id, offering_id) VALUES (?1, ?2)",
            params![student_id, offering_id],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
