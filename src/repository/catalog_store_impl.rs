// ==========================================
// 多学院教务系统 - 教务目录 Store 实现
// ==========================================
// 职责: 实现 CatalogStore（使用 rusqlite）
// 红线: Store 不含业务规则，只做数据 CRUD
// ==========================================

mod core;
mod queries;
mod setup;
mod writes;


pub use self::core::SqliteCatalogStore;

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
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::catalog_store::{CatalogStore, GroupFailure};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::BTreeSet;

impl CatalogStore for SqliteCatalogStore {
    fn find_course(&self, code: &str, department_id: DepartmentId) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        queries::find_course(&conn, code, department_id)
    }

    fn find_course_by_id(&self, course_id: CourseId) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        queries::find_course_by_id(&conn, course_id)
    }

    fn find_department(
        &self,
        college_code: &str,
        department_code: &str,
    ) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        queries::find_department(&conn, college_code, department_code)
    }

    fn find_academic_year(&self, label: &str) -> RepositoryResult<Option<AcademicYear>> {
        let conn = self.get_conn()?;
        queries::find_academic_year(&conn, label)
    }

    fn list_course_duplicates(
        &self,
        department_id: Option<DepartmentId>,
    ) -> RepositoryResult<Vec<DuplicateCourse>> {
        let conn = self.get_conn()?;
        queries::list_course_duplicates(&conn, department_id)
    }

    fn list_offerings(
        &self,
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
    ) -> RepositoryResult<Vec<OfferingSummary>> {
        let conn = self.get_conn()?;
        queries::list_offerings(&conn, course_id, semester, academic_year_id)
    }

    fn list_students(&self, filter: &StudentFilter) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        queries::list_students(&conn, filter)
    }

    fn find_student(&self, student_id: StudentId) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        queries::find_student(&conn, student_id)
    }

    fn count_enrollments_for_course_semester(
        &self,
        course_id: CourseId,
        semester: Semester,
        student_id: StudentId,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        queries::count_enrollments_for_course_semester(&conn, course_id, semester, student_id)
    }

    fn enrolled_student_ids(
        &self,
        course_id: CourseId,
        semester: Semester,
    ) -> RepositoryResult<BTreeSet<StudentId>> {
        let conn = self.get_conn()?;
        queries::enrolled_student_ids(&conn, course_id, semester)
    }

    fn list_enrollments(&self, offering_ids: &[OfferingId]) -> RepositoryResult<Vec<EnrollmentRecord>> {
        let conn = self.get_conn()?;
        queries::list_enrollments(&conn, offering_ids)
    }

    fn delete_offering(&self, offering_id: OfferingId) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        writes::delete_offering(&conn, offering_id)
    }

    fn update_enrollment_offering(
        &self,
        enrollment_id: EnrollmentId,
        new_offering_id: OfferingId,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        writes::update_enrollment_offering(&conn, enrollment_id, new_offering_id)
    }

    fn apply_group(
        &self,
        ops: &[CatalogOp],
        audit: Option<&ActionLog>,
    ) -> Result<Vec<OpStatus>, GroupFailure> {
        let mut conn = self
            .get_conn()
            .map_err(|error| GroupFailure { index: None, error })?;
        let tx = conn.transaction().map_err(|e| GroupFailure {
            index: None,
            error: RepositoryError::DatabaseTransactionError(e.to_string()),
        })?;

        let mut statuses = Vec::with_capacity(ops.len());
        for (index, op) in ops.iter().enumerate() {
            match writes::apply_op(&tx, op) {
                Ok(status) => statuses.push(status),
                // tx 在此处 drop, 自动回滚
                Err(error) => {
                    return Err(GroupFailure {
                        index: Some(index),
                        error,
                    })
                }
            }
        }

        if let Some(log) = audit {
            insert_action_log(&tx, log).map_err(|error| GroupFailure { index: None, error })?;
        }

        tx.commit().map_err(|e| GroupFailure {
            index: None,
            error: RepositoryError::DatabaseTransactionError(e.to_string()),
        })?;

        Ok(statuses)
    }

    fn insert_enrollments(
        &self,
        enrollments: &[NewEnrollment],
        audit: Option<&ActionLog>,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let count = writes::insert_enrollments(&tx, enrollments)?;
        if let Some(log) = audit {
            insert_action_log(&tx, log)?;
        }
        tx.commit()?;
        Ok(count)
    }
}
