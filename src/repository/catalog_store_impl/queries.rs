// ==========================================
// 教务目录 - 只读查询
// ==========================================
// 约束: 所有查询参数化; 结果按 id 升序, 保证计划输出稳定
// ==========================================

use crate::domain::catalog::{
    AcademicYear, Course, Department, DuplicateCourse, EnrollmentRecord, OfferingSummary, Student,
};
use crate::domain::eligibility::StudentFilter;
use crate::domain::types::{
    AcademicYearId, CourseId, CourseType, DepartmentId, OfferingId, Semester, StudentId,
};
use crate::repository::error::RepositoryResult;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const COURSE_SELECT: &str = r#"
    SELECT c.id, c.code, c.name, c.course_type, c.department_id, d.college_id, c.year_level
    FROM course c
    JOIN department d ON d.id = c.department_id
"#;

const STUDENT_SELECT: &str = r#"
    SELECT st.id, st.college_id, st.department_id, st.section_id, sec.name,
           st.semester, st.batch_year, st.name, st.email
    FROM student st
    LEFT JOIN section sec ON sec.id = st.section_id
"#;

fn placeholders(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(", ")
}

fn map_course(row: &Row) -> rusqlite::Result<Course> {
    let raw_type: String = row.get(3)?;
    let course_type = CourseType::from_db_str(&raw_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("未知课程类型: {}", raw_type).into(),
        )
    })?;

    Ok(Course {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        course_type,
        department_id: row.get(4)?,
        college_id: row.get(5)?,
        year_level: row.get(6)?,
        restricted_department_ids: Vec::new(),
    })
}

fn map_student(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        college_id: row.get(1)?,
        department_id: row.get(2)?,
        section_id: row.get(3)?,
        section_name: row.get(4)?,
        semester: row.get(5)?,
        batch_year: row.get(6)?,
        name: row.get(7)?,
        email: row.get(8)?,
    })
}

fn load_restrictions(conn: &Connection, course_id: CourseId) -> RepositoryResult<Vec<DepartmentId>> {
    let mut stmt = conn.prepare(
        "SELECT department_id FROM course_department_restriction WHERE course_id = ?1 ORDER BY department_id",
    )?;
    let ids = stmt
        .query_map(params![course_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<DepartmentId>>>()?;
    Ok(ids)
}

fn with_restrictions(conn: &Connection, course: Option<Course>) -> RepositoryResult<Option<Course>> {
    match course {
        Some(mut c) => {
            c.restricted_department_ids = load_restrictions(conn, c.id)?;
            Ok(Some(c))
        }
        None => Ok(None),
    }
}

pub(super) fn find_course(
    conn: &Connection,
    code: &str,
    department_id: DepartmentId,
) -> RepositoryResult<Option<Course>> {
    let sql = format!(
        "{} WHERE c.code = ?1 AND c.department_id = ?2 ORDER BY c.id ASC LIMIT 1",
        COURSE_SELECT
    );
    let course = conn
        .query_row(&sql, params![code, department_id], map_course)
        .optional()?;
    with_restrictions(conn, course)
}

pub(super) fn find_course_by_id(conn: &Connection, course_id: CourseId) -> RepositoryResult<Option<Course>> {
    let sql = format!("{} WHERE c.id = ?1", COURSE_SELECT);
    let course = conn.query_row(&sql, params![course_id], map_course).optional()?;
    with_restrictions(conn, course)
}

pub(super) fn find_department(
    conn: &Connection,
    college_code: &str,
    department_code: &str,
) -> RepositoryResult<Option<Department>> {
    let dept = conn
        .query_row(
            r#"
            SELECT d.id, d.college_id, d.code, d.name
            FROM department d
            JOIN college col ON col.id = d.college_id
            WHERE col.code = ?1 AND d.code = ?2
            "#,
            params![college_code, department_code],
            |row| {
                Ok(Department {
                    id: row.get(0)?,
                    college_id: row.get(1)?,
                    code: row.get(2)?,
                    name: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(dept)
}

pub(super) fn find_academic_year(conn: &Connection, label: &str) -> RepositoryResult<Option<AcademicYear>> {
    let year = conn
        .query_row(
            "SELECT id, label, is_current FROM academic_year WHERE label = ?1",
            params![label.trim()],
            |row| {
                Ok(AcademicYear {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    is_current: row.get::<_, i64>(2)? != 0,
                })
            },
        )
        .optional()?;
    Ok(year)
}

pub(super) fn list_course_duplicates(
    conn: &Connection,
    department_id: Option<DepartmentId>,
) -> RepositoryResult<Vec<DuplicateCourse>> {
    let mut sql = String::from(
        r#"
        SELECT c.department_id, c.code, c.id,
               (SELECT COUNT(*) FROM course_offering o WHERE o.course_id = c.id)
        FROM course c
        WHERE EXISTS (
            SELECT 1 FROM course c2
            WHERE c2.department_id = c.department_id AND c2.code = c.code AND c2.id <> c.id
        )
        "#,
    );
    let mut values: Vec<Value> = Vec::new();
    if let Some(dept) = department_id {
        sql.push_str(" AND c.department_id = ?");
        values.push(Value::from(dept));
    }
    sql.push_str(" ORDER BY c.department_id, c.code, c.id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, DepartmentId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, CourseId>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut duplicates: Vec<DuplicateCourse> = Vec::new();
    for (dept, code, course_id, offering_count) in rows {
        match duplicates.last_mut() {
            Some(last) if last.department_id == dept && last.code == code => {
                last.courses.push((course_id, offering_count));
            }
            _ => duplicates.push(DuplicateCourse {
                department_id: dept,
                code,
                courses: vec![(course_id, offering_count)],
            }),
        }
    }
    Ok(duplicates)
}

pub(super) fn list_offerings(
    conn: &Connection,
    course_id: CourseId,
    semester: Semester,
    academic_year_id: AcademicYearId,
) -> RepositoryResult<Vec<OfferingSummary>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT o.id, o.course_id, o.semester, o.academic_year_id,
               o.section_id, sec.name, o.teacher_id,
               (SELECT COUNT(*) FROM enrollment e WHERE e.offering_id = o.id)
        FROM course_offering o
        LEFT JOIN section sec ON sec.id = o.section_id
        WHERE o.course_id = ?1 AND o.semester = ?2 AND o.academic_year_id = ?3
        ORDER BY o.id ASC
        "#,
    )?;

    let offerings = stmt
        .query_map(params![course_id, semester, academic_year_id], |row| {
            Ok(OfferingSummary {
                id: row.get(0)?,
                course_id: row.get(1)?,
                semester: row.get(2)?,
                academic_year_id: row.get(3)?,
                section_id: row.get(4)?,
                section_name: row.get(5)?,
                teacher_id: row.get(6)?,
                enrollment_count: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(offerings)
}

pub(super) fn list_students(conn: &Connection, filter: &StudentFilter) -> RepositoryResult<Vec<Student>> {
    let mut sql = format!("{} WHERE st.college_id = ? AND st.semester = ?", STUDENT_SELECT);
    let mut values: Vec<Value> = vec![Value::from(filter.college_id), Value::from(filter.semester)];

    if let Some(dept) = filter.department_id {
        sql.push_str(" AND st.department_id = ?");
        values.push(Value::from(dept));
    }

    if !filter.excluded_department_ids.is_empty() {
        sql.push_str(&format!(
            " AND st.department_id NOT IN ({})",
            placeholders(filter.excluded_department_ids.len())
        ));
        for dept in &filter.excluded_department_ids {
            values.push(Value::from(*dept));
        }
    }

    sql.push_str(" ORDER BY st.id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let students = stmt
        .query_map(params_from_iter(values.iter()), map_student)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(students)
}

pub(super) fn find_student(conn: &Connection, student_id: StudentId) -> RepositoryResult<Option<Student>> {
    let sql = format!("{} WHERE st.id = ?1", STUDENT_SELECT);
    let student = conn.query_row(&sql, params![student_id], map_student).optional()?;
    Ok(student)
}

pub(super) fn count_enrollments_for_course_semester(
    conn: &Connection,
    course_id: CourseId,
    semester: Semester,
    student_id: StudentId,
) -> RepositoryResult<i64> {
    let count = conn.query_row(
        r#"
        SELECT COUNT(*)
        FROM enrollment e
        JOIN course_offering o ON o.id = e.offering_id
        WHERE o.course_id = ?1 AND o.semester = ?2 AND e.student_id = ?3
        "#,
        params![course_id, semester, student_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(super) fn enrolled_student_ids(
    conn: &Connection,
    course_id: CourseId,
    semester: Semester,
) -> RepositoryResult<BTreeSet<StudentId>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT DISTINCT e.student_id
        FROM enrollment e
        JOIN course_offering o ON o.id = e.offering_id
        WHERE o.course_id = ?1 AND o.semester = ?2
        "#,
    )?;
    let ids = stmt
        .query_map(params![course_id, semester], |row| row.get(0))?
        .collect::<rusqlite::Result<BTreeSet<StudentId>>>()?;
    Ok(ids)
}

pub(super) fn list_enrollments(
    conn: &Connection,
    offering_ids: &[OfferingId],
) -> RepositoryResult<Vec<EnrollmentRecord>> {
    if offering_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT e.id, e.student_id, e.offering_id, sec.name
        FROM enrollment e
        JOIN student st ON st.id = e.student_id
        LEFT JOIN section sec ON sec.id = st.section_id
        WHERE e.offering_id IN ({})
        ORDER BY e.id ASC
        "#,
        placeholders(offering_ids.len())
    );

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params_from_iter(offering_ids.iter()), |row| {
            Ok(EnrollmentRecord {
                id: row.get(0)?,
                student_id: row.get(1)?,
                offering_id: row.get(2)?,
                student_section_name: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}
