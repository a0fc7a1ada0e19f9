// ==========================================
// 教务目录 - 写操作
// ==========================================
// 说明: 以 &Connection 为参数, 既可直接执行也可在 Transaction 内执行
// ==========================================

use crate::domain::catalog::NewEnrollment;
use crate::domain::reconciliation::{CatalogOp, OpStatus};
use crate::domain::types::{EnrollmentId, OfferingId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};

pub(super) fn delete_offering(conn: &Connection, offering_id: OfferingId) -> RepositoryResult<()> {
    let rows = conn.execute("DELETE FROM course_offering WHERE id = ?1", params![offering_id])?;
    if rows == 0 {
        return Err(RepositoryError::not_found("course_offering", offering_id));
    }
    Ok(())
}

pub(super) fn update_enrollment_offering(
    conn: &Connection,
    enrollment_id: EnrollmentId,
    new_offering_id: OfferingId,
) -> RepositoryResult<()> {
    let rows = conn.execute(
        "UPDATE enrollment SET offering_id = ?2 WHERE id = ?1",
        params![enrollment_id, new_offering_id],
    )?;
    if rows == 0 {
        return Err(RepositoryError::not_found("enrollment", enrollment_id));
    }
    Ok(())
}

/// 迁移选课: 仅当选课仍挂在计划时的源开课上才修改
fn migrate_enrollment(
    conn: &Connection,
    enrollment_id: EnrollmentId,
    from_offering: OfferingId,
    to_offering: OfferingId,
) -> RepositoryResult<()> {
    let rows = conn.execute(
        "UPDATE enrollment SET offering_id = ?3 WHERE id = ?1 AND offering_id = ?2",
        params![enrollment_id, from_offering, to_offering],
    )?;
    if rows == 0 {
        return Err(RepositoryError::not_found(
            "enrollment",
            format!("{} (offering_id={})", enrollment_id, from_offering),
        ));
    }
    Ok(())
}

pub(super) fn apply_op(conn: &Connection, op: &CatalogOp) -> RepositoryResult<OpStatus> {
    match *op {
        CatalogOp::MigrateEnrollment {
            enrollment_id,
            from_offering,
            to_offering,
        } => {
            migrate_enrollment(conn, enrollment_id, from_offering, to_offering)?;
            Ok(OpStatus::Applied)
        }
        CatalogOp::DeleteOffering { offering_id } => match delete_offering(conn, offering_id) {
            Ok(()) => Ok(OpStatus::Applied),
            // 另一方已删除同一行: 容忍
            Err(RepositoryError::NotFound { .. }) => Ok(OpStatus::AlreadyAbsent),
            Err(e) => Err(e),
        },
    }
}

pub(super) fn insert_enrollments(conn: &Connection, enrollments: &[NewEnrollment]) -> RepositoryResult<usize> {
    let mut stmt = conn.prepare("INSERT INTO enrollment (student_id, offering_id) VALUES (?1, ?2)")?;
    let mut count = 0;
    for e in enrollments {
        count += stmt.execute(params![e.student_id, e.offering_id])?;
    }
    Ok(count)
}
