// ==========================================
// 多学院教务系统 - 课程代码审计
// ==========================================
// 职责: 列出同院系重复的课程代码（只报告, 不合并）
// ==========================================

use crate::domain::catalog::DuplicateCourse;
use crate::domain::types::DepartmentId;
use crate::engine::error::EngineResult;
use crate::repository::CatalogStore;
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct CourseAuditor;

impl CourseAuditor {
    pub fn new() -> Self {
        Self
    }

    /// department_id 为 None 时审计全库
    #[instrument(skip(self, store))]
    pub fn duplicate_courses<S>(
        &self,
        store: &S,
        department_id: Option<DepartmentId>,
    ) -> EngineResult<Vec<DuplicateCourse>>
    where
        S: CatalogStore + ?Sized,
    {
        let duplicates = store.list_course_duplicates(department_id)?;
        for dup in &duplicates {
            warn!(
                department_id = dup.department_id,
                code = %dup.code,
                rows = dup.courses.len(),
                "课程代码重复"
            );
        }
        info!(duplicate_codes = duplicates.len(), "课程代码审计完成");
        Ok(duplicates)
    }
}
