// ==========================================
// 多学院教务系统 - 开课去重引擎
// ==========================================
// 职责: 读取开课与选课, 调用 ReconcileCore 生成去重计划
// 输入: course_offering + enrollment + 去重策略配置
// 输出: ReconciliationPlan（纯数据, 供预演或 PlanExecutor 执行）
// 红线: 生成计划不写库; 仅 Store I/O 错误会导致失败
// ==========================================

use crate::config::CatalogConfigReader;
use crate::domain::reconciliation::ReconciliationPlan;
use crate::domain::types::{AcademicYearId, CourseId, OfferingId, Semester};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::ReconcileCore;
use crate::repository::CatalogStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// OfferingReconciler - 开课去重引擎
// ==========================================
pub struct OfferingReconciler<C>
where
    C: CatalogConfigReader,
{
    config: Arc<C>,
}

impl<C> OfferingReconciler<C>
where
    C: CatalogConfigReader,
{
    /// 创建新的 OfferingReconciler 实例
    ///
    /// # 参数
    /// - config: 配置读取器（空班级分组策略、全空重复策略）
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }

    /// 生成 (course, semester, academic_year) 的去重计划
    ///
    /// # 返回
    /// - Err(NotFound): 课程不存在
    /// - Err(Store): 存储 I/O 失败
    #[instrument(skip(self, store))]
    pub fn reconcile<S>(
        &self,
        store: &S,
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
    ) -> EngineResult<ReconciliationPlan>
    where
        S: CatalogStore + ?Sized,
    {
        let course = store
            .find_course_by_id(course_id)?
            .ok_or_else(|| EngineError::not_found("course", course_id))?;

        let null_policy = self.config.get_null_section_policy()?;
        let empty_policy = self.config.get_empty_duplicate_policy()?;

        // === 步骤 1: 读取开课与选课 ===
        let offerings = store.list_offerings(course_id, semester, academic_year_id)?;
        let offering_ids: Vec<OfferingId> = offerings.iter().map(|o| o.id).collect();
        let enrollments = store.list_enrollments(&offering_ids)?;

        // === 步骤 2: 纯计算 ===
        let plan = ReconcileCore::plan(
            course_id,
            semester,
            academic_year_id,
            &offerings,
            &enrollments,
            null_policy,
            empty_policy,
        );

        info!(
            course_code = %course.code,
            offerings = offerings.len(),
            to_delete = plan.to_delete.len(),
            to_migrate = plan.to_migrate.len(),
            conflicts = plan.conflicts.len(),
            missing_offerings = plan.missing_offerings.len(),
            "去重计划生成完成"
        );
        if plan.needs_attention() {
            warn!(course_code = %course.code, "存在需人工处理的冲突或缺失开课");
        }

        Ok(plan)
    }
}
