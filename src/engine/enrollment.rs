// ==========================================
// 多学院教务系统 - 选课补录引擎
// ==========================================
// 职责: 把可选课学生分配到本班级的规范开课, 生成并执行补录计划
// 输入: EligibilityResolver 结果 + 开课列表
// 输出: EnrollmentPlan / EnrollmentApplyReport
// 红线: plan 不写库; apply 单事务批量插入, 唯一约束冲突整体失败
// ==========================================

use crate::config::CatalogConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::catalog::NewEnrollment;
use crate::domain::enrollment::{EnrollmentApplyReport, EnrollmentPlan};
use crate::domain::types::{AcademicYearId, CourseId, SectionKey, Semester, StudentId};
use crate::engine::error::EngineResult;
use crate::engine::{EligibilityResolver, ReconcileCore};
use crate::repository::CatalogStore;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// EnrollmentPlanner - 选课补录引擎
// ==========================================
pub struct EnrollmentPlanner<C>
where
    C: CatalogConfigReader,
{
    config: Arc<C>,
    resolver: EligibilityResolver,
}

impl<C> EnrollmentPlanner<C>
where
    C: CatalogConfigReader,
{
    pub fn new(config: Arc<C>) -> Self {
        Self {
            config,
            resolver: EligibilityResolver::new(),
        }
    }

    /// 生成补录计划
    ///
    /// # 规则
    /// - 学生分配到本班级的规范开课（与去重引擎的规范开课选择一致）
    /// - 班级无开课 → missing_offerings; 班级有未裁决重复 → blocked
    /// - 学生档案无班级 → unassigned
    #[instrument(skip(self, store))]
    pub fn plan<S>(
        &self,
        store: &S,
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
    ) -> EngineResult<EnrollmentPlan>
    where
        S: CatalogStore + ?Sized,
    {
        let report = self.resolver.resolve_eligible_detailed(store, course_id, semester)?;

        let offerings = store.list_offerings(course_id, semester, academic_year_id)?;
        let canonical = ReconcileCore::canonical_by_section(
            &offerings,
            self.config.get_null_section_policy()?,
            self.config.get_empty_duplicate_policy()?,
        );

        let mut plan = EnrollmentPlan {
            course_id,
            semester,
            academic_year_id,
            to_enroll: Vec::new(),
            missing_offerings: Vec::new(),
            unassigned: Vec::new(),
            blocked: Vec::new(),
        };
        let mut missing: BTreeMap<String, Vec<StudentId>> = BTreeMap::new();
        let mut blocked: BTreeMap<String, Vec<StudentId>> = BTreeMap::new();

        for student in &report.students {
            let Some(section_name) = student.section_name.as_deref() else {
                plan.unassigned.push(student.student_id);
                continue;
            };

            match canonical.get(&SectionKey::Named(section_name.to_string())) {
                Some(Some(offering_id)) => plan.to_enroll.push(NewEnrollment {
                    student_id: student.student_id,
                    offering_id: *offering_id,
                }),
                Some(None) => blocked
                    .entry(section_name.to_string())
                    .or_default()
                    .push(student.student_id),
                None => missing
                    .entry(section_name.to_string())
                    .or_default()
                    .push(student.student_id),
            }
        }

        plan.missing_offerings = missing.into_iter().collect();
        plan.blocked = blocked.into_iter().collect();

        info!(
            course_code = %report.course_code,
            to_enroll = plan.to_enroll.len(),
            missing_sections = plan.missing_offerings.len(),
            blocked_sections = plan.blocked.len(),
            unassigned = plan.unassigned.len(),
            "补录计划生成完成"
        );
        Ok(plan)
    }

    /// 执行补录计划
    ///
    /// # 返回
    /// - Err(Config): 配置读取失败, 未写库
    /// - Err(Conflict): 学生已被并发选入（唯一约束）, 整批回滚
    /// - Err(Store): 审计日志写入失败, 选课随之回滚
    #[instrument(skip(self, store, plan), fields(course_id = plan.course_id))]
    pub fn apply<S>(
        &self,
        store: &S,
        plan: &EnrollmentPlan,
        actor: Option<&str>,
    ) -> EngineResult<EnrollmentApplyReport>
    where
        S: CatalogStore + ?Sized,
    {
        if plan.to_enroll.is_empty() {
            return Ok(EnrollmentApplyReport {
                inserted: 0,
                action_id: None,
            });
        }

        let audit = if self.config.is_action_log_enabled()? {
            let actor = match actor {
                Some(a) if !a.trim().is_empty() => a.trim().to_string(),
                _ => self.config.get_default_actor()?,
            };
            Some(
                ActionLog::new(ActionType::EnrollmentApply, &actor)
                    .with_scope(plan.course_id, plan.semester, plan.academic_year_id)
                    .with_payload(json!({ "enrollments": plan.to_enroll }))
                    .with_detail(format!("补录选课 {} 条", plan.to_enroll.len())),
            )
        } else {
            None
        };

        let inserted = store.insert_enrollments(&plan.to_enroll, audit.as_ref())?;
        let action_id = audit.map(|log| log.action_id);

        info!(inserted, "补录计划执行完成");
        Ok(EnrollmentApplyReport {
            inserted,
            action_id,
        })
    }
}
