// ==========================================
// 多学院教务系统 - 去重计划执行器
// ==========================================
// 职责: 把 ReconciliationPlan 按班级组落库, 逐操作报告结果
// 事务边界: 每个班级组一个事务, 组内首个失败即整组回滚
// 红线: 组间互不影响; 每个已提交组写一条 action_log, 与组内操作同事务
// ==========================================

use crate::config::CatalogConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::reconciliation::{
    ActionOutcome, ActionReport, ApplyReport, GroupReport, OpStatus, PlanGroup,
    ReconciliationPlan,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{CatalogStore, GroupFailure};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// PlanExecutor - 去重计划执行器
// ==========================================
pub struct PlanExecutor<C>
where
    C: CatalogConfigReader,
{
    config: Arc<C>,
}

impl<C> PlanExecutor<C>
where
    C: CatalogConfigReader,
{
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }

    /// 执行去重计划
    ///
    /// # 参数
    /// - actor: 操作人; None 时使用 audit.default_actor
    ///
    /// # 返回
    /// - Ok(ApplyReport): 每组是否提交 + 每个操作的结果
    /// - Err: 配置读取失败（此时尚未写库）; 组内失败与审计写入失败均记录在报告中
    #[instrument(skip(self, store, plan), fields(course_id = plan.course_id, semester = plan.semester))]
    pub fn apply<S>(
        &self,
        store: &S,
        plan: &ReconciliationPlan,
        actor: Option<&str>,
    ) -> EngineResult<ApplyReport>
    where
        S: CatalogStore + ?Sized,
    {
        let actor = match actor {
            Some(a) if !a.trim().is_empty() => a.trim().to_string(),
            _ => self.config.get_default_actor()?,
        };
        let log_enabled = self.config.is_action_log_enabled()?;

        let mut report = ApplyReport {
            course_id: plan.course_id,
            semester: plan.semester,
            academic_year_id: plan.academic_year_id,
            groups: Vec::new(),
            action_ids: Vec::new(),
        };

        for group in plan.groups() {
            let audit = log_enabled.then(|| Self::audit_log(plan, &group, &actor));
            let group_report = Self::apply_group(store, &group, audit.as_ref());

            if group_report.committed {
                info!(section = %group.section, ops = group.ops.len(), "执行组已提交");
                if let Some(log) = audit {
                    report.action_ids.push(log.action_id);
                }
            } else {
                warn!(
                    section = %group.section,
                    error = group_report.error.as_deref().unwrap_or(""),
                    "执行组失败, 已回滚"
                );
            }

            report.groups.push(group_report);
        }

        info!(
            groups = report.groups.len(),
            committed = report.committed_count(),
            actor = %actor,
            "去重计划执行完成"
        );
        Ok(report)
    }

    /// 执行单组, 把存储层结果展开为逐操作报告
    fn apply_group<S>(store: &S, group: &PlanGroup, audit: Option<&ActionLog>) -> GroupReport
    where
        S: CatalogStore + ?Sized,
    {
        match store.apply_group(&group.ops, audit) {
            Ok(statuses) => GroupReport {
                section: group.section.clone(),
                committed: true,
                error: None,
                actions: group
                    .ops
                    .iter()
                    .zip(statuses)
                    .map(|(op, status)| ActionReport {
                        op: *op,
                        outcome: match status {
                            OpStatus::Applied => ActionOutcome::Applied,
                            OpStatus::AlreadyAbsent => ActionOutcome::AlreadyAbsent,
                        },
                    })
                    .collect(),
            },
            Err(GroupFailure { index, error }) => {
                let error = EngineError::from(error);
                let failed = ActionOutcome::Failed {
                    kind: error.kind(),
                    reason: error.to_string(),
                };
                // index 为 None: 全部操作已执行但事务未能提交, 一律回滚
                let failed_at = index.unwrap_or(group.ops.len());
                GroupReport {
                    section: group.section.clone(),
                    committed: false,
                    error: Some(error.to_string()),
                    actions: group
                        .ops
                        .iter()
                        .enumerate()
                        .map(|(i, op)| ActionReport {
                            op: *op,
                            outcome: if i < failed_at {
                                ActionOutcome::RolledBack
                            } else if i == failed_at {
                                failed.clone()
                            } else {
                                ActionOutcome::Skipped
                            },
                        })
                        .collect(),
                }
            }
        }
    }

    fn audit_log(plan: &ReconciliationPlan, group: &PlanGroup, actor: &str) -> ActionLog {
        ActionLog::new(ActionType::ReconcileApply, actor)
            .with_scope(plan.course_id, plan.semester, plan.academic_year_id)
            .with_payload(json!({
                "section": group.section,
                "ops": group.ops,
            }))
            .with_detail(format!("班级 {} 去重: {} 个操作", group.section, group.ops.len()))
    }
}
