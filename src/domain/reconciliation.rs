// ==========================================
// 多学院教务系统 - 开课去重计划模型
// ==========================================
// 红线: 计划只是数据, 生成计划不写库; 执行是单独的显式步骤
// 用途: 预演 (dry-run) 输出、执行输入、审计日志载荷
// ==========================================

use crate::domain::types::{
    AcademicYearId, CourseId, EnrollmentId, OfferingId, SectionKey, Semester, StudentId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// PlannedDeletion - 计划删除的空开课
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDeletion {
    pub offering_id: OfferingId,
    pub section: SectionKey,
    /// 同组保留的规范开课
    pub canonical_offering_id: OfferingId,
}

// ==========================================
// Migration - 错班选课迁移
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub from_offering: OfferingId,
    pub to_offering: OfferingId,
    /// 目标班级（执行时按此分组）
    pub target_section: SectionKey,
}

// ==========================================
// ReconcileConflict - 需人工裁决的冲突
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileConflict {
    /// 同一班级有多条开课均有选课, 自动合并有丢数据风险
    PopulatedDuplicates {
        section: SectionKey,
        /// (offering_id, enrollment_count)
        offerings: Vec<(OfferingId, i64)>,
    },
    /// 同一班级多条开课均无选课, 且策略为 REPORT
    AllEmptyDuplicates {
        section: SectionKey,
        offering_ids: Vec<OfferingId>,
    },
    /// 学生已在目标开课中有选课, 迁移会违反选课唯一约束
    DuplicateEnrollment {
        enrollment_id: EnrollmentId,
        student_id: StudentId,
        from_offering: OfferingId,
        to_offering: OfferingId,
    },
}

// ==========================================
// MissingOffering - 缺失的目标开课
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingOffering {
    pub section_name: String,
    pub enrollment_ids: Vec<EnrollmentId>,
    pub student_ids: Vec<StudentId>,
}

// ==========================================
// ReconciliationPlan - 去重计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub course_id: CourseId,
    pub semester: Semester,
    pub academic_year_id: AcademicYearId,
    pub to_delete: Vec<PlannedDeletion>,
    pub to_migrate: Vec<Migration>,
    pub conflicts: Vec<ReconcileConflict>,
    pub missing_offerings: Vec<MissingOffering>,
}

impl ReconciliationPlan {
    pub fn empty(course_id: CourseId, semester: Semester, academic_year_id: AcademicYearId) -> Self {
        Self {
            course_id,
            semester,
            academic_year_id,
            to_delete: Vec::new(),
            to_migrate: Vec::new(),
            conflicts: Vec::new(),
            missing_offerings: Vec::new(),
        }
    }

    /// 计划中没有任何动作与告警
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty()
            && self.to_migrate.is_empty()
            && self.conflicts.is_empty()
            && self.missing_offerings.is_empty()
    }

    /// 计划中存在可自动执行的动作
    pub fn has_actions(&self) -> bool {
        !self.to_delete.is_empty() || !self.to_migrate.is_empty()
    }

    /// 需要人工处理（冲突或缺失开课）
    pub fn needs_attention(&self) -> bool {
        !self.conflicts.is_empty() || !self.missing_offerings.is_empty()
    }

    pub fn deleted_offering_ids(&self) -> Vec<OfferingId> {
        self.to_delete.iter().map(|d| d.offering_id).collect()
    }

    /// 按班级拆分为执行组
    ///
    /// # 规则
    /// - 迁移按目标班级归组, 删除按重复组归组
    /// - 组内先迁移后删除, 任何时刻都不会有选课指向已删除的开课
    /// - 组按 SectionKey 排序, 输出稳定
    pub fn groups(&self) -> Vec<PlanGroup> {
        let mut groups: BTreeMap<SectionKey, PlanGroup> = BTreeMap::new();

        for m in &self.to_migrate {
            groups
                .entry(m.target_section.clone())
                .or_insert_with(|| PlanGroup::new(m.target_section.clone()))
                .ops
                .push(CatalogOp::MigrateEnrollment {
                    enrollment_id: m.enrollment_id,
                    from_offering: m.from_offering,
                    to_offering: m.to_offering,
                });
        }

        for d in &self.to_delete {
            groups
                .entry(d.section.clone())
                .or_insert_with(|| PlanGroup::new(d.section.clone()))
                .ops
                .push(CatalogOp::DeleteOffering {
                    offering_id: d.offering_id,
                });
        }

        groups.into_values().collect()
    }
}

// ==========================================
// CatalogOp - 单个写操作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogOp {
    MigrateEnrollment {
        enrollment_id: EnrollmentId,
        from_offering: OfferingId,
        to_offering: OfferingId,
    },
    DeleteOffering {
        offering_id: OfferingId,
    },
}

/// 一个事务边界内的操作集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGroup {
    pub section: SectionKey,
    pub ops: Vec<CatalogOp>,
}

impl PlanGroup {
    fn new(section: SectionKey) -> Self {
        Self {
            section,
            ops: Vec::new(),
        }
    }
}

/// 存储层对单个操作的执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpStatus {
    Applied,
    /// 删除目标已不存在（并发执行的另一方已删）, 容忍
    AlreadyAbsent,
}

// ==========================================
// 执行结果
// ==========================================

/// 失败分类（与引擎错误分类一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    NotFound,
    Conflict,
    StoreError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionOutcome {
    Applied,
    AlreadyAbsent,
    /// 本身成功, 但同组后续操作失败导致事务回滚
    RolledBack,
    Failed { kind: FailureKind, reason: String },
    /// 同组前序操作失败, 未执行
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    pub op: CatalogOp,
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    pub section: SectionKey,
    pub committed: bool,
    /// 整组回滚原因（含审计日志写入失败）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub actions: Vec<ActionReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub course_id: CourseId,
    pub semester: Semester,
    pub academic_year_id: AcademicYearId,
    pub groups: Vec<GroupReport>,
    /// 写入 action_log 的日志ID（每个已提交组一条）
    pub action_ids: Vec<String>,
}

impl ApplyReport {
    pub fn all_committed(&self) -> bool {
        self.groups.iter().all(|g| g.committed)
    }

    pub fn committed_count(&self) -> usize {
        self.groups.iter().filter(|g| g.committed).count()
    }

    pub fn failed_groups(&self) -> Vec<&GroupReport> {
        self.groups.iter().filter(|g| !g.committed).collect()
    }
}
