// ==========================================
// 多学院教务系统 - Reconcile Core 纯函数库
// ==========================================
// 职责: 开课去重分组、规范开课选择、错班选课迁移计算
// 输入: 同一 (course, semester, academic_year) 下的开课与选课
// 输出: ReconciliationPlan
// 红线: 无状态、无副作用、无 I/O 操作; 有真实选课的重复开课只报告, 不自动处理
// ==========================================

use crate::domain::catalog::{EnrollmentRecord, OfferingSummary};
use crate::domain::reconciliation::{
    Migration, MissingOffering, PlannedDeletion, ReconcileConflict, ReconciliationPlan,
};
use crate::domain::types::{
    AcademicYearId, CourseId, EmptyDuplicatePolicy, NullSectionPolicy, OfferingId, SectionKey,
    Semester, StudentId,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// ==========================================
// GroupVerdict - 单个班级组的判定
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupVerdict {
    /// 规范开课 + 待删除的空开课
    Canonical {
        canonical: OfferingId,
        deletions: Vec<OfferingId>,
    },
    Conflict(ReconcileConflict),
}

// ==========================================
// ReconcileCore - 纯函数工具类
// ==========================================
pub struct ReconcileCore;

impl ReconcileCore {
    /// 生成去重计划
    ///
    /// # 参数
    /// - offerings: 目标三元组下的全部开课（含选课人数）
    /// - enrollments: 上述开课下的全部选课（含学生登记班级）
    pub fn plan(
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
        offerings: &[OfferingSummary],
        enrollments: &[EnrollmentRecord],
        null_policy: NullSectionPolicy,
        empty_policy: EmptyDuplicatePolicy,
    ) -> ReconciliationPlan {
        let mut plan = ReconciliationPlan::empty(course_id, semester, academic_year_id);

        // === 步骤 1: 按班级分组 ===
        let groups = Self::group_by_section(offerings, null_policy);

        // === 步骤 2: 逐组判定规范开课 ===
        let mut canonical_by_section: HashMap<SectionKey, OfferingId> = HashMap::new();
        let mut conflict_sections: HashSet<SectionKey> = HashSet::new();

        for (section, members) in &groups {
            match Self::judge_group(section, members, empty_policy) {
                GroupVerdict::Canonical {
                    canonical,
                    deletions,
                } => {
                    for offering_id in deletions {
                        plan.to_delete.push(PlannedDeletion {
                            offering_id,
                            section: section.clone(),
                            canonical_offering_id: canonical,
                        });
                    }
                    canonical_by_section.insert(section.clone(), canonical);
                }
                GroupVerdict::Conflict(conflict) => {
                    plan.conflicts.push(conflict);
                    conflict_sections.insert(section.clone());
                }
            }
        }

        // === 步骤 3: 错班选课 ===
        let section_of_offering: HashMap<OfferingId, SectionKey> = offerings
            .iter()
            .map(|o| {
                (
                    o.id,
                    SectionKey::for_offering(o.section_name.as_deref(), o.id, null_policy),
                )
            })
            .collect();
        let existing: HashSet<(StudentId, OfferingId)> = enrollments
            .iter()
            .map(|e| (e.student_id, e.offering_id))
            .collect();

        let mut sorted: Vec<&EnrollmentRecord> = enrollments.iter().collect();
        sorted.sort_by_key(|e| e.id);

        let mut missing: BTreeMap<String, MissingOffering> = BTreeMap::new();

        for enrollment in sorted {
            let Some(source_section) = section_of_offering.get(&enrollment.offering_id) else {
                continue;
            };
            let (Some(offering_section), Some(student_section)) = (
                source_section.section_name(),
                enrollment.student_section_name.as_deref(),
            ) else {
                // 任一侧无班级, 不视为错班
                continue;
            };
            if offering_section == student_section {
                continue;
            }

            let target_section = SectionKey::Named(student_section.to_string());
            if conflict_sections.contains(source_section) || conflict_sections.contains(&target_section) {
                continue;
            }

            match canonical_by_section.get(&target_section) {
                Some(&to_offering) => {
                    if existing.contains(&(enrollment.student_id, to_offering)) {
                        plan.conflicts.push(ReconcileConflict::DuplicateEnrollment {
                            enrollment_id: enrollment.id,
                            student_id: enrollment.student_id,
                            from_offering: enrollment.offering_id,
                            to_offering,
                        });
                    } else {
                        plan.to_migrate.push(Migration {
                            enrollment_id: enrollment.id,
                            student_id: enrollment.student_id,
                            from_offering: enrollment.offering_id,
                            to_offering,
                            target_section,
                        });
                    }
                }
                None => {
                    let entry = missing
                        .entry(student_section.to_string())
                        .or_insert_with(|| MissingOffering {
                            section_name: student_section.to_string(),
                            enrollment_ids: Vec::new(),
                            student_ids: Vec::new(),
                        });
                    entry.enrollment_ids.push(enrollment.id);
                    entry.student_ids.push(enrollment.student_id);
                }
            }
        }

        plan.missing_offerings = missing.into_values().collect();
        plan
    }

    /// 按班级分组, 组内按 id 升序
    pub fn group_by_section(
        offerings: &[OfferingSummary],
        null_policy: NullSectionPolicy,
    ) -> BTreeMap<SectionKey, Vec<&OfferingSummary>> {
        let mut groups: BTreeMap<SectionKey, Vec<&OfferingSummary>> = BTreeMap::new();
        for offering in offerings {
            let key = SectionKey::for_offering(offering.section_name.as_deref(), offering.id, null_policy);
            groups.entry(key).or_default().push(offering);
        }
        for members in groups.values_mut() {
            members.sort_by_key(|o| o.id);
        }
        groups
    }

    /// 每个班级组的规范开课; 冲突组为 None
    pub fn canonical_by_section(
        offerings: &[OfferingSummary],
        null_policy: NullSectionPolicy,
        empty_policy: EmptyDuplicatePolicy,
    ) -> BTreeMap<SectionKey, Option<OfferingId>> {
        Self::group_by_section(offerings, null_policy)
            .iter()
            .map(|(section, members)| {
                let canonical = match Self::judge_group(section, members, empty_policy) {
                    GroupVerdict::Canonical { canonical, .. } => Some(canonical),
                    GroupVerdict::Conflict(_) => None,
                };
                (section.clone(), canonical)
            })
            .collect()
    }

    /// 判定单组
    ///
    /// # 规则
    /// 1. 仅一条开课 → 即为规范开课
    /// 2. 恰好一条有选课 → 保留它, 删除其余空开课
    /// 3. 多条有选课 → 冲突, 人工裁决
    /// 4. 全部为空 → KEEP_OLDEST 保留 id 最小者; REPORT 报告冲突
    fn judge_group(
        section: &SectionKey,
        members: &[&OfferingSummary],
        empty_policy: EmptyDuplicatePolicy,
    ) -> GroupVerdict {
        let (populated, empty): (Vec<&OfferingSummary>, Vec<&OfferingSummary>) =
            members.iter().copied().partition(|o| o.is_populated());

        if members.len() == 1 {
            return GroupVerdict::Canonical {
                canonical: members[0].id,
                deletions: Vec::new(),
            };
        }

        match populated.len() {
            1 => GroupVerdict::Canonical {
                canonical: populated[0].id,
                deletions: empty.iter().map(|o| o.id).collect(),
            },
            0 => match empty_policy {
                EmptyDuplicatePolicy::KeepOldest => GroupVerdict::Canonical {
                    canonical: empty[0].id,
                    deletions: empty[1..].iter().map(|o| o.id).collect(),
                },
                EmptyDuplicatePolicy::Report => {
                    GroupVerdict::Conflict(ReconcileConflict::AllEmptyDuplicates {
                        section: section.clone(),
                        offering_ids: empty.iter().map(|o| o.id).collect(),
                    })
                }
            },
            _ => GroupVerdict::Conflict(ReconcileConflict::PopulatedDuplicates {
                section: section.clone(),
                offerings: populated.iter().map(|o| (o.id, o.enrollment_count)).collect(),
            }),
        }
    }

    /// 计划涉及的全部开课（去重后）
    pub fn touched_offerings(plan: &ReconciliationPlan) -> BTreeSet<OfferingId> {
        plan.to_delete
            .iter()
            .map(|d| d.offering_id)
            .chain(plan.to_migrate.iter().flat_map(|m| [m.from_offering, m.to_offering]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: CourseId = 1;
    const SEM: Semester = 5;
    const YEAR: AcademicYearId = 1;

    fn offering(id: i64, section: Option<&str>, count: i64) -> OfferingSummary {
        OfferingSummary {
            id,
            course_id: COURSE,
            semester: SEM,
            academic_year_id: YEAR,
            section_id: section.map(|_| id * 100),
            section_name: section.map(str::to_string),
            teacher_id: None,
            enrollment_count: count,
        }
    }

    fn enrollment(id: i64, student: i64, offering: i64, section: Option<&str>) -> EnrollmentRecord {
        EnrollmentRecord {
            id,
            student_id: student,
            offering_id: offering,
            student_section_name: section.map(str::to_string),
        }
    }

    /// 按 offerings 生成匹配人数的选课（学生班级与开课一致）
    fn matching_enrollments(offerings: &[OfferingSummary]) -> Vec<EnrollmentRecord> {
        let mut next = 1000;
        let mut out = Vec::new();
        for o in offerings {
            for _ in 0..o.enrollment_count {
                next += 1;
                out.push(enrollment(next, next, o.id, o.section_name.as_deref()));
            }
        }
        out
    }

    fn plan_default(offerings: &[OfferingSummary], enrollments: &[EnrollmentRecord]) -> ReconciliationPlan {
        ReconcileCore::plan(
            COURSE,
            SEM,
            YEAR,
            offerings,
            enrollments,
            NullSectionPolicy::Grouped,
            EmptyDuplicatePolicy::KeepOldest,
        )
    }

    // ==========================================
    // 测试 1: 重复开课判定
    // ==========================================

    #[test]
    fn test_one_populated_two_empty_deletes_the_empties() {
        // CS301 第5学期 A 班三条开课, 人数 [12, 0, 0]
        let offerings = vec![offering(10, Some("A"), 12), offering(11, Some("A"), 0), offering(12, Some("A"), 0)];
        let plan = plan_default(&offerings, &matching_enrollments(&offerings));

        assert_eq!(plan.deleted_offering_ids(), vec![11, 12]);
        assert!(plan.to_delete.iter().all(|d| d.canonical_offering_id == 10));
        assert!(plan.to_migrate.is_empty());
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_populated_one_not_first_is_kept() {
        let offerings = vec![offering(10, Some("A"), 0), offering(11, Some("A"), 3), offering(12, Some("A"), 0)];
        let plan = plan_default(&offerings, &matching_enrollments(&offerings));
        assert_eq!(plan.deleted_offering_ids(), vec![10, 12]);
        assert!(!plan.deleted_offering_ids().contains(&11));
    }

    #[test]
    fn test_two_populated_is_conflict_and_untouched() {
        let offerings = vec![offering(10, Some("A"), 5), offering(11, Some("A"), 2), offering(12, Some("A"), 0)];
        let plan = plan_default(&offerings, &matching_enrollments(&offerings));

        assert!(plan.to_delete.is_empty());
        assert!(plan.to_migrate.is_empty());
        assert_eq!(
            plan.conflicts,
            vec![ReconcileConflict::PopulatedDuplicates {
                section: SectionKey::Named("A".to_string()),
                offerings: vec![(10, 5), (11, 2)],
            }]
        );
    }

    #[test]
    fn test_all_empty_duplicates_follow_policy() {
        let offerings = vec![offering(21, Some("B"), 0), offering(20, Some("B"), 0)];

        let keep = plan_default(&offerings, &[]);
        assert_eq!(keep.deleted_offering_ids(), vec![21]);
        assert_eq!(keep.to_delete[0].canonical_offering_id, 20);

        let report = ReconcileCore::plan(
            COURSE,
            SEM,
            YEAR,
            &offerings,
            &[],
            NullSectionPolicy::Grouped,
            EmptyDuplicatePolicy::Report,
        );
        assert!(report.to_delete.is_empty());
        assert!(matches!(
            &report.conflicts[0],
            ReconcileConflict::AllEmptyDuplicates { offering_ids, .. } if offering_ids == &vec![20, 21]
        ));
    }

    #[test]
    fn test_single_offering_per_section_is_empty_plan() {
        let offerings = vec![offering(10, Some("A"), 4), offering(11, Some("B"), 0), offering(12, None, 1)];
        let plan = plan_default(&offerings, &matching_enrollments(&offerings));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_null_section_policy() {
        let offerings = vec![offering(30, None, 2), offering(31, None, 0)];
        let enrollments = matching_enrollments(&offerings);

        let grouped = plan_default(&offerings, &enrollments);
        assert_eq!(grouped.deleted_offering_ids(), vec![31]);
        assert_eq!(grouped.to_delete[0].section, SectionKey::Unassigned);

        let singleton = ReconcileCore::plan(
            COURSE,
            SEM,
            YEAR,
            &offerings,
            &enrollments,
            NullSectionPolicy::Singleton,
            EmptyDuplicatePolicy::KeepOldest,
        );
        assert!(singleton.is_empty());
    }

    // ==========================================
    // 测试 2: 错班选课
    // ==========================================

    #[test]
    fn test_misfiled_enrollment_migrates_to_own_section() {
        // B 班学生选在 A 班开课
        let offerings = vec![offering(10, Some("A"), 2), offering(20, Some("B"), 0)];
        let enrollments = vec![enrollment(1, 100, 10, Some("A")), enrollment(2, 200, 10, Some("B"))];
        let plan = plan_default(&offerings, &enrollments);

        assert_eq!(
            plan.to_migrate,
            vec![Migration {
                enrollment_id: 2,
                student_id: 200,
                from_offering: 10,
                to_offering: 20,
                target_section: SectionKey::Named("B".to_string()),
            }]
        );
        assert!(plan.missing_offerings.is_empty());
    }

    #[test]
    fn test_misfiled_without_target_flags_missing_offering() {
        let offerings = vec![offering(10, Some("A"), 3)];
        let enrollments = vec![
            enrollment(1, 100, 10, Some("A")),
            enrollment(3, 201, 10, Some("B")),
            enrollment(2, 200, 10, Some("B")),
        ];
        let plan = plan_default(&offerings, &enrollments);

        assert!(plan.to_migrate.is_empty());
        assert_eq!(
            plan.missing_offerings,
            vec![MissingOffering {
                section_name: "B".to_string(),
                enrollment_ids: vec![2, 3],
                student_ids: vec![200, 201],
            }]
        );
        assert!(!plan.has_actions());
        assert!(plan.needs_attention());
    }

    #[test]
    fn test_misfiled_targets_canonical_of_duplicate_group() {
        // B 组 [20 空, 21 有人] → 规范开课 21, 20 删除; A 中的 B 学生迁往 21
        let offerings = vec![offering(10, Some("A"), 1), offering(20, Some("B"), 0), offering(21, Some("B"), 1)];
        let enrollments = vec![enrollment(1, 300, 10, Some("B")), enrollment(2, 301, 21, Some("B"))];
        let plan = plan_default(&offerings, &enrollments);

        assert_eq!(plan.deleted_offering_ids(), vec![20]);
        assert_eq!(plan.to_migrate.len(), 1);
        assert_eq!(plan.to_migrate[0].to_offering, 21);
        assert_eq!(
            ReconcileCore::touched_offerings(&plan).into_iter().collect::<Vec<_>>(),
            vec![10, 20, 21]
        );
    }

    #[test]
    fn test_misfiled_into_conflict_group_is_skipped() {
        let offerings = vec![offering(10, Some("A"), 1), offering(20, Some("B"), 1), offering(21, Some("B"), 1)];
        let enrollments = vec![
            enrollment(1, 300, 10, Some("B")),
            enrollment(2, 301, 20, Some("B")),
            enrollment(3, 302, 21, Some("B")),
        ];
        let plan = plan_default(&offerings, &enrollments);

        assert!(plan.to_migrate.is_empty());
        assert!(plan.missing_offerings.is_empty());
        assert_eq!(plan.conflicts.len(), 1);
    }

    #[test]
    fn test_student_already_in_target_is_duplicate_enrollment() {
        let offerings = vec![offering(10, Some("A"), 1), offering(20, Some("B"), 1)];
        let enrollments = vec![enrollment(1, 300, 10, Some("B")), enrollment(2, 300, 20, Some("B"))];
        let plan = plan_default(&offerings, &enrollments);

        assert!(plan.to_migrate.is_empty());
        assert_eq!(
            plan.conflicts,
            vec![ReconcileConflict::DuplicateEnrollment {
                enrollment_id: 1,
                student_id: 300,
                from_offering: 10,
                to_offering: 20,
            }]
        );
    }

    #[test]
    fn test_unknown_sections_never_misfiled() {
        let offerings = vec![offering(10, Some("A"), 1), offering(11, None, 1)];
        let enrollments = vec![enrollment(1, 300, 10, None), enrollment(2, 301, 11, Some("A"))];
        assert!(plan_default(&offerings, &enrollments).is_empty());
    }

    #[test]
    fn test_canonical_by_section() {
        let offerings = vec![
            offering(10, Some("A"), 0),
            offering(11, Some("A"), 2),
            offering(20, Some("B"), 1),
            offering(21, Some("B"), 1),
        ];
        let canonical = ReconcileCore::canonical_by_section(
            &offerings,
            NullSectionPolicy::Grouped,
            EmptyDuplicatePolicy::KeepOldest,
        );
        assert_eq!(canonical[&SectionKey::Named("A".to_string())], Some(11));
        assert_eq!(canonical[&SectionKey::Named("B".to_string())], None);
    }

    // ==========================================
    // 测试 3: 幂等
    // ==========================================

    #[test]
    fn test_plan_on_reconciled_state_is_empty() {
        // 模拟执行后的状态: A 只剩 10, B 学生已迁到 20
        let offerings = vec![offering(10, Some("A"), 1), offering(20, Some("B"), 1)];
        let enrollments = vec![enrollment(1, 100, 10, Some("A")), enrollment(2, 200, 20, Some("B"))];
        let plan = plan_default(&offerings, &enrollments);
        assert!(plan.is_empty());
    }
}
