// ==========================================
// 开课去重端到端测试
// ==========================================
// 测试范围:
// 1. CS301 场景: A 班 [12, 0, 0] + 错班学生 → 预演 → 执行 → 再预演为空
// 2. 缺失目标开课 / 多条有选课的冲突
// 3. 执行事务: 组内失败整组回滚, 其他组照常提交
// 4. 重复执行: 已删除的开课报告 AlreadyAbsent
// 5. 配置驱动: 全空重复策略、无班级分组策略、操作日志开关
// ==========================================

mod helpers;

use college_erp::config::{config_keys, ConfigManager};
use college_erp::domain::types::{CourseType, SectionKey};
use college_erp::domain::{ActionOutcome, ActionType, FailureKind, ReconcileConflict};
use college_erp::engine::{EngineError, OfferingReconciler, PlanExecutor};
use college_erp::logging;
use college_erp::repository::{CatalogStore, RepositoryError};
use helpers::mock_config::MockConfig;
use helpers::test_data_builder::StudentBuilder;
use std::sync::Arc;
use test_helpers::CatalogTestEnv;

fn engines(env: &CatalogTestEnv) -> (OfferingReconciler<ConfigManager>, PlanExecutor<ConfigManager>) {
    (
        OfferingReconciler::new(env.config.clone()),
        PlanExecutor::new(env.config.clone()),
    )
}

fn students_in(env: &CatalogTestEnv, prefix: &str, section: i64, n: usize) -> Vec<i64> {
    (0..n)
        .map(|i| {
            env.student(
                StudentBuilder::new(&format!("{}{}", prefix, i), env.college, env.cse)
                    .section(section)
                    .build(),
            )
            .unwrap()
        })
        .collect()
}

// ==========================================
// 测试 1: CS301 完整流程
// ==========================================

#[test]
fn test_cs301_plan_apply_then_idempotent() {
    logging::init_test();
    println!("=== 测试: CS301 去重完整流程 ===");

    let env = CatalogTestEnv::new().expect("无法创建测试环境");
    let (reconciler, executor) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();

    let a_students = students_in(&env, "a", env.section_a, 11);
    let b_students = students_in(&env, "b", env.section_b, 2);

    // A 班三条开课（不同教师）, 人数 [12, 0, 0], 其中一人是 B 班学生
    let mut a_enrolled = a_students.clone();
    a_enrolled.push(b_students[0]);
    let a_main = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[0]), &a_enrolled)
        .unwrap();
    let a_dup1 = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[1]), &[])
        .unwrap();
    let a_dup2 = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[2]), &[])
        .unwrap();
    let b_main = env
        .offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[3]), &[b_students[1]])
        .unwrap();

    // === 预演 ===
    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    println!("计划: {}", serde_json::to_string_pretty(&plan).unwrap());

    assert_eq!(plan.deleted_offering_ids(), vec![a_dup1, a_dup2]);
    assert!(plan.to_delete.iter().all(|d| d.canonical_offering_id == a_main));
    assert_eq!(plan.to_migrate.len(), 1);
    assert_eq!(plan.to_migrate[0].student_id, b_students[0]);
    assert_eq!(plan.to_migrate[0].from_offering, a_main);
    assert_eq!(plan.to_migrate[0].to_offering, b_main);
    assert!(plan.conflicts.is_empty());
    assert!(plan.missing_offerings.is_empty());

    // 预演不写库
    assert_eq!(env.count("SELECT COUNT(*) FROM course_offering").unwrap(), 4);

    // === 执行 ===
    let report = executor.apply(&env.store, &plan, Some("registrar")).unwrap();
    assert!(report.all_committed());
    assert_eq!(report.groups.len(), 2);
    assert!(report
        .groups
        .iter()
        .flat_map(|g| g.actions.iter())
        .all(|a| a.outcome == ActionOutcome::Applied));

    assert_eq!(env.count("SELECT COUNT(*) FROM course_offering").unwrap(), 2);
    assert_eq!(env.enrollment_offering(b_students[0], cs301).unwrap(), vec![b_main]);

    // 每个已提交组一条操作日志
    assert_eq!(report.action_ids.len(), 2);
    let logs = env.action_log_repo.find_by_course(cs301, 5).unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.action_type == ActionType::ReconcileApply));
    assert!(logs.iter().all(|l| l.actor == "registrar"));
    assert!(logs.iter().all(|l| l.academic_year_id == Some(env.year)));

    // === 幂等: 再次预演为空计划 ===
    let again = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert!(again.is_empty(), "第二次计划应为空: {:?}", again);
}

#[test]
fn test_missing_target_offering_is_flagged() {
    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, _) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();

    let a = students_in(&env, "a", env.section_a, 2);
    let b = students_in(&env, "b", env.section_b, 1);
    env.offering_with(cs301, 5, Some(env.section_a), None, &[a[0], a[1], b[0]])
        .unwrap();

    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert!(plan.to_migrate.is_empty());
    assert_eq!(plan.missing_offerings.len(), 1);
    assert_eq!(plan.missing_offerings[0].section_name, "B");
    assert_eq!(plan.missing_offerings[0].student_ids, vec![b[0]]);
    assert!(!plan.has_actions());
}

#[test]
fn test_populated_duplicates_are_reported_not_touched() {
    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, executor) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();

    let a = students_in(&env, "a", env.section_a, 3);
    let first = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[0]), &[a[0], a[1]])
        .unwrap();
    let second = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[1]), &[a[2]])
        .unwrap();
    env.offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[2]), &[])
        .unwrap();

    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert!(plan.to_delete.is_empty());
    assert!(plan.to_migrate.is_empty());
    assert_eq!(
        plan.conflicts,
        vec![ReconcileConflict::PopulatedDuplicates {
            section: SectionKey::Named("A".to_string()),
            offerings: vec![(first, 2), (second, 1)],
        }]
    );

    // 无动作, 执行为空
    let report = executor.apply(&env.store, &plan, None).unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(env.count("SELECT COUNT(*) FROM course_offering").unwrap(), 3);
}

#[test]
fn test_unknown_course_is_not_found() {
    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, _) = engines(&env);
    let err = reconciler.reconcile(&env.store, 777, 5, env.year).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

// ==========================================
// 测试 2: 执行事务边界
// ==========================================

#[test]
fn test_failed_group_rolls_back_and_other_groups_commit() {
    logging::init_test();
    println!("=== 测试: 组内失败回滚, 组间独立 ===");

    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, executor) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();

    let a = students_in(&env, "a", env.section_a, 3);
    let b = students_in(&env, "b", env.section_b, 1);

    // A: [x 有人, y 空, z 空]; B: [p 有人(含一名 A 班学生), q 空]
    let x = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[0]), &[a[0]])
        .unwrap();
    let y = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[1]), &[])
        .unwrap();
    let z = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[2]), &[])
        .unwrap();
    let p = env
        .offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[0]), &[b[0], a[1]])
        .unwrap();
    let q = env
        .offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[1]), &[])
        .unwrap();

    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert_eq!(plan.deleted_offering_ids(), vec![y, z, q]);
    assert_eq!(plan.to_migrate.len(), 1);
    assert_eq!(plan.to_migrate[0].to_offering, x);

    // 预演之后, 有人并发选入了 y
    env.store.insert_enrollment(a[2], y).unwrap();

    let report = executor.apply(&env.store, &plan, None).unwrap();
    assert!(!report.all_committed());
    assert_eq!(report.committed_count(), 1);

    let group_a = report
        .groups
        .iter()
        .find(|g| g.section == SectionKey::Named("A".to_string()))
        .unwrap();
    assert!(!group_a.committed);
    let outcomes: Vec<&ActionOutcome> = group_a.actions.iter().map(|a| &a.outcome).collect();
    assert_eq!(outcomes[0], &ActionOutcome::RolledBack);
    assert!(matches!(
        outcomes[1],
        ActionOutcome::Failed { kind: FailureKind::Conflict, .. }
    ));
    assert_eq!(outcomes[2], &ActionOutcome::Skipped);

    let group_b = report
        .groups
        .iter()
        .find(|g| g.section == SectionKey::Named("B".to_string()))
        .unwrap();
    assert!(group_b.committed);
    assert_eq!(group_b.actions[0].outcome, ActionOutcome::Applied);

    // A 组整体回滚: 迁移撤销, y/z 仍在; B 组 q 已删除
    assert_eq!(env.enrollment_offering(a[1], cs301).unwrap(), vec![p]);
    let remaining = env
        .store
        .list_offerings(cs301, 5, env.year)
        .unwrap()
        .into_iter()
        .map(|o| o.id)
        .collect::<Vec<_>>();
    assert_eq!(remaining, vec![x, y, z, p]);

    // 只有已提交组写日志
    assert_eq!(report.action_ids.len(), 1);
    assert_eq!(env.count("SELECT COUNT(*) FROM action_log").unwrap(), 1);
}

#[test]
fn test_reapplying_deletions_reports_already_absent() {
    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, executor) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();
    let a = students_in(&env, "a", env.section_a, 1);

    env.offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[0]), &a)
        .unwrap();
    env.offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[1]), &[])
        .unwrap();

    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    let first = executor.apply(&env.store, &plan, None).unwrap();
    assert!(first.all_committed());

    // 模拟另一位管理员拿着同一份计划再次执行
    let second = executor.apply(&env.store, &plan, None).unwrap();
    assert!(second.all_committed());
    assert_eq!(second.groups[0].actions[0].outcome, ActionOutcome::AlreadyAbsent);
}

#[test]
fn test_direct_store_delete_of_missing_offering_is_not_found() {
    let env = CatalogTestEnv::new().unwrap();
    let err = env.store.delete_offering(31337).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

// ==========================================
// 测试 3: 配置驱动
// ==========================================

#[test]
fn test_all_empty_duplicates_follow_config_kv_policy() {
    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, _) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();
    let oldest = env
        .offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[0]), &[])
        .unwrap();
    let newer = env
        .offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[1]), &[])
        .unwrap();

    // 默认 KEEP_OLDEST
    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert_eq!(plan.deleted_offering_ids(), vec![newer]);
    assert_eq!(plan.to_delete[0].canonical_offering_id, oldest);

    env.config
        .set_global_value(config_keys::EMPTY_DUPLICATE_POLICY, "REPORT")
        .unwrap();
    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert!(plan.to_delete.is_empty());
    assert!(matches!(
        plan.conflicts.as_slice(),
        [ReconcileConflict::AllEmptyDuplicates { .. }]
    ));
}

#[test]
fn test_null_section_policy_with_mock_config() {
    let env = CatalogTestEnv::new().unwrap();
    let cs301 = env.course("CS301", CourseType::Core).unwrap();
    let s = students_in(&env, "s", env.section_a, 1);
    env.offering_with(cs301, 5, None, Some(env.teachers[0]), &s).unwrap();
    let spare = env
        .offering_with(cs301, 5, None, Some(env.teachers[1]), &[])
        .unwrap();

    let grouped = OfferingReconciler::new(Arc::new(MockConfig::default()))
        .reconcile(&env.store, cs301, 5, env.year)
        .unwrap();
    assert_eq!(grouped.deleted_offering_ids(), vec![spare]);
    assert_eq!(grouped.to_delete[0].section, SectionKey::Unassigned);

    let singleton = OfferingReconciler::new(Arc::new(MockConfig::singleton_nulls()))
        .reconcile(&env.store, cs301, 5, env.year)
        .unwrap();
    assert!(singleton.is_empty());
}

#[test]
fn test_action_log_disabled_and_default_actor() {
    let env = CatalogTestEnv::new().unwrap();
    let cs301 = env.course("CS301", CourseType::Core).unwrap();
    env.offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[0]), &[])
        .unwrap();
    env.offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[1]), &[])
        .unwrap();
    env.offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[0]), &[])
        .unwrap();
    env.offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[1]), &[])
        .unwrap();

    let config = Arc::new(MockConfig::without_action_log());
    let reconciler = OfferingReconciler::new(config.clone());
    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert_eq!(plan.to_delete.len(), 2);

    // 仅执行 A 组: 截取计划
    let mut only_a = plan.clone();
    only_a
        .to_delete
        .retain(|d| d.section == SectionKey::Named("A".to_string()));

    let report = PlanExecutor::new(config)
        .apply(&env.store, &only_a, None)
        .unwrap();
    assert!(report.action_ids.is_empty());
    assert_eq!(env.count("SELECT COUNT(*) FROM action_log").unwrap(), 0);

    // 开启日志, 未指定操作人 → 使用 audit.default_actor
    env.config
        .set_global_value(config_keys::DEFAULT_ACTOR, "night-batch")
        .unwrap();
    let (reconciler, executor) = engines(&env);
    let rest = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    let report = executor.apply(&env.store, &rest, Some("  ")).unwrap();
    assert_eq!(report.action_ids.len(), 1);
    let log = env
        .action_log_repo
        .find_by_id(&report.action_ids[0])
        .unwrap()
        .unwrap();
    assert_eq!(log.actor, "night-batch");
}

#[test]
fn test_broken_config_surfaces_as_config_error() {
    let env = CatalogTestEnv::new().unwrap();
    let cs301 = env.course("CS301", CourseType::Core).unwrap();
    let err = OfferingReconciler::new(Arc::new(MockConfig::broken()))
        .reconcile(&env.store, cs301, 5, env.year)
        .unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

// ==========================================
// 测试 4: 存储层唯一约束
// ==========================================

#[test]
fn test_offering_slot_uniqueness_enforced_by_store() {
    let env = CatalogTestEnv::new().unwrap();
    let cs301 = env.course("CS301", CourseType::Core).unwrap();

    env.store
        .insert_offering(cs301, 5, env.year, Some(env.section_a), Some(env.teachers[0]))
        .unwrap();
    let dup = env
        .store
        .insert_offering(cs301, 5, env.year, Some(env.section_a), Some(env.teachers[0]));
    assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));

    // 无班级无教师的槽位同样唯一
    env.store.insert_offering(cs301, 5, env.year, None, None).unwrap();
    let dup = env.store.insert_offering(cs301, 5, env.year, None, None);
    assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));

    // 不同教师允许
    env.store
        .insert_offering(cs301, 5, env.year, Some(env.section_a), Some(env.teachers[1]))
        .unwrap();
}

// ==========================================
// 测试: 审计日志写入失败
// ==========================================

#[test]
fn test_audit_write_failure_rolls_back_only_that_group() {
    logging::init_test();
    let env = CatalogTestEnv::new().unwrap();
    let (reconciler, executor) = engines(&env);
    let cs301 = env.course("CS301", CourseType::Core).unwrap();

    let a = students_in(&env, "a", env.section_a, 2);
    let b = students_in(&env, "b", env.section_b, 1);
    // A: [有人(含错班 B 学生), 空] → 删除一条; B: 迁入错班学生
    let a_main = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[0]), &[a[0], a[1], b[0]])
        .unwrap();
    let a_dup = env
        .offering_with(cs301, 5, Some(env.section_a), Some(env.teachers[1]), &[])
        .unwrap();
    let b_main = env
        .offering_with(cs301, 5, Some(env.section_b), Some(env.teachers[2]), &[])
        .unwrap();

    // 只拒绝 A 组的日志
    env.execute_batch(
        "CREATE TRIGGER reject_section_a_log BEFORE INSERT ON action_log
         WHEN NEW.detail LIKE '班级 A %'
         BEGIN SELECT RAISE(ABORT, 'audit store unavailable'); END;",
    )
    .unwrap();

    let plan = reconciler.reconcile(&env.store, cs301, 5, env.year).unwrap();
    assert_eq!(plan.deleted_offering_ids(), vec![a_dup]);
    assert_eq!(plan.to_migrate.len(), 1);

    let report = executor.apply(&env.store, &plan, Some("registrar")).unwrap();
    assert_eq!(report.groups.len(), 2);

    let group_a = &report.groups[0];
    assert_eq!(group_a.section, SectionKey::Named("A".to_string()));
    assert!(!group_a.committed);
    assert!(group_a
        .error
        .as_deref()
        .unwrap_or("")
        .contains("audit store unavailable"));
    assert!(group_a
        .actions
        .iter()
        .all(|a| a.outcome == ActionOutcome::RolledBack));

    let group_b = &report.groups[1];
    assert_eq!(group_b.section, SectionKey::Named("B".to_string()));
    assert!(group_b.committed);
    assert_eq!(report.action_ids.len(), 1);

    // A 组删除随审计失败回滚; B 组迁移已提交
    assert_eq!(env.count("SELECT COUNT(*) FROM course_offering").unwrap(), 3);
    assert_eq!(env.enrollment_offering(b[0], cs301).unwrap(), vec![b_main]);
    assert_eq!(env.enrollment_offering(a[0], cs301).unwrap(), vec![a_main]);
    assert_eq!(env.count("SELECT COUNT(*) FROM action_log").unwrap(), 1);
    let log = env
        .action_log_repo
        .find_by_id(&report.action_ids[0])
        .unwrap()
        .unwrap();
    assert!(log.detail.as_deref().unwrap_or("").starts_with("班级 B"));
}
