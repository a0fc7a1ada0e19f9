// ==========================================
// 多学院教务系统 - 命令行入口
// ==========================================
// 职责: 选课资格查询、开课去重、选课补录、课程代码审计
// 红线: 默认预演, 仅 --apply 时写库
// ==========================================

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use college_erp::app::{get_default_db_path, AppState};
use college_erp::domain::{
    ActionOutcome, ApplyReport, Course, EligibilityReport, EnrollmentPlan, ReconcileConflict,
    ReconciliationPlan,
};
use college_erp::domain::types::{AcademicYearId, DepartmentId};
use college_erp::engine::ReconcileCore;
use college_erp::repository::CatalogStore;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "college-erp")]
#[command(version, about = "多学院教务系统 - 选课资格与开课去重工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 数据库路径（默认: COLLEGE_ERP_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    log_json: bool,
}

/// 课程定位参数
#[derive(clap::Args, Debug)]
struct CourseArgs {
    /// 学院代码
    #[arg(long)]
    college: String,

    /// 院系代码
    #[arg(long)]
    dept: String,

    /// 课程代码（如 CS301）
    #[arg(long)]
    course: String,

    /// 学期
    #[arg(long)]
    semester: i64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 创建数据库结构
    InitDb,

    /// 列出可选课且尚未选课的学生
    Eligible {
        #[command(flatten)]
        target: CourseArgs,

        /// 输出 JSON
        #[arg(long)]
        json: bool,

        /// 导出 CSV 文件
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// 生成（并可执行）开课去重计划
    Reconcile {
        #[command(flatten)]
        target: CourseArgs,

        /// 学年标签（如 2024-25）
        #[arg(long)]
        year: String,

        /// 执行计划（默认仅预演）
        #[arg(long)]
        apply: bool,

        /// 操作人
        #[arg(long)]
        actor: Option<String>,

        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },

    /// 把可选课学生补录到本班级开课
    Enroll {
        #[command(flatten)]
        target: CourseArgs,

        /// 学年标签（如 2024-25）
        #[arg(long)]
        year: String,

        /// 执行补录（默认仅预演）
        #[arg(long)]
        apply: bool,

        /// 操作人
        #[arg(long)]
        actor: Option<String>,
    },

    /// 审计同院系重复的课程代码
    AuditCourses {
        /// 学院代码（与 --dept 一起使用）
        #[arg(long, requires = "dept")]
        college: Option<String>,

        /// 院系代码
        #[arg(long, requires = "college")]
        dept: Option<String>,
    },

    /// 查看最近的操作日志
    History {
        /// 条数
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        college_erp::logging::init_json();
    } else {
        college_erp::logging::init();
    }

    if let Err(e) = run(cli) {
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("{} v{} 使用数据库: {}", college_erp::APP_NAME, college_erp::VERSION, db_path);

    let state = AppState::new(db_path)?;

    match cli.command {
        Commands::InitDb => {
            println!("数据库已就绪: {}", state.db_path);
        }

        Commands::Eligible { target, json, csv } => {
            let course = locate_course(&state, &target)?;
            let report = state
                .resolver
                .resolve_eligible_detailed(&state.store, course.id, target.semester)?;

            if let Some(path) = csv {
                write_eligible_csv(&report, &path)?;
                println!("已导出 {} 名学生到 {}", report.students.len(), path.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_eligibility(&course, &report);
            }
        }

        Commands::Reconcile {
            target,
            year,
            apply,
            actor,
            json,
        } => {
            let course = locate_course(&state, &target)?;
            let year_id = locate_year(&state, &year)?;
            let plan = state
                .reconciler
                .reconcile(&state.store, course.id, target.semester, year_id)?;

            if json && !apply {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }
            if !json {
                print_plan(&course, &year, &plan);
            }

            if apply {
                if !plan.has_actions() {
                    println!("计划中没有可执行的动作");
                    return Ok(());
                }
                let report = state.executor.apply(&state.store, &plan, actor.as_deref())?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "plan": plan,
                            "report": report,
                        }))?
                    );
                } else {
                    print_apply_report(&report);
                }
                if !report.all_committed() {
                    return Err(anyhow!("{} 个执行组失败并已回滚", report.failed_groups().len()));
                }
            } else if plan.has_actions() {
                println!("（预演）使用 --apply 执行以上计划");
            }
        }

        Commands::Enroll {
            target,
            year,
            apply,
            actor,
        } => {
            let course = locate_course(&state, &target)?;
            let year_id = locate_year(&state, &year)?;
            let plan = state
                .enrollment_planner
                .plan(&state.store, course.id, target.semester, year_id)?;
            print_enrollment_plan(&course, &plan);

            if apply {
                let report = state
                    .enrollment_planner
                    .apply(&state.store, &plan, actor.as_deref())?;
                println!("已补录 {} 条选课", report.inserted);
                if let Some(id) = report.action_id {
                    println!("操作日志: {}", id);
                }
            } else if !plan.to_enroll.is_empty() {
                println!("（预演）使用 --apply 执行补录");
            }
        }

        Commands::AuditCourses { college, dept } => {
            let department_id: Option<DepartmentId> = match (college, dept) {
                (Some(college), Some(dept)) => Some(
                    state
                        .store
                        .find_department(&college, &dept)?
                        .ok_or_else(|| anyhow!("院系不存在: {}/{}", college, dept))?
                        .id,
                ),
                _ => None,
            };
            let duplicates = state.auditor.duplicate_courses(&state.store, department_id)?;
            if duplicates.is_empty() {
                println!("未发现重复课程代码");
            }
            for dup in &duplicates {
                println!("院系 {} 课程代码 {}:", dup.department_id, dup.code);
                for (course_id, offering_count) in &dup.courses {
                    println!("  course_id={} 开课数={}", course_id, offering_count);
                }
            }
        }

        Commands::History { limit } => {
            let logs = state.action_log_repo.find_recent(limit)?;
            if logs.is_empty() {
                println!("暂无操作日志");
            }
            for log in &logs {
                println!(
                    "{}  {:<18} {:<12} {}  {}",
                    log.action_ts.format("%Y-%m-%d %H:%M:%S"),
                    log.action_type.to_db_str(),
                    log.actor,
                    log.action_id,
                    log.detail.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

fn locate_course(state: &AppState, target: &CourseArgs) -> Result<Course> {
    let department = state
        .store
        .find_department(&target.college, &target.dept)?
        .ok_or_else(|| anyhow!("院系不存在: {}/{}", target.college, target.dept))?;
    state
        .store
        .find_course(&target.course, department.id)?
        .ok_or_else(|| anyhow!("课程不存在: {} ({}/{})", target.course, target.college, target.dept))
}

fn locate_year(state: &AppState, label: &str) -> Result<AcademicYearId> {
    Ok(state
        .store
        .find_academic_year(label)?
        .ok_or_else(|| anyhow!("学年不存在: {}", label))?
        .id)
}

fn write_eligible_csv(report: &EligibilityReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("无法创建 CSV 文件: {}", path.display()))?;
    for student in &report.students {
        writer.serialize(student)?;
    }
    writer.flush()?;
    Ok(())
}

// ==========================================
// 文本输出
// ==========================================

fn print_eligibility(course: &Course, report: &EligibilityReport) {
    println!(
        "课程 {} ({}) 第 {} 学期: 候选 {} 人, 已选 {} 人, 可选 {} 人",
        course.code,
        course.course_type,
        report.semester,
        report.candidate_count,
        report.already_enrolled_count,
        report.students.len()
    );
    for s in &report.students {
        println!(
            "  {:>6}  {:<24} {:<32} 班级={}",
            s.student_id,
            s.name,
            s.email.as_deref().unwrap_or("-"),
            s.section_name.as_deref().unwrap_or("None")
        );
    }
}

fn print_plan(course: &Course, year: &str, plan: &ReconciliationPlan) {
    println!("课程 {} 第 {} 学期 {} 去重计划:", course.code, plan.semester, year);
    if plan.is_empty() {
        println!("  无需处理");
        return;
    }
    for d in &plan.to_delete {
        println!(
            "  删除开课 {} (班级 {}, 保留 {})",
            d.offering_id, d.section, d.canonical_offering_id
        );
    }
    for m in &plan.to_migrate {
        println!(
            "  迁移选课 {} (学生 {}) {} -> {} (班级 {})",
            m.enrollment_id, m.student_id, m.from_offering, m.to_offering, m.target_section
        );
    }
    for c in &plan.conflicts {
        match c {
            ReconcileConflict::PopulatedDuplicates { section, offerings } => {
                println!("  冲突: 班级 {} 多条开课均有选课 {:?}", section, offerings)
            }
            ReconcileConflict::AllEmptyDuplicates {
                section,
                offering_ids,
            } => println!("  冲突: 班级 {} 多条开课均无选课 {:?}", section, offering_ids),
            ReconcileConflict::DuplicateEnrollment {
                enrollment_id,
                student_id,
                to_offering,
                ..
            } => println!(
                "  冲突: 选课 {} 的学生 {} 已在目标开课 {} 中",
                enrollment_id, student_id, to_offering
            ),
        }
    }
    for m in &plan.missing_offerings {
        println!(
            "  缺失开课: 班级 {} ({} 条选课待迁移)",
            m.section_name,
            m.enrollment_ids.len()
        );
    }

    let touched = ReconcileCore::touched_offerings(plan);
    if !touched.is_empty() {
        println!("  涉及开课 {} 条: {:?}", touched.len(), touched);
    }
}

fn print_apply_report(report: &ApplyReport) {
    for group in &report.groups {
        println!(
            "  执行组 {}: {}",
            group.section,
            if group.committed { "已提交" } else { "已回滚" }
        );
        if let Some(error) = &group.error {
            println!("    原因: {}", error);
        }
        for action in &group.actions {
            let outcome = match &action.outcome {
                ActionOutcome::Applied => "成功".to_string(),
                ActionOutcome::AlreadyAbsent => "已不存在".to_string(),
                ActionOutcome::RolledBack => "已回滚".to_string(),
                ActionOutcome::Failed { kind, reason } => format!("失败 {:?}: {}", kind, reason),
                ActionOutcome::Skipped => "未执行".to_string(),
            };
            println!("    {:?} => {}", action.op, outcome);
        }
    }
    for id in &report.action_ids {
        println!("  操作日志: {}", id);
    }
}

fn print_enrollment_plan(course: &Course, plan: &EnrollmentPlan) {
    println!(
        "课程 {} 第 {} 学期补录计划: 待补录 {} 人",
        course.code,
        plan.semester,
        plan.to_enroll.len()
    );
    for e in &plan.to_enroll {
        println!("  学生 {} -> 开课 {}", e.student_id, e.offering_id);
    }
    for (section, students) in &plan.missing_offerings {
        println!("  缺失开课: 班级 {} ({} 人)", section, students.len());
    }
    for (section, students) in &plan.blocked {
        println!("  班级 {} 存在未裁决的重复开课 ({} 人待补录)", section, students.len());
    }
    if !plan.unassigned.is_empty() {
        println!("  无班级学生: {:?}", plan.unassigned);
    }
}
