// ==========================================
// 多学院教务系统 - 应用状态
// ==========================================
// 职责: 打开数据库、装配仓储/配置/引擎, 供 CLI 复用
// 约束: 所有组件共享同一个 SQLite 连接
// ==========================================

use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{
    CourseAuditor, EligibilityResolver, EnrollmentPlanner, OfferingReconciler, PlanExecutor,
};
use crate::repository::{ActionLogRepository, SqliteCatalogStore};
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// AppState - 应用状态
// ==========================================
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 目录存储（引擎每次调用显式传入）
    pub store: SqliteCatalogStore,

    pub config: Arc<ConfigManager>,
    pub action_log_repo: Arc<ActionLogRepository>,

    // ===== 引擎 =====
    pub resolver: EligibilityResolver,
    pub reconciler: OfferingReconciler<ConfigManager>,
    pub executor: PlanExecutor<ConfigManager>,
    pub enrollment_planner: EnrollmentPlanner<ConfigManager>,
    pub auditor: CourseAuditor,
}

impl AppState {
    /// 打开数据库并装配全部组件
    ///
    /// # 说明
    /// 库表不存在时会自动建表（幂等）
    pub fn new(db_path: String) -> Result<Self> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        ensure_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let store = SqliteCatalogStore::from_connection(conn.clone())
            .context("无法创建SqliteCatalogStore")?;
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| anyhow!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let reconciler = OfferingReconciler::new(config.clone());
        let executor = PlanExecutor::new(config.clone());
        let enrollment_planner = EnrollmentPlanner::new(config.clone());

        tracing::info!("AppState初始化成功");

        Ok(Self {
            db_path,
            store,
            config,
            action_log_repo,
            resolver: EligibilityResolver::new(),
            reconciler,
            executor,
            enrollment_planner,
            auditor: CourseAuditor::new(),
        })
    }
}

/// 校验 schema 版本并建表
///
/// 版本高于程序支持时直接拒绝, 不触碰库表
fn ensure_schema(conn: &Connection) -> Result<()> {
    if let Some(v) = read_schema_version(conn)? {
        if v > CURRENT_SCHEMA_VERSION {
            return Err(anyhow!(
                "数据库 schema 版本 {} 高于程序支持的版本 {}",
                v,
                CURRENT_SCHEMA_VERSION
            ));
        }
    }
    init_schema(conn).context("初始化数据库结构失败")?;
    Ok(())
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 COLLEGE_ERP_DB_PATH
/// 2. <用户数据目录>/college-erp/college_erp.db
/// 3. ./college_erp.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("COLLEGE_ERP_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./college_erp.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("college-erp");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("college_erp.db");
        }
    }

    path.to_string_lossy().to_string()
}
