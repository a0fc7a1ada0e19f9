// ==========================================
// 多学院教务系统 - 操作日志领域模型
// ==========================================
// 红线: 所有执行步骤的写入必须记录
// 用途: 审计追踪（谁在何时对哪门课做了什么）
// 对齐: v0.1_catalog.sql action_log 表
// ==========================================

use crate::domain::types::{AcademicYearId, CourseId, Semester};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,        // 日志ID (uuid v4)
    pub action_type: ActionType,  // 操作类型
    pub action_ts: NaiveDateTime, // 操作时间戳
    pub actor: String,            // 操作人

    // ===== 作用范围 =====
    pub course_id: Option<CourseId>,
    pub semester: Option<Semester>,
    pub academic_year_id: Option<AcademicYearId>,

    pub payload_json: Option<JsonValue>, // 操作载荷 (JSON)
    pub detail: Option<String>,          // 详细描述
}

impl ActionLog {
    /// 以当前时间与新 uuid 创建日志
    pub fn new(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type,
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            course_id: None,
            semester: None,
            academic_year_id: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_scope(
        mut self,
        course_id: CourseId,
        semester: Semester,
        academic_year_id: AcademicYearId,
    ) -> Self {
        self.course_id = Some(course_id);
        self.semester = Some(semester);
        self.academic_year_id = Some(academic_year_id);
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    ReconcileApply,  // 执行去重计划（每组一条）
    EnrollmentApply, // 执行选课补录
}

impl ActionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RECONCILE_APPLY" => Some(ActionType::ReconcileApply),
            "ENROLLMENT_APPLY" => Some(ActionType::EnrollmentApply),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::ReconcileApply => "RECONCILE_APPLY",
            ActionType::EnrollmentApply => "ENROLLMENT_APPLY",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
