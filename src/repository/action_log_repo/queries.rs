use super::core::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::types::{CourseId, Semester};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, action_type, action_ts, actor,
           course_id, semester, academic_year_id,
           payload_json, detail
    FROM action_log
"#;

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE action_id = ?", SELECT_COLUMNS);
        let log = conn
            .query_row(&sql, params![action_id], |row| self.map_row(row))
            .optional()?;
        Ok(log)
    }

    /// 查询某门课程某学期的全部日志（新到旧）
    pub fn find_by_course(&self, course_id: CourseId, semester: Semester) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE course_id = ? AND semester = ? ORDER BY action_ts DESC, action_id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![course_id, semester], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 最近 N 条日志
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY action_ts DESC, action_id LIMIT ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![limit as i64], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 将数据库行映射为 ActionLog
    fn map_row(&self, row: &Row) -> SqliteResult<ActionLog> {
        let action_type_str: String = row.get(1)?;
        let action_ts_str: String = row.get(2)?;
        let payload_json_str: Option<String> = row.get(7)?;

        let action_type = ActionType::from_str(&action_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("未知操作类型: {}", action_type_str).into(),
            )
        })?;

        // 解析时间戳
        let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;

        Ok(ActionLog {
            action_id: row.get(0)?,
            action_type,
            action_ts,
            actor: row.get(3)?,
            course_id: row.get(4)?,
            semester: row.get(5)?,
            academic_year_id: row.get(6)?,
            payload_json: payload_json_str.and_then(|s| serde_json::from_str(&s).ok()),
            detail: row.get(8)?,
        })
    }
}
