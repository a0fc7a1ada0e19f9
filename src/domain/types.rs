// ==========================================
// 多学院教务系统 - 领域类型定义
// ==========================================
// 职责: 标识符别名、课程类型、去重策略、分组键
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 标识符 (SQLite rowid)
// ==========================================
pub type CollegeId = i64;
pub type DepartmentId = i64;
pub type SectionId = i64;
pub type AcademicYearId = i64;
pub type TeacherId = i64;
pub type CourseId = i64;
pub type OfferingId = i64;
pub type StudentId = i64;
pub type EnrollmentId = i64;

/// 学期（1..=8）
pub type Semester = i64;

// ==========================================
// 课程类型 (Course Type)
// ==========================================
// 存储格式: snake_case (与 course.course_type 列一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    Core,               // 必修
    DepartmentElective, // 院系选修
    OpenElective,       // 公共选修（跨院系）
}

impl CourseType {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "core" => Some(CourseType::Core),
            "department_elective" => Some(CourseType::DepartmentElective),
            "open_elective" => Some(CourseType::OpenElective),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CourseType::Core => "core",
            CourseType::DepartmentElective => "department_elective",
            CourseType::OpenElective => "open_elective",
        }
    }

    /// 是否限定在开课院系内选课
    pub fn is_department_bound(&self) -> bool {
        matches!(self, CourseType::Core | CourseType::DepartmentElective)
    }
}

impl fmt::Display for CourseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 无班级开课的分组策略 (Null Section Policy)
// ==========================================
// GROUPED: 所有无班级开课归入同一组 "None"
// SINGLETON: 每个无班级开课单独成组, 永不视为重复
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullSectionPolicy {
    #[default]
    Grouped,
    Singleton,
}

impl NullSectionPolicy {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SINGLETON" => NullSectionPolicy::Singleton,
            _ => NullSectionPolicy::Grouped, // 默认值
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            NullSectionPolicy::Grouped => "GROUPED",
            NullSectionPolicy::Singleton => "SINGLETON",
        }
    }
}

// ==========================================
// 全空重复组策略 (Empty Duplicate Policy)
// ==========================================
// 同一班级多条开课且均无选课时:
// KEEP_OLDEST: 保留 id 最小的一条, 删除其余
// REPORT: 作为冲突上报, 不自动处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmptyDuplicatePolicy {
    #[default]
    KeepOldest,
    Report,
}

impl EmptyDuplicatePolicy {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "REPORT" => EmptyDuplicatePolicy::Report,
            _ => EmptyDuplicatePolicy::KeepOldest,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            EmptyDuplicatePolicy::KeepOldest => "KEEP_OLDEST",
            EmptyDuplicatePolicy::Report => "REPORT",
        }
    }
}

// ==========================================
// 开课分组键 (Section Key)
// ==========================================
// 按班级名称分组; 无班级时的取值由 NullSectionPolicy 决定
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionKey {
    Named(String),
    /// GROUPED 策略下所有无班级开课的公共组
    Unassigned,
    /// SINGLETON 策略下的单条无班级开课
    UnassignedOffering(OfferingId),
}

impl SectionKey {
    pub fn for_offering(
        section_name: Option<&str>,
        offering_id: OfferingId,
        policy: NullSectionPolicy,
    ) -> Self {
        match section_name {
            Some(name) => SectionKey::Named(name.to_string()),
            None => match policy {
                NullSectionPolicy::Grouped => SectionKey::Unassigned,
                NullSectionPolicy::Singleton => SectionKey::UnassignedOffering(offering_id),
            },
        }
    }

    pub fn section_name(&self) -> Option<&str> {
        match self {
            SectionKey::Named(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKey::Named(name) => write!(f, "{}", name),
            SectionKey::Unassigned => write!(f, "None"),
            SectionKey::UnassignedOffering(id) => write!(f, "None#{}", id),
        }
    }
}
