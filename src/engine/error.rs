// ==========================================
// 多学院教务系统 - 引擎层错误类型
// ==========================================
// 分类: NotFound / Conflict / Store
// 红线: Store 错误一律向上传播, 不吞掉
// ==========================================

use crate::domain::reconciliation::FailureKind;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    /// 需人工裁决的重复数据, 或写入时违反唯一/外键约束
    #[error("数据冲突: {0}")]
    Conflict(String),

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error(transparent)]
    Store(RepositoryError),
}

impl EngineError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            EngineError::NotFound { .. } => FailureKind::NotFound,
            EngineError::Conflict(_) => FailureKind::Conflict,
            EngineError::Config(_) | EngineError::Store(_) => FailureKind::StoreError,
        }
    }
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            RepositoryError::UniqueConstraintViolation(msg) => {
                EngineError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                EngineError::Conflict(format!("外键约束违反: {}", msg))
            }
            other => EngineError::Store(other),
        }
    }
}

impl From<Box<dyn std::error::Error>> for EngineError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        EngineError::Config(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
