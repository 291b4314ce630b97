// ==========================================
// 家教平台排课引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 引擎层只返回本枚举；仓储错误经 From 转换后上抛
// ==========================================

use thiserror::Error;

use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;

/// 传输层无关的错误分类（由边界层映射为状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Forbidden,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// 排课引擎错误
#[derive(Error, Debug)]
pub enum SchedulingError {
    // ===== 输入与权限 =====
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Ownership(String),

    #[error("{0}")]
    UnverifiedActor(String),

    // ===== 名额 =====
    #[error("名额已满: slot_id={slot_id}")]
    CapacityExceeded { slot_id: String },

    #[error("重复报名: slot_id={slot_id}, student_id={student_id}")]
    AlreadyEnrolled { slot_id: String, student_id: String },

    #[error("并发修改冲突: slot_id={slot_id}, expected_revision={expected}, actual_revision={actual}")]
    ConcurrentModification {
        slot_id: String,
        expected: i32,
        actual: i32,
    },

    // ===== 状态 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("时段已有报名，不可删除: slot_id={slot_id}")]
    SlotNotEmpty { slot_id: String },

    // ===== 仓储 =====
    #[error(transparent)]
    Repository(RepositoryError),
}

impl SchedulingError {
    /// 按消息键构造本地化的输入错误
    pub fn invalid_input(key: &str) -> Self {
        SchedulingError::InvalidInput(t(key))
    }

    /// 按消息键构造本地化的输入错误（带参数）
    pub fn invalid_input_with(key: &str, args: &[(&str, &str)]) -> Self {
        SchedulingError::InvalidInput(t_with_args(key, args))
    }

    pub fn ownership() -> Self {
        SchedulingError::Ownership(t("errors.not_owner"))
    }

    pub fn unverified() -> Self {
        SchedulingError::UnverifiedActor(t("errors.unverified"))
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        SchedulingError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::InvalidInput(_) => ErrorKind::InvalidInput,
            SchedulingError::Ownership(_) => ErrorKind::Forbidden,
            SchedulingError::UnverifiedActor(_) => ErrorKind::Unauthorized,
            SchedulingError::NotFound { .. } => ErrorKind::NotFound,
            SchedulingError::CapacityExceeded { .. }
            | SchedulingError::AlreadyEnrolled { .. }
            | SchedulingError::ConcurrentModification { .. }
            | SchedulingError::InvalidStateTransition { .. }
            | SchedulingError::SlotNotEmpty { .. } => ErrorKind::Conflict,
            SchedulingError::Repository(_) => ErrorKind::Internal,
        }
    }

    /// 面向终端用户的本地化消息
    ///
    /// 输入/权限类错误在构造时已本地化；其余按当前语言翻译
    pub fn user_message(&self) -> String {
        match self {
            SchedulingError::InvalidInput(msg)
            | SchedulingError::Ownership(msg)
            | SchedulingError::UnverifiedActor(msg) => msg.clone(),
            SchedulingError::CapacityExceeded { .. } => t("errors.capacity_exceeded"),
            SchedulingError::AlreadyEnrolled { .. } => t("errors.already_enrolled"),
            SchedulingError::ConcurrentModification { .. } => t("errors.concurrent_modification"),
            SchedulingError::NotFound { entity, .. } => {
                t_with_args("errors.not_found", &[("entity", entity)])
            }
            SchedulingError::InvalidStateTransition { .. } => t("errors.invalid_state"),
            SchedulingError::SlotNotEmpty { .. } => t("errors.slot_not_empty"),
            SchedulingError::Repository(_) => t("errors.internal"),
        }
    }
}

// 乐观锁冲突、占用时段与记录缺失在引擎层有独立语义，其余原样包装
impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure {
                entity_id,
                expected,
                actual,
            } => SchedulingError::ConcurrentModification {
                slot_id: entity_id,
                expected,
                actual,
            },
            RepositoryError::SlotOccupied { slot_id } => SchedulingError::SlotNotEmpty { slot_id },
            RepositoryError::NotFound { entity, id } => SchedulingError::NotFound { entity, id },
            other => SchedulingError::Repository(other),
        }
    }
}

/// Result 类型别名
pub type SchedulingResult<T> = Result<T, SchedulingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimistic_lock_maps_to_concurrent_modification() {
        let err: SchedulingError = RepositoryError::OptimisticLockFailure {
            entity_id: "S1".to_string(),
            expected: 2,
            actual: 3,
        }
        .into();
        assert!(matches!(
            err,
            SchedulingError::ConcurrentModification { ref slot_id, expected: 2, actual: 3 } if slot_id == "S1"
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_occupied_slot_maps_to_slot_not_empty() {
        let err: SchedulingError = RepositoryError::SlotOccupied {
            slot_id: "S1".to_string(),
        }
        .into();
        assert!(matches!(err, SchedulingError::SlotNotEmpty { ref slot_id } if slot_id == "S1"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_other_repository_errors_are_internal() {
        let err: SchedulingError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("poisoned"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            SchedulingError::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(SchedulingError::Ownership("x".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(
            SchedulingError::UnverifiedActor("x".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            SchedulingError::SlotNotEmpty { slot_id: "S".into() }.kind(),
            ErrorKind::Conflict
        );
    }
}
