// ==========================================
// 仓储装载跟踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换引擎/仓储错误为用户友好的错误消息
// 红线: 错误必须包含显式原因,禁止静默吞错
// ==========================================

use crate::engine::EngineError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 所有错误信息面向最终用户,必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 装载规则错误
    // ==========================================
    #[error("装载单已归档: {0}")]
    ArchivedShipment(String),

    #[error("开始时间未设置: {0}")]
    MissingStartTime(String),

    /// 剩余件数不足一托,调用方据此提示"打尾托"
    #[error("超出目标件数: 剩余 {units_left} 件不足一托 {capacity} 件")]
    ExceedsTarget { units_left: u64, capacity: u32 },

    #[error("容量非法: {0} (必须为正整数)")]
    InvalidCapacity(i64),

    #[error("容量已存在: {0}")]
    DuplicateCapacity(u32),

    #[error("货品代码冲突: {0}")]
    DuplicateSkuCode(String),

    // ==========================================
    // 设置错误
    // ==========================================
    #[error("装载时限非法: {0} (允许区间 0.1~99 小时)")]
    InvalidTimeLimit(f64),

    // ==========================================
    // 资源与输入错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 账户与权限错误
    // ==========================================
    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("登录失败: 用户名或密码错误")]
    AuthenticationFailed,

    #[error("用户名已存在: {0}")]
    DuplicateUsername(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// 目的: 引擎层结构化错误转为用户可读消息,保留调用方需要的字段
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ArchivedShipment { shipment_id } => {
                ApiError::ArchivedShipment(format!("装载单(id={})已归档,禁止变更", shipment_id))
            }
            EngineError::MissingStartTime { shipment_id } => ApiError::MissingStartTime(format!(
                "装载单(id={})尚未设置开始时间,禁止打包操作",
                shipment_id
            )),
            EngineError::ExceedsTarget {
                units_left,
                capacity,
            } => ApiError::ExceedsTarget {
                units_left,
                capacity,
            },
            EngineError::InvalidCapacity { value } => ApiError::InvalidCapacity(value),
            EngineError::DuplicateCapacity { value } => ApiError::DuplicateCapacity(value),
            EngineError::DuplicateSkuCode { code } => ApiError::DuplicateSkuCode(code),
            EngineError::SkuNotFound { sku_id } => {
                ApiError::NotFound(format!("SKU(id={})不存在", sku_id))
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::SnapshotCodec(err) => {
                ApiError::InternalError(format!("快照编解码失败: {}", err))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
