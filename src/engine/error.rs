// ==========================================
// 仓储装载跟踪系统 - 引擎层错误类型
// ==========================================
// 职责: 打包/状态机规则的可恢复类型化错误
// 红线: 引擎只返回错误值,从不弹窗;呈现由调用方负责
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
///
/// 全部为可恢复的业务错误,不致进程终止
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 状态机错误 =====
    #[error("装载单已归档,禁止变更: shipment_id={shipment_id}")]
    ArchivedShipment { shipment_id: String },

    #[error("开始时间未设置,禁止打包操作: shipment_id={shipment_id}")]
    MissingStartTime { shipment_id: String },

    // ===== 打包规则错误 =====
    // 调用方据 units_left 显式发起"打尾托"操作
    #[error("超出目标件数: 剩余 {units_left} 件不足一托 {capacity} 件")]
    ExceedsTarget { units_left: u64, capacity: u32 },

    #[error("容量非法: {value} (必须为正整数)")]
    InvalidCapacity { value: i64 },

    #[error("容量已存在: {value}")]
    DuplicateCapacity { value: u32 },

    // ===== SKU 规则错误 =====
    #[error("货品代码冲突(忽略大小写): {code}")]
    DuplicateSkuCode { code: String },

    #[error("SKU 未找到: {sku_id}")]
    SkuNotFound { sku_id: String },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
