// ==========================================
// 仓储装载跟踪系统 - 引擎层
// ==========================================
// 职责: 纯计算与状态迁移规则,不做持久化
// 红线1: 引擎不读墙钟,当前时间一律由调用方注入
// 红线2: 拒绝性规则必须携带可判别的错误变体
// ==========================================

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod packing;
pub mod permission;
pub mod task_query;

// 重导出核心引擎
pub use aggregate::{RecentShipmentActivity, ShipmentAggregator, ShipmentTotals};
pub use dashboard::{DashboardEngine, DashboardStats, TaskStatusSlice};
pub use error::{EngineError, EngineResult};
pub use health::{HealthEngine, HealthReport};
pub use packing::{PackingEngine, PackingSuggestion, SkuView};
pub use permission::PermissionEvaluator;
pub use task_query::TaskQueryEngine;
