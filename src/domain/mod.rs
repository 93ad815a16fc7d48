// ==========================================
// 仓储装载跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与构造期默认值
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod shipment;
pub mod state;
pub mod task;
pub mod template;
pub mod types;
pub mod user;

// 重导出核心类型
pub use shipment::{normalize_capacities, PalletBuildInfo, PalletEntry, Shipment, Sku};
pub use state::{
    AppSettings, QuickCount, TrackerState, DEFAULT_TIME_LIMIT_HOURS, TIME_LIMIT_MAX_HOURS,
    TIME_LIMIT_MIN_HOURS,
};
pub use task::{Task, TaskQuery, DELETED_SHIPMENT_LABEL};
pub use template::{ShipmentTemplate, TemplateSku};
pub use user::{seed_managed_users, ManagedUser, User, ADMIN_PASSWORD, ADMIN_USERNAME};
