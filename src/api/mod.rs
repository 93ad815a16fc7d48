// ==========================================
// 仓储装载跟踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供宿主(CLI/界面壳)调用
// ==========================================

pub mod error;

pub mod account_api;
pub mod dashboard_api;
pub mod settings_api;
pub mod shipment_api;
pub mod task_api;
pub mod template_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};

pub use account_api::{AccountApi, ManagedUserInput};
pub use dashboard_api::DashboardApi;
pub use settings_api::SettingsApi;
pub use shipment_api::{ShipmentApi, ShipmentSummary, ShipmentView};
pub use task_api::{TaskApi, TaskInput, TaskListItem};
pub use template_api::TemplateApi;
