// ==========================================
// 仓储装载跟踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 装载跟踪计算核心 (纯函数引擎 + 状态快照持久化)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 状态快照持久化
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 时长格式化
pub mod timefmt;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ArchivedFilter, HealthStatus, PermissionKey, QuickCountMode, ShipmentPhase, SortDirection,
    TaskPriority, TaskSortKey, TaskStatus, UserRole,
};

// 领域实体
pub use domain::{
    ManagedUser, PalletBuildInfo, PalletEntry, Shipment, ShipmentTemplate, Sku, Task, TaskQuery,
    TemplateSku, TrackerState, User, DELETED_SHIPMENT_LABEL,
};

// 引擎
pub use engine::{
    DashboardEngine, HealthEngine, PackingEngine, PermissionEvaluator, ShipmentAggregator,
    TaskQueryEngine,
};

// API
pub use api::{
    AccountApi, DashboardApi, SettingsApi, ShipmentApi, TaskApi, TemplateApi,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓储装载跟踪系统";

// ==========================================
// 预编译检查
// ==========================================
