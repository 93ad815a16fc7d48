// ==========================================
// 仓储装载跟踪系统 - 领域类型定义
// ==========================================
// 职责: 全系统共享的枚举类型
// 红线: 权限是固定枚举,不是字符串字典
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 装载阶段 (Shipment Phase)
// ==========================================
// 状态机: NOT_STARTED → IN_PROGRESS → ARCHIVED
// ARCHIVED → IN_PROGRESS 仅允许通过显式取消归档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentPhase {
    NotStarted, // 未开始(无开始时间)
    InProgress, // 装载中
    Archived,   // 已归档(只读)
}

impl fmt::Display for ShipmentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentPhase::NotStarted => write!(f, "NOT_STARTED"),
            ShipmentPhase::InProgress => write!(f, "IN_PROGRESS"),
            ShipmentPhase::Archived => write!(f, "ARCHIVED"),
        }
    }
}

// ==========================================
// 时效健康度 (Health Status)
// ==========================================
// 红线: 等级制,不是评分制
// GRAY 为中性状态(无开始时间或零托盘,不参与红黄绿分级)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Gray,   // 中性(信息不足)
    Green,  // 正常
    Yellow, // 接近时限
    Red,    // 超限/预计超限
}

impl HealthStatus {
    /// 前端样式类名(与仪表盘样式约定一致)
    pub fn css_class(&self) -> &'static str {
        match self {
            HealthStatus::Gray => "gray",
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Gray => write!(f, "GRAY"),
            HealthStatus::Green => write!(f, "GREEN"),
            HealthStatus::Yellow => write!(f, "YELLOW"),
            HealthStatus::Red => write!(f, "RED"),
        }
    }
}

// ==========================================
// 任务状态 (Task Status)
// ==========================================
// 转入 COMPLETED 时记录 completed_at,转出时清除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,       // 待办
    InProgress, // 进行中
    Completed,  // 已完成
    OnHold,     // 搁置
}

impl TaskStatus {
    /// 全部状态(用于状态分布统计,顺序固定)
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::OnHold,
    ];

    /// 展示标签
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::OnHold => "On Hold",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().replace('-', "_").as_str() {
            "TODO" => TaskStatus::Todo,
            "IN_PROGRESS" | "INPROGRESS" => TaskStatus::InProgress,
            "COMPLETED" => TaskStatus::Completed,
            "ON_HOLD" | "ONHOLD" => TaskStatus::OnHold,
            _ => TaskStatus::Todo, // 默认值
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "TODO"),
            TaskStatus::InProgress => write!(f, "IN_PROGRESS"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
            TaskStatus::OnHold => write!(f, "ON_HOLD"),
        }
    }
}

// ==========================================
// 任务优先级 (Task Priority)
// ==========================================
// 排序依据固定序: LOW < MEDIUM < HIGH < URGENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,    // 低
    Medium, // 中
    High,   // 高
    Urgent, // 紧急
}

impl TaskPriority {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LOW" => TaskPriority::Low,
            "MEDIUM" => TaskPriority::Medium,
            "HIGH" => TaskPriority::High,
            "URGENT" => TaskPriority::Urgent,
            _ => TaskPriority::Medium, // 默认值
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "LOW"),
            TaskPriority::Medium => write!(f, "MEDIUM"),
            TaskPriority::High => write!(f, "HIGH"),
            TaskPriority::Urgent => write!(f, "URGENT"),
        }
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
// ADMIN 无视权限表,恒真
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin, // 管理员
    User,  // 普通用户
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::User => write!(f, "USER"),
        }
    }
}

// ==========================================
// 权限键 (Permission Key)
// ==========================================
// 红线: 固定枚举全集,has_permission 对其全覆盖,
// 杜绝字符串键拼写错误导致的静默 false
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionKey {
    CanCreateTemplates,  // 创建模板
    CanManageUsers,      // 管理用户
    CanViewAllShipments, // 查看全部装载单
    CanEditAnyTask,      // 编辑任意任务
}

impl PermissionKey {
    /// 权限全集(用于授权界面与种子账户)
    pub const ALL: [PermissionKey; 4] = [
        PermissionKey::CanCreateTemplates,
        PermissionKey::CanManageUsers,
        PermissionKey::CanViewAllShipments,
        PermissionKey::CanEditAnyTask,
    ];
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKey::CanCreateTemplates => write!(f, "CAN_CREATE_TEMPLATES"),
            PermissionKey::CanManageUsers => write!(f, "CAN_MANAGE_USERS"),
            PermissionKey::CanViewAllShipments => write!(f, "CAN_VIEW_ALL_SHIPMENTS"),
            PermissionKey::CanEditAnyTask => write!(f, "CAN_EDIT_ANY_TASK"),
        }
    }
}

// ==========================================
// 快速点数模式 (Quick Count Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuickCountMode {
    Basic,    // 基础(仅装车数)
    Advanced, // 高级(装车/退货/卡板圈)
}

impl fmt::Display for QuickCountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuickCountMode::Basic => write!(f, "BASIC"),
            QuickCountMode::Advanced => write!(f, "ADVANCED"),
        }
    }
}

// ==========================================
// 归档过滤 (Archived Filter)
// ==========================================
// 三态: 只看归档 / 只看未归档 / 全部
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArchivedFilter {
    Yes, // 仅归档
    No,  // 仅未归档
    All, // 全部
}

impl fmt::Display for ArchivedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchivedFilter::Yes => write!(f, "YES"),
            ArchivedFilter::No => write!(f, "NO"),
            ArchivedFilter::All => write!(f, "ALL"),
        }
    }
}

// ==========================================
// 任务排序键 (Task Sort Key)
// ==========================================
// 日期键: 缺失日期恒排在有日期之后,与方向无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskSortKey {
    Title,       // 标题(忽略大小写)
    Status,      // 状态
    Priority,    // 优先级固定序
    DueDate,     // 截止日期
    CreatedAt,   // 创建时间
    UpdatedAt,   // 更新时间
    CompletedAt, // 完成时间
}

impl fmt::Display for TaskSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSortKey::Title => write!(f, "TITLE"),
            TaskSortKey::Status => write!(f, "STATUS"),
            TaskSortKey::Priority => write!(f, "PRIORITY"),
            TaskSortKey::DueDate => write!(f, "DUE_DATE"),
            TaskSortKey::CreatedAt => write!(f, "CREATED_AT"),
            TaskSortKey::UpdatedAt => write!(f, "UPDATED_AT"),
            TaskSortKey::CompletedAt => write!(f, "COMPLETED_AT"),
        }
    }
}

// ==========================================
// 排序方向 (Sort Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    Asc,  // 升序
    Desc, // 降序
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}
