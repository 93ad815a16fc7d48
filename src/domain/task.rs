// ==========================================
// 仓储装载跟踪系统 - 任务领域模型
// ==========================================
// 职责: 任务实体 + 任务查询条件
// 红线: 任务对装载单是弱引用,悬挂引用渲染为占位文本而非报错
// ==========================================

use crate::domain::types::{
    ArchivedFilter, SortDirection, TaskPriority, TaskSortKey, TaskStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 已删除装载单的占位名称
pub const DELETED_SHIPMENT_LABEL: &str = "[Deleted Shipment]";

// ==========================================
// Task - 任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,    // 任务唯一标识
    pub title: String, // 标题

    #[serde(default)]
    pub description: String, // 描述

    #[serde(default = "default_status")]
    pub status: TaskStatus, // 状态

    #[serde(default = "default_priority")]
    pub priority: TaskPriority, // 优先级

    #[serde(default)]
    pub due_date: Option<NaiveDate>, // 截止日期(可缺失)

    #[serde(default)]
    pub assigned_to: String, // 负责人(自由文本)

    #[serde(default)]
    pub tags: Vec<String>, // 标签

    #[serde(default)]
    pub related_shipment_id: Option<String>, // 关联装载单(弱引用,按 id 查找)

    #[serde(default)]
    pub is_archived: bool, // 归档标记

    // ===== 创建人 =====
    #[serde(default)]
    pub created_by_uid: String, // 创建人 uid
    #[serde(default)]
    pub created_by_name: String, // 创建人显示名

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 创建时间
    pub updated_at: DateTime<Utc>, // 更新时间

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>, // 完成时间(仅 COMPLETED 状态持有)
}

fn default_status() -> TaskStatus {
    TaskStatus::Todo
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

impl Task {
    /// 创建任务,构造期补全全部字段
    pub fn new(title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            assigned_to: String::new(),
            tags: Vec::new(),
            related_shipment_id: None,
            is_archived: false,
            created_by_uid: String::new(),
            created_by_name: String::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// 状态迁移,维护 completed_at:
    /// 转入 COMPLETED 记录完成时间,转出则清除
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        if status == TaskStatus::Completed {
            self.completed_at = Some(now);
        } else {
            self.completed_at = None;
        }
    }
}

// ==========================================
// TaskQuery - 任务过滤/排序条件
// ==========================================
// 同时作为持久化的任务视图偏好(tasks_view)
// 文本条件为空字符串 = 不过滤
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub search: String, // 全文搜索(标题/描述/标签,忽略大小写)

    #[serde(default)]
    pub status: Option<TaskStatus>, // 状态精确匹配(None = 全部)

    #[serde(default)]
    pub priority: Option<TaskPriority>, // 优先级精确匹配(None = 全部)

    #[serde(default)]
    pub due_date: Option<NaiveDate>, // 截止日期同日匹配

    #[serde(default)]
    pub assigned_to: String, // 负责人子串匹配(忽略大小写)

    #[serde(default)]
    pub tags: String, // 逗号分隔标签词,任一子串命中即保留

    #[serde(default = "default_archived_filter")]
    pub archived: ArchivedFilter, // 归档三态,默认仅未归档

    #[serde(default = "default_sort_key")]
    pub sort_key: TaskSortKey, // 排序键,默认创建时间

    #[serde(default = "default_sort_direction")]
    pub direction: SortDirection, // 排序方向,默认降序
}

fn default_archived_filter() -> ArchivedFilter {
    ArchivedFilter::No
}

fn default_sort_key() -> TaskSortKey {
    TaskSortKey::CreatedAt
}

fn default_sort_direction() -> SortDirection {
    SortDirection::Desc
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            priority: None,
            due_date: None,
            assigned_to: String::new(),
            tags: String::new(),
            archived: default_archived_filter(),
            sort_key: default_sort_key(),
            direction: default_sort_direction(),
        }
    }
}
