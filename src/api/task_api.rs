// ==========================================
// 仓储装载跟踪系统 - 任务 API
// ==========================================
// 职责: 任务增删改查/状态迁移/归档,过滤排序委托查询引擎
// 红线: 永久删除仅限 ADMIN 角色;归档任务先取消归档再编辑
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::state::TrackerState;
use crate::domain::task::{Task, TaskQuery, DELETED_SHIPMENT_LABEL};
use crate::domain::types::{TaskPriority, TaskStatus, UserRole};
use crate::engine::TaskQueryEngine;
use crate::repository::StateSnapshotRepository;

/// 离线环境下任务创建人的兜底标识
const LOCAL_CREATOR_UID: &str = "local_user";
const LOCAL_CREATOR_NAME: &str = "Local User";

// ==========================================
// TaskApi - 任务 API
// ==========================================

/// 任务API
pub struct TaskApi {
    state: Arc<Mutex<TrackerState>>,
    snapshot_repo: Arc<StateSnapshotRepository>,
    query_engine: TaskQueryEngine,
}

impl TaskApi {
    pub fn new(state: Arc<Mutex<TrackerState>>, snapshot_repo: Arc<StateSnapshotRepository>) -> Self {
        Self {
            state,
            snapshot_repo,
            query_engine: TaskQueryEngine::new(),
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按当前持久化的视图偏好过滤排序,返回任务清单
    ///
    /// 悬挂的装载单引用渲染为占位文本,不报错
    ///
    /// # 返回
    /// - Ok(Vec<TaskListItem>): 任务清单(含解析后的装载单名)
    pub fn query_tasks(&self) -> ApiResult<Vec<TaskListItem>> {
        let state = self.state()?;
        let query = state.tasks_view.clone();
        let filtered = self.query_engine.filter_and_sort(&state.tasks, &query);
        Ok(filtered
            .into_iter()
            .map(|task| TaskListItem {
                related_shipment_name: resolve_shipment_name(&state, task),
                task: task.clone(),
            })
            .collect())
    }

    /// 单个任务详情
    pub fn get_task(&self, task_id: &str) -> ApiResult<Task> {
        let state = self.state()?;
        state
            .find_task(task_id)
            .cloned()
            .ok_or_else(|| task_not_found(task_id))
    }

    /// 当前视图偏好
    pub fn get_tasks_view(&self) -> ApiResult<TaskQuery> {
        Ok(self.state()?.tasks_view.clone())
    }

    /// 保存视图偏好(过滤/排序条件随快照持久化)
    pub fn update_tasks_view(&self, query: TaskQuery) -> ApiResult<()> {
        let mut state = self.state()?;
        state.tasks_view = query;
        self.persist(&state);
        Ok(())
    }

    // ==========================================
    // 任务维护
    // ==========================================

    /// 创建任务
    ///
    /// 创建人取当前登录用户,未登录时记为本地用户
    ///
    /// # 参数
    /// - input: 任务字段
    ///
    /// # 返回
    /// - Ok(String): 新任务ID
    /// - Err(ApiError::InvalidInput): 标题为空
    pub fn create_task(&self, input: TaskInput) -> ApiResult<String> {
        if input.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("任务标题不能为空".to_string()));
        }
        let mut state = self.state()?;
        let now = Utc::now();

        let mut task = Task::new(&input.title, now);
        task.set_status(input.status, now);
        apply_input_fields(&mut task, input);

        match &state.current_user {
            Some(user) => {
                task.created_by_uid = user.uid.clone();
                task.created_by_name = if user.display_name.is_empty() {
                    user.email.clone()
                } else {
                    user.display_name.clone()
                };
            }
            None => {
                task.created_by_uid = LOCAL_CREATOR_UID.to_string();
                task.created_by_name = LOCAL_CREATOR_NAME.to_string();
            }
        }

        let task_id = task.id.clone();
        state.tasks.push(task);
        self.persist(&state);
        info!(task_id = %task_id, "任务已创建");
        Ok(task_id)
    }

    /// 更新任务字段(创建人不变)
    ///
    /// 状态变化经由状态迁移逻辑维护完成时间
    pub fn update_task(&self, task_id: &str, input: TaskInput) -> ApiResult<()> {
        if input.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("任务标题不能为空".to_string()));
        }
        let mut state = self.state()?;
        let task = state
            .find_task_mut(task_id)
            .ok_or_else(|| task_not_found(task_id))?;
        guard_not_archived(task)?;

        let now = Utc::now();
        if input.status != task.status {
            task.set_status(input.status, now);
        } else {
            task.updated_at = now;
        }
        apply_input_fields(task, input);

        self.persist(&state);
        Ok(())
    }

    /// 变更任务状态(归档任务拒绝)
    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> ApiResult<()> {
        let mut state = self.state()?;
        let task = state
            .find_task_mut(task_id)
            .ok_or_else(|| task_not_found(task_id))?;
        guard_not_archived(task)?;
        task.set_status(status, Utc::now());
        self.persist(&state);
        Ok(())
    }

    /// 归档任务
    pub fn archive_task(&self, task_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let task = state
            .find_task_mut(task_id)
            .ok_or_else(|| task_not_found(task_id))?;
        task.is_archived = true;
        task.updated_at = Utc::now();
        self.persist(&state);
        Ok(())
    }

    /// 取消归档
    pub fn unarchive_task(&self, task_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let task = state
            .find_task_mut(task_id)
            .ok_or_else(|| task_not_found(task_id))?;
        task.is_archived = false;
        task.updated_at = Utc::now();
        self.persist(&state);
        Ok(())
    }

    /// 永久删除任务(不可恢复)
    ///
    /// # 参数
    /// - task_id: 任务ID
    ///
    /// # 返回
    /// - Err(ApiError::PermissionDenied): 当前用户不是管理员
    pub fn delete_task_permanently(&self, task_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let is_admin = state
            .current_user
            .as_ref()
            .map(|u| u.role == UserRole::Admin)
            .unwrap_or(false);
        if !is_admin {
            return Err(ApiError::PermissionDenied(
                "仅管理员可永久删除任务".to_string(),
            ));
        }

        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != task_id);
        if state.tasks.len() == before {
            return Err(task_not_found(task_id));
        }
        self.persist(&state);
        info!(task_id, "任务已永久删除");
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn state(&self) -> ApiResult<MutexGuard<'_, TrackerState>> {
        self.state
            .lock()
            .map_err(|e| ApiError::InternalError(format!("状态锁获取失败: {}", e)))
    }

    /// 快照落盘,失败只告警不阻断主流程
    fn persist(&self, state: &TrackerState) {
        if let Err(e) = self.snapshot_repo.save(state) {
            warn!(error = %e, "快照保存失败");
        }
    }
}

fn task_not_found(task_id: &str) -> ApiError {
    ApiError::NotFound(format!("任务(id={})不存在", task_id))
}

fn guard_not_archived(task: &Task) -> ApiResult<()> {
    if task.is_archived {
        return Err(ApiError::BusinessRuleViolation(
            "任务已归档,请先取消归档".to_string(),
        ));
    }
    Ok(())
}

/// 写入标题以外的输入字段,规整文本(去空白/去空标签)
fn apply_input_fields(task: &mut Task, input: TaskInput) {
    task.title = input.title.trim().to_string();
    task.description = input.description.trim().to_string();
    task.priority = input.priority;
    task.due_date = input.due_date;
    task.assigned_to = input.assigned_to.trim().to_string();
    task.tags = input
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    task.related_shipment_id = input
        .related_shipment_id
        .filter(|id| !id.trim().is_empty());
}

/// 装载单名解析: 有引用但找不到时给占位文本
fn resolve_shipment_name(state: &TrackerState, task: &Task) -> Option<String> {
    task.related_shipment_id.as_ref().map(|id| {
        state
            .find_shipment(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| DELETED_SHIPMENT_LABEL.to_string())
    })
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 任务创建/更新输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_shipment_id: Option<String>,
}

/// 任务清单条目(装载单名已解析)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListItem {
    pub task: Task,
    pub related_shipment_name: Option<String>,
}
