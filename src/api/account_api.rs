// ==========================================
// 仓储装载跟踪系统 - 账户 API
// ==========================================
// 职责: 演示登录体系的登录/登出 + 受管账户维护
// 红线: 受管账户维护需 CAN_MANAGE_USERS 权限;预置账户由状态规整保证始终存在
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::state::TrackerState;
use crate::domain::types::PermissionKey;
use crate::domain::user::{ManagedUser, User, ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::engine::PermissionEvaluator;
use crate::repository::StateSnapshotRepository;

// ==========================================
// AccountApi - 账户 API
// ==========================================

/// 账户API
pub struct AccountApi {
    state: Arc<Mutex<TrackerState>>,
    snapshot_repo: Arc<StateSnapshotRepository>,
    permissions: PermissionEvaluator,
}

impl AccountApi {
    pub fn new(state: Arc<Mutex<TrackerState>>, snapshot_repo: Arc<StateSnapshotRepository>) -> Self {
        Self {
            state,
            snapshot_repo,
            permissions: PermissionEvaluator::new(),
        }
    }

    // ==========================================
    // 登录/登出
    // ==========================================

    /// 登录
    ///
    /// 1. 内置管理员: 用户名与口令均精确匹配
    /// 2. 受管账户: 用户名忽略大小写,口令精确匹配
    ///
    /// # 参数
    /// - username: 用户名
    /// - password: 口令
    ///
    /// # 返回
    /// - Ok(User): 登录后的当前用户
    /// - Err(ApiError::AuthenticationFailed): 用户名或口令错误
    pub fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let mut state = self.state()?;

        let user = if username == ADMIN_USERNAME && password == ADMIN_PASSWORD {
            User::admin()
        } else {
            let needle = username.to_lowercase();
            let managed = state
                .managed_users
                .iter()
                .find(|m| m.username.to_lowercase() == needle && m.temp_password == password);
            match managed {
                Some(m) => User::from_managed(m),
                None => return Err(ApiError::AuthenticationFailed),
            }
        };

        state.current_user = Some(user.clone());
        self.persist(&state);
        info!(uid = %user.uid, "登录成功");
        Ok(user)
    }

    /// 登出
    pub fn logout(&self) -> ApiResult<()> {
        let mut state = self.state()?;
        state.current_user = None;
        self.persist(&state);
        info!("已登出");
        Ok(())
    }

    /// 当前登录用户(未登录为 None)
    pub fn current_user(&self) -> ApiResult<Option<User>> {
        Ok(self.state()?.current_user.clone())
    }

    // ==========================================
    // 受管账户维护(需权限)
    // ==========================================

    /// 受管账户清单
    pub fn list_managed_users(&self) -> ApiResult<Vec<ManagedUser>> {
        let state = self.state()?;
        self.guard_can_manage(&state)?;
        Ok(state.managed_users.clone())
    }

    /// 新增受管账户
    ///
    /// 用户名忽略大小写唯一;权限表写入模板/任务两项开关,
    /// 查看权限默认放开,账户管理权限不授予
    ///
    /// # 参数
    /// - input: 账户字段
    ///
    /// # 返回
    /// - Ok(String): 新账户ID
    /// - Err(ApiError::DuplicateUsername): 用户名已占用
    pub fn add_managed_user(&self, input: ManagedUserInput) -> ApiResult<String> {
        let mut state = self.state()?;
        self.guard_can_manage(&state)?;

        let username = input.username.trim().to_string();
        let temp_password = input.temp_password.trim().to_string();
        if username.is_empty() || temp_password.is_empty() {
            return Err(ApiError::InvalidInput(
                "用户名与临时口令不能为空".to_string(),
            ));
        }

        let needle = username.to_lowercase();
        if state
            .managed_users
            .iter()
            .any(|m| m.username.to_lowercase() == needle)
        {
            return Err(ApiError::DuplicateUsername(username));
        }

        let display_name = input.display_name.trim().to_string();
        let user = ManagedUser {
            id: format!("managed_{}", Uuid::new_v4()),
            display_name: if display_name.is_empty() {
                username.clone()
            } else {
                display_name
            },
            username,
            temp_password,
            email: input.email.trim().to_string(),
            permissions: build_permissions(&input),
        };
        let user_id = user.id.clone();
        state.managed_users.push(user);
        self.persist(&state);
        info!(user_id = %user_id, "受管账户已创建");
        Ok(user_id)
    }

    /// 更新受管账户
    ///
    /// 用户名不可变更;显示名/邮箱/口令留空表示保持原值,权限表整体替换
    pub fn update_managed_user(&self, user_id: &str, input: ManagedUserInput) -> ApiResult<()> {
        let mut state = self.state()?;
        self.guard_can_manage(&state)?;

        let permissions = build_permissions(&input);
        let user = state
            .managed_users
            .iter_mut()
            .find(|m| m.id == user_id)
            .ok_or_else(|| managed_user_not_found(user_id))?;

        let display_name = input.display_name.trim();
        if !display_name.is_empty() {
            user.display_name = display_name.to_string();
        }
        let email = input.email.trim();
        if !email.is_empty() {
            user.email = email.to_string();
        }
        let temp_password = input.temp_password.trim();
        if !temp_password.is_empty() {
            user.temp_password = temp_password.to_string();
        }
        user.permissions = permissions;

        self.persist(&state);
        Ok(())
    }

    /// 删除受管账户
    pub fn delete_managed_user(&self, user_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        self.guard_can_manage(&state)?;

        let before = state.managed_users.len();
        state.managed_users.retain(|m| m.id != user_id);
        if state.managed_users.len() == before {
            return Err(managed_user_not_found(user_id));
        }
        self.persist(&state);
        info!(user_id, "受管账户已删除");
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

    fn guard_can_manage(&self, state: &TrackerState) -> ApiResult<()> {
        if !self
            .permissions
            .has_permission(state.current_user.as_ref(), PermissionKey::CanManageUsers)
        {
            return Err(ApiError::PermissionDenied("无账户管理权限".to_string()));
        }
        Ok(())
    }
}

fn managed_user_not_found(user_id: &str) -> ApiError {
    ApiError::NotFound(format!("受管账户(id={})不存在", user_id))
}

/// 由输入开关构造权限表
///
/// CAN_VIEW_ALL_SHIPMENTS 默认放开;CAN_MANAGE_USERS 不写入,求值时视为 false
fn build_permissions(input: &ManagedUserInput) -> HashMap<PermissionKey, bool> {
    HashMap::from([
        (PermissionKey::CanCreateTemplates, input.can_create_templates),
        (PermissionKey::CanEditAnyTask, input.can_edit_any_task),
        (PermissionKey::CanViewAllShipments, true),
    ])
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 受管账户创建/更新输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedUserInput {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub temp_password: String,
    #[serde(default)]
    pub can_create_templates: bool,
    #[serde(default)]
    pub can_edit_any_task: bool,
}
