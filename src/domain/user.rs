// ==========================================
// 仓储装载跟踪系统 - 用户领域模型
// ==========================================
// 职责: 当前用户 + 受管账户(演示登录体系)
// 红线: ADMIN 角色无视权限表;权限键为固定枚举
// ==========================================

use crate::domain::types::{PermissionKey, UserRole};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 内置管理员账号(演示环境)
pub const ADMIN_USERNAME: &str = "Admin";
pub const ADMIN_PASSWORD: &str = "Admin";

// ==========================================
// User - 当前登录用户
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: String,          // 用户唯一标识
    pub display_name: String, // 显示名
    #[serde(default)]
    pub email: String, // 邮箱
    pub role: UserRole,       // 角色
    #[serde(default)]
    pub permissions: HashMap<PermissionKey, bool>, // 权限表(ADMIN 忽略)
}

impl User {
    /// 内置管理员用户(权限表全真,但 ADMIN 角色本身即恒真)
    pub fn admin() -> Self {
        Self {
            uid: "admin_mock_uid".to_string(),
            display_name: "Administrator".to_string(),
            email: "admin@packtracker.pro".to_string(),
            role: UserRole::Admin,
            permissions: PermissionKey::ALL.iter().map(|k| (*k, true)).collect(),
        }
    }

    /// 由受管账户派生登录用户
    pub fn from_managed(managed: &ManagedUser) -> Self {
        let email = if managed.email.is_empty() {
            format!("{}@packtracker.local", managed.username)
        } else {
            managed.email.clone()
        };
        let display_name = if managed.display_name.is_empty() {
            managed.username.clone()
        } else {
            managed.display_name.clone()
        };
        Self {
            uid: managed.id.clone(),
            display_name,
            email,
            role: UserRole::User,
            permissions: managed.permissions.clone(),
        }
    }
}

// ==========================================
// ManagedUser - 受管账户
// ==========================================
// 管理员维护的演示账户,用户名忽略大小写唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: String,       // 账户标识
    pub username: String, // 登录名(忽略大小写唯一)

    #[serde(default)]
    pub temp_password: String, // 临时口令(演示用,明文)

    #[serde(default)]
    pub display_name: String, // 显示名

    #[serde(default)]
    pub email: String, // 邮箱

    #[serde(default)]
    pub permissions: HashMap<PermissionKey, bool>, // 权限表
}

/// 预置受管账户(低权限/高权限各一)
///
/// 加载历史快照时按用户名去重合并,预置账户始终存在
pub fn seed_managed_users() -> Vec<ManagedUser> {
    vec![
        ManagedUser {
            id: "managed_testlow_001".to_string(),
            username: "testlow".to_string(),
            temp_password: "passwordlow".to_string(),
            display_name: "Low Priv User".to_string(),
            email: "testlow@example.com".to_string(),
            permissions: HashMap::from([
                (PermissionKey::CanCreateTemplates, false),
                (PermissionKey::CanViewAllShipments, true),
                (PermissionKey::CanEditAnyTask, false),
            ]),
        },
        ManagedUser {
            id: "managed_testhigh_002".to_string(),
            username: "testhigh".to_string(),
            temp_password: "passwordhigh".to_string(),
            display_name: "High Priv User".to_string(),
            email: "testhigh@example.com".to_string(),
            permissions: HashMap::from([
                (PermissionKey::CanCreateTemplates, true),
                (PermissionKey::CanViewAllShipments, true),
                (PermissionKey::CanEditAnyTask, true),
            ]),
        },
    ]
}
