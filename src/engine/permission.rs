// ==========================================
// 仓储装载跟踪系统 - 权限评估
// ==========================================
// 职责: 单点判定当前用户是否持有某权限
// 红线: 不缓存判定结果,每次都从用户记录现算
// ==========================================

use crate::domain::types::{PermissionKey, UserRole};
use crate::domain::user::User;

// ==========================================
// PermissionEvaluator - 权限评估器
// ==========================================
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 权限判定:
    /// 1. 未登录 → 拒绝
    /// 2. 管理员 → 无条件放行
    /// 3. 其余按权限表查找,表中缺失按拒绝处理
    pub fn has_permission(&self, user: Option<&User>, key: PermissionKey) -> bool {
        let Some(user) = user else {
            return false;
        };
        if user.role == UserRole::Admin {
            return true;
        }
        user.permissions.get(&key).copied().unwrap_or(false)
    }
}

impl Default for PermissionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
