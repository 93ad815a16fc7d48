// ==========================================
// 仓储装载跟踪系统 - 设置与快速点数 API
// ==========================================
// 职责: 装载时限设置 + 快速点数计数器
// 红线: 时限合法区间 0.1~99 小时(含边界),越界整体拒绝不钳制
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::state::{
    AppSettings, QuickCount, TrackerState, TIME_LIMIT_MAX_HOURS, TIME_LIMIT_MIN_HOURS,
};
use crate::domain::types::QuickCountMode;
use crate::repository::StateSnapshotRepository;

// ==========================================
// SettingsApi - 设置 API
// ==========================================

/// 设置API
pub struct SettingsApi {
    state: Arc<Mutex<TrackerState>>,
    snapshot_repo: Arc<StateSnapshotRepository>,
}

impl SettingsApi {
    pub fn new(state: Arc<Mutex<TrackerState>>, snapshot_repo: Arc<StateSnapshotRepository>) -> Self {
        Self {
            state,
            snapshot_repo,
        }
    }

    // ==========================================
    // 应用设置
    // ==========================================

    /// 当前应用设置
    pub fn get_settings(&self) -> ApiResult<AppSettings> {
        Ok(self.state()?.settings.clone())
    }

    /// 更新装载时限
    ///
    /// # 参数
    /// - hours: 时限(小时),合法区间 0.1~99 含边界
    ///
    /// # 返回
    /// - Err(ApiError::InvalidTimeLimit): 越界或非有限数
    pub fn update_time_limit(&self, hours: f64) -> ApiResult<()> {
        if !hours.is_finite() || !(TIME_LIMIT_MIN_HOURS..=TIME_LIMIT_MAX_HOURS).contains(&hours) {
            return Err(ApiError::InvalidTimeLimit(hours));
        }
        let mut state = self.state()?;
        state.settings.time_limit_hours = hours;
        self.persist(&state);
        info!(hours, "装载时限已更新");
        Ok(())
    }

    // ==========================================
    // 快速点数
    // ==========================================

    /// 当前快速点数
    pub fn get_quick_count(&self) -> ApiResult<QuickCount> {
        Ok(self.state()?.quick_count.clone())
    }

    /// 切换点数模式(计数值保留)
    pub fn set_quick_count_mode(&self, mode: QuickCountMode) -> ApiResult<QuickCount> {
        let mut state = self.state()?;
        state.quick_count.mode = mode;
        self.persist(&state);
        Ok(state.quick_count.clone())
    }

    /// 调整装车数(减至 0 封底)
    pub fn adjust_loaded(&self, delta: i32) -> ApiResult<QuickCount> {
        let mut state = self.state()?;
        state.quick_count.adjust_loaded(delta);
        self.persist(&state);
        Ok(state.quick_count.clone())
    }

    /// 调整退货数(仅高级模式生效)
    pub fn adjust_returns(&self, delta: i32) -> ApiResult<QuickCount> {
        let mut state = self.state()?;
        state.quick_count.adjust_returns(delta);
        self.persist(&state);
        Ok(state.quick_count.clone())
    }

    /// 调整卡板圈数(仅高级模式生效)
    pub fn adjust_collars(&self, delta: i32) -> ApiResult<QuickCount> {
        let mut state = self.state()?;
        state.quick_count.adjust_collars(delta);
        self.persist(&state);
        Ok(state.quick_count.clone())
    }

    /// 全部计数清零(模式保留)
    pub fn reset_quick_count(&self) -> ApiResult<QuickCount> {
        let mut state = self.state()?;
        state.quick_count.reset();
        self.persist(&state);
        Ok(state.quick_count.clone())
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
