// ==========================================
// 仓储装载跟踪系统 - 仪表盘 API
// ==========================================
// 职责: 封装仪表盘聚合查询,统计口径全部委托仪表盘引擎
// 架构: API 层 → 仪表盘引擎(纯函数)
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::state::TrackerState;
use crate::engine::{DashboardEngine, DashboardStats, RecentShipmentActivity, TaskStatusSlice};

// ==========================================
// DashboardApi - 仪表盘 API
// ==========================================

/// 仪表盘API
///
/// 只读聚合查询,不触发快照落盘
pub struct DashboardApi {
    state: Arc<Mutex<TrackerState>>,
    engine: DashboardEngine,
}

impl DashboardApi {
    pub fn new(state: Arc<Mutex<TrackerState>>) -> Self {
        Self {
            state,
            engine: DashboardEngine::new(),
        }
    }

    /// 顶部统计卡: 在役装载单/今日托盘/将到期任务/今日完成任务
    ///
    /// # 返回
    /// - Ok(DashboardStats): 统计数字
    pub fn get_stats(&self) -> ApiResult<DashboardStats> {
        let state = self.state()?;
        Ok(self
            .engine
            .compute_stats(&state.shipments, &state.tasks, Utc::now()))
    }

    /// 近期装载动态(至多 5 条,已开始的排前)
    pub fn get_recent_activity(&self) -> ApiResult<Vec<RecentShipmentActivity>> {
        let state = self.state()?;
        Ok(self.engine.recent_activity(&state.shipments))
    }

    /// 任务状态分布(无在役任务时为空)
    pub fn get_task_status_chart(&self) -> ApiResult<Vec<TaskStatusSlice>> {
        let state = self.state()?;
        Ok(self.engine.task_status_chart(&state.tasks))
    }

    fn state(&self) -> ApiResult<MutexGuard<'_, TrackerState>> {
        self.state
            .lock()
            .map_err(|e| ApiError::InternalError(format!("状态锁获取失败: {}", e)))
    }
}
