// ==========================================
// 仓储装载跟踪系统 - 装载单 API
// ==========================================
// 职责: 装载单/SKU/托盘记录的增删改查,组装视图 DTO
// 红线: 规则判定全部委托引擎层,本层只做输入校验与状态读写
// 架构: API 层 → 引擎层(纯函数) + 快照仓储(落盘)
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::shipment::{PalletBuildInfo, PalletEntry, Shipment};
use crate::domain::state::TrackerState;
use crate::domain::types::ShipmentPhase;
use crate::engine::{
    EngineError, HealthEngine, HealthReport, PackingEngine, ShipmentAggregator, ShipmentTotals,
    SkuView,
};
use crate::repository::StateSnapshotRepository;

// ==========================================
// ShipmentApi - 装载单 API
// ==========================================

/// 装载单API
///
/// 持有共享状态与快照仓储,每次变更成功后落盘
pub struct ShipmentApi {
    state: Arc<Mutex<TrackerState>>,
    snapshot_repo: Arc<StateSnapshotRepository>,
    packing: PackingEngine,
    health: HealthEngine,
    aggregator: ShipmentAggregator,
}

impl ShipmentApi {
    /// 创建新的ShipmentApi实例
    ///
    /// # 参数
    /// - state: 共享应用状态
    /// - snapshot_repo: 状态快照仓储
    pub fn new(state: Arc<Mutex<TrackerState>>, snapshot_repo: Arc<StateSnapshotRepository>) -> Self {
        Self {
            state,
            snapshot_repo,
            packing: PackingEngine::new(),
            health: HealthEngine::new(),
            aggregator: ShipmentAggregator::new(),
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 全部装载单摘要(含归档,由调用方按 is_archived 分屏)
    pub fn list_shipments(&self) -> ApiResult<Vec<ShipmentSummary>> {
        let state = self.state()?;
        Ok(state
            .shipments
            .iter()
            .map(|s| ShipmentSummary {
                shipment_id: s.id.clone(),
                name: s.name.clone(),
                phase: s.phase(),
                is_archived: s.is_archived,
                start_time: s.start_time,
                sku_count: s.skus.len(),
                totals: self.aggregator.totals(s),
            })
            .collect())
    }

    /// 装载单完整视图: 基本信息 + 汇总 + 逐 SKU 视图 + 健康度
    ///
    /// # 参数
    /// - shipment_id: 装载单ID
    ///
    /// # 返回
    /// - Ok(ShipmentView): 完整视图
    /// - Err(ApiError::NotFound): 装载单不存在
    pub fn get_shipment(&self, shipment_id: &str) -> ApiResult<ShipmentView> {
        let state = self.state()?;
        let limit = state.settings.effective_time_limit_hours();
        let shipment = state
            .find_shipment(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        Ok(self.build_view(shipment, limit))
    }

    /// 单个 SKU 的打包视图
    pub fn get_sku_view(&self, shipment_id: &str, sku_id: &str) -> ApiResult<SkuView> {
        let state = self.state()?;
        let shipment = state
            .find_shipment(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        let sku = shipment
            .find_sku(sku_id)
            .ok_or_else(|| ApiError::from(EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            }))?;
        Ok(self.packing.compute_sku_view(sku))
    }

    /// 装载单健康度(按当前设置的装载时限计算)
    pub fn get_health(&self, shipment_id: &str) -> ApiResult<HealthReport> {
        let state = self.state()?;
        let limit = state.settings.effective_time_limit_hours();
        let shipment = state
            .find_shipment(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        Ok(self.health.compute_health(shipment, Utc::now(), limit))
    }

    // ==========================================
    // 装载单维护
    // ==========================================

    /// 新建装载单
    ///
    /// # 参数
    /// - name: 装载单名称(非空)
    ///
    /// # 返回
    /// - Ok(String): 新装载单ID
    /// - Err(ApiError::InvalidInput): 名称为空
    pub fn create_shipment(&self, name: &str) -> ApiResult<String> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("装载单名称不能为空".to_string()));
        }
        let mut state = self.state()?;
        let shipment = Shipment::new(name, Utc::now());
        let shipment_id = shipment.id.clone();
        state.shipments.push(shipment);
        self.persist(&state);
        info!(shipment_id = %shipment_id, "装载单已创建");
        Ok(shipment_id)
    }

    /// 重命名装载单(归档后禁止)
    pub fn rename_shipment(&self, shipment_id: &str, name: &str) -> ApiResult<()> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("装载单名称不能为空".to_string()));
        }
        let mut state = self.state()?;
        let shipment = find_active_mut(&mut state, shipment_id)?;
        shipment.name = name.trim().to_string();
        self.persist(&state);
        Ok(())
    }

    /// 登记叉车司机/装载员(自由文本,允许清空)
    pub fn set_drivers(
        &self,
        shipment_id: &str,
        forklift_driver: &str,
        loader_name: &str,
    ) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = find_active_mut(&mut state, shipment_id)?;
        shipment.forklift_driver = forklift_driver.trim().to_string();
        shipment.loader_name = loader_name.trim().to_string();
        self.persist(&state);
        Ok(())
    }

    /// 设置/清除开始装载时间
    ///
    /// 显式设值会打上人工标记;清除后恢复自动回填资格
    ///
    /// # 参数
    /// - shipment_id: 装载单ID
    /// - start_time: 开始时间,None 表示清除
    pub fn set_start_time(
        &self,
        shipment_id: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = find_active_mut(&mut state, shipment_id)?;
        shipment.start_time = start_time;
        shipment.user_set_start_time = start_time.is_some();
        self.persist(&state);
        Ok(())
    }

    /// 归档装载单(转为只读)
    pub fn archive_shipment(&self, shipment_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        shipment.is_archived = true;
        self.persist(&state);
        info!(shipment_id, "装载单已归档");
        Ok(())
    }

    /// 取消归档,装载单恢复可编辑
    pub fn unarchive_shipment(&self, shipment_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        shipment.is_archived = false;
        self.persist(&state);
        info!(shipment_id, "装载单已取消归档");
        Ok(())
    }

    /// 删除装载单(连带其全部 SKU 与打包记录)
    ///
    /// 关联任务不删除,其装载单引用悬挂后渲染占位文本
    pub fn delete_shipment(&self, shipment_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let before = state.shipments.len();
        state.shipments.retain(|s| s.id != shipment_id);
        if state.shipments.len() == before {
            return Err(shipment_not_found(shipment_id));
        }
        self.persist(&state);
        info!(shipment_id, "装载单已删除");
        Ok(())
    }

    // ==========================================
    // SKU 维护
    // ==========================================

    /// 新增 SKU
    ///
    /// # 参数
    /// - shipment_id: 装载单ID
    /// - code: 货品代码(装载单内唯一,忽略大小写)
    /// - target: 目标件数(0 = 无目标)
    /// - capacities: 可选单托容量
    ///
    /// # 返回
    /// - Ok(String): 新 SKU ID
    pub fn add_sku(
        &self,
        shipment_id: &str,
        code: &str,
        target: u32,
        capacities: Vec<u32>,
    ) -> ApiResult<String> {
        if code.trim().is_empty() {
            return Err(ApiError::InvalidInput("货品代码不能为空".to_string()));
        }
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        let sku_id = self.packing.add_sku(shipment, code, target, capacities)?;
        self.persist(&state);
        Ok(sku_id)
    }

    /// 更新 SKU 代码/目标件数
    pub fn update_sku(
        &self,
        shipment_id: &str,
        sku_id: &str,
        code: &str,
        target: u32,
    ) -> ApiResult<()> {
        if code.trim().is_empty() {
            return Err(ApiError::InvalidInput("货品代码不能为空".to_string()));
        }
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        self.packing.update_sku(shipment, sku_id, code, target)?;
        self.persist(&state);
        Ok(())
    }

    /// 删除 SKU(连带其打包记录)
    pub fn delete_sku(&self, shipment_id: &str, sku_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = find_active_mut(&mut state, shipment_id)?;
        let before = shipment.skus.len();
        shipment.skus.retain(|s| s.id != sku_id);
        if shipment.skus.len() == before {
            return Err(EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            }
            .into());
        }
        self.persist(&state);
        Ok(())
    }

    /// 更新托盘搭建说明(空地址自动剔除)
    pub fn update_build_info(
        &self,
        shipment_id: &str,
        sku_id: &str,
        text: &str,
        image_urls: Vec<String>,
    ) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = find_active_mut(&mut state, shipment_id)?;
        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| ApiError::from(EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            }))?;
        let image_urls: Vec<String> = image_urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        sku.pallet_build_info = Some(PalletBuildInfo {
            text: text.to_string(),
            image_urls,
        });
        self.persist(&state);
        Ok(())
    }

    // ==========================================
    // 容量维护
    // ==========================================

    /// 新增可选单托容量
    pub fn add_capacity(&self, shipment_id: &str, sku_id: &str, value: i64) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        self.packing.add_capacity(shipment, sku_id, value)?;
        self.persist(&state);
        Ok(())
    }

    /// 移除可选单托容量(不存在时无事发生)
    pub fn remove_capacity(&self, shipment_id: &str, sku_id: &str, value: u32) -> ApiResult<()> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        self.packing.remove_capacity(shipment, sku_id, value)?;
        self.persist(&state);
        Ok(())
    }

    // ==========================================
    // 打包操作
    // ==========================================

    /// 追加一条整托打包记录
    ///
    /// # 参数
    /// - shipment_id: 装载单ID
    /// - sku_id: SKU ID
    /// - capacity: 本托容量(件)
    ///
    /// # 返回
    /// - Ok(PalletEntry): 新增记录
    /// - Err(ApiError::ExceedsTarget): 剩余件数不足一托,应改打尾托
    pub fn add_entry(
        &self,
        shipment_id: &str,
        sku_id: &str,
        capacity: i64,
    ) -> ApiResult<PalletEntry> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        let entry = self.packing.add_entry(shipment, sku_id, capacity, Utc::now())?;
        self.persist(&state);
        Ok(entry)
    }

    /// 打尾托: 把剩余件数一次性补齐
    ///
    /// 无目标或已打满时无事发生(Ok(None))
    pub fn pack_final_remainder(
        &self,
        shipment_id: &str,
        sku_id: &str,
    ) -> ApiResult<Option<PalletEntry>> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        let entry = self
            .packing
            .pack_final_remainder(shipment, sku_id, Utc::now())?;
        self.persist(&state);
        Ok(entry)
    }

    /// 撤销最末一条打包记录(空列表时无事发生)
    pub fn undo_last_entry(&self, shipment_id: &str, sku_id: &str) -> ApiResult<Option<PalletEntry>> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        let entry = self.packing.undo_last_entry(shipment, sku_id)?;
        self.persist(&state);
        Ok(entry)
    }

    /// 清空该 SKU 的全部打包记录
    ///
    /// # 返回
    /// - Ok(usize): 被清除的记录条数
    pub fn reset_entries(&self, shipment_id: &str, sku_id: &str) -> ApiResult<usize> {
        let mut state = self.state()?;
        let shipment = state
            .find_shipment_mut(shipment_id)
            .ok_or_else(|| shipment_not_found(shipment_id))?;
        let removed = self.packing.reset_entries(shipment, sku_id)?;
        self.persist(&state);
        info!(shipment_id, sku_id, removed, "打包记录已清空");
        Ok(removed)
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

    fn build_view(&self, shipment: &Shipment, time_limit_hours: f64) -> ShipmentView {
        ShipmentView {
            shipment_id: shipment.id.clone(),
            name: shipment.name.clone(),
            phase: shipment.phase(),
            is_archived: shipment.is_archived,
            start_time: shipment.start_time,
            user_set_start_time: shipment.user_set_start_time,
            forklift_driver: shipment.forklift_driver.clone(),
            loader_name: shipment.loader_name.clone(),
            totals: self.aggregator.totals(shipment),
            skus: shipment
                .skus
                .iter()
                .map(|s| self.packing.compute_sku_view(s))
                .collect(),
            health: self
                .health
                .compute_health(shipment, Utc::now(), time_limit_hours),
        }
    }
}

fn shipment_not_found(shipment_id: &str) -> ApiError {
    ApiError::NotFound(format!("装载单(id={})不存在", shipment_id))
}

/// 查找未归档装载单的可变引用,归档即拒绝
///
/// 打包类操作的归档检查在引擎内,此函数供 API 层直改字段的操作使用
fn find_active_mut<'a>(
    state: &'a mut TrackerState,
    shipment_id: &str,
) -> ApiResult<&'a mut Shipment> {
    let shipment = state
        .find_shipment_mut(shipment_id)
        .ok_or_else(|| shipment_not_found(shipment_id))?;
    if shipment.is_archived {
        return Err(EngineError::ArchivedShipment {
            shipment_id: shipment_id.to_string(),
        }
        .into());
    }
    Ok(shipment)
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 装载单摘要(列表页用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentSummary {
    pub shipment_id: String,
    pub name: String,
    pub phase: ShipmentPhase,
    pub is_archived: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub sku_count: usize,
    pub totals: ShipmentTotals,
}

/// 装载单完整视图(详情页用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentView {
    pub shipment_id: String,
    pub name: String,
    pub phase: ShipmentPhase,
    pub is_archived: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub user_set_start_time: bool,
    pub forklift_driver: String,
    pub loader_name: String,
    pub totals: ShipmentTotals,
    pub skus: Vec<SkuView>,
    pub health: HealthReport,
}
