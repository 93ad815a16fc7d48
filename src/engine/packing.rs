// ==========================================
// 仓储装载跟踪系统 - 打包引擎
// ==========================================
// 职责: 单 SKU 维度的打包计算与条目变更
// 红线1: 归档/未开始门禁在引擎内强制,不依赖调用方自觉
// 红线2: 建议算法为"最大容量优先"贪心,刻意不做最优装箱
// ==========================================

use crate::domain::shipment::{PalletBuildInfo, PalletEntry, Shipment, Sku};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ==========================================
// PackingSuggestion - 托盘组合建议
// ==========================================
/// 贪心建议结果: (容量, 托数) 按容量升序 + 尾数 + 展示文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingSuggestion {
    pub pallets: Vec<(u32, u64)>, // 建议托盘组合,容量升序
    pub remainder: u64,           // 贪心后剩余件数
    pub text: String,             // 展示文本
}

impl PackingSuggestion {
    fn plain(text: String) -> Self {
        Self {
            pallets: Vec::new(),
            remainder: 0,
            text,
        }
    }
}

// ==========================================
// SkuView - SKU 计算视图
// ==========================================
/// 供展示层消费的只读视图,每次变更后整体重算,不缓存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuView {
    pub sku_id: String,
    pub code: String,
    pub target: u32,
    pub capacities: Vec<u32>,                  // 可选单托容量(升序)
    pub packed_units: u64,                     // 已打包件数
    pub pallets_used: u64,                     // 已用托盘数
    pub units_left: Option<u64>,               // 剩余件数(None = 无目标)
    pub progress_percent: Option<f64>,         // 进度百分比(None = 无定义)
    pub suggestion: PackingSuggestion,         // 托盘组合建议
    pub pallets_remaining_estimate: Option<u64>, // 乐观剩余托盘估计
    pub pallet_build_info: Option<PalletBuildInfo>, // 搭建说明
}

// ==========================================
// PackingEngine - 打包引擎
// ==========================================
pub struct PackingEngine;

impl PackingEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 只读计算
    // ==========================================

    /// 已打包件数 = Σ capacity_used * pallet_count
    pub fn packed_units(&self, sku: &Sku) -> u64 {
        sku.entries.iter().map(|e| e.units()).sum()
    }

    /// 已用托盘数 = Σ pallet_count
    pub fn pallets_used(&self, sku: &Sku) -> u64 {
        sku.entries.iter().map(|e| e.pallet_count as u64).sum()
    }

    /// 剩余件数: target>0 时为 max(0, target-packed); 无目标时无定义
    pub fn units_left(&self, sku: &Sku) -> Option<u64> {
        if sku.target > 0 {
            Some((sku.target as u64).saturating_sub(self.packed_units(sku)))
        } else {
            None
        }
    }

    /// 进度百分比:
    /// - target>0: clamp(100*packed/target, 0, 100)
    /// - target=0 且 packed=0: 0
    /// - target=0 且 packed>0: 无定义(None,展示层渲染"无目标"而非 0%/100%)
    ///
    /// 与装载单级汇总百分比刻意不对称,两侧行为各自固定
    pub fn progress_percent(&self, sku: &Sku) -> Option<f64> {
        let packed = self.packed_units(sku);
        if sku.target > 0 {
            let pct = packed as f64 / sku.target as f64 * 100.0;
            Some(pct.clamp(0.0, 100.0))
        } else if packed == 0 {
            Some(0.0)
        } else {
            None
        }
    }

    /// 乐观剩余托盘估计 = ceil(units_left / 最大容量)
    ///
    /// 与贪心建议口径不同: 这里只用最大容量一档
    pub fn pallets_remaining_estimate(&self, sku: &Sku) -> Option<u64> {
        let left = self.units_left(sku)?;
        let max_cap = sku.capacities.iter().copied().max()? as u64;
        if left == 0 {
            return Some(0);
        }
        Some(left.div_ceil(max_cap))
    }

    /// 托盘组合建议(贪心,最大容量优先,floor 取整)
    ///
    /// 文本分支与剩余口径同展示层约定:
    /// - 目标已达成 / 无目标 / 无容量表 各有固定提示
    /// - 组合非空 + 尾数>0 → 建议补一托尾数
    pub fn suggest_breakdown(&self, sku: &Sku) -> PackingSuggestion {
        let packed = self.packed_units(sku);

        if sku.target > 0 {
            let left = (sku.target as u64).saturating_sub(packed);
            if left == 0 {
                return PackingSuggestion::plain("All units packed for this SKU!".to_string());
            }
            return self.suggest_for_units_left(sku, left);
        }

        if !sku.entries.is_empty() {
            PackingSuggestion::plain("Units packed. No target set.".to_string())
        } else {
            PackingSuggestion::plain("No target set for this SKU.".to_string())
        }
    }

    fn suggest_for_units_left(&self, sku: &Sku, units_left: u64) -> PackingSuggestion {
        let capacities: Vec<u32> = sku.capacities.iter().copied().filter(|c| *c > 0).collect();
        if capacities.is_empty() {
            let mut suggestion = PackingSuggestion::plain(format!(
                "Add pallet capacities for suggestions. {} units remaining.",
                units_left
            ));
            suggestion.remainder = units_left;
            return suggestion;
        }

        // 贪心: 容量降序消耗,floor 取整
        let mut sorted_desc = capacities.clone();
        sorted_desc.sort_unstable_by(|a, b| b.cmp(a));

        let mut remaining = units_left;
        let mut pallets: Vec<(u32, u64)> = Vec::new();
        for cap in &sorted_desc {
            let cap64 = *cap as u64;
            if remaining >= cap64 {
                let count = remaining / cap64;
                if count > 0 {
                    pallets.push((*cap, count));
                    remaining -= count * cap64;
                }
            }
        }
        // 输出按容量升序
        pallets.sort_unstable_by_key(|(cap, _)| *cap);

        let text = if !pallets.is_empty() {
            let parts: Vec<String> = pallets
                .iter()
                .map(|(cap, count)| {
                    format!("{} pallet{} of {}", count, if *count > 1 { "s" } else { "" }, cap)
                })
                .collect();
            let mut text = format!("Use: {}", parts.join(", "));
            if remaining > 0 {
                text.push_str(&format!(", then 1 pallet with final {} units.", remaining));
            } else {
                text.push_str(". This completes the SKU.");
            }
            text
        } else {
            // 无任何整托可排: 尾数小于最小容量建议直接打尾托
            let min_cap = sorted_desc.iter().copied().min().unwrap_or(0) as u64;
            if units_left < min_cap {
                format!("Pack 1 pallet with remaining {} units.", units_left)
            } else {
                format!(
                    "No standard full pallet for {} units. Consider \"Pack Final {}\".",
                    units_left, units_left
                )
            }
        };

        PackingSuggestion {
            pallets,
            remainder: remaining,
            text,
        }
    }

    /// SKU 只读视图,供展示层消费
    #[instrument(skip(self, sku), fields(sku_id = %sku.id))]
    pub fn compute_sku_view(&self, sku: &Sku) -> SkuView {
        SkuView {
            sku_id: sku.id.clone(),
            code: sku.code.clone(),
            target: sku.target,
            capacities: sku.capacities.clone(),
            packed_units: self.packed_units(sku),
            pallets_used: self.pallets_used(sku),
            units_left: self.units_left(sku),
            progress_percent: self.progress_percent(sku),
            suggestion: self.suggest_breakdown(sku),
            pallets_remaining_estimate: self.pallets_remaining_estimate(sku),
            pallet_build_info: sku.pallet_build_info.clone(),
        }
    }

    // ==========================================
    // 变更操作(统一门禁: 归档 → 未开始 → 业务规则)
    // ==========================================

    /// 变更门禁: 归档只读 + 打包前必须有开始时间
    fn guard_mutation(&self, shipment: &Shipment) -> EngineResult<()> {
        if shipment.is_archived {
            return Err(EngineError::ArchivedShipment {
                shipment_id: shipment.id.clone(),
            });
        }
        if shipment.start_time.is_none() {
            return Err(EngineError::MissingStartTime {
                shipment_id: shipment.id.clone(),
            });
        }
        Ok(())
    }

    fn positive_capacity(&self, value: i64) -> EngineResult<u32> {
        if value <= 0 {
            return Err(EngineError::InvalidCapacity { value });
        }
        u32::try_from(value).map_err(|_| EngineError::InvalidCapacity { value })
    }

    /// 追加一条打包记录(pallet_count 固定为 1)
    ///
    /// target>0 且 0 < units_left < capacity 时拒绝并返回 ExceedsTarget,
    /// 调用方应转而发起 pack_final_remainder
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id, sku_id, capacity))]
    pub fn add_entry(
        &self,
        shipment: &mut Shipment,
        sku_id: &str,
        capacity: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<PalletEntry> {
        self.guard_mutation(shipment)?;
        let capacity = self.positive_capacity(capacity)?;

        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;

        let packed: u64 = sku.entries.iter().map(|e| e.units()).sum();
        if sku.target > 0 {
            let left = (sku.target as u64).saturating_sub(packed);
            if left > 0 && left < capacity as u64 {
                return Err(EngineError::ExceedsTarget {
                    units_left: left,
                    capacity,
                });
            }
        }

        let entry = PalletEntry::single(capacity, now);
        sku.entries.push(entry.clone());
        debug!(units = entry.units(), "打包记录已追加");
        Ok(entry)
    }

    /// 打尾托: 按当前剩余件数整托补齐
    ///
    /// 剩余为 0 或无目标时为无事发生(Ok(None)),与撤销空列表同口径
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id, sku_id))]
    pub fn pack_final_remainder(
        &self,
        shipment: &mut Shipment,
        sku_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<PalletEntry>> {
        self.guard_mutation(shipment)?;

        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;

        if sku.target == 0 {
            return Ok(None);
        }
        let packed: u64 = sku.entries.iter().map(|e| e.units()).sum();
        let left = (sku.target as u64).saturating_sub(packed);
        if left == 0 {
            return Ok(None);
        }

        // 尾数必然小于等于 target(u32),转换不丢失
        let entry = PalletEntry::single(left as u32, now);
        sku.entries.push(entry.clone());
        debug!(units = entry.units(), "尾托记录已追加");
        Ok(Some(entry))
    }

    /// 撤销最末一条记录;空列表为无事发生(Ok(None)),不是错误
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id, sku_id))]
    pub fn undo_last_entry(
        &self,
        shipment: &mut Shipment,
        sku_id: &str,
    ) -> EngineResult<Option<PalletEntry>> {
        self.guard_mutation(shipment)?;

        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;

        Ok(sku.entries.pop())
    }

    /// 清空全部打包记录(破坏性操作,二次确认由调用方把关)
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id, sku_id))]
    pub fn reset_entries(&self, shipment: &mut Shipment, sku_id: &str) -> EngineResult<usize> {
        self.guard_mutation(shipment)?;

        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;

        let cleared = sku.entries.len();
        sku.entries.clear();
        Ok(cleared)
    }

    // ==========================================
    // SKU 与容量管理(归档门禁,不要求开始时间)
    // ==========================================

    fn guard_archived(&self, shipment: &Shipment) -> EngineResult<()> {
        if shipment.is_archived {
            return Err(EngineError::ArchivedShipment {
                shipment_id: shipment.id.clone(),
            });
        }
        Ok(())
    }

    /// 新增 SKU,代码忽略大小写唯一
    pub fn add_sku(
        &self,
        shipment: &mut Shipment,
        code: &str,
        target: u32,
        capacities: Vec<u32>,
    ) -> EngineResult<String> {
        self.guard_archived(shipment)?;
        if shipment.code_taken(code, None) {
            return Err(EngineError::DuplicateSkuCode {
                code: code.trim().to_string(),
            });
        }
        let sku = Sku::new(code, target, capacities);
        let sku_id = sku.id.clone();
        shipment.skus.push(sku);
        Ok(sku_id)
    }

    /// 更新 SKU 基本定义(代码/目标),代码冲突检查排除自身
    pub fn update_sku(
        &self,
        shipment: &mut Shipment,
        sku_id: &str,
        code: &str,
        target: u32,
    ) -> EngineResult<()> {
        self.guard_archived(shipment)?;
        if shipment.code_taken(code, Some(sku_id)) {
            return Err(EngineError::DuplicateSkuCode {
                code: code.trim().to_string(),
            });
        }
        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;
        sku.code = code.trim().to_string();
        sku.target = target;
        Ok(())
    }

    /// 新增可选容量: 必须为正、不可重复,插入后保持升序
    pub fn add_capacity(
        &self,
        shipment: &mut Shipment,
        sku_id: &str,
        value: i64,
    ) -> EngineResult<()> {
        self.guard_archived(shipment)?;
        let capacity = self.positive_capacity(value)?;

        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;

        if sku.capacities.contains(&capacity) {
            return Err(EngineError::DuplicateCapacity { value: capacity });
        }
        sku.capacities.push(capacity);
        sku.capacities.sort_unstable();
        Ok(())
    }

    /// 移除一个可选容量;不存在时为无事发生
    pub fn remove_capacity(
        &self,
        shipment: &mut Shipment,
        sku_id: &str,
        value: u32,
    ) -> EngineResult<()> {
        self.guard_archived(shipment)?;
        let sku = shipment
            .find_sku_mut(sku_id)
            .ok_or_else(|| EngineError::SkuNotFound {
                sku_id: sku_id.to_string(),
            })?;
        sku.capacities.retain(|c| *c != value);
        Ok(())
    }
}

impl Default for PackingEngine {
    fn default() -> Self {
        Self::new()
    }
}
