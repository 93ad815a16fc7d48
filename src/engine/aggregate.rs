// ==========================================
// 仓储装载跟踪系统 - 装载单汇总引擎
// ==========================================
// 职责: 跨 SKU 的装载单级合计与近期活动排序
// 红线: 无目标时装载单级百分比固定为 0,与 SKU 级"无定义"
//       口径不同,两侧行为均被展示层依赖,不得互相拉齐
// ==========================================

use crate::domain::shipment::Shipment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 装载单级合计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipmentTotals {
    pub total_target: u64,  // 全 SKU 目标件数之和
    pub total_packed: u64,  // 全 SKU 已打包件数之和
    pub total_pallets: u64, // 全 SKU 已用托盘之和
    pub units_left: u64,    // max(0, target - packed)
    pub percent: f64,       // 无目标固定为 0
}

/// 仪表盘近期活动条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentShipmentActivity {
    pub shipment_id: String,
    pub name: String,
    pub progress: u32, // 四舍五入后的百分比
    pub start_time: Option<DateTime<Utc>>,
}

// ==========================================
// ShipmentAggregator - 装载单汇总引擎
// ==========================================
pub struct ShipmentAggregator;

impl ShipmentAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 跨 SKU 合计;归档装载单同样参与汇总(只读展示),仅变更被拒
    pub fn totals(&self, shipment: &Shipment) -> ShipmentTotals {
        let mut total_target: u64 = 0;
        let mut total_packed: u64 = 0;
        let mut total_pallets: u64 = 0;
        for sku in &shipment.skus {
            total_target += sku.target as u64;
            for entry in &sku.entries {
                total_packed += entry.units();
                total_pallets += entry.pallet_count as u64;
            }
        }
        ShipmentTotals {
            total_target,
            total_packed,
            total_pallets,
            units_left: total_target.saturating_sub(total_packed),
            percent: Self::percent_of(total_packed, total_target),
        }
    }

    fn percent_of(packed: u64, target: u64) -> f64 {
        if target > 0 {
            (packed as f64 / target as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// 仪表盘近期活动: 活跃装载单按开始时间倒序取前 5
    ///
    /// 活跃数超过 5 时仅收录已开始的装载单;未开始者排在最后
    pub fn recent_activity(&self, shipments: &[Shipment]) -> Vec<RecentShipmentActivity> {
        let active: Vec<&Shipment> = shipments.iter().filter(|s| !s.is_archived).collect();
        let active_count = active.len();

        let mut items: Vec<RecentShipmentActivity> = active
            .into_iter()
            .filter(|s| active_count <= 5 || s.start_time.is_some())
            .map(|s| {
                let totals = self.totals(s);
                RecentShipmentActivity {
                    shipment_id: s.id.clone(),
                    name: s.name.clone(),
                    progress: totals.percent.round() as u32,
                    start_time: s.start_time,
                }
            })
            .collect();
        items.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        items.truncate(5);
        items
    }
}

impl Default for ShipmentAggregator {
    fn default() -> Self {
        Self::new()
    }
}
