// ==========================================
// 仓储装载跟踪系统 - 装载单领域模型
// ==========================================
// 职责: 装载单/SKU/托盘记录实体,构造期补全默认值
// 红线: 归档后实体只读,条目只允许追加与撤销末条
// ==========================================

use crate::domain::types::ShipmentPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 历史快照中缺失时间字段时的兜底值
fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

// ==========================================
// PalletBuildInfo - 托盘搭建说明
// ==========================================
// 用途: 操作工参考信息,引擎不解释其内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PalletBuildInfo {
    #[serde(default)]
    pub text: String, // 搭建说明文字
    #[serde(default)]
    pub image_urls: Vec<String>, // 参考图片地址
}

// ==========================================
// PalletEntry - 托盘打包记录
// ==========================================
// 每条记录贡献 capacity_used * pallet_count 件
// 创建后不可修改,仅允许撤销最末一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalletEntry {
    pub capacity_used: u32,         // 单托容量(件/托)
    pub pallet_count: u32,          // 托盘数(通常为1,模型支持批量)
    pub timestamp: DateTime<Utc>,   // 记录时间
}

impl PalletEntry {
    /// 创建单托记录(常规路径,pallet_count 固定为 1)
    pub fn single(capacity_used: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            capacity_used,
            pallet_count: 1,
            timestamp,
        }
    }

    /// 该记录贡献的总件数
    pub fn units(&self) -> u64 {
        self.capacity_used as u64 * self.pallet_count as u64
    }
}

// ==========================================
// Sku - 装载单内的货品条目
// ==========================================
// 代码在装载单内唯一(忽略大小写)
// capacities 保持升序且去重; target=0 表示"无目标"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub id: String,   // SKU 唯一标识
    pub code: String, // 货品代码(装载单内唯一,忽略大小写)

    #[serde(default)]
    pub target: u32, // 目标件数(0 = 无目标)

    #[serde(default)]
    pub capacities: Vec<u32>, // 可选单托容量,升序去重

    #[serde(default)]
    pub entries: Vec<PalletEntry>, // 打包记录,仅追加/撤销末条

    #[serde(default)]
    pub pallet_build_info: Option<PalletBuildInfo>, // 搭建说明(引擎不解释)
}

impl Sku {
    /// 创建 SKU,构造期规整容量表(去零、升序、去重)
    pub fn new(code: &str, target: u32, capacities: Vec<u32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code: code.trim().to_string(),
            target,
            capacities: normalize_capacities(capacities),
            entries: Vec::new(),
            pallet_build_info: None,
        }
    }
}

/// 容量表规整: 去除非正值、升序、去重
pub fn normalize_capacities(mut capacities: Vec<u32>) -> Vec<u32> {
    capacities.retain(|c| *c > 0);
    capacities.sort_unstable();
    capacities.dedup();
    capacities
}

// ==========================================
// Shipment - 装载单
// ==========================================
// 独占拥有其 SKU 与打包记录(删除装载单连带删除全部下级)
// 状态机: NOT_STARTED → IN_PROGRESS → ARCHIVED(只读)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,   // 装载单唯一标识
    pub name: String, // 装载单名称

    #[serde(default)]
    pub skus: Vec<Sku>, // 货品列表(有序)

    #[serde(default)]
    pub is_archived: bool, // 归档标记(归档后只读)

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>, // 开始装载时间(打包前必须存在)

    #[serde(default)]
    pub user_set_start_time: bool, // 开始时间是否为人工显式设置

    #[serde(default)]
    pub forklift_driver: String, // 叉车司机

    #[serde(default)]
    pub loader_name: String, // 装载员

    // ===== 审计字段 =====
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>, // 记录创建时间
}

impl Shipment {
    /// 创建装载单,全部字段构造期补全
    pub fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            skus: Vec::new(),
            is_archived: false,
            start_time: None,
            user_set_start_time: false,
            forklift_driver: String::new(),
            loader_name: String::new(),
            created_at: now,
        }
    }

    /// 当前所处装载阶段
    pub fn phase(&self) -> ShipmentPhase {
        if self.is_archived {
            ShipmentPhase::Archived
        } else if self.start_time.is_some() {
            ShipmentPhase::InProgress
        } else {
            ShipmentPhase::NotStarted
        }
    }

    pub fn find_sku(&self, sku_id: &str) -> Option<&Sku> {
        self.skus.iter().find(|s| s.id == sku_id)
    }

    pub fn find_sku_mut(&mut self, sku_id: &str) -> Option<&mut Sku> {
        self.skus.iter_mut().find(|s| s.id == sku_id)
    }

    /// 代码是否已被占用(忽略大小写,可排除某个 SKU 自身)
    pub fn code_taken(&self, code: &str, exclude_sku_id: Option<&str>) -> bool {
        let needle = code.trim().to_lowercase();
        self.skus.iter().any(|s| {
            exclude_sku_id.map_or(true, |ex| s.id != ex) && s.code.to_lowercase() == needle
        })
    }

    /// 全部打包记录中最早的时间戳
    ///
    /// 用于首条记录落盘后反推开始时间(操作工未显式设置时)
    pub fn earliest_entry_timestamp(&self) -> Option<DateTime<Utc>> {
        self.skus
            .iter()
            .flat_map(|s| s.entries.iter())
            .map(|e| e.timestamp)
            .min()
    }
}
