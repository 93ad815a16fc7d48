// ==========================================
// 仓储装载跟踪系统 - 装载模板领域模型
// ==========================================
// 职责: 预定义 SKU 组,用于快速开单
// 红线: 模板只携带定义(代码/目标/容量),从不携带打包记录
// ==========================================

use crate::domain::shipment::{normalize_capacities, PalletBuildInfo, Shipment, Sku};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// TemplateSku - 模板内的 SKU 定义
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSku {
    pub code: String, // 货品代码

    #[serde(default)]
    pub target: u32, // 目标件数

    #[serde(default)]
    pub capacities: Vec<u32>, // 可选单托容量

    #[serde(default)]
    pub pallet_build_info: Option<PalletBuildInfo>, // 搭建说明
}

// ==========================================
// ShipmentTemplate - 装载模板
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentTemplate {
    pub id: String,   // 模板唯一标识
    pub name: String, // 模板名称(非空)

    #[serde(default)]
    pub description: String, // 模板描述

    #[serde(default)]
    pub predefined_skus: Vec<TemplateSku>, // 预定义 SKU 组
}

impl ShipmentTemplate {
    pub fn new(name: &str, description: &str, predefined_skus: Vec<TemplateSku>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            predefined_skus,
        }
    }

    /// 从既有装载单提取模板(丢弃打包记录,仅保留定义)
    pub fn from_shipment(name: &str, description: &str, shipment: &Shipment) -> Self {
        let predefined_skus = shipment
            .skus
            .iter()
            .map(|sku| TemplateSku {
                code: sku.code.clone(),
                target: sku.target,
                capacities: sku.capacities.clone(),
                pallet_build_info: sku.pallet_build_info.clone(),
            })
            .collect();
        Self::new(name, description, predefined_skus)
    }

    /// 按模板开新装载单: 全新 id、空记录、容量表规整
    pub fn instantiate(&self, shipment_name: &str, now: DateTime<Utc>) -> Shipment {
        let mut shipment = Shipment::new(shipment_name, now);
        shipment.skus = self
            .predefined_skus
            .iter()
            .map(|t| {
                let mut sku = Sku::new(&t.code, t.target, normalize_capacities(t.capacities.clone()));
                sku.pallet_build_info = t.pallet_build_info.clone();
                sku
            })
            .collect();
        shipment
    }
}
