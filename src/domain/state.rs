// ==========================================
// 仓储装载跟踪系统 - 应用状态值
// ==========================================
// 职责: 单一显式状态值,由调用方持有并传入各引擎
// 红线: 引擎函数纯函数化(实体进、视图出),禁止隐式全局读取
// ==========================================

use crate::domain::shipment::Shipment;
use crate::domain::task::{Task, TaskQuery};
use crate::domain::template::ShipmentTemplate;
use crate::domain::types::QuickCountMode;
use crate::domain::user::{seed_managed_users, ManagedUser, User};
use serde::{Deserialize, Serialize};

/// 装载时限默认值(小时)
pub const DEFAULT_TIME_LIMIT_HOURS: f64 = 3.0;
/// 装载时限允许区间(小时,闭区间)
pub const TIME_LIMIT_MIN_HOURS: f64 = 0.1;
pub const TIME_LIMIT_MAX_HOURS: f64 = 99.0;

// ==========================================
// AppSettings - 应用设置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_time_limit_hours")]
    pub time_limit_hours: f64, // 装载时限(小时),合法区间 0.1..=99
}

fn default_time_limit_hours() -> f64 {
    DEFAULT_TIME_LIMIT_HOURS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            time_limit_hours: DEFAULT_TIME_LIMIT_HOURS,
        }
    }
}

impl AppSettings {
    /// 健康度计算使用的有效时限: 非法存量值回落默认值
    pub fn effective_time_limit_hours(&self) -> f64 {
        if self.time_limit_hours.is_finite() && self.time_limit_hours > 0.0 {
            self.time_limit_hours
        } else {
            DEFAULT_TIME_LIMIT_HOURS
        }
    }
}

// ==========================================
// QuickCount - 快速点数
// ==========================================
// 三个计数器,减至 0 封底(不报错)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickCount {
    #[serde(default = "default_quick_count_mode")]
    pub mode: QuickCountMode, // 点数模式

    #[serde(default)]
    pub loaded: u32, // 装车数

    #[serde(default)]
    pub returns: u32, // 退货数(仅高级模式)

    #[serde(default)]
    pub collars: u32, // 卡板圈数(仅高级模式)
}

fn default_quick_count_mode() -> QuickCountMode {
    QuickCountMode::Basic
}

impl Default for QuickCount {
    fn default() -> Self {
        Self {
            mode: QuickCountMode::Basic,
            loaded: 0,
            returns: 0,
            collars: 0,
        }
    }
}

impl QuickCount {
    /// 调整装车数,减至 0 封底
    pub fn adjust_loaded(&mut self, delta: i32) {
        self.loaded = apply_delta(self.loaded, delta);
    }

    /// 调整退货数,仅高级模式生效
    pub fn adjust_returns(&mut self, delta: i32) {
        if self.mode == QuickCountMode::Advanced {
            self.returns = apply_delta(self.returns, delta);
        }
    }

    /// 调整卡板圈数,仅高级模式生效
    pub fn adjust_collars(&mut self, delta: i32) {
        if self.mode == QuickCountMode::Advanced {
            self.collars = apply_delta(self.collars, delta);
        }
    }

    /// 全部清零
    pub fn reset(&mut self) {
        self.loaded = 0;
        self.returns = 0;
        self.collars = 0;
    }
}

fn apply_delta(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

// ==========================================
// TrackerState - 全量应用状态
// ==========================================
// 整体序列化为单一 JSON 快照持久化;
// 反序列化历史快照时字段级补全默认值,再经 sanitize 合并预置账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(default)]
    pub current_user: Option<User>, // 当前登录用户

    #[serde(default)]
    pub shipments: Vec<Shipment>, // 装载单集合

    #[serde(default)]
    pub tasks: Vec<Task>, // 任务集合

    #[serde(default)]
    pub templates: Vec<ShipmentTemplate>, // 装载模板

    #[serde(default = "seed_managed_users")]
    pub managed_users: Vec<ManagedUser>, // 受管账户(含预置)

    #[serde(default)]
    pub settings: AppSettings, // 应用设置

    #[serde(default)]
    pub tasks_view: TaskQuery, // 任务视图偏好(持久化)

    #[serde(default)]
    pub quick_count: QuickCount, // 快速点数
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            current_user: None,
            shipments: Vec::new(),
            tasks: Vec::new(),
            templates: Vec::new(),
            managed_users: seed_managed_users(),
            settings: AppSettings::default(),
            tasks_view: TaskQuery::default(),
            quick_count: QuickCount::default(),
        }
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加载历史快照后的规整:
    /// 1. 预置账户按用户名(忽略大小写)合并,预置在前、存量追加,
    ///    保证演示账户始终可登录
    /// 2. 缺失开始时间且非人工设置、但已有打包记录的装载单,
    ///    用最早条目时间戳回填开始时间
    pub fn sanitize(&mut self) {
        let mut merged = seed_managed_users();
        for stored in self.managed_users.drain(..) {
            let exists = merged
                .iter()
                .any(|m| m.username.to_lowercase() == stored.username.to_lowercase());
            if !exists {
                merged.push(stored);
            }
        }
        self.managed_users = merged;

        for shipment in &mut self.shipments {
            if shipment.start_time.is_none() && !shipment.user_set_start_time {
                if let Some(earliest) = shipment.earliest_entry_timestamp() {
                    shipment.start_time = Some(earliest);
                }
            }
        }
    }

    pub fn find_shipment(&self, shipment_id: &str) -> Option<&Shipment> {
        self.shipments.iter().find(|s| s.id == shipment_id)
    }

    pub fn find_shipment_mut(&mut self, shipment_id: &str) -> Option<&mut Shipment> {
        self.shipments.iter_mut().find(|s| s.id == shipment_id)
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn find_template(&self, template_id: &str) -> Option<&ShipmentTemplate> {
        self.templates.iter().find(|t| t.id == template_id)
    }
}
