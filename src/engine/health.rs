// ==========================================
// 仓储装载跟踪系统 - 装载健康度引擎
// ==========================================
// 职责: 依据开始时间/打包节奏/时限,推算完成时间与红黄绿状态
// 红线1: 当前时间由调用方注入,引擎内部不得读取墙钟
// 红线2: 有完成预估且有目标时,比较口径为"预计总时长",
//        否则退回已耗时,两种口径不得混用
// ==========================================

use crate::domain::shipment::Shipment;
use crate::domain::types::HealthStatus;
use crate::engine::aggregate::ShipmentAggregator;
use crate::timefmt::format_duration_ms;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 黄色预警阈值: 比较时长超过时限的 85% 即预警
pub const YELLOW_THRESHOLD_RATIO: f64 = 0.85;

/// 健康度报告
///
/// 未开始或已归档的装载单返回中性报告(全字段无值,灰色,0 填充)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub fill_percent: f64,                 // 健康条填充比例 [0,100]
    pub elapsed_ms: Option<i64>,           // 已耗时
    pub time_remaining_ms: Option<i64>,    // 时限内剩余时间,下限 0
    pub avg_ms_per_pallet: Option<f64>,    // 平均每托耗时
    pub est_finish: Option<DateTime<Utc>>, // 预计完成时刻
    pub completed: bool,                   // 目标已全部打包
    pub warning: Option<String>,           // 红/黄状态附带的提示文本
}

impl HealthReport {
    fn neutral() -> Self {
        Self {
            status: HealthStatus::Gray,
            fill_percent: 0.0,
            elapsed_ms: None,
            time_remaining_ms: None,
            avg_ms_per_pallet: None,
            est_finish: None,
            completed: false,
            warning: None,
        }
    }
}

// ==========================================
// HealthEngine - 健康度引擎
// ==========================================
pub struct HealthEngine {
    aggregator: ShipmentAggregator,
}

impl HealthEngine {
    pub fn new() -> Self {
        Self {
            aggregator: ShipmentAggregator::new(),
        }
    }

    /// 健康度计算
    ///
    /// 计算规则:
    /// 1. 未开始或已归档 → 中性报告
    /// 2. 零托盘 → 仅按已耗时与时限的比值展示;已超时直接红色
    /// 3. 有目标且有剩余且已有打包量 → 按平均节奏外推完成时刻
    /// 4. 有目标且无剩余 → 完成态,预计完成时刻即当前时刻
    /// 5. 红色: 比较时长 > 时限;黄色: > 时限的 85%;其余绿色
    ///
    /// # 参数
    /// - `now`: 注入的当前时刻
    /// - `time_limit_hours`: 时限(小时),调用方负责传入有效值
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id))]
    pub fn compute_health(
        &self,
        shipment: &Shipment,
        now: DateTime<Utc>,
        time_limit_hours: f64,
    ) -> HealthReport {
        let start = match shipment.start_time {
            Some(start) if !shipment.is_archived => start,
            _ => return HealthReport::neutral(),
        };

        let totals = self.aggregator.totals(shipment);
        let elapsed_ms = (now - start).num_milliseconds();
        let limit_ms = time_limit_hours * 3_600_000.0;
        let time_remaining_ms = (limit_ms - elapsed_ms as f64).max(0.0) as i64;

        if totals.total_pallets == 0 {
            let fill = (elapsed_ms as f64 / limit_ms * 100.0).clamp(0.0, 100.0);
            let (status, warning) = if elapsed_ms as f64 > limit_ms {
                (
                    HealthStatus::Red,
                    Some(format!(
                        "Over limit by {} with 0 pallets.",
                        format_duration_ms(elapsed_ms as f64 - limit_ms, true)
                    )),
                )
            } else {
                (HealthStatus::Gray, None)
            };
            return HealthReport {
                status,
                fill_percent: fill,
                elapsed_ms: Some(elapsed_ms),
                time_remaining_ms: Some(time_remaining_ms),
                avg_ms_per_pallet: None,
                est_finish: None,
                completed: false,
                warning,
            };
        }

        let avg_ms_per_pallet = elapsed_ms as f64 / totals.total_pallets as f64;
        let units_remaining = totals.total_target as i64 - totals.total_packed as i64;

        let mut completed = false;
        let est_finish: Option<DateTime<Utc>> =
            if totals.total_target > 0 && units_remaining > 0 && totals.total_packed > 0 {
                let avg_units_per_pallet = totals.total_packed as f64 / totals.total_pallets as f64;
                let pallets_remaining = units_remaining as f64 / avg_units_per_pallet;
                let est_remaining_ms = pallets_remaining * avg_ms_per_pallet;
                Some(now + Duration::milliseconds(est_remaining_ms as i64))
            } else if totals.total_target > 0 && units_remaining <= 0 {
                completed = true;
                Some(now)
            } else {
                None
            };

        let effective_ms = match est_finish {
            Some(finish) if totals.total_target > 0 => (finish - start).num_milliseconds() as f64,
            _ => elapsed_ms as f64,
        };

        let (status, warning) = if effective_ms > limit_ms {
            let overdue = format_duration_ms(effective_ms - limit_ms, true);
            let text = if est_finish.is_some() && totals.total_target > 0 {
                format!(
                    "Projected to exceed {}hr limit by {}!",
                    time_limit_hours, overdue
                )
            } else {
                format!("Exceeded {}hr limit by {}!", time_limit_hours, overdue)
            };
            (HealthStatus::Red, Some(text))
        } else if effective_ms > limit_ms * YELLOW_THRESHOLD_RATIO {
            (
                HealthStatus::Yellow,
                Some(format!("At risk: Approaching {}hr limit.", time_limit_hours)),
            )
        } else {
            (HealthStatus::Green, None)
        };

        HealthReport {
            status,
            fill_percent: (effective_ms / limit_ms * 100.0).clamp(0.0, 100.0),
            elapsed_ms: Some(elapsed_ms),
            time_remaining_ms: Some(time_remaining_ms),
            avg_ms_per_pallet: Some(avg_ms_per_pallet),
            est_finish,
            completed,
            warning,
        }
    }
}

impl Default for HealthEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipment::{PalletEntry, Shipment, Sku};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 17, 12, 0, 0).unwrap()
    }

    fn hours_ago(h: i64) -> DateTime<Utc> {
        now() - Duration::hours(h)
    }

    fn started_shipment(start: DateTime<Utc>) -> Shipment {
        let mut shipment = Shipment::new("测试装载单", start);
        shipment.start_time = Some(start);
        shipment.user_set_start_time = true;
        shipment
    }

    fn sku_with_entries(target: u32, entries: Vec<(u32, u32)>) -> Sku {
        let mut sku = Sku::new("SKU", target, vec![]);
        for (cap, count) in entries {
            sku.entries.push(PalletEntry {
                capacity_used: cap,
                pallet_count: count,
                timestamp: now(),
            });
        }
        sku
    }

    #[test]
    fn test_neutral_without_start_time() {
        let engine = HealthEngine::new();
        let shipment = Shipment::new("未开始", now());

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Gray);
        assert_eq!(report.fill_percent, 0.0);
        assert!(report.elapsed_ms.is_none());
        assert!(report.est_finish.is_none());
        assert!(report.warning.is_none());
    }

    #[test]
    fn test_neutral_when_archived() {
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(5));
        shipment.is_archived = true;

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Gray);
        assert!(report.elapsed_ms.is_none());
    }

    #[test]
    fn test_zero_pallets_within_limit_is_gray() {
        // 时限 3h,已耗时 2h,零托盘: 灰色,无预警,填充 2/3
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(2));
        shipment.skus.push(sku_with_entries(100, vec![]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Gray);
        assert!(report.warning.is_none());
        assert!((report.fill_percent - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.elapsed_ms, Some(2 * 3_600_000));
        assert_eq!(report.time_remaining_ms, Some(3_600_000));
        assert!(report.avg_ms_per_pallet.is_none());
        assert!(report.est_finish.is_none());
    }

    #[test]
    fn test_zero_pallets_over_limit_is_red() {
        // 已耗时 4h 超过 3h 时限且零托盘: 直接红色
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(4));
        shipment.skus.push(sku_with_entries(100, vec![]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Red);
        assert_eq!(
            report.warning.as_deref(),
            Some("Over limit by 1h with 0 pallets.")
        );
        assert_eq!(report.fill_percent, 100.0);
        assert_eq!(report.time_remaining_ms, Some(0));
    }

    #[test]
    fn test_on_pace_is_green_with_projection() {
        // 1h 打了 2 托共 50 件,目标 100: 预计还需 1h,总时长 2h < 3h 时限
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(1));
        shipment.skus.push(sku_with_entries(100, vec![(25, 2)]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Green);
        assert!(report.warning.is_none());
        assert_eq!(report.avg_ms_per_pallet, Some(1_800_000.0));
        assert_eq!(report.est_finish, Some(now() + Duration::hours(1)));
        assert!(!report.completed);
        assert!((report.fill_percent - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_slow_pace_projects_red() {
        // 2h 仅 1 托 10 件,目标 100: 还需 9 托 x 2h = 18h,预计总时长 20h
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(2));
        shipment.skus.push(sku_with_entries(100, vec![(10, 1)]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Red);
        assert_eq!(
            report.warning.as_deref(),
            Some("Projected to exceed 3hr limit by 17h!")
        );
        assert_eq!(report.est_finish, Some(now() + Duration::hours(18)));
        assert_eq!(report.fill_percent, 100.0);
    }

    #[test]
    fn test_no_target_compares_elapsed_only() {
        // 无目标有打包量: 无预估,比较口径退回已耗时
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(4));
        shipment.skus.push(sku_with_entries(0, vec![(25, 2)]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Red);
        assert_eq!(report.warning.as_deref(), Some("Exceeded 3hr limit by 1h!"));
        assert!(report.est_finish.is_none());
    }

    #[test]
    fn test_approaching_limit_is_yellow() {
        // 已耗时 2.6h > 3h x 0.85 = 2.55h: 黄色预警
        let engine = HealthEngine::new();
        let start = now() - Duration::minutes(156);
        let mut shipment = started_shipment(start);
        shipment.skus.push(sku_with_entries(0, vec![(25, 1)]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert_eq!(report.status, HealthStatus::Yellow);
        assert_eq!(
            report.warning.as_deref(),
            Some("At risk: Approaching 3hr limit.")
        );
    }

    #[test]
    fn test_completed_target() {
        // 目标全部打完: 完成态,预计完成时刻即当前时刻
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(1));
        shipment.skus.push(sku_with_entries(50, vec![(25, 2)]));

        let report = engine.compute_health(&shipment, now(), 3.0);
        assert!(report.completed);
        assert_eq!(report.est_finish, Some(now()));
        assert_eq!(report.status, HealthStatus::Green);
    }

    #[test]
    fn test_fractional_hour_limit_renders_verbatim() {
        // 时限 1.5h,提示文本原样渲染 "1.5hr"
        let engine = HealthEngine::new();
        let mut shipment = started_shipment(hours_ago(2));
        shipment.skus.push(sku_with_entries(0, vec![(25, 1)]));

        let report = engine.compute_health(&shipment, now(), 1.5);
        assert_eq!(
            report.warning.as_deref(),
            Some("Exceeded 1.5hr limit by 30m!")
        );
    }
}
