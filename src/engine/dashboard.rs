// ==========================================
// 仓储装载跟踪系统 - 仪表盘引擎
// ==========================================
// 职责: 首页概览的统计口径(当日按注入时刻的 UTC 自然日)
// 红线: 当前时间由调用方注入,引擎内部不得读取墙钟
// ==========================================

use crate::domain::shipment::Shipment;
use crate::domain::task::Task;
use crate::domain::types::TaskStatus;
use crate::engine::aggregate::{RecentShipmentActivity, ShipmentAggregator};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 任务到期提醒的前瞻窗口(天)
pub const UPCOMING_TASK_WINDOW_DAYS: i64 = 7;

/// 首页统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_shipments: usize,       // 活跃装载单数
    pub pallets_packed_today: u64,     // 当日打包托盘数(仅活跃装载单)
    pub upcoming_tasks: usize,         // 窗口期内到期的未完成任务数
    pub completed_tasks_today: usize,  // 当日完成任务数
}

/// 任务状态分布的一个分片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusSlice {
    pub status: TaskStatus,
    pub count: usize,
    pub percentage: f64,
}

// ==========================================
// DashboardEngine - 仪表盘引擎
// ==========================================
pub struct DashboardEngine {
    aggregator: ShipmentAggregator,
}

impl DashboardEngine {
    pub fn new() -> Self {
        Self {
            aggregator: ShipmentAggregator::new(),
        }
    }

    /// 首页统计口径:
    /// 1. 活跃装载单 = 未归档
    /// 2. 当日托盘 = 活跃装载单中时间戳落在今日的条目托数之和
    /// 3. 到期提醒 = 未归档且未完成、截止日落在 [今日, 今日+7] 的任务
    /// 4. 当日完成 = 完成时间落在今日的任务(含已归档)
    #[instrument(skip(self, shipments, tasks))]
    pub fn compute_stats(
        &self,
        shipments: &[Shipment],
        tasks: &[Task],
        now: DateTime<Utc>,
    ) -> DashboardStats {
        let today = now.date_naive();

        let mut active_shipments = 0usize;
        let mut pallets_packed_today = 0u64;
        for shipment in shipments.iter().filter(|s| !s.is_archived) {
            active_shipments += 1;
            for sku in &shipment.skus {
                for entry in &sku.entries {
                    if entry.timestamp.date_naive() == today {
                        pallets_packed_today += entry.pallet_count as u64;
                    }
                }
            }
        }

        let window_end = today + Duration::days(UPCOMING_TASK_WINDOW_DAYS);
        let mut upcoming_tasks = 0usize;
        let mut completed_tasks_today = 0usize;
        for task in tasks {
            if !task.is_archived && task.status != TaskStatus::Completed {
                if let Some(due) = task.due_date {
                    if due >= today && due <= window_end {
                        upcoming_tasks += 1;
                    }
                }
            }
            if let Some(completed_at) = task.completed_at {
                if completed_at.date_naive() == today {
                    completed_tasks_today += 1;
                }
            }
        }

        DashboardStats {
            active_shipments,
            pallets_packed_today,
            upcoming_tasks,
            completed_tasks_today,
        }
    }

    /// 近期装载活动,委托汇总引擎
    pub fn recent_activity(&self, shipments: &[Shipment]) -> Vec<RecentShipmentActivity> {
        self.aggregator.recent_activity(shipments)
    }

    /// 任务状态分布(仅未归档任务);无活跃任务时返回空
    ///
    /// 四个状态固定顺序全部输出,计数为零的也占一片
    pub fn task_status_chart(&self, tasks: &[Task]) -> Vec<TaskStatusSlice> {
        let active: Vec<&Task> = tasks.iter().filter(|t| !t.is_archived).collect();
        if active.is_empty() {
            return Vec::new();
        }

        let total = active.len();
        TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let count = active.iter().filter(|t| t.status == status).count();
                TaskStatusSlice {
                    status,
                    count,
                    percentage: count as f64 / total as f64 * 100.0,
                }
            })
            .collect()
    }
}

impl Default for DashboardEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shipment::{PalletEntry, Sku};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 17, 14, 0, 0).unwrap()
    }

    fn shipment_with_entry(archived: bool, entry_ts: DateTime<Utc>, count: u32) -> Shipment {
        let mut shipment = Shipment::new("S", now());
        shipment.is_archived = archived;
        let mut sku = Sku::new("A", 100, vec![30]);
        sku.entries.push(PalletEntry {
            capacity_used: 30,
            pallet_count: count,
            timestamp: entry_ts,
        });
        shipment.skus.push(sku);
        shipment
    }

    #[test]
    fn test_pallets_today_counts_only_active_and_today() {
        let engine = DashboardEngine::new();
        let yesterday = now() - Duration::days(1);
        let shipments = vec![
            shipment_with_entry(false, now(), 3),
            shipment_with_entry(false, yesterday, 5),
            shipment_with_entry(true, now(), 7), // 已归档,不计
        ];

        let stats = engine.compute_stats(&shipments, &[], now());
        assert_eq!(stats.active_shipments, 2);
        assert_eq!(stats.pallets_packed_today, 3, "只统计活跃装载单的今日条目");
    }

    #[test]
    fn test_upcoming_window_inclusive() {
        let engine = DashboardEngine::new();
        let today = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();

        let mut due_today = Task::new("今天", now());
        due_today.due_date = Some(today);
        let mut due_edge = Task::new("边界", now());
        due_edge.due_date = Some(today + Duration::days(7));
        let mut due_far = Task::new("太远", now());
        due_far.due_date = Some(today + Duration::days(8));
        let mut overdue = Task::new("已过期", now());
        overdue.due_date = Some(today - Duration::days(1));
        let mut completed = Task::new("已完成", now());
        completed.due_date = Some(today);
        completed.set_status(TaskStatus::Completed, now());
        let mut archived = Task::new("已归档", now());
        archived.due_date = Some(today);
        archived.is_archived = true;

        let tasks = vec![due_today, due_edge, due_far, overdue, completed, archived];
        let stats = engine.compute_stats(&[], &tasks, now());
        assert_eq!(stats.upcoming_tasks, 2, "窗口含今日与第 7 日,排除完成/归档/过期");
    }

    #[test]
    fn test_completed_today_includes_archived() {
        let engine = DashboardEngine::new();
        let mut done_now = Task::new("刚完成", now());
        done_now.set_status(TaskStatus::Completed, now());
        let mut done_archived = Task::new("完成后归档", now());
        done_archived.set_status(TaskStatus::Completed, now());
        done_archived.is_archived = true;
        let mut done_yesterday = Task::new("昨天完成", now());
        done_yesterday.set_status(TaskStatus::Completed, now() - Duration::days(1));

        let tasks = vec![done_now, done_archived, done_yesterday];
        let stats = engine.compute_stats(&[], &tasks, now());
        assert_eq!(stats.completed_tasks_today, 2, "当日完成计数不排除归档任务");
    }

    #[test]
    fn test_chart_fixed_order_with_zero_slices() {
        let engine = DashboardEngine::new();
        let mut in_progress = Task::new("进行中", now());
        in_progress.status = TaskStatus::InProgress;
        let todo_a = Task::new("待办A", now());
        let todo_b = Task::new("待办B", now());
        let mut hidden = Task::new("已归档", now());
        hidden.is_archived = true;

        let tasks = vec![in_progress, todo_a, todo_b, hidden];
        let chart = engine.task_status_chart(&tasks);

        assert_eq!(chart.len(), 4, "四个状态各占一片");
        assert_eq!(chart[0].status, TaskStatus::Todo);
        assert_eq!(chart[0].count, 2);
        assert!((chart[0].percentage - 2.0 / 3.0 * 100.0).abs() < 1e-9);
        assert_eq!(chart[1].status, TaskStatus::InProgress);
        assert_eq!(chart[1].count, 1);
        assert_eq!(chart[2].count, 0, "零计数状态也输出");
    }

    #[test]
    fn test_chart_empty_when_all_archived() {
        let engine = DashboardEngine::new();
        let mut hidden = Task::new("已归档", now());
        hidden.is_archived = true;
        assert!(engine.task_status_chart(&[hidden]).is_empty());
    }
}
