// ==========================================
// 仓储装载跟踪系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 装载进度与任务跟踪计算核心
// ==========================================

use pack_tracker::app::{get_default_db_path, AppState};

fn main() {
    // 初始化日志系统
    pack_tracker::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", pack_tracker::APP_NAME);
    tracing::info!("系统版本: {}", pack_tracker::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::new(db_path)
        .expect("无法初始化AppState");

    tracing::info!("AppState初始化成功");

    // 启动概览: 打印仪表盘统计与近期装载动态
    match app_state.dashboard_api.get_stats() {
        Ok(stats) => {
            tracing::info!(
                active_shipments = stats.active_shipments,
                pallets_packed_today = stats.pallets_packed_today,
                upcoming_tasks = stats.upcoming_tasks,
                completed_tasks_today = stats.completed_tasks_today,
                "仪表盘统计"
            );
        }
        Err(e) => tracing::warn!(error = %e, "读取仪表盘统计失败"),
    }

    match app_state.dashboard_api.get_recent_activity() {
        Ok(items) => {
            for item in &items {
                tracing::info!(
                    shipment_id = %item.shipment_id,
                    name = %item.name,
                    progress = item.progress,
                    "近期装载动态"
                );
            }
            if items.is_empty() {
                tracing::info!("暂无近期装载动态");
            }
        }
        Err(e) => tracing::warn!(error = %e, "读取近期装载动态失败"),
    }
}
