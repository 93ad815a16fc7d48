// ==========================================
// 仓储装载跟踪系统 - 应用层
// ==========================================
// 职责: 装配应用状态,供宿主进程持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
