// ==========================================
// 仓储装载跟踪系统 - 应用状态
// ==========================================
// 职责: 装配共享状态/快照仓储/API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    AccountApi, DashboardApi, SettingsApi, ShipmentApi, TaskApi, TemplateApi,
};
use crate::domain::state::TrackerState;
use crate::repository::StateSnapshotRepository;

/// 应用状态
///
/// 包含所有API实例和共享资源,宿主进程作为全局状态持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享应用状态(全部 API 实例共用)
    pub state: Arc<Mutex<TrackerState>>,

    /// 状态快照仓储
    pub snapshot_repo: Arc<StateSnapshotRepository>,

    /// 装载单API
    pub shipment_api: Arc<ShipmentApi>,

    /// 任务API
    pub task_api: Arc<TaskApi>,

    /// 装载模板API
    pub template_api: Arc<TemplateApi>,

    /// 账户API
    pub account_api: Arc<AccountApi>,

    /// 设置API
    pub settings_api: Arc<SettingsApi>,

    /// 仪表盘API
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开快照仓储并建表
    /// 2. 加载最近一次快照(缺失时落默认状态)
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        let snapshot_repo = Arc::new(
            StateSnapshotRepository::new(&db_path)
                .map_err(|e| format!("无法创建StateSnapshotRepository: {}", e))?,
        );

        // 加载即规整: 预置账户合并/开始时间回填在反序列化后完成
        let initial = snapshot_repo
            .load_or_default()
            .map_err(|e| format!("无法加载状态快照: {}", e))?;
        let state = Arc::new(Mutex::new(initial));

        // ==========================================
        // 初始化API层
        // ==========================================

        let shipment_api = Arc::new(ShipmentApi::new(state.clone(), snapshot_repo.clone()));
        let task_api = Arc::new(TaskApi::new(state.clone(), snapshot_repo.clone()));
        let template_api = Arc::new(TemplateApi::new(state.clone(), snapshot_repo.clone()));
        let account_api = Arc::new(AccountApi::new(state.clone(), snapshot_repo.clone()));
        let settings_api = Arc::new(SettingsApi::new(state.clone(), snapshot_repo.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(state.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            state,
            snapshot_repo,
            shipment_api,
            task_api,
            template_api,
            account_api,
            settings_api,
            dashboard_api,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/pack-tracker-dev/pack_tracker.db
/// - 生产环境: 用户数据目录/pack-tracker/pack_tracker.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径(便于调试/测试/CI)
    if let Ok(path) = std::env::var("PACK_TRACKER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 拿不到用户数据目录时回落当前目录
    let mut path = PathBuf::from("./pack_tracker.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录,避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("pack-tracker-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("pack-tracker");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("pack_tracker.db");
    }

    path.to_string_lossy().to_string()
}
