// ==========================================
// 状态快照持久化集成测试
// ==========================================
// 测试范围:
// 1. 全量状态经关停/重启存活
// 2. 空库首启落默认状态
// 3. 历史快照加载时的规整(种子合并/开始时间回填)
// ==========================================


use chrono::{Duration, Utc};
use pack_tracker::app::AppState;
use pack_tracker::repository::StateSnapshotRepository;
use pack_tracker::{
    logging, PalletEntry, QuickCountMode, Shipment, Sku, TaskStatus, TrackerState, UserRole,
};
use tempfile::NamedTempFile;
use test_helpers::*;

fn temp_db() -> (NamedTempFile, String) {
    let file = NamedTempFile::new().expect("创建临时文件失败");
    let path = file
        .path()
        .to_str()
        .expect("临时文件路径非UTF-8")
        .to_string();
    (file, path)
}

// ==========================================
// 重启存活测试
// ==========================================

#[test]
fn test_restart_保留全量状态() {
    // 初始化日志系统
    logging::init_test();

    let (_file, db_path) = temp_db();

    let shipment_id;
    let sku_id;
    let task_id;
    let packed_before;
    let progress_before;
    {
        let app = AppState::new(db_path.clone()).expect("初始化失败");

        app.account_api
            .login("Admin", "Admin")
            .expect("登录失败");

        shipment_id = app
            .shipment_api
            .create_shipment("重启存活单")
            .expect("创建失败");
        sku_id = app
            .shipment_api
            .add_sku(&shipment_id, "SKU-A", 100, vec![20])
            .expect("添加SKU失败");
        app.shipment_api
            .set_start_time(&shipment_id, Some(Utc::now() - Duration::minutes(20)))
            .expect("设置开始时间失败");
        app.shipment_api
            .add_entry(&shipment_id, &sku_id, 20)
            .expect("打包失败");

        let view = app
            .shipment_api
            .get_sku_view(&shipment_id, &sku_id)
            .expect("查询SKU视图失败");
        packed_before = view.packed_units;
        progress_before = view.progress_percent;

        let mut input = task_input("重启后仍在");
        input.status = TaskStatus::InProgress;
        task_id = app.task_api.create_task(input).expect("创建任务失败");

        app.settings_api
            .update_time_limit(6.5)
            .expect("设置时限失败");
        app.settings_api
            .set_quick_count_mode(QuickCountMode::Advanced)
            .expect("切换模式失败");
        app.settings_api.adjust_loaded(7).expect("调整失败");
    }

    // 重新打开同一数据库
    let app = AppState::new(db_path).expect("重启失败");

    let view = app
        .shipment_api
        .get_shipment(&shipment_id)
        .expect("装载单应存活");
    assert_eq!(view.name, "重启存活单");
    assert_eq!(view.totals.total_packed, 20);
    assert!(view.start_time.is_some());

    // 派生口径经重启不变
    let sku_view = app
        .shipment_api
        .get_sku_view(&shipment_id, &sku_id)
        .expect("查询SKU视图失败");
    assert_eq!(sku_view.packed_units, packed_before);
    assert_eq!(sku_view.progress_percent, progress_before);

    let task = app.task_api.get_task(&task_id).expect("任务应存活");
    assert_eq!(task.status, TaskStatus::InProgress);

    let settings = app.settings_api.get_settings().expect("查询失败");
    assert_eq!(settings.time_limit_hours, 6.5);

    let qc = app.settings_api.get_quick_count().expect("查询失败");
    assert_eq!(qc.mode, QuickCountMode::Advanced);
    assert_eq!(qc.loaded, 7);

    // 登录态随快照存活
    let current = app.account_api.current_user().expect("查询失败");
    let user = current.expect("重启后应保持登录态");
    assert_eq!(user.role, UserRole::Admin);
}

// ==========================================
// 首启默认状态测试
// ==========================================

#[test]
fn test_first_start_默认状态() {
    let (_file, db_path) = temp_db();
    let app = AppState::new(db_path).expect("初始化失败");

    assert!(app
        .shipment_api
        .list_shipments()
        .expect("查询失败")
        .is_empty());

    let settings = app.settings_api.get_settings().expect("查询失败");
    assert_eq!(settings.time_limit_hours, 3.0, "默认时限3小时");

    // 预置账户可直接登录
    app.account_api
        .login("testlow", "passwordlow")
        .expect("预置账户应可登录");
}

// ==========================================
// 历史快照规整测试
// ==========================================

#[test]
fn test_legacy_snapshot_开始时间回填() {
    let (_file, db_path) = temp_db();

    // 手工构造缺开始时间但已有打包记录的历史快照
    let earliest = Utc::now() - Duration::hours(2);
    let mut state = TrackerState::new();
    let mut shipment = Shipment::new("历史单", earliest);
    let mut sku = Sku::new("SKU-A", 100, vec![20]);
    sku.entries.push(PalletEntry::single(20, earliest));
    sku.entries
        .push(PalletEntry::single(20, earliest + Duration::minutes(30)));
    shipment.skus.push(sku);
    let shipment_id = shipment.id.clone();
    state.shipments.push(shipment);

    {
        let repo = StateSnapshotRepository::new(&db_path).expect("打开仓储失败");
        repo.save(&state).expect("保存快照失败");
    }

    let app = AppState::new(db_path).expect("初始化失败");
    let view = app
        .shipment_api
        .get_shipment(&shipment_id)
        .expect("查询失败");
    assert_eq!(
        view.start_time,
        Some(earliest),
        "应回填最早条目时间为开始时间"
    );
    assert!(!view.user_set_start_time, "回填不应打人工标记");
}

#[test]
fn test_legacy_snapshot_种子账户合并() {
    let (_file, db_path) = temp_db();

    {
        let app = AppState::new(db_path.clone()).expect("初始化失败");
        app.account_api.login("Admin", "Admin").expect("登录失败");
        app.account_api
            .add_managed_user(pack_tracker::api::ManagedUserInput {
                username: "survivor".to_string(),
                display_name: String::new(),
                email: String::new(),
                temp_password: "pw".to_string(),
                can_create_templates: false,
                can_edit_any_task: false,
            })
            .expect("新增失败");
    }

    // 重启后种子在前,自建账户追加在后
    let app = AppState::new(db_path).expect("重启失败");
    app.account_api.login("Admin", "Admin").expect("登录失败");
    let users = app.account_api.list_managed_users().expect("查询失败");
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["testlow", "testhigh", "survivor"]);
}
