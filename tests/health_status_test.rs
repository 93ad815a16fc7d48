// ==========================================
// 装载健康度集成测试
// ==========================================
// 测试范围:
// 1. 中性态: 未开始/已归档
// 2. 颜色阈值: 绿色/黄色/红色(已超时与预计超时)
// 3. 时限设置联动: 修改时限立即影响健康度判定
// ==========================================


use chrono::{Duration, Utc};
use pack_tracker::HealthStatus;
use test_helpers::*;

// ==========================================
// 中性态测试
// ==========================================

#[test]
fn test_health_未开始_中性() {
    let env = TrackerTestEnv::new().expect("无法创建测试环境");
    let (id, _) = env.create_shipment_with_sku("未开始", "SKU-A", 100, vec![20]);

    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    assert_eq!(health.status, HealthStatus::Gray);
    assert!(health.elapsed_ms.is_none());
    assert!(health.warning.is_none());
}

// ==========================================
// 颜色阈值测试
// ==========================================

#[test]
fn test_health_零托盘_超时红色() {
    let env = TrackerTestEnv::new().expect("无法创建测试环境");
    let (id, _) = env.create_shipment_with_sku("零托盘", "SKU-A", 100, vec![20]);

    // 默认时限3小时,开始4小时前,一托未打
    env.app
        .shipment_api
        .set_start_time(&id, Some(Utc::now() - Duration::hours(4)))
        .expect("设置开始时间失败");

    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    assert_eq!(health.status, HealthStatus::Red);
    let warning = health.warning.expect("超时应有告警文本");
    assert!(
        warning.contains("0 pallets"),
        "零托盘超时文本不符: {}",
        warning
    );
}

#[test]
fn test_health_时限内_绿色() {
    let env = TrackerTestEnv::new().expect("无法创建测试环境");
    let (id, sku_id) = env.create_shipment_with_sku("正常", "SKU-A", 100, vec![20]);

    env.app
        .shipment_api
        .set_start_time(&id, Some(Utc::now() - Duration::minutes(10)))
        .expect("设置开始时间失败");
    env.app
        .shipment_api
        .add_entry(&id, &sku_id, 20)
        .expect("打包失败");

    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    // 10分钟打1托20件,剩余80件按此节奏约40分钟,远低于3小时时限
    assert_eq!(health.status, HealthStatus::Green);
    assert!(health.warning.is_none());
    assert!(health.est_finish.is_some(), "有目标有进度应给出预计完成时刻");
}

#[test]
fn test_health_接近时限_黄色() {
    let env = TrackerTestEnv::new().expect("无法创建测试环境");
    // 无目标SKU,健康度只看已耗时
    let (id, sku_id) = env.create_shipment_with_sku("接近时限", "SKU-A", 0, vec![10]);

    env.app
        .settings_api
        .update_time_limit(1.0)
        .expect("设置时限失败");
    env.app
        .shipment_api
        .set_start_time(&id, Some(Utc::now() - Duration::minutes(55)))
        .expect("设置开始时间失败");
    env.app
        .shipment_api
        .add_entry(&id, &sku_id, 10)
        .expect("打包失败");

    // 已耗时55分钟,超过1小时时限的85%
    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    assert_eq!(health.status, HealthStatus::Yellow);
    let warning = health.warning.expect("黄色应有提示文本");
    assert!(
        warning.contains("Approaching 1hr limit"),
        "黄色提示文本不符: {}",
        warning
    );
}

#[test]
fn test_health_预计超时_红色() {
    let env = TrackerTestEnv::new().expect("无法创建测试环境");
    let (id, sku_id) = env.create_shipment_with_sku("预计超时", "SKU-A", 100, vec![10]);

    // 2小时只打了1托10件,按此节奏剩余90件需18小时,必然超3小时时限
    env.app
        .shipment_api
        .set_start_time(&id, Some(Utc::now() - Duration::hours(2)))
        .expect("设置开始时间失败");
    env.app
        .shipment_api
        .add_entry(&id, &sku_id, 10)
        .expect("打包失败");

    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    assert_eq!(health.status, HealthStatus::Red);
    let warning = health.warning.expect("红色应有告警文本");
    assert!(
        warning.starts_with("Projected to exceed 3hr limit"),
        "预计超时文本不符: {}",
        warning
    );
    assert!(!health.completed);
}

// ==========================================
// 时限设置联动测试
// ==========================================

#[test]
fn test_health_修改时限立即生效() {
    let env = TrackerTestEnv::new().expect("无法创建测试环境");
    let (id, sku_id) = env.create_shipment_with_sku("联动", "SKU-A", 0, vec![10]);

    env.app
        .shipment_api
        .set_start_time(&id, Some(Utc::now() - Duration::hours(2)))
        .expect("设置开始时间失败");
    env.app
        .shipment_api
        .add_entry(&id, &sku_id, 10)
        .expect("打包失败");

    // 默认时限3小时,已耗时2小时约67%,仍为绿色
    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    assert_eq!(health.status, HealthStatus::Green);

    // 收紧时限到1小时后立即变红
    env.app
        .settings_api
        .update_time_limit(1.0)
        .expect("设置时限失败");

    let health = env.app.shipment_api.get_health(&id).expect("查询失败");
    assert_eq!(health.status, HealthStatus::Red);
    let warning = health.warning.expect("红色应有告警文本");
    assert!(
        warning.starts_with("Exceeded 1hr limit"),
        "已超时文本不符: {}",
        warning
    );
}
