// ==========================================
// 仓储装载跟踪系统 - 装载模板 API
// ==========================================
// 职责: 模板增删改查/按模板开单/装载单另存为模板
// 红线: 模板管理操作需 CAN_CREATE_TEMPLATES 权限;按模板开单不设权限门槛
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::state::TrackerState;
use crate::domain::template::{ShipmentTemplate, TemplateSku};
use crate::domain::types::PermissionKey;
use crate::engine::PermissionEvaluator;
use crate::repository::StateSnapshotRepository;

// ==========================================
// TemplateApi - 装载模板 API
// ==========================================

/// 装载模板API
pub struct TemplateApi {
    state: Arc<Mutex<TrackerState>>,
    snapshot_repo: Arc<StateSnapshotRepository>,
    permissions: PermissionEvaluator,
}

impl TemplateApi {
    pub fn new(state: Arc<Mutex<TrackerState>>, snapshot_repo: Arc<StateSnapshotRepository>) -> Self {
        Self {
            state,
            snapshot_repo,
            permissions: PermissionEvaluator::new(),
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 全部模板(模板选择器用,无权限门槛)
    pub fn list_templates(&self) -> ApiResult<Vec<ShipmentTemplate>> {
        Ok(self.state()?.templates.clone())
    }

    /// 单个模板详情
    pub fn get_template(&self, template_id: &str) -> ApiResult<ShipmentTemplate> {
        let state = self.state()?;
        state
            .find_template(template_id)
            .cloned()
            .ok_or_else(|| template_not_found(template_id))
    }

    // ==========================================
    // 模板维护(需权限)
    // ==========================================

    /// 创建模板
    ///
    /// # 参数
    /// - name: 模板名称(非空)
    /// - description: 模板描述
    /// - skus: 预定义 SKU 组
    ///
    /// # 返回
    /// - Ok(String): 新模板ID
    /// - Err(ApiError::PermissionDenied): 无创建模板权限
    /// - Err(ApiError::InvalidInput): 模板定义不合法
    pub fn create_template(
        &self,
        name: &str,
        description: &str,
        skus: Vec<TemplateSku>,
    ) -> ApiResult<String> {
        let mut state = self.state()?;
        self.guard_can_create(&state)?;
        validate_template(name, &skus)?;

        let template = ShipmentTemplate::new(name, description, skus);
        let template_id = template.id.clone();
        state.templates.push(template);
        self.persist(&state);
        info!(template_id = %template_id, "模板已创建");
        Ok(template_id)
    }

    /// 更新模板定义
    pub fn update_template(
        &self,
        template_id: &str,
        name: &str,
        description: &str,
        skus: Vec<TemplateSku>,
    ) -> ApiResult<()> {
        let mut state = self.state()?;
        self.guard_can_create(&state)?;
        validate_template(name, &skus)?;

        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| template_not_found(template_id))?;
        template.name = name.trim().to_string();
        template.description = description.trim().to_string();
        template.predefined_skus = skus;
        self.persist(&state);
        Ok(())
    }

    /// 删除模板(已开出的装载单不受影响)
    pub fn delete_template(&self, template_id: &str) -> ApiResult<()> {
        let mut state = self.state()?;
        self.guard_can_create(&state)?;

        let before = state.templates.len();
        state.templates.retain(|t| t.id != template_id);
        if state.templates.len() == before {
            return Err(template_not_found(template_id));
        }
        self.persist(&state);
        info!(template_id, "模板已删除");
        Ok(())
    }

    // ==========================================
    // 模板应用
    // ==========================================

    /// 按模板开新装载单: 全新 id,空打包记录,容量表规整
    ///
    /// # 参数
    /// - template_id: 模板ID
    /// - shipment_name: 新装载单名称(非空)
    ///
    /// # 返回
    /// - Ok(String): 新装载单ID
    pub fn instantiate_template(
        &self,
        template_id: &str,
        shipment_name: &str,
    ) -> ApiResult<String> {
        if shipment_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("装载单名称不能为空".to_string()));
        }
        let mut state = self.state()?;
        let template = state
            .find_template(template_id)
            .ok_or_else(|| template_not_found(template_id))?;

        let shipment = template.instantiate(shipment_name, Utc::now());
        let shipment_id = shipment.id.clone();
        state.shipments.push(shipment);
        self.persist(&state);
        info!(template_id, shipment_id = %shipment_id, "已按模板开单");
        Ok(shipment_id)
    }

    /// 把既有装载单另存为模板(丢弃打包记录,仅保留定义)
    pub fn save_as_template(
        &self,
        shipment_id: &str,
        name: &str,
        description: &str,
    ) -> ApiResult<String> {
        let mut state = self.state()?;
        self.guard_can_create(&state)?;

        let shipment = state
            .find_shipment(shipment_id)
            .ok_or_else(|| ApiError::NotFound(format!("装载单(id={})不存在", shipment_id)))?;
        let template = ShipmentTemplate::from_shipment(name, description, shipment);
        validate_template(&template.name, &template.predefined_skus)?;

        let template_id = template.id.clone();
        state.templates.push(template);
        self.persist(&state);
        info!(shipment_id, template_id = %template_id, "装载单已另存为模板");
        Ok(template_id)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn state(&self) -> ApiResult<MutexGuard<'_, TrackerState>> {
        self.state
            .lock()
            .map_err(|e| ApiError::InternalError(format!("状态锁获取失败: {}", e)))
    }

    /// 快照落盘,失败只告警不阻断主流程
    fn persist(&self, state: &TrackerState) {
        if let Err(e) = self.snapshot_repo.save(state) {
            warn!(error = %e, "快照保存失败");
        }
    }

    fn guard_can_create(&self, state: &TrackerState) -> ApiResult<()> {
        if !self
            .permissions
            .has_permission(state.current_user.as_ref(), PermissionKey::CanCreateTemplates)
        {
            return Err(ApiError::PermissionDenied("无创建模板权限".to_string()));
        }
        Ok(())
    }
}

fn template_not_found(template_id: &str) -> ApiError {
    ApiError::NotFound(format!("模板(id={})不存在", template_id))
}

/// 模板定义校验: 名称非空,货品代码非空,容量为正,图片地址非空
fn validate_template(name: &str, skus: &[TemplateSku]) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("模板名称不能为空".to_string()));
    }
    for sku in skus {
        if sku.code.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "模板内存在空的货品代码".to_string(),
            ));
        }
        if sku.capacities.iter().any(|c| *c == 0) {
            return Err(ApiError::InvalidInput(
                "模板容量必须为正整数".to_string(),
            ));
        }
        if let Some(info) = &sku.pallet_build_info {
            if info.image_urls.iter().any(|u| u.trim().is_empty()) {
                return Err(ApiError::InvalidInput(
                    "模板图片地址不能为空".to_string(),
                ));
            }
        }
    }
    Ok(())
}
