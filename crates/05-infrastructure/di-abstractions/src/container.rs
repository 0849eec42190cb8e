//! 容器配置与统计

use crate::scanner::ScanOptions;
use chrono::{DateTime, Utc};
use infrastructure_common::PropertyEnvironment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 容器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 扫描选项
    pub scan: ScanOptions,
    /// 容器级属性
    pub properties: PropertyEnvironment,
}

impl ContainerConfig {
    pub fn with_scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_properties(mut self, properties: PropertyEnvironment) -> Self {
        self.properties = properties;
        self
    }
}

/// 一次构建的统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    /// 构建标识
    pub build_id: Uuid,
    /// 构建完成时间
    pub built_at: DateTime<Utc>,
    /// 描述符数量
    pub descriptors: usize,
    pub singletons: usize,
    pub per_request: usize,
    /// 被增强的组件数量
    pub augmented: usize,
    /// 构建耗时（毫秒）
    pub build_duration_ms: u64,
}
