//! 容器构建入口

use crate::catalog::ProviderCatalog;
use crate::engine::InstantiationEngine;
use crate::graph::DependencyGraph;
use crate::proxy::{AugmentationLayer, InterceptorRegistry};
use crate::registry::Registry;
use crate::scanner::DescriptorScanner;
use di_abstractions::{ComponentScanner, ContainerConfig, Interceptor, ScanTarget};
use infrastructure_common::{BuildError, ComponentDescriptor, PropertyEnvironment};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// 扫描目标并构建容器
///
/// 失败时不产生任何外部可见的状态，调用方已持有的注册表不受影响。
pub async fn build_container(
    targets: &[ScanTarget],
    catalog: Arc<ProviderCatalog>,
    interceptors: InterceptorRegistry,
    config: &ContainerConfig,
) -> Result<Arc<Registry>, BuildError> {
    let started = Instant::now();
    info!("开始构建容器: {} 个扫描目标", targets.len());

    let scanner = DescriptorScanner::new(catalog.clone(), config.scan.clone());
    let descriptors = scanner.scan(targets).await.map_err(|err| {
        error!("组件扫描失败: {}", err);
        err
    })?;

    build_from_descriptors(
        descriptors,
        &catalog,
        interceptors,
        config.properties.clone(),
        started,
    )
}

/// 由已有的描述符构建容器
pub fn build_from_descriptors(
    descriptors: Vec<ComponentDescriptor>,
    catalog: &ProviderCatalog,
    interceptors: InterceptorRegistry,
    properties: PropertyEnvironment,
    started: Instant,
) -> Result<Arc<Registry>, BuildError> {
    let graph = DependencyGraph::build(&descriptors)?;
    let plan = graph.plan().map_err(|err| {
        error!("依赖图构建失败: {}", err);
        err
    })?;
    info!("实例化计划包含 {} 个组件", plan.len());

    let engine = InstantiationEngine::new(AugmentationLayer::new(interceptors), properties);
    let registry = engine.instantiate(graph, plan, descriptors, catalog, started)?;
    Ok(Arc::new(registry))
}

/// 容器构建器
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    catalog: Arc<ProviderCatalog>,
    interceptors: InterceptorRegistry,
    config: ContainerConfig,
    targets: Vec<ScanTarget>,
}

impl ContainerBuilder {
    /// 创建构建器，默认注册日志与指标拦截器
    pub fn new(catalog: impl Into<Arc<ProviderCatalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            interceptors: InterceptorRegistry::with_builtin(),
            config: ContainerConfig::default(),
            targets: Vec::new(),
        }
    }

    /// 添加扫描目标
    pub fn scan(mut self, target: ScanTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn scan_all(mut self, targets: impl IntoIterator<Item = ScanTarget>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// 注册拦截器，同名拦截器会被替换
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.register(interceptor);
        self
    }

    /// 替换整个拦截器注册表
    pub fn with_interceptors(mut self, interceptors: InterceptorRegistry) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn targets(&self) -> &[ScanTarget] {
        &self.targets
    }

    pub fn catalog(&self) -> &Arc<ProviderCatalog> {
        &self.catalog
    }

    /// 构建容器，可重复调用，每次产生新的注册表
    pub async fn build(&self) -> Result<Arc<Registry>, BuildError> {
        build_container(
            &self.targets,
            self.catalog.clone(),
            self.interceptors.clone(),
            &self.config,
        )
        .await
    }
}
