//! 实例化引擎
//!
//! 按实例化计划逐个构造组件。单例在构建期间构造一次，按需组件只登记为工厂。
//! 任一组件失败时，已构造的单例按逆序执行销毁钩子，整个构建作废。

use crate::catalog::ProviderCatalog;
use crate::graph::{DependencyGraph, InstantiationPlan};
use crate::proxy::AugmentationLayer;
use crate::registry::{Registry, RegistryEntry};
use di_abstractions::{ComponentProvider, DependencyLookup, InjectionContext};
use infrastructure_common::{
    BuildError, ComponentDescriptor, ComponentHandle, ComponentKey, ConstructionError,
    GraphError, LookupError, PropertyEnvironment, ScanError,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 构造单个组件：构造、初始化钩子、增强
pub(crate) fn materialize(
    descriptor: &ComponentDescriptor,
    provider: &dyn ComponentProvider,
    augmenter: &AugmentationLayer,
    lookup: &dyn DependencyLookup,
) -> Result<ComponentHandle, BuildError> {
    let key = descriptor.key();
    debug!("构造组件: {} (提供者: {})", key, provider.name());

    let ctx = InjectionContext::new(descriptor, lookup);
    let handle = provider
        .construct(&ctx)
        .map_err(|source| ConstructionError::new(key.clone(), source))?;

    handle
        .hooks()
        .post_construct()
        .map_err(|source| ConstructionError::new(key.clone(), source))?;

    let hooks = handle.clone();
    augmenter.augment(handle, descriptor, provider).map_err(|err| {
        hooks.hooks().pre_destroy();
        err.into()
    })
}

/// 构建期间的依赖来源
struct Staging<'a> {
    augmenter: &'a AugmentationLayer,
    properties: &'a PropertyEnvironment,
    singletons: BTreeMap<ComponentKey, ComponentHandle>,
    factories: BTreeMap<ComponentKey, (&'a ComponentDescriptor, &'a dyn ComponentProvider)>,
    built: Vec<ComponentKey>,
}

impl<'a> Staging<'a> {
    fn new(augmenter: &'a AugmentationLayer, properties: &'a PropertyEnvironment) -> Self {
        Self {
            augmenter,
            properties,
            singletons: BTreeMap::new(),
            factories: BTreeMap::new(),
            built: Vec::new(),
        }
    }

    /// 按构造的逆序销毁已构造的单例
    fn discard(self) {
        for key in self.built.iter().rev() {
            if let Some(handle) = self.singletons.get(key) {
                debug!("回滚组件: {}", key);
                handle.hooks().pre_destroy();
            }
        }
    }
}

impl DependencyLookup for Staging<'_> {
    fn resolve(&self, key: &ComponentKey) -> Result<ComponentHandle, LookupError> {
        if let Some(handle) = self.singletons.get(key) {
            return Ok(handle.clone());
        }
        let (descriptor, provider) = self
            .factories
            .get(key)
            .ok_or_else(|| LookupError::NotFound { key: key.clone() })?;

        materialize(descriptor, *provider, self.augmenter, self).map_err(|err| match err {
            BuildError::Construction(err) => LookupError::Construction(err),
            other => LookupError::Construction(ConstructionError::new(key.clone(), other)),
        })
    }

    fn property(&self, path: &str) -> Option<&Value> {
        self.properties.get(path)
    }
}

/// 实例化引擎
#[derive(Debug, Clone, Default)]
pub struct InstantiationEngine {
    augmenter: AugmentationLayer,
    properties: PropertyEnvironment,
}

impl InstantiationEngine {
    pub fn new(augmenter: AugmentationLayer, properties: PropertyEnvironment) -> Self {
        Self {
            augmenter,
            properties,
        }
    }

    /// 按计划构造全部组件并生成注册表
    ///
    /// 成功之前不会产生任何外部可见的状态。
    pub fn instantiate(
        self,
        graph: DependencyGraph,
        plan: InstantiationPlan,
        descriptors: Vec<ComponentDescriptor>,
        catalog: &ProviderCatalog,
        started: Instant,
    ) -> Result<Registry, BuildError> {
        let mut resolved: BTreeMap<ComponentKey, (ComponentDescriptor, Arc<dyn ComponentProvider>)> =
            BTreeMap::new();
        for descriptor in descriptors {
            let provider = catalog.provider(descriptor.provider()).cloned().ok_or_else(|| {
                ScanError::UnresolvedProvider {
                    key: descriptor.key().clone(),
                    provider: descriptor.provider().to_string(),
                    origin: descriptor.origin().to_string(),
                }
            })?;
            let key = descriptor.key().clone();
            if resolved.insert(key.clone(), (descriptor, provider)).is_some() {
                return Err(GraphError::DuplicateKey { key }.into());
            }
        }
        if let Some(key) = resolved.keys().find(|key| plan.position(key).is_none()) {
            return Err(GraphError::UnplannedKey { key: key.clone() }.into());
        }

        let ordered = plan
            .iter()
            .map(|key| {
                resolved
                    .get(key)
                    .map(|(descriptor, provider)| (key, descriptor, provider.as_ref()))
                    .ok_or_else(|| GraphError::UnplannedKey { key: key.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for &(_, descriptor, provider) in &ordered {
            self.augmenter.validate(descriptor, provider)?;
        }

        let mut staging = Staging::new(&self.augmenter, &self.properties);
        for &(key, descriptor, provider) in &ordered {
            if descriptor.lifecycle().is_singleton() {
                match materialize(descriptor, provider, &self.augmenter, &staging) {
                    Ok(handle) => {
                        staging.singletons.insert(key.clone(), handle);
                        staging.built.push(key.clone());
                    }
                    Err(err) => {
                        warn!("组件 {} 构造失败，回滚 {} 个已构造的组件", key, staging.built.len());
                        staging.discard();
                        return Err(err);
                    }
                }
            } else {
                debug!("登记按需组件工厂: {}", key);
                staging.factories.insert(key.clone(), (descriptor, provider));
            }
        }

        let mut singletons = std::mem::take(&mut staging.singletons);
        drop(staging);
        drop(ordered);

        let mut entries = Vec::with_capacity(plan.len());
        for key in &plan {
            if let Some((descriptor, provider)) = resolved.remove(key) {
                let instance = singletons.remove(key);
                entries.push(RegistryEntry::new(descriptor, provider, instance));
            }
        }

        let registry = Registry::new(
            entries,
            graph,
            plan,
            self.augmenter,
            self.properties,
            started.elapsed(),
        );
        info!(
            "容器构建完成: {} 个组件, 构建标识 {}",
            registry.len(),
            registry.build_id()
        );
        Ok(registry)
    }
}
