//! 组件注册表
//!
//! 构建完成后发布的只读结构，通过 `Arc` 在调用方之间共享。查找不加锁，
//! 只读取一个原子的 `accepting` 标志。注册表只在销毁时移除条目。

use crate::engine::materialize;
use crate::graph::{DependencyGraph, InstantiationPlan};
use crate::proxy::AugmentationLayer;
use chrono::{DateTime, Utc};
use di_abstractions::{ComponentLookup, ComponentProvider, ContainerStats, DependencyLookup};
use infrastructure_common::{
    BuildError, CapabilityId, ComponentDescriptor, ComponentHandle, ComponentKey,
    ConstructionError, LookupError, PropertyEnvironment,
};
use serde_json::Value;
use std::collections::{btree_map, BTreeMap};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// 注册表条目：单例保存实例，按需组件只保存工厂所需的描述符与提供者
pub(crate) struct RegistryEntry {
    descriptor: ComponentDescriptor,
    provider: Arc<dyn ComponentProvider>,
    instance: Option<ComponentHandle>,
}

impl RegistryEntry {
    pub(crate) fn new(
        descriptor: ComponentDescriptor,
        provider: Arc<dyn ComponentProvider>,
        instance: Option<ComponentHandle>,
    ) -> Self {
        Self {
            descriptor,
            provider,
            instance,
        }
    }
}

/// 组件注册表
pub struct Registry {
    build_id: Uuid,
    built_at: DateTime<Utc>,
    /// 按实例化顺序排列
    entries: Vec<RegistryEntry>,
    index: BTreeMap<ComponentKey, usize>,
    graph: DependencyGraph,
    plan: InstantiationPlan,
    augmenter: AugmentationLayer,
    properties: PropertyEnvironment,
    stats: ContainerStats,
    accepting: AtomicBool,
}

impl Registry {
    pub(crate) fn new(
        entries: Vec<RegistryEntry>,
        graph: DependencyGraph,
        plan: InstantiationPlan,
        augmenter: AugmentationLayer,
        properties: PropertyEnvironment,
        build_duration: Duration,
    ) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.descriptor.key().clone(), position))
            .collect();

        let build_id = Uuid::new_v4();
        let built_at = Utc::now();
        let singletons = entries
            .iter()
            .filter(|entry| entry.descriptor.lifecycle().is_singleton())
            .count();
        let stats = ContainerStats {
            build_id,
            built_at,
            descriptors: entries.len(),
            singletons,
            per_request: entries.len() - singletons,
            augmented: entries
                .iter()
                .filter(|entry| entry.descriptor.augmentation().is_some())
                .count(),
            build_duration_ms: u64::try_from(build_duration.as_millis()).unwrap_or(u64::MAX),
        };

        Self {
            build_id,
            built_at,
            entries,
            index,
            graph,
            plan,
            augmenter,
            properties,
            stats,
            accepting: AtomicBool::new(true),
        }
    }

    /// 构建标识
    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    /// 构建完成时间
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// 构建统计
    pub fn stats(&self) -> &ContainerStats {
        &self.stats
    }

    /// 实例化计划
    pub fn plan(&self) -> &InstantiationPlan {
        &self.plan
    }

    /// 依赖图
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// 容器级属性
    pub fn properties(&self) -> &PropertyEnvironment {
        &self.properties
    }

    /// 组件数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何组件
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否仍接受查找
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// 是否注册了指定键，关闭后仍可查询
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// 按键获取描述符
    pub fn descriptor(&self, key: &str) -> Option<&ComponentDescriptor> {
        self.index.get(key).map(|&position| &self.entries[position].descriptor)
    }

    /// 按实例化顺序返回全部描述符
    pub fn descriptors(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// 按键查找组件
    ///
    /// 单例返回共享实例，按需组件每次构造新实例。
    pub fn lookup(&self, key: &str) -> Result<ComponentHandle, LookupError> {
        if !self.is_accepting() {
            return Err(LookupError::Closed);
        }
        let entry = self
            .index
            .get(key)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| LookupError::NotFound {
                key: ComponentKey::new(key),
            })?;
        self.materialize_entry(entry)
    }

    /// 按键查找组件并取出指定能力
    pub fn lookup_as<C>(&self, key: &str) -> Result<Arc<C>, LookupError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        ComponentLookup::lookup_as(self, key)
    }

    /// 按能力查找组件
    ///
    /// 返回惰性迭代器，按组件键顺序遍历，每次调用都从注册表重新计算。
    pub fn lookup_by_capability<C>(&self) -> CapabilityIter<'_, C>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        CapabilityIter {
            registry: self,
            keys: self.index.iter(),
            capability: CapabilityId::of::<C>(),
            closed: false,
            _capability: PhantomData,
        }
    }

    /// 销毁容器
    ///
    /// 先停止接受查找，再按实例化的逆序执行单例的销毁钩子。重复调用无效果。
    pub fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }

        info!("销毁容器: 构建标识 {}", self.build_id);
        for entry in self.entries.iter().rev() {
            if let Some(instance) = &entry.instance {
                debug!("销毁组件: {}", instance.key());
                instance.hooks().pre_destroy();
            }
        }
    }

    fn materialize_entry(&self, entry: &RegistryEntry) -> Result<ComponentHandle, LookupError> {
        if let Some(instance) = &entry.instance {
            return Ok(instance.clone());
        }

        materialize(
            &entry.descriptor,
            entry.provider.as_ref(),
            &self.augmenter,
            self,
        )
        .map_err(|err| match err {
            BuildError::Construction(err) => LookupError::Construction(err),
            other => LookupError::Construction(ConstructionError::new(
                entry.descriptor.key().clone(),
                other,
            )),
        })
    }
}

impl DependencyLookup for Registry {
    fn resolve(&self, key: &ComponentKey) -> Result<ComponentHandle, LookupError> {
        self.lookup(key.as_str())
    }

    fn property(&self, path: &str) -> Option<&Value> {
        self.properties.get(path)
    }
}

impl ComponentLookup for Registry {
    fn lookup(&self, key: &str) -> Result<ComponentHandle, LookupError> {
        Registry::lookup(self, key)
    }

    fn contains(&self, key: &str) -> bool {
        Registry::contains(self, key)
    }

    fn keys(&self) -> Vec<ComponentKey> {
        self.plan.keys().to_vec()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("build_id", &self.build_id)
            .field("plan", &self.plan)
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

/// 按能力查找的惰性迭代器
///
/// 注册表关闭后只产生一次 [`LookupError::Closed`]。
pub struct CapabilityIter<'a, C: ?Sized> {
    registry: &'a Registry,
    keys: btree_map::Iter<'a, ComponentKey, usize>,
    capability: CapabilityId,
    closed: bool,
    _capability: PhantomData<fn() -> Arc<C>>,
}

impl<C: ?Sized> Clone for CapabilityIter<'_, C> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry,
            keys: self.keys.clone(),
            capability: self.capability,
            closed: self.closed,
            _capability: PhantomData,
        }
    }
}

impl<C> Iterator for CapabilityIter<'_, C>
where
    C: ?Sized + Send + Sync + 'static,
{
    type Item = Result<Arc<C>, LookupError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        if !self.registry.is_accepting() {
            self.closed = true;
            return Some(Err(LookupError::Closed));
        }

        for (_, &position) in self.keys.by_ref() {
            let entry = &self.registry.entries[position];
            if !entry.provider.capabilities().contains(&self.capability) {
                continue;
            }
            let item = self.registry.materialize_entry(entry).and_then(|handle| {
                handle
                    .capability::<C>()
                    .ok_or_else(|| LookupError::CapabilityNotProvided {
                        key: handle.key().clone(),
                        capability: self.capability.name().to_string(),
                    })
            });
            return Some(item);
        }
        None
    }
}
