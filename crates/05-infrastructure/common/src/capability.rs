//! 组件能力与实例句柄
//!
//! 能力（capability）是组件对外暴露的 trait 对象。句柄以类型擦除的方式保存
//! 组件实例及其能力表，增强层只替换能力表中的条目。

use crate::component::{Component, ComponentKey};
use crate::lifecycle::Lifecycle;
use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// 能力面：能力 trait 上可被拦截的操作名称集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySurface {
    operations: BTreeSet<String>,
}

impl CapabilitySurface {
    pub fn new<I, S>(operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operations: operations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }

    pub fn operations(&self) -> &BTreeSet<String> {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// 能力标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId {
    type_id: TypeId,
    name: &'static str,
}

impl CapabilityId {
    /// 获取能力类型（通常是 `dyn Trait`）的标识
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除的能力绑定，内部保存 `Arc<C>`
#[derive(Clone)]
pub struct CapabilityBinding {
    id: CapabilityId,
    value: Arc<dyn Any + Send + Sync>,
}

impl CapabilityBinding {
    pub fn new<C: ?Sized + Send + Sync + 'static>(capability: Arc<C>) -> Self {
        Self {
            id: CapabilityId::of::<C>(),
            value: Arc::new(capability),
        }
    }

    pub fn id(&self) -> CapabilityId {
        self.id
    }

    /// 还原为具体能力
    pub fn downcast<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.value.downcast_ref::<Arc<C>>().cloned()
    }
}

impl fmt::Debug for CapabilityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityBinding")
            .field("capability", &self.id.name)
            .finish()
    }
}

/// 组件实例句柄
///
/// 克隆句柄只增加引用计数，单例的所有克隆指向同一个实例。
#[derive(Clone)]
pub struct ComponentHandle {
    key: ComponentKey,
    lifecycle: Lifecycle,
    type_name: &'static str,
    target: Arc<dyn Any + Send + Sync>,
    hooks: Arc<dyn Component>,
    capabilities: Vec<CapabilityBinding>,
    augmented: bool,
}

impl ComponentHandle {
    pub fn new<T: Component>(
        key: ComponentKey,
        lifecycle: Lifecycle,
        instance: Arc<T>,
        capabilities: Vec<CapabilityBinding>,
    ) -> Self {
        Self {
            key,
            lifecycle,
            type_name: std::any::type_name::<T>(),
            target: instance.clone(),
            hooks: instance,
            capabilities,
            augmented: false,
        }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// 具体实现类型名
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 获取原始具体实例，绕过增强层
    pub fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        self.target.clone().downcast::<T>().ok()
    }

    /// 获取指定能力
    pub fn capability<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        let id = CapabilityId::of::<C>();
        self.capabilities
            .iter()
            .find(|binding| binding.id() == id)
            .and_then(CapabilityBinding::downcast::<C>)
    }

    pub fn provides<C: ?Sized + 'static>(&self) -> bool {
        let id = CapabilityId::of::<C>();
        self.capabilities.iter().any(|binding| binding.id() == id)
    }

    pub fn capability_ids(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.capabilities.iter().map(CapabilityBinding::id)
    }

    pub fn capabilities(&self) -> &[CapabilityBinding] {
        &self.capabilities
    }

    /// 生命周期钩子
    pub fn hooks(&self) -> &dyn Component {
        self.hooks.as_ref()
    }

    /// 用增强后的能力表替换原有能力表
    pub fn into_augmented(mut self, capabilities: Vec<CapabilityBinding>) -> Self {
        self.capabilities = capabilities;
        self.augmented = true;
        self
    }

    pub fn is_augmented(&self) -> bool {
        self.augmented
    }

    /// 两个句柄是否指向同一个实例
    pub fn ptr_eq(&self, other: &ComponentHandle) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("key", &self.key)
            .field("lifecycle", &self.lifecycle)
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities)
            .field("augmented", &self.augmented)
            .finish()
    }
}
