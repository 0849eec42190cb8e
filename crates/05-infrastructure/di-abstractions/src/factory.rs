//! 组件提供者抽象接口
//!
//! 提供者取代运行时反射：每个提供者知道如何构造一种组件、暴露哪些能力，
//! 以及增强时如何为每个能力生成装饰器。

use crate::interceptor::{Advice, Intercepted};
use crate::resolver::InjectionContext;
use infrastructure_common::{
    AugmentationSpec, CapabilityBinding, CapabilityId, CapabilitySurface, Component,
    ComponentFailure, ComponentHandle, ComponentKey, Lifecycle,
};
use std::sync::Arc;

/// 能力装饰器：为一个能力绑定生成增强后的绑定
pub type CapabilityDecorator =
    Arc<dyn Fn(&CapabilityBinding, Advice) -> Option<CapabilityBinding> + Send + Sync>;

/// 组件构造函数
pub type Constructor<T> =
    Arc<dyn Fn(&InjectionContext<'_>) -> Result<T, ComponentFailure> + Send + Sync>;

/// 组件提供者 trait
pub trait ComponentProvider: Send + Sync {
    /// 提供者名称，组件清单通过此名称引用提供者
    fn name(&self) -> &str;

    /// 未被清单覆盖时使用的组件键
    fn default_key(&self) -> &ComponentKey;

    /// 按声明顺序排列的依赖槽
    fn dependencies(&self) -> &[String];

    fn lifecycle(&self) -> Lifecycle;

    /// 默认增强需求
    fn augmentation(&self) -> Option<&AugmentationSpec>;

    /// 可被拦截的操作
    fn surface(&self) -> &CapabilitySurface;

    /// 暴露的能力
    fn capabilities(&self) -> Vec<CapabilityId>;

    /// 构造组件
    fn construct(&self, ctx: &InjectionContext<'_>) -> Result<ComponentHandle, ComponentFailure>;

    /// 获取能力的装饰器
    fn decorator(&self, capability: CapabilityId) -> Option<&CapabilityDecorator>;
}

/// 可由派生宏生成的注入实现
pub trait Injectable: Component + Sized {
    /// 组件键
    fn component_key() -> &'static str;

    fn lifecycle() -> Lifecycle {
        Lifecycle::Singleton
    }

    /// 依赖槽
    fn dependencies() -> Vec<&'static str> {
        Vec::new()
    }

    /// 从注入上下文构造实例
    fn inject(ctx: &InjectionContext<'_>) -> Result<Self, ComponentFailure>;
}

type Projection<T> = Arc<dyn Fn(&Arc<T>) -> CapabilityBinding + Send + Sync>;

struct CapabilityProjection<T> {
    id: CapabilityId,
    project: Projection<T>,
}

/// 类型化的组件定义
///
/// ```ignore
/// let definition = ComponentDefinition::new("greeter", |ctx| {
///     Ok(GreeterService::new(ctx.capability::<dyn Clock>("clock")?))
/// })
/// .depends_on("clock")
/// .operations(["greet"])
/// .provides::<dyn Greeter>(|service| service)
/// .decorated::<dyn Greeter>(|proxy| Arc::new(proxy));
/// ```
pub struct ComponentDefinition<T: Component> {
    name: String,
    key: ComponentKey,
    dependencies: Vec<String>,
    lifecycle: Lifecycle,
    augmentation: Option<AugmentationSpec>,
    surface: CapabilitySurface,
    constructor: Constructor<T>,
    capabilities: Vec<CapabilityProjection<T>>,
    decorators: Vec<(CapabilityId, CapabilityDecorator)>,
}

impl<T: Component> ComponentDefinition<T> {
    /// 创建组件定义，提供者名称默认为类型名的最后一段
    pub fn new<F>(key: impl Into<ComponentKey>, constructor: F) -> Self
    where
        F: Fn(&InjectionContext<'_>) -> Result<T, ComponentFailure> + Send + Sync + 'static,
    {
        Self {
            name: short_type_name::<T>().to_string(),
            key: key.into(),
            dependencies: Vec::new(),
            lifecycle: Lifecycle::Singleton,
            augmentation: None,
            surface: CapabilitySurface::default(),
            constructor: Arc::new(constructor),
            capabilities: Vec::new(),
            decorators: Vec::new(),
        }
    }

    /// 设置提供者名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 声明依赖槽
    pub fn depends_on(mut self, slot: impl Into<String>) -> Self {
        let slot = slot.into();
        if !self.dependencies.contains(&slot) {
            self.dependencies.push(slot);
        }
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// 每次查找都创建新实例
    pub fn per_request(self) -> Self {
        self.with_lifecycle(Lifecycle::PerRequest)
    }

    /// 声明能力面上的操作
    pub fn operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.surface = CapabilitySurface::new(operations);
        self
    }

    /// 设置默认增强需求
    pub fn augmented(mut self, augmentation: AugmentationSpec) -> Self {
        self.augmentation = Some(augmentation);
        self
    }

    /// 暴露一个能力
    pub fn provides<C>(mut self, project: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let id = CapabilityId::of::<C>();
        self.capabilities.retain(|existing| existing.id != id);
        self.capabilities.push(CapabilityProjection {
            id,
            project: Arc::new(move |instance: &Arc<T>| CapabilityBinding::new(project(instance.clone()))),
        });
        self
    }

    /// 为一个能力注册装饰器
    pub fn decorated<C>(
        mut self,
        decorate: impl Fn(Intercepted<C>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let id = CapabilityId::of::<C>();
        let decorator: CapabilityDecorator = Arc::new(move |binding: &CapabilityBinding, advice: Advice| {
            let target = binding.downcast::<C>()?;
            Some(CapabilityBinding::new(decorate(Intercepted::new(target, advice))))
        });
        self.decorators.retain(|(existing, _)| *existing != id);
        self.decorators.push((id, decorator));
        self
    }
}

impl<T: Injectable> ComponentDefinition<T> {
    /// 由 [`Injectable`] 实现生成组件定义
    pub fn injectable() -> Self {
        T::dependencies().into_iter().fold(
            Self::new(T::component_key(), T::inject).with_lifecycle(T::lifecycle()),
            |definition, slot| definition.depends_on(slot),
        )
    }
}

impl<T: Component> ComponentProvider for ComponentDefinition<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_key(&self) -> &ComponentKey {
        &self.key
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn augmentation(&self) -> Option<&AugmentationSpec> {
        self.augmentation.as_ref()
    }

    fn surface(&self) -> &CapabilitySurface {
        &self.surface
    }

    fn capabilities(&self) -> Vec<CapabilityId> {
        self.capabilities.iter().map(|projection| projection.id).collect()
    }

    fn construct(&self, ctx: &InjectionContext<'_>) -> Result<ComponentHandle, ComponentFailure> {
        let instance = Arc::new((self.constructor)(ctx)?);
        let capabilities = self
            .capabilities
            .iter()
            .map(|projection| (projection.project)(&instance))
            .collect();
        Ok(ComponentHandle::new(
            ctx.key().clone(),
            ctx.lifecycle(),
            instance,
            capabilities,
        ))
    }

    fn decorator(&self, capability: CapabilityId) -> Option<&CapabilityDecorator> {
        self.decorators
            .iter()
            .find(|(id, _)| *id == capability)
            .map(|(_, decorator)| decorator)
    }
}

impl<T: Component> std::fmt::Debug for ComponentDefinition<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("lifecycle", &self.lifecycle)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DependencyLookup;
    use infrastructure_common::{ComponentDescriptor, LookupError, Origin};
    use serde_json::Value;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Debug)]
    struct PoliteGreeter;

    impl Component for PoliteGreeter {}

    impl Greeter for PoliteGreeter {
        fn greet(&self) -> String {
            "Good day".to_string()
        }
    }

    struct NoLookup;

    impl DependencyLookup for NoLookup {
        fn resolve(&self, key: &ComponentKey) -> Result<ComponentHandle, LookupError> {
            Err(LookupError::NotFound { key: key.clone() })
        }

        fn property(&self, _path: &str) -> Option<&Value> {
            None
        }
    }

    fn definition() -> ComponentDefinition<PoliteGreeter> {
        ComponentDefinition::new("greeter", |_| Ok(PoliteGreeter))
            .depends_on("clock")
            .depends_on("clock")
            .operations(["greet"])
            .provides::<dyn Greeter>(|greeter| greeter)
    }

    #[test]
    fn test_definition_metadata() {
        let definition = definition();
        assert_eq!(definition.name(), "PoliteGreeter");
        assert_eq!(definition.default_key().as_str(), "greeter");
        assert_eq!(definition.dependencies(), ["clock".to_string()]);
        assert!(definition.surface().contains("greet"));
        assert_eq!(definition.capabilities(), vec![CapabilityId::of::<dyn Greeter>()]);
        assert!(definition.decorator(CapabilityId::of::<dyn Greeter>()).is_none());
    }

    #[test]
    fn test_construct_projects_capabilities() {
        let definition = definition();
        let descriptor = ComponentDescriptor::new(
            "greeter",
            "PoliteGreeter",
            Origin::Package {
                name: "core".to_string(),
            },
        );
        let ctx = InjectionContext::new(&descriptor, &NoLookup);

        let handle = definition.construct(&ctx).unwrap();
        assert_eq!(handle.key().as_str(), "greeter");
        assert_eq!(handle.capability::<dyn Greeter>().unwrap().greet(), "Good day");
        assert!(handle.downcast::<PoliteGreeter>().is_some());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<PoliteGreeter>(), "PoliteGreeter");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }
}
