//! 依赖解析抽象接口
//!
//! 提供组件构造期间的依赖与属性注入能力

use infrastructure_common::{
    Component, ComponentDescriptor, ComponentHandle, ComponentKey, InjectionError, Lifecycle,
    LookupError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// 构造期间可见的依赖来源
///
/// 构建阶段由引擎的暂存区实现，按需组件的工厂由已发布的注册表实现。
pub trait DependencyLookup: Send + Sync {
    /// 解析已构建（或可按需构建）的组件
    fn resolve(&self, key: &ComponentKey) -> Result<ComponentHandle, LookupError>;

    /// 容器级属性
    fn property(&self, path: &str) -> Option<&Value>;
}

/// 注入上下文
///
/// 传给组件构造函数，只能解析描述符中声明过的依赖。
#[derive(Clone, Copy)]
pub struct InjectionContext<'a> {
    descriptor: &'a ComponentDescriptor,
    lookup: &'a dyn DependencyLookup,
}

impl<'a> InjectionContext<'a> {
    pub fn new(descriptor: &'a ComponentDescriptor, lookup: &'a dyn DependencyLookup) -> Self {
        Self { descriptor, lookup }
    }

    /// 正在构造的组件键
    pub fn key(&self) -> &ComponentKey {
        self.descriptor.key()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.descriptor.lifecycle()
    }

    pub fn descriptor(&self) -> &ComponentDescriptor {
        self.descriptor
    }

    /// 按依赖槽解析组件句柄
    pub fn handle(&self, slot: &str) -> Result<ComponentHandle, InjectionError> {
        let key = self.descriptor.resolve_slot(slot);
        if !self.descriptor.depends_on(&key) {
            return Err(InjectionError::UndeclaredDependency {
                slot: slot.to_string(),
                key,
            });
        }
        Ok(self.lookup.resolve(&key)?)
    }

    /// 按依赖槽获取具体类型的实例
    ///
    /// 返回原始实例，不经过增强层。
    pub fn get<T: Component>(&self, slot: &str) -> Result<Arc<T>, InjectionError> {
        let handle = self.handle(slot)?;
        handle
            .downcast::<T>()
            .ok_or_else(|| InjectionError::TypeMismatch {
                key: handle.key().clone(),
                expected: std::any::type_name::<T>().to_string(),
            })
    }

    /// 按依赖槽获取能力，可能是增强后的实例
    pub fn capability<C: ?Sized + Send + Sync + 'static>(
        &self,
        slot: &str,
    ) -> Result<Arc<C>, InjectionError> {
        let handle = self.handle(slot)?;
        handle.capability::<C>().ok_or_else(|| {
            LookupError::CapabilityNotProvided {
                key: handle.key().clone(),
                capability: std::any::type_name::<C>().to_string(),
            }
            .into()
        })
    }

    /// 读取必需的属性
    ///
    /// 先查找组件级属性，再查找容器级属性。
    pub fn property<T: DeserializeOwned>(&self, path: &str) -> Result<T, InjectionError> {
        self.optional_property(path)?
            .ok_or_else(|| InjectionError::MissingProperty {
                path: path.to_string(),
            })
    }

    /// 读取可选的属性
    pub fn optional_property<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, InjectionError> {
        let value = self
            .descriptor
            .properties()
            .get(path)
            .or_else(|| self.lookup.property(path));

        match value {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| InjectionError::InvalidProperty {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for InjectionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionContext")
            .field("key", self.key())
            .finish()
    }
}
