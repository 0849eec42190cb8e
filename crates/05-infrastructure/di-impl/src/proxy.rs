//! 增强层
//!
//! 按描述符的增强需求，用提供者注册的装饰器替换组件的全部能力。
//! 替换后的句柄与原句柄指向同一实例，能力集合保持不变。

use crate::interceptors::{LoggingInterceptor, MetricsInterceptor};
use di_abstractions::{Advice, ComponentProvider, Interceptor};
use infrastructure_common::{AugmentationError, ComponentDescriptor, ComponentHandle};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// 拦截器注册表，按名称引用
#[derive(Debug, Clone, Default)]
pub struct InterceptorRegistry {
    interceptors: BTreeMap<String, Arc<dyn Interceptor>>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 包含日志与指标拦截器的注册表
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LoggingInterceptor));
        registry.register(Arc::new(MetricsInterceptor::new()));
        registry
    }

    /// 注册拦截器，同名拦截器会被替换
    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.interceptors
            .insert(interceptor.name().to_string(), interceptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Interceptor>> {
        self.interceptors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.interceptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

/// 增强层
#[derive(Debug, Clone, Default)]
pub struct AugmentationLayer {
    interceptors: InterceptorRegistry,
}

impl AugmentationLayer {
    pub fn new(interceptors: InterceptorRegistry) -> Self {
        Self { interceptors }
    }

    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    /// 校验增强需求并生成拦截配置
    ///
    /// 没有增强需求时返回 `None`。
    pub fn validate(
        &self,
        descriptor: &ComponentDescriptor,
        provider: &dyn ComponentProvider,
    ) -> Result<Option<Advice>, AugmentationError> {
        let Some(spec) = descriptor.augmentation() else {
            return Ok(None);
        };
        let key = descriptor.key();

        if let Some(operation) = spec
            .operations
            .iter()
            .find(|operation| !provider.surface().contains(operation.as_str()))
        {
            return Err(AugmentationError::UnknownOperation {
                key: key.clone(),
                operation: operation.clone(),
            });
        }

        let interceptors = spec
            .interceptors
            .iter()
            .map(|name| {
                self.interceptors
                    .get(name)
                    .cloned()
                    .ok_or_else(|| AugmentationError::UnknownInterceptor {
                        key: key.clone(),
                        interceptor: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(capability) = provider
            .capabilities()
            .into_iter()
            .find(|capability| provider.decorator(*capability).is_none())
        {
            return Err(AugmentationError::MissingDecorator {
                key: key.clone(),
                capability: capability.name().to_string(),
            });
        }

        let designated = (!spec.operations.is_empty()).then(|| spec.operations.clone());
        Ok(Some(Advice::new(key.clone(), interceptors, designated)))
    }

    /// 增强组件
    ///
    /// 没有增强需求时原样返回句柄。
    pub fn augment(
        &self,
        handle: ComponentHandle,
        descriptor: &ComponentDescriptor,
        provider: &dyn ComponentProvider,
    ) -> Result<ComponentHandle, AugmentationError> {
        let Some(advice) = self.validate(descriptor, provider)? else {
            return Ok(handle);
        };

        let capabilities = handle
            .capabilities()
            .iter()
            .map(|binding| {
                provider
                    .decorator(binding.id())
                    .and_then(|decorate| decorate(binding, advice.clone()))
                    .ok_or_else(|| AugmentationError::MissingDecorator {
                        key: descriptor.key().clone(),
                        capability: binding.id().name().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "组件已增强: {} (拦截器: {:?})",
            descriptor.key(),
            advice
                .interceptors()
                .iter()
                .map(|interceptor| interceptor.name())
                .collect::<Vec<_>>()
        );
        Ok(handle.into_augmented(capabilities))
    }
}
