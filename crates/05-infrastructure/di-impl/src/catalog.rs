//! 提供者目录
//!
//! 代码中注册的组件提供者，按包分组。包名即 `package:` 扫描目标，
//! 提供者名称在整个目录内唯一，供组件清单引用。

use di_abstractions::{ComponentDefinition, ComponentProvider};
use infrastructure_common::{Component, ScanError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// 提供者目录
#[derive(Default, Clone)]
pub struct ProviderCatalog {
    packages: BTreeMap<String, Vec<Arc<dyn ComponentProvider>>>,
    by_name: BTreeMap<String, Arc<dyn ComponentProvider>>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在指定包中注册一个组件定义
    pub fn register<T: Component>(
        &mut self,
        package: impl Into<String>,
        definition: ComponentDefinition<T>,
    ) -> Result<&mut Self, ScanError> {
        self.register_provider(package, Arc::new(definition))
    }

    /// 在指定包中注册一个提供者
    pub fn register_provider(
        &mut self,
        package: impl Into<String>,
        provider: Arc<dyn ComponentProvider>,
    ) -> Result<&mut Self, ScanError> {
        let package = package.into();
        let name = provider.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(ScanError::DuplicateProvider { provider: name });
        }

        debug!("注册提供者: {} (包: {})", name, package);
        self.by_name.insert(name, provider.clone());
        self.packages.entry(package).or_default().push(provider);
        Ok(self)
    }

    /// 按名称查找提供者
    pub fn provider(&self, name: &str) -> Option<&Arc<dyn ComponentProvider>> {
        self.by_name.get(name)
    }

    /// 获取包内的全部提供者，按注册顺序
    pub fn package(&self, package: &str) -> Option<&[Arc<dyn ComponentProvider>]> {
        self.packages.get(package).map(Vec::as_slice)
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl std::fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let packages: BTreeMap<&str, Vec<&str>> = self
            .packages
            .iter()
            .map(|(package, providers)| {
                (
                    package.as_str(),
                    providers.iter().map(|provider| provider.name()).collect(),
                )
            })
            .collect();
        f.debug_struct("ProviderCatalog")
            .field("packages", &packages)
            .finish()
    }
}
