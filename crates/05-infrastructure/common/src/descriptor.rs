//! 组件描述符
//!
//! 扫描阶段产出的不可变组件元数据：标识、依赖、生命周期、增强需求和来源

use crate::component::ComponentKey;
use crate::lifecycle::Lifecycle;
use crate::properties::PropertyEnvironment;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// 描述符来源，仅用于诊断
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Origin {
    /// 代码中注册的提供者包
    Package { name: String },
    /// 组件清单文件中的第 `entry` 个条目
    Manifest { path: PathBuf, entry: usize },
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package { name } => write!(f, "package:{}", name),
            Self::Manifest { path, entry } => write!(f, "{}#{}", path.display(), entry),
        }
    }
}

/// 增强需求
///
/// `operations` 为空表示拦截能力面上的全部操作。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentationSpec {
    /// 按顺序执行的拦截器名称
    pub interceptors: Vec<String>,
    /// 需要拦截的操作
    pub operations: BTreeSet<String>,
}

impl AugmentationSpec {
    /// 创建新的增强需求
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加拦截器
    pub fn with_interceptor(mut self, name: impl Into<String>) -> Self {
        self.interceptors.push(name.into());
        self
    }

    /// 添加被拦截的操作
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operations.insert(operation.into());
        self
    }
}

/// 组件描述符
///
/// 通过 `new` 和 `with_*` 方法组装，交给图构建器之后只能读取。
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    key: ComponentKey,
    provider: String,
    dependencies: Vec<ComponentKey>,
    bindings: BTreeMap<String, ComponentKey>,
    lifecycle: Lifecycle,
    augmentation: Option<AugmentationSpec>,
    properties: PropertyEnvironment,
    origin: Origin,
}

impl ComponentDescriptor {
    /// 创建新的组件描述符
    pub fn new(key: impl Into<ComponentKey>, provider: impl Into<String>, origin: Origin) -> Self {
        Self {
            key: key.into(),
            provider: provider.into(),
            dependencies: Vec::new(),
            bindings: BTreeMap::new(),
            lifecycle: Lifecycle::default(),
            augmentation: None,
            properties: PropertyEnvironment::default(),
            origin,
        }
    }

    /// 追加依赖，重复的键会被忽略
    pub fn with_dependency(mut self, key: impl Into<ComponentKey>) -> Self {
        let key = key.into();
        if !self.dependencies.contains(&key) {
            self.dependencies.push(key);
        }
        self
    }

    /// 将依赖槽绑定到另一个组件键
    pub fn with_binding(mut self, slot: impl Into<String>, key: impl Into<ComponentKey>) -> Self {
        self.bindings.insert(slot.into(), key.into());
        self
    }

    /// 设置生命周期
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// 设置增强需求
    pub fn with_augmentation(mut self, augmentation: AugmentationSpec) -> Self {
        self.augmentation = Some(augmentation);
        self
    }

    /// 设置组件级属性
    pub fn with_properties(mut self, properties: PropertyEnvironment) -> Self {
        self.properties = properties;
        self
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// 提供者名称
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// 按声明顺序排列的依赖键
    pub fn dependencies(&self) -> &[ComponentKey] {
        &self.dependencies
    }

    pub fn bindings(&self) -> &BTreeMap<String, ComponentKey> {
        &self.bindings
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn augmentation(&self) -> Option<&AugmentationSpec> {
        self.augmentation.as_ref()
    }

    pub fn properties(&self) -> &PropertyEnvironment {
        &self.properties
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// 将依赖槽解析为组件键
    ///
    /// 未绑定的槽名本身就是组件键。
    pub fn resolve_slot(&self, slot: &str) -> ComponentKey {
        self.bindings
            .get(slot)
            .cloned()
            .unwrap_or_else(|| ComponentKey::new(slot))
    }

    /// 是否声明了对指定键的依赖
    pub fn depends_on(&self, key: &ComponentKey) -> bool {
        self.dependencies.contains(key)
    }
}
