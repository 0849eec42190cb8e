//! 错误类型定义

use crate::component::{ComponentFailure, ComponentKey};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 扫描错误类型
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("扫描根目录不可读: {root}, 原因: {source}")]
    UnreadableRoot {
        root: PathBuf,
        source: std::io::Error,
    },

    #[error("未注册的组件包: {package}")]
    UnknownPackage { package: String },

    #[error("组件清单格式错误: {path}, 原因: {message}")]
    MalformedManifest { path: PathBuf, message: String },

    #[error("组件 {key} 引用了不存在的提供者 {provider} ({origin})")]
    UnresolvedProvider {
        key: ComponentKey,
        provider: String,
        origin: String,
    },

    #[error("组件键重复: {key}, 来源: {first} 与 {second}")]
    DuplicateKey {
        key: ComponentKey,
        first: String,
        second: String,
    },

    #[error("提供者名称重复: {provider}")]
    DuplicateProvider { provider: String },

    #[error("组件声明无效 ({origin}): {message}")]
    InvalidDeclaration { origin: String, message: String },
}

/// 循环依赖错误
///
/// `cycle` 按依赖方向排列，首个键为环上字典序最小的键。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("检测到循环依赖: {}", render_cycle(.cycle))]
pub struct CyclicDependencyError {
    pub cycle: Vec<ComponentKey>,
}

impl CyclicDependencyError {
    /// 环上是否包含指定键
    pub fn involves(&self, key: &str) -> bool {
        self.cycle.iter().any(|k| k.as_str() == key)
    }
}

fn render_cycle(cycle: &[ComponentKey]) -> String {
    let mut path: Vec<&str> = cycle.iter().map(ComponentKey::as_str).collect();
    if let Some(first) = path.first().copied() {
        path.push(first);
    }
    path.join(" -> ")
}

/// 缺失依赖错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("组件 {dependent} 依赖的组件 {missing} 不存在")]
pub struct MissingDependencyError {
    pub dependent: ComponentKey,
    pub missing: ComponentKey,
}

/// 依赖图构建错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error(transparent)]
    CyclicDependency(#[from] CyclicDependencyError),

    #[error(transparent)]
    MissingDependency(#[from] MissingDependencyError),

    #[error("组件键重复: {key}")]
    DuplicateKey { key: ComponentKey },

    #[error("实例化计划中的组件 {key} 没有对应的描述符")]
    UnplannedKey { key: ComponentKey },
}

/// 组件构造错误
#[derive(Error, Debug)]
#[error("组件构造失败: {key}, 原因: {source}")]
pub struct ConstructionError {
    pub key: ComponentKey,
    pub source: ComponentFailure,
}

impl ConstructionError {
    pub fn new(key: impl Into<ComponentKey>, source: impl Into<ComponentFailure>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
        }
    }
}

/// 组件增强错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AugmentationError {
    #[error("组件 {key} 的能力面上不存在操作: {operation}")]
    UnknownOperation { key: ComponentKey, operation: String },

    #[error("组件 {key} 引用了未注册的拦截器: {interceptor}")]
    UnknownInterceptor {
        key: ComponentKey,
        interceptor: String,
    },

    #[error("组件 {key} 的能力 {capability} 没有可用的装饰器")]
    MissingDecorator { key: ComponentKey, capability: String },
}

/// 拦截器拒绝调用
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("拦截器 {interceptor} 拒绝调用 {component}::{operation}: {reason}")]
pub struct InterceptionError {
    pub component: ComponentKey,
    pub operation: String,
    pub interceptor: String,
    pub reason: String,
}

/// 依赖注入错误
///
/// 在组件构造函数内部产生，最终包装为 [`ConstructionError`]。
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("依赖槽 {slot} 解析到的组件 {key} 未在描述符中声明")]
    UndeclaredDependency { slot: String, key: ComponentKey },

    #[error("组件 {key} 不是期望的类型: {expected}")]
    TypeMismatch { key: ComponentKey, expected: String },

    #[error("缺少必需的属性: {path}")]
    MissingProperty { path: String },

    #[error("属性值无效: {path}, 原因: {source}")]
    InvalidProperty {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// 组件查找错误
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("组件未找到: {key}")]
    NotFound { key: ComponentKey },

    #[error("容器已关闭")]
    Closed,

    #[error("组件 {key} 未提供能力: {capability}")]
    CapabilityNotProvided { key: ComponentKey, capability: String },

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

impl LookupError {
    /// 是否为查找未命中
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// 容器构建错误
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Augmentation(#[from] AugmentationError),
}

impl From<CyclicDependencyError> for BuildError {
    fn from(err: CyclicDependencyError) -> Self {
        Self::Graph(err.into())
    }
}

impl From<MissingDependencyError> for BuildError {
    fn from(err: MissingDependencyError) -> Self {
        Self::Graph(err.into())
    }
}

/// 构建失败所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Scan,
    Graph,
    Construction,
    Augmentation,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scan => "scan",
            Self::Graph => "graph",
            Self::Construction => "construction",
            Self::Augmentation => "augmentation",
        };
        f.write_str(name)
    }
}

impl BuildError {
    pub fn stage(&self) -> BuildStage {
        match self {
            Self::Scan(_) => BuildStage::Scan,
            Self::Graph(_) => BuildStage::Graph,
            Self::Construction(_) => BuildStage::Construction,
            Self::Augmentation(_) => BuildStage::Augmentation,
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置加载失败: {message}")]
    LoadFailed { message: String },

    #[error("配置值无效: {key}, 原因: {message}")]
    InvalidValue { key: String, message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("容器构建失败: {source}")]
    BuildError {
        #[from]
        source: BuildError,
    },

    #[error("启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("容器宿主未运行, 当前状态: {state}")]
    NotRunning { state: String },
}

/// 结果类型别名
pub type ScanResult<T> = Result<T, ScanError>;
pub type BuildResult<T> = Result<T, BuildError>;
pub type LookupResult<T> = Result<T, LookupError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_closes_the_path() {
        let err = CyclicDependencyError {
            cycle: vec![ComponentKey::from("A"), ComponentKey::from("B")],
        };
        assert_eq!(err.to_string(), "检测到循环依赖: A -> B -> A");
        assert!(err.involves("B"));
        assert!(!err.involves("C"));
    }

    #[test]
    fn test_build_error_stage() {
        let err: BuildError = MissingDependencyError {
            dependent: ComponentKey::from("A"),
            missing: ComponentKey::from("Z"),
        }
        .into();
        assert_eq!(err.stage(), BuildStage::Graph);
        assert!(err.to_string().contains('Z'));
    }

    #[test]
    fn test_construction_error_keeps_source() {
        let err = ConstructionError::new("db", "连接被拒绝");
        assert_eq!(err.key.as_str(), "db");
        assert!(std::error::Error::source(&err).is_some());
    }
}
