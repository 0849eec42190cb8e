//! # 组件容器具体实现
//!
//! 扫描 → 依赖图 → 实例化计划 → 实例化引擎（含增强层）→ 注册表。
//!
//! ```ignore
//! let mut catalog = ProviderCatalog::new();
//! catalog.register("core", ComponentDefinition::new("clock", |_| Ok(SystemClock)))?;
//!
//! let registry = ContainerBuilder::new(catalog)
//!     .scan(ScanTarget::package("core"))
//!     .build()
//!     .await?;
//! let clock = registry.lookup("clock")?;
//! ```

pub mod catalog;
pub mod container;
pub mod engine;
pub mod graph;
pub mod interceptors;
pub mod manifest;
pub mod proxy;
pub mod registry;
pub mod scanner;

pub use catalog::ProviderCatalog;
pub use container::{build_container, build_from_descriptors, ContainerBuilder};
pub use engine::InstantiationEngine;
pub use graph::{DependencyGraph, InstantiationPlan};
pub use interceptors::{AccessInterceptor, LoggingInterceptor, MetricsInterceptor, OperationStats};
pub use manifest::{ComponentManifest, ManifestEntry, ManifestFormat};
pub use proxy::{AugmentationLayer, InterceptorRegistry};
pub use registry::{CapabilityIter, Registry};
pub use scanner::DescriptorScanner;
