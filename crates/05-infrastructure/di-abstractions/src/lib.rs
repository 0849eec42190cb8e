//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件扫描、构造、增强和查找的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentScanner`] - 组件扫描器接口
//! - [`ComponentProvider`] - 组件提供者接口，[`ComponentDefinition`] 为其类型化实现
//! - [`InjectionContext`] - 构造期间的依赖与属性注入
//! - [`Interceptor`] - 拦截器接口，[`Intercepted`] 为增强后的能力
//! - [`ComponentLookup`] - 已发布注册表的只读查找接口

pub mod container;
pub mod factory;
pub mod interceptor;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use container::*;
pub use factory::*;
pub use interceptor::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
