//! # Infrastructure Common
//!
//! 这个 crate 提供了 Icicle 组件容器的公共组件模型和错误类型。
//!
//! ## 核心类型
//!
//! - [`Component`] - 组件基础 trait（生命周期钩子）
//! - [`ComponentKey`] - 组件的稳定标识
//! - [`ComponentDescriptor`] - 扫描阶段产出的不可变组件描述符
//! - [`ComponentHandle`] - 已构建组件的实例句柄与能力表
//! - [`PropertyEnvironment`] - 属性注入使用的配置环境
//!
//! ## 设计原则
//!
//! - 显式注册，不依赖运行时反射
//! - 描述符一经创建不可修改
//! - 错误类型化，绝不静默替换为默认组件

pub mod capability;
pub mod component;
pub mod descriptor;
pub mod errors;
pub mod lifecycle;
pub mod properties;

pub use capability::*;
pub use component::*;
pub use descriptor::*;
pub use errors::*;
pub use lifecycle::*;
pub use properties::*;
