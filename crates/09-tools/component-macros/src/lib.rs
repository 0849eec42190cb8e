//! # Component Macros
//!
//! 编译时生成组件定义的过程宏，替代运行时的类型扫描。
//!
//! ## 核心宏
//!
//! - [`Injectable`](derive@Injectable) - 生成组件键、生命周期、依赖槽和构造函数
//! - [`Component`](derive@Component) - 生成空的生命周期钩子实现
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::{Component, Injectable};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Component, Injectable)]
//! #[component(key = "greeter")]
//! pub struct GreeterService {
//!     #[inject]
//!     clock: Arc<SystemClock>,
//!     #[property("greeting.prefix", default)]
//!     prefix: String,
//! }
//!
//! catalog.register("core", ComponentDefinition::<GreeterService>::injectable())?;
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod component;
mod injectable;
mod utils;

/// 组件派生宏
///
/// 为结构体实现 `Component`，`name()` 返回组件键。
///
/// # 参数
///
/// - `key = "custom_key"` - 自定义组件键（默认为结构体名）
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Debug, Component)]
/// #[component(key = "utc_clock")]
/// pub struct SystemClock;
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_component_impl(input)
}

/// 注入派生宏
///
/// 为结构体实现 `di_abstractions::Injectable`，
/// 之后可通过 `ComponentDefinition::<T>::injectable()` 注册。
///
/// # 参数
///
/// - `#[component(key = "...")]` - 组件键（默认为结构体名）
/// - `#[component(per_request)]` - 每次查找构造新实例（默认单例）
/// - `#[inject]` / `#[inject("slot")]` - `Arc<T>` 字段按依赖槽注入，槽名默认为字段名；
///   `Arc<dyn Trait>` 字段按能力注入
/// - `#[property("path")]` - 必需属性，`#[property("path", default)]` 缺失时取默认值
///
/// 未标注的字段使用 `Default::default()`。
#[proc_macro_derive(Injectable, attributes(component, inject, property))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
}
