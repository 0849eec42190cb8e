//! # 容器组合层
//!
//! 将组件目录、宿主配置、日志和容器构建组合成可运行的容器宿主。
//!
//! ## 主要功能
//!
//! - **宿主构建器**: 使用构建者模式组装扫描目标、拦截器和日志
//! - **宿主配置**: 配置文件叠加 `ICICLE__` 环境变量
//! - **生命周期管理**: 首次构建、重建与销毁
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::ScanTarget;
//! use di_impl::ProviderCatalog;
//! use infrastructure_composition::{ContainerHostBuilder, LoggingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = ContainerHostBuilder::new(ProviderCatalog::new())
//!         .load_settings(Some("config/host.toml"))?
//!         .scan(ScanTarget::directory("./components"))
//!         .with_logging(LoggingConfig::development())
//!         .build()
//!         .await?;
//!
//!     let registry = host.registry()?;
//!     println!("已加载 {} 个组件", registry.len());
//!
//!     host.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod host;
pub mod settings;

pub use builder::{ContainerHostBuilder, LoggingConfig};
pub use host::{ContainerHost, HostMetrics, HostStatus};
pub use settings::{HostSettings, LoggingSettings, ENV_PREFIX};

pub use infrastructure_common::InfrastructureError;

/// 容器版本
pub const ICICLE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 启动横幅
pub fn banner() -> String {
    format!("Icicle 组件容器 v{}", ICICLE_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_carries_version() {
        assert!(banner().ends_with(ICICLE_VERSION));
        assert!(!ICICLE_VERSION.is_empty());
    }
}
