//! 演示组件

use chrono::{DateTime, Utc};
use component_macros::{Component, Injectable};
use di_abstractions::{ComponentDefinition, Intercepted};
use di_impl::ProviderCatalog;
use infrastructure_common::{Component, ComponentFailure, InterceptionError, ScanError};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 演示组件所在的包
pub const PACKAGE: &str = "demo";

/// 问候能力
pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> Result<String, InterceptionError>;
}

#[derive(Debug, Component, Injectable)]
#[component(key = "clock")]
pub struct SystemClock;

impl SystemClock {
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Injectable)]
#[component(key = "greeter")]
pub struct GreeterService {
    #[inject]
    clock: Arc<SystemClock>,
    #[property("greeting.prefix", default)]
    prefix: String,
}

impl Component for GreeterService {
    fn post_construct(&self) -> Result<(), ComponentFailure> {
        info!("问候服务已就绪: {}", self.prefix());
        Ok(())
    }

    fn pre_destroy(&self) {
        info!("问候服务已销毁");
    }
}

impl GreeterService {
    fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "Hello"
        } else {
            &self.prefix
        }
    }
}

impl Greeter for GreeterService {
    fn greet(&self, name: &str) -> Result<String, InterceptionError> {
        Ok(format!(
            "{}, {}! ({})",
            self.prefix(),
            name,
            self.clock.now().format("%H:%M:%S")
        ))
    }
}

impl Greeter for Intercepted<dyn Greeter> {
    fn greet(&self, name: &str) -> Result<String, InterceptionError> {
        self.try_invoke("greet", |target| target.greet(name))
    }
}

/// 请求标识，每个请求作用域各自生成
#[derive(Debug)]
pub struct RequestId(pub Uuid);

impl Default for RequestId {
    fn default() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Component, Injectable)]
#[component(key = "request", per_request)]
pub struct RequestScope {
    pub id: RequestId,
    #[inject]
    pub greeter: Arc<GreeterService>,
}

/// 注册演示组件
pub fn catalog() -> Result<ProviderCatalog, ScanError> {
    let mut catalog = ProviderCatalog::new();
    catalog
        .register(PACKAGE, ComponentDefinition::<SystemClock>::injectable())?
        .register(
            PACKAGE,
            ComponentDefinition::<GreeterService>::injectable()
                .operations(["greet"])
                .provides::<dyn Greeter>(|service| service)
                .decorated::<dyn Greeter>(|proxy| Arc::new(proxy)),
        )?
        .register(PACKAGE, ComponentDefinition::<RequestScope>::injectable())?;
    Ok(catalog)
}
