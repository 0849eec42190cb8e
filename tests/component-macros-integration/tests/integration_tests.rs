//! 组件宏集成测试

use component_macros::{Component, Injectable};
use di_abstractions::{ComponentDefinition, ContainerConfig, Injectable as _, ScanTarget};
use di_impl::{ContainerBuilder, ProviderCatalog};
use infrastructure_common::{
    BuildError, Component as _, Lifecycle, PropertyEnvironment,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 时钟能力
trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> u64;
}

#[derive(Debug, Default, Component, Injectable)]
#[component(key = "clock")]
struct TickingClock {
    ticks: AtomicU64,
}

impl Clock for TickingClock {
    fn now(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::SeqCst)
    }
}

#[derive(Debug, Component, Injectable)]
#[component(key = "greeter")]
struct GreeterService {
    #[inject("clock")]
    clock: Arc<dyn Clock>,
    #[property("greeting.prefix")]
    prefix: String,
    #[property("greeting.punctuation", default)]
    punctuation: String,
}

impl GreeterService {
    fn greet(&self, name: &str) -> String {
        format!("{} {}{} @{}", self.prefix, name, self.punctuation, self.clock.now())
    }
}

#[derive(Debug, Component, Injectable)]
#[component(per_request)]
struct RequestContext {
    #[inject]
    greeter: Arc<GreeterService>,
    trail: Vec<String>,
}

fn catalog() -> ProviderCatalog {
    let mut catalog = ProviderCatalog::new();
    catalog
        .register(
            "app",
            ComponentDefinition::<TickingClock>::injectable()
                .provides::<dyn Clock>(|clock| clock),
        )
        .unwrap()
        .register("app", ComponentDefinition::<GreeterService>::injectable())
        .unwrap()
        .register("app", ComponentDefinition::<RequestContext>::injectable())
        .unwrap();
    catalog
}

fn properties() -> PropertyEnvironment {
    PropertyEnvironment::new().with_property("greeting", serde_json::json!({ "prefix": "Hello" }))
}

#[test]
fn test_generated_metadata() {
    assert_eq!(TickingClock::component_key(), "clock");
    assert_eq!(GreeterService::dependencies(), vec!["clock"]);
    assert_eq!(RequestContext::component_key(), "RequestContext");
    assert_eq!(RequestContext::dependencies(), vec!["greeter"]);
    assert_eq!(RequestContext::lifecycle(), Lifecycle::PerRequest);
    assert_eq!(TickingClock::default().name(), "clock");
}

#[tokio::test]
async fn test_derived_components_build_into_a_container() {
    let registry = ContainerBuilder::new(catalog())
        .scan(ScanTarget::package("app"))
        .with_config(ContainerConfig::default().with_properties(properties()))
        .build()
        .await
        .unwrap();

    let plan: Vec<&str> = registry.plan().iter().map(|key| key.as_str()).collect();
    assert_eq!(plan, vec!["clock", "greeter", "RequestContext"]);

    let greeter = registry
        .lookup("greeter")
        .unwrap()
        .downcast::<GreeterService>()
        .unwrap();
    assert_eq!(greeter.greet("Steve"), "Hello Steve @0");

    let first = registry.lookup("RequestContext").unwrap();
    let second = registry.lookup("RequestContext").unwrap();
    assert!(!first.ptr_eq(&second));

    let context = first.downcast::<RequestContext>().unwrap();
    assert!(Arc::ptr_eq(&context.greeter, &greeter));
    assert!(context.trail.is_empty());
}

#[tokio::test]
async fn test_missing_required_property_fails_construction() {
    let err = ContainerBuilder::new(catalog())
        .scan(ScanTarget::package("app"))
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::Construction(err) => {
            assert_eq!(err.key.as_str(), "greeter");
            assert!(err.to_string().contains("greeting.prefix"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
