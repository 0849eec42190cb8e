//! 组件容器端到端集成测试
//!
//! 从组件清单目录构建容器，覆盖增强、属性注入、并发查找和重建失败。

use anyhow::Result;
use di_abstractions::{
    ComponentDefinition, ComponentLookup, ContainerConfig, Intercepted, ScanTarget,
};
use di_impl::{AccessInterceptor, ContainerBuilder, MetricsInterceptor, ProviderCatalog, Registry};
use infrastructure_common::{
    AugmentationError, BuildError, Component, InterceptionError, Lifecycle, LookupError,
    PropertyEnvironment, ScanError,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

/// 问候能力
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> Result<String, InterceptionError>;
    fn farewell(&self, name: &str) -> Result<String, InterceptionError>;
}

/// 时钟能力
trait Clock: Send + Sync {
    fn hour(&self) -> u32;
}

#[derive(Debug)]
struct FixedClock {
    hour: u32,
}

impl Component for FixedClock {}

impl Clock for FixedClock {
    fn hour(&self) -> u32 {
        self.hour
    }
}

#[derive(Debug)]
struct GreeterService {
    clock: Arc<FixedClock>,
    prefix: String,
}

impl Component for GreeterService {}

impl Greeter for GreeterService {
    fn greet(&self, name: &str) -> Result<String, InterceptionError> {
        Ok(format!("{} {} ({}h)", self.prefix, name, self.clock.hour()))
    }

    fn farewell(&self, name: &str) -> Result<String, InterceptionError> {
        Ok(format!("Bye {}", name))
    }
}

impl Greeter for Intercepted<dyn Greeter> {
    fn greet(&self, name: &str) -> Result<String, InterceptionError> {
        self.try_invoke("greet", |target| target.greet(name))
    }

    fn farewell(&self, name: &str) -> Result<String, InterceptionError> {
        self.try_invoke("farewell", |target| target.farewell(name))
    }
}

/// 按需组件，统计构造次数
#[derive(Debug)]
struct Session {
    serial: usize,
}

impl Component for Session {}

fn catalog(sessions: Arc<AtomicUsize>) -> ProviderCatalog {
    let mut catalog = ProviderCatalog::new();
    catalog
        .register(
            "core",
            ComponentDefinition::new("clock", |ctx| {
                Ok(FixedClock {
                    hour: ctx.optional_property("clock.hour")?.unwrap_or(12),
                })
            })
            .provides::<dyn Clock>(|clock| clock),
        )
        .unwrap()
        .register(
            "core",
            ComponentDefinition::new("greeter", |ctx| {
                Ok(GreeterService {
                    clock: ctx.get("clock")?,
                    prefix: ctx.property("prefix")?,
                })
            })
            .depends_on("clock")
            .operations(["greet", "farewell"])
            .provides::<dyn Greeter>(|service| service)
            .decorated::<dyn Greeter>(|proxy| Arc::new(proxy)),
        )
        .unwrap()
        .register(
            "web",
            ComponentDefinition::new("session", move |_| {
                Ok(Session {
                    serial: sessions.fetch_add(1, Ordering::SeqCst),
                })
            })
            .per_request(),
        )
        .unwrap();
    catalog
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

const MANIFEST: &str = r#"
[[component]]
key = "morning_clock"
provider = "FixedClock"

[component.properties]
clock = { hour = 8 }

[[component]]
key = "greeter"
provider = "GreeterService"

[component.bind]
clock = "morning_clock"

[component.properties]
prefix = "Hello"

[component.augment]
interceptors = ["access", "metrics"]
operations = ["greet"]

[[component]]
provider = "Session"
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    builder: ContainerBuilder,
    metrics: Arc<MetricsInterceptor>,
    sessions: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "components.toml", MANIFEST);

    let sessions = Arc::new(AtomicUsize::new(0));
    let metrics = Arc::new(MetricsInterceptor::new());
    let builder = ContainerBuilder::new(catalog(sessions.clone()))
        .scan(ScanTarget::directory(dir.path()))
        .with_interceptor(metrics.clone())
        .with_interceptor(Arc::new(AccessInterceptor::new().deny("greeter::farewell")))
        .with_config(ContainerConfig::default().with_properties(
            PropertyEnvironment::new().with_property("prefix", "Hi"),
        ));

    Fixture {
        _dir: dir,
        builder,
        metrics,
        sessions,
    }
}

#[tokio::test]
async fn test_manifest_build_with_bindings_and_properties() -> Result<()> {
    let fixture = fixture();
    let registry = fixture.builder.build().await?;

    assert_eq!(registry.keys().len(), 3);
    let greeter = registry.lookup_as::<dyn Greeter>("greeter")?;
    assert_eq!(greeter.greet("Steve")?, "Hello Steve (8h)");

    let descriptor = registry.descriptor("greeter").unwrap();
    assert_eq!(descriptor.dependencies()[0].as_str(), "morning_clock");
    Ok(())
}

#[tokio::test]
async fn test_augmented_operations_are_intercepted() -> Result<()> {
    let fixture = fixture();
    let registry = fixture.builder.build().await?;
    let greeter = registry.lookup_as::<dyn Greeter>("greeter")?;

    greeter.greet("Alex")?;
    greeter.greet("Sam")?;
    // farewell 未被指定，访问控制不生效，也不计入指标
    assert_eq!(greeter.farewell("Alex")?, "Bye Alex");

    let stats = fixture.metrics.stats("greeter::greet").unwrap();
    assert_eq!(stats.calls, 2);
    assert!(fixture.metrics.stats("greeter::farewell").is_none());
    assert!(registry.lookup("greeter")?.is_augmented());
    Ok(())
}

#[tokio::test]
async fn test_designating_an_unknown_operation_fails_the_build() {
    let fixture = fixture();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "broken.toml",
        "[[component]]\nkey = \"loud\"\nprovider = \"GreeterService\"\n\n[component.bind]\nclock = \"clock\"\n\n[component.augment]\noperations = [\"shout\"]\n\n[[component]]\nprovider = \"FixedClock\"\n",
    );

    let err = fixture
        .builder
        .clone()
        .scan(ScanTarget::directory(dir.path()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Augmentation(AugmentationError::UnknownOperation { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_per_request_lookups_yield_distinct_instances() -> Result<()> {
    let fixture = fixture();
    let registry = fixture.builder.build().await?;
    assert_eq!(fixture.sessions.load(Ordering::SeqCst), 0);

    // 两个任务在屏障处会合后同时查找
    let barrier = Arc::new(Barrier::new(2));
    let lookup = |registry: Arc<Registry>, barrier: Arc<Barrier>| {
        tokio::spawn(async move {
            barrier.wait().await;
            registry
                .lookup("session")
                .map(|handle| handle.downcast::<Session>())
        })
    };
    let first = lookup(registry.clone(), barrier.clone());
    let second = lookup(registry.clone(), barrier);
    let (first, second) = tokio::try_join!(first, second)?;
    let (first, second) = (first?.unwrap(), second?.unwrap());

    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.serial, second.serial);
    assert_eq!(fixture.sessions.load(Ordering::SeqCst), 2);
    assert_eq!(registry.descriptor("session").unwrap().lifecycle(), Lifecycle::PerRequest);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_singleton_lookups_are_consistent() -> Result<()> {
    let fixture = fixture();
    let registry = fixture.builder.build().await?;
    let expected = registry.lookup("morning_clock")?;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.lookup("morning_clock") })
        })
        .collect();

    for task in tasks {
        assert!(task.await??.ptr_eq(&expected));
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_rebuild_leaves_published_registry_intact() -> Result<()> {
    let fixture = fixture();
    let published = fixture.builder.build().await?;
    let before: Vec<String> = published.plan().iter().map(|key| key.to_string()).collect();

    let dir = tempfile::tempdir()?;
    write(
        dir.path(),
        "cycle.json",
        &json!({
            "component": [
                { "key": "left", "provider": "FixedClock", "depends_on": ["right"] },
                { "key": "right", "provider": "Session", "depends_on": ["left"] }
            ]
        })
        .to_string(),
    );

    let err = fixture
        .builder
        .clone()
        .scan(ScanTarget::directory(dir.path()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Graph(_)));

    let after: Vec<String> = published.plan().iter().map(|key| key.to_string()).collect();
    assert_eq!(before, after);
    assert!(published.is_accepting());
    assert_eq!(
        published.lookup_as::<dyn Greeter>("greeter")?.greet("Kim")?,
        "Hello Kim (8h)"
    );
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_provider_is_a_scan_error() {
    let fixture = fixture();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "extra.toml", "[[component]]\nprovider = \"Database\"\n");

    let err = fixture
        .builder
        .clone()
        .scan(ScanTarget::directory(dir.path()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Scan(ScanError::UnresolvedProvider { .. })
    ));
}

#[tokio::test]
async fn test_lookups_fail_after_shutdown() -> Result<()> {
    let fixture = fixture();
    let registry = fixture.builder.build().await?;
    registry.shutdown();

    assert!(matches!(registry.lookup("greeter"), Err(LookupError::Closed)));
    assert!(registry.contains("greeter"));
    Ok(())
}
