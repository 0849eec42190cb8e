use component_macros::{Component, Injectable};
use di_abstractions::{ComponentDefinition, ComponentProvider, Injectable as _};
use infrastructure_common::Lifecycle;
use std::sync::Arc;

trait Clock: Send + Sync + std::fmt::Debug {}

#[derive(Debug, Component, Injectable)]
struct SystemClock;

#[derive(Debug, Component, Injectable)]
#[component(key = "session", per_request)]
struct Session {
    #[inject("clock")]
    clock: Arc<dyn Clock>,
    #[inject]
    store: Arc<SystemClock>,
    #[property("session.ttl", default)]
    ttl: u64,
    visits: Vec<String>,
}

fn main() {
    assert_eq!(Session::component_key(), "session");
    assert_eq!(Session::lifecycle(), Lifecycle::PerRequest);
    assert_eq!(Session::dependencies(), vec!["clock", "store"]);

    let definition = ComponentDefinition::<Session>::injectable();
    assert_eq!(definition.default_key().as_str(), "session");
    assert_eq!(SystemClock::dependencies(), Vec::<&str>::new());
}
