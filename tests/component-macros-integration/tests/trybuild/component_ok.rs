use component_macros::Component;
use infrastructure_common::Component as _;

#[derive(Debug, Component)]
struct OkService;

#[derive(Debug, Component)]
#[component(key = "utc_clock")]
struct SystemClock;

fn main() {
    assert_eq!(OkService.name(), "OkService");
    assert_eq!(SystemClock.name(), "utc_clock");
}
