//! 内置拦截器

use dashmap::DashMap;
use di_abstractions::{Interceptor, Invocation, Outcome};
use infrastructure_common::InterceptionError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, warn};

/// 日志拦截器
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    pub const NAME: &'static str = "logging";
}

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before(&self, invocation: &Invocation<'_>) -> Result<(), InterceptionError> {
        debug!(
            "调用开始: {} (能力: {})",
            invocation.qualified_operation(),
            invocation.capability
        );
        Ok(())
    }

    fn after(&self, invocation: &Invocation<'_>, outcome: &Outcome) {
        if outcome.succeeded {
            debug!(
                "调用完成: {}, elapsed={:?}",
                invocation.qualified_operation(),
                outcome.elapsed
            );
        } else {
            warn!(
                "调用失败: {}, elapsed={:?}",
                invocation.qualified_operation(),
                outcome.elapsed
            );
        }
    }
}

/// 单个操作的调用统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    pub calls: u64,
    pub failures: u64,
    pub total_elapsed: Duration,
}

impl OperationStats {
    /// 平均耗时
    pub fn average_elapsed(&self) -> Duration {
        match u32::try_from(self.calls) {
            Ok(calls) if calls > 0 => self.total_elapsed / calls,
            _ => Duration::ZERO,
        }
    }
}

/// 指标拦截器
///
/// 按 `组件::操作` 统计调用次数、失败次数和累计耗时。
#[derive(Debug, Default)]
pub struct MetricsInterceptor {
    stats: DashMap<String, OperationStats>,
}

impl MetricsInterceptor {
    pub const NAME: &'static str = "metrics";

    pub fn new() -> Self {
        Self::default()
    }

    /// 获取单个操作的统计
    pub fn stats(&self, qualified_operation: &str) -> Option<OperationStats> {
        self.stats.get(qualified_operation).map(|entry| *entry.value())
    }

    /// 获取全部统计，按操作排序
    pub fn snapshot(&self) -> BTreeMap<String, OperationStats> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn reset(&self) {
        self.stats.clear();
    }
}

impl Interceptor for MetricsInterceptor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn after(&self, invocation: &Invocation<'_>, outcome: &Outcome) {
        let mut stats = self
            .stats
            .entry(invocation.qualified_operation())
            .or_default();
        stats.calls += 1;
        if !outcome.succeeded {
            stats.failures += 1;
        }
        stats.total_elapsed += outcome.elapsed;
    }
}

/// 访问控制拦截器
///
/// 拒绝列表中的条目可以是操作名，也可以是 `组件::操作`。
#[derive(Debug, Default, Clone)]
pub struct AccessInterceptor {
    denied: BTreeSet<String>,
}

impl AccessInterceptor {
    pub const NAME: &'static str = "access";

    pub fn new() -> Self {
        Self::default()
    }

    /// 拒绝指定操作
    pub fn deny(mut self, operation: impl Into<String>) -> Self {
        self.denied.insert(operation.into());
        self
    }

    pub fn is_denied(&self, invocation: &Invocation<'_>) -> bool {
        self.denied.contains(invocation.operation)
            || self.denied.contains(&invocation.qualified_operation())
    }
}

impl Interceptor for AccessInterceptor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before(&self, invocation: &Invocation<'_>) -> Result<(), InterceptionError> {
        if self.is_denied(invocation) {
            warn!("拒绝访问: {}", invocation.qualified_operation());
            return Err(invocation.reject(Self::NAME, "操作被访问控制拒绝"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::ComponentKey;

    fn outcome(succeeded: bool) -> Outcome {
        Outcome {
            elapsed: Duration::from_millis(4),
            succeeded,
        }
    }

    #[test]
    fn test_metrics_accumulate_per_operation() {
        let metrics = MetricsInterceptor::new();
        let key = ComponentKey::from("greeter");
        let invocation = Invocation {
            component: &key,
            capability: "Greeter",
            operation: "greet",
        };

        metrics.after(&invocation, &outcome(true));
        metrics.after(&invocation, &outcome(false));

        let stats = metrics.stats("greeter::greet").unwrap();
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.average_elapsed(), Duration::from_millis(4));
        assert_eq!(metrics.snapshot().len(), 1);

        metrics.reset();
        assert!(metrics.stats("greeter::greet").is_none());
    }

    #[test]
    fn test_access_denies_by_operation_or_qualified_name() {
        let access = AccessInterceptor::new().deny("shutdown").deny("vault::open");
        let vault = ComponentKey::from("vault");
        let shop = ComponentKey::from("shop");
        fn invocation<'a>(component: &'a ComponentKey, operation: &'a str) -> Invocation<'a> {
            Invocation {
                component,
                capability: "Service",
                operation,
            }
        }

        assert!(access.before(&invocation(&shop, "shutdown")).is_err());
        assert!(access.before(&invocation(&vault, "open")).is_err());
        assert!(access.before(&invocation(&shop, "open")).is_ok());
    }

    #[test]
    fn test_logging_never_rejects() {
        let key = ComponentKey::from("greeter");
        let invocation = Invocation {
            component: &key,
            capability: "Greeter",
            operation: "greet",
        };
        assert!(LoggingInterceptor.before(&invocation).is_ok());
    }
}
