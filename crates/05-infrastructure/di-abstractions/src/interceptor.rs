//! 拦截器抽象接口
//!
//! 增强层把组件的能力包装进 [`Intercepted`]，由用户编写的装饰器在每个能力
//! 操作中调用 [`Intercepted::invoke`]。被指定的操作依次经过拦截器链：
//! `before` 按声明顺序执行并可以拒绝调用，`after` 按逆序执行并观察耗时和结果。
//! 未被指定的操作直接委托给原始实例。

use infrastructure_common::{ComponentKey, InterceptionError};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// 一次被拦截的调用
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// 组件键
    pub component: &'a ComponentKey,
    /// 能力类型名
    pub capability: &'static str,
    /// 操作名称
    pub operation: &'a str,
}

impl Invocation<'_> {
    /// 构造拒绝本次调用的错误
    pub fn reject(&self, interceptor: &str, reason: impl Into<String>) -> InterceptionError {
        InterceptionError {
            component: self.component.clone(),
            operation: self.operation.to_string(),
            interceptor: interceptor.to_string(),
            reason: reason.into(),
        }
    }

    /// `组件::操作` 形式的标识
    pub fn qualified_operation(&self) -> String {
        format!("{}::{}", self.component, self.operation)
    }
}

/// 调用结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub elapsed: Duration,
    pub succeeded: bool,
}

/// 拦截器 trait
pub trait Interceptor: Send + Sync + Debug {
    /// 拦截器名称，在增强需求中按此名称引用
    fn name(&self) -> &str;

    /// 委托之前调用，返回错误即拒绝本次调用
    fn before(&self, _invocation: &Invocation<'_>) -> Result<(), InterceptionError> {
        Ok(())
    }

    /// 委托完成之后调用，被拒绝的调用不会触发
    fn after(&self, _invocation: &Invocation<'_>, _outcome: &Outcome) {}
}

/// 一个组件的拦截配置
#[derive(Debug, Clone)]
pub struct Advice {
    component: ComponentKey,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    designated: Option<Arc<BTreeSet<String>>>,
}

impl Advice {
    /// 创建拦截配置，`designated` 为 `None` 表示拦截所有操作
    pub fn new(
        component: ComponentKey,
        interceptors: Vec<Arc<dyn Interceptor>>,
        designated: Option<BTreeSet<String>>,
    ) -> Self {
        Self {
            component,
            interceptors: interceptors.into(),
            designated: designated.map(Arc::new),
        }
    }

    pub fn component(&self) -> &ComponentKey {
        &self.component
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    /// 操作是否需要拦截
    pub fn designates(&self, operation: &str) -> bool {
        self.designated
            .as_ref()
            .map_or(true, |designated| designated.contains(operation))
    }
}

/// 被增强的能力
///
/// 装饰器实现能力 trait 时在每个方法中调用 [`Intercepted::invoke`] 或
/// [`Intercepted::try_invoke`]。
pub struct Intercepted<C: ?Sized> {
    target: Arc<C>,
    advice: Advice,
    capability: &'static str,
}

impl<C: ?Sized> Intercepted<C> {
    pub fn new(target: Arc<C>, advice: Advice) -> Self {
        Self {
            target,
            advice,
            capability: std::any::type_name::<C>(),
        }
    }

    /// 原始能力实例
    pub fn target(&self) -> &Arc<C> {
        &self.target
    }

    pub fn advice(&self) -> &Advice {
        &self.advice
    }

    /// 执行一个不会失败的操作
    pub fn invoke<R>(&self, operation: &str, call: impl FnOnce(&C) -> R) -> Result<R, InterceptionError> {
        self.try_invoke(operation, |target| Ok::<R, InterceptionError>(call(target)))
    }

    /// 执行一个可能失败的操作，失败同样会以 `succeeded = false` 通知 `after`
    pub fn try_invoke<R, E>(
        &self,
        operation: &str,
        call: impl FnOnce(&C) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<InterceptionError>,
    {
        if !self.advice.designates(operation) {
            return call(&self.target);
        }

        let invocation = Invocation {
            component: &self.advice.component,
            capability: self.capability,
            operation,
        };

        for interceptor in self.advice.interceptors.iter() {
            if let Err(rejection) = interceptor.before(&invocation) {
                debug!(
                    "拦截器 {} 拒绝调用 {}",
                    interceptor.name(),
                    invocation.qualified_operation()
                );
                return Err(rejection.into());
            }
        }

        let started = Instant::now();
        let result = call(&self.target);
        let outcome = Outcome {
            elapsed: started.elapsed(),
            succeeded: result.is_ok(),
        };

        for interceptor in self.advice.interceptors.iter().rev() {
            interceptor.after(&invocation, &outcome);
        }

        result
    }
}

impl<C: ?Sized> Debug for Intercepted<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Intercepted")
            .field("capability", &self.capability)
            .field("advice", &self.advice)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    trait Counter: Send + Sync {
        fn next(&self) -> u32;
    }

    #[derive(Debug)]
    struct Fixed(u32);

    impl Counter for Fixed {
        fn next(&self) -> u32 {
            self.0
        }
    }

    #[derive(Debug)]
    struct Recording {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
        veto: bool,
    }

    impl Interceptor for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn before(&self, invocation: &Invocation<'_>) -> Result<(), InterceptionError> {
            self.journal.lock().push(format!("{}:before", self.name));
            if self.veto {
                return Err(invocation.reject(self.name, "禁止"));
            }
            Ok(())
        }

        fn after(&self, _invocation: &Invocation<'_>, outcome: &Outcome) {
            self.journal
                .lock()
                .push(format!("{}:after:{}", self.name, outcome.succeeded));
        }
    }

    fn recording(name: &'static str, journal: &Arc<Mutex<Vec<String>>>, veto: bool) -> Arc<dyn Interceptor> {
        Arc::new(Recording {
            name,
            journal: journal.clone(),
            veto,
        })
    }

    fn intercepted(interceptors: Vec<Arc<dyn Interceptor>>, designated: Option<&[&str]>) -> Intercepted<dyn Counter> {
        let target: Arc<dyn Counter> = Arc::new(Fixed(7));
        let designated = designated.map(|ops| ops.iter().map(|op| op.to_string()).collect());
        Intercepted::new(target, Advice::new(ComponentKey::from("counter"), interceptors, designated))
    }

    #[test]
    fn test_before_in_order_after_in_reverse() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let proxy = intercepted(
            vec![recording("outer", &journal, false), recording("inner", &journal, false)],
            None,
        );

        assert_eq!(proxy.invoke("next", |c| c.next()).unwrap(), 7);
        assert_eq!(
            *journal.lock(),
            vec!["outer:before", "inner:before", "inner:after:true", "outer:after:true"]
        );
    }

    #[test]
    fn test_rejection_skips_target_and_after_hooks() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let proxy = intercepted(
            vec![recording("guard", &journal, true), recording("audit", &journal, false)],
            None,
        );

        let err = proxy.invoke("next", |c| c.next()).unwrap_err();
        assert_eq!(err.interceptor, "guard");
        assert_eq!(err.operation, "next");
        assert_eq!(*journal.lock(), vec!["guard:before"]);
    }

    #[test]
    fn test_undesignated_operation_delegates_directly() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let proxy = intercepted(vec![recording("guard", &journal, true)], Some(&["reset"]));

        assert_eq!(proxy.invoke("next", |c| c.next()).unwrap(), 7);
        assert!(journal.lock().is_empty());
    }

    #[test]
    fn test_failed_call_reported_to_after() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let proxy = intercepted(vec![recording("audit", &journal, false)], None);

        let result: Result<u32, InterceptionError> = proxy.try_invoke("next", |_| {
            Err(Invocation {
                component: &ComponentKey::from("counter"),
                capability: "Counter",
                operation: "next",
            }
            .reject("target", "失败"))
        });
        assert!(result.is_err());
        assert_eq!(*journal.lock(), vec!["audit:before", "audit:after:false"]);
    }
}
