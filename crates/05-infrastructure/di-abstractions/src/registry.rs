//! 组件查找抽象接口

use infrastructure_common::{ComponentHandle, ComponentKey, LookupError};
use std::sync::Arc;

/// 组件查找 trait
///
/// 已发布注册表对外提供的只读接口，不包含任何修改操作。
pub trait ComponentLookup: Send + Sync {
    /// 按键查找组件
    fn lookup(&self, key: &str) -> Result<ComponentHandle, LookupError>;

    /// 检查组件是否已注册
    fn contains(&self, key: &str) -> bool;

    /// 按实例化顺序返回所有组件键
    fn keys(&self) -> Vec<ComponentKey>;

    /// 按键查找组件并取出指定能力
    fn lookup_as<C>(&self, key: &str) -> Result<Arc<C>, LookupError>
    where
        Self: Sized,
        C: ?Sized + Send + Sync + 'static,
    {
        let handle = self.lookup(key)?;
        handle
            .capability::<C>()
            .ok_or_else(|| LookupError::CapabilityNotProvided {
                key: handle.key().clone(),
                capability: std::any::type_name::<C>().to_string(),
            })
    }
}
