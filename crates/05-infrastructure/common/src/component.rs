//! 组件基础接口定义
//!
//! 提供所有容器托管组件必须实现的基础 trait 以及组件标识

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Debug};

/// 组件作者返回的失败类型
pub type ComponentFailure = Box<dyn std::error::Error + Send + Sync>;

/// 组件基础 trait
///
/// 所有由容器托管的组件都必须实现此 trait。钩子方法都接收 `&self`，
/// 需要可变状态的组件自行使用内部可变性。
pub trait Component: Send + Sync + Debug + 'static {
    /// 组件名称，默认为类型名
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// 构造完成、注入依赖之后调用的初始化钩子
    fn post_construct(&self) -> Result<(), ComponentFailure> {
        Ok(())
    }

    /// 容器销毁时调用，按实例化顺序的逆序执行
    fn pre_destroy(&self) {}
}

/// 组件键
///
/// 组件在容器中的稳定标识，按字典序全序排列。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKey(String);

impl ComponentKey {
    /// 创建新的组件键
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 获取字符串表示
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为空键
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ComponentKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&ComponentKey> for ComponentKey {
    fn from(value: &ComponentKey) -> Self {
        value.clone()
    }
}

impl Borrow<str> for ComponentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ComponentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
