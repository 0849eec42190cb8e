//! 组件生命周期

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lifecycle {
    /// 单例模式 - 整个容器生命周期内只创建一个实例
    #[default]
    Singleton,
    /// 按需模式 - 每次查找都创建新实例
    #[serde(alias = "per_request", alias = "prototype", alias = "transient")]
    PerRequest,
}

impl Lifecycle {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::PerRequest => f.write_str("per-request"),
        }
    }
}

impl std::str::FromStr for Lifecycle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "per-request" | "per_request" | "prototype" | "transient" => Ok(Self::PerRequest),
            _ => Err(ConfigError::InvalidValue {
                key: "lifecycle".to_string(),
                message: format!("未知的生命周期: {}", s),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_from_str() {
        assert_eq!("singleton".parse::<Lifecycle>().unwrap(), Lifecycle::Singleton);
        assert_eq!("per-request".parse::<Lifecycle>().unwrap(), Lifecycle::PerRequest);
        assert_eq!("Prototype".parse::<Lifecycle>().unwrap(), Lifecycle::PerRequest);
        assert!("scoped".parse::<Lifecycle>().is_err());
    }

    #[test]
    fn test_lifecycle_serde_aliases() {
        let parsed: Lifecycle = serde_json::from_str("\"per_request\"").unwrap();
        assert_eq!(parsed, Lifecycle::PerRequest);
        assert_eq!(serde_json::to_string(&Lifecycle::PerRequest).unwrap(), "\"per-request\"");
    }
}
