//! 属性环境
//!
//! 属性注入的数据来源，支持以点号分隔的嵌套路径

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 属性环境
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyEnvironment {
    values: Map<String, Value>,
}

impl PropertyEnvironment {
    /// 创建空的属性环境
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// 设置顶层属性
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// 按路径获取属性
    ///
    /// 完整键优先匹配，其次按 `.` 逐级进入嵌套对象。
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// 是否包含指定路径
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// 属性数量（仅顶层）
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
