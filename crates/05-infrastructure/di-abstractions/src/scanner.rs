//! 组件扫描器抽象接口
//!
//! 提供从扫描根中发现组件并产出描述符的能力

use async_trait::async_trait;
use infrastructure_common::{ComponentDescriptor, ConfigError, ScanError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 组件扫描器 trait
///
/// 扫描只产出描述符，绝不构造任何组件。
#[async_trait]
pub trait ComponentScanner: Send + Sync {
    /// 扫描一组目标，返回按组件键排序的描述符
    async fn scan(&self, targets: &[ScanTarget]) -> Result<Vec<ComponentDescriptor>, ScanError>;

    /// 获取扫描器名称
    fn name(&self) -> &str;

    /// 检查是否支持指定的扫描目标
    fn supports(&self, target: &ScanTarget) -> bool;
}

/// 扫描目标类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScanTarget {
    /// 代码中注册的提供者包
    Package(String),
    /// 包含组件清单的目录
    Directory(PathBuf),
    /// 单个组件清单文件
    File(PathBuf),
}

impl ScanTarget {
    pub fn package(name: impl Into<String>) -> Self {
        Self::Package(name.into())
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// 是否需要读取文件系统
    pub fn is_filesystem(&self) -> bool {
        !matches!(self, Self::Package(_))
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(name) => write!(f, "package:{}", name),
            Self::Directory(path) => write!(f, "dir:{}", path.display()),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

impl FromStr for ScanTarget {
    type Err = ConfigError;

    /// 解析 `package:<名称>`、`dir:<路径>` 或 `file:<路径>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: "scan_roots".to_string(),
            message: format!("{}: {}", message, s),
        };

        let (kind, value) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| invalid("扫描目标缺少类型前缀"))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid("扫描目标为空"));
        }

        match kind.trim().to_lowercase().as_str() {
            "package" | "pkg" => Ok(Self::Package(value.to_string())),
            "dir" | "directory" => Ok(Self::Directory(PathBuf::from(value))),
            "file" => Ok(Self::File(PathBuf::from(value))),
            _ => Err(invalid("未知的扫描目标类型")),
        }
    }
}

/// 扫描选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// 是否递归扫描子目录
    pub recursive: bool,
    /// 视为组件清单的文件扩展名
    pub manifest_extensions: Vec<String>,
    /// 是否并发读取扫描根
    pub parallel: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            manifest_extensions: vec!["toml".to_string(), "json".to_string()],
            parallel: true,
        }
    }
}

impl ScanOptions {
    /// 文件扩展名是否为组件清单
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.manifest_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
