//! 宿主配置
//!
//! 从可选的 TOML/JSON 文件加载，再叠加 `ICICLE__` 前缀的环境变量，
//! 例如 `ICICLE__SCAN_ROOTS=dir:./components,package:core`、`ICICLE__LOGGING__JSON=true`。

use crate::builder::LoggingConfig;
use di_abstractions::{ContainerConfig, ScanTarget};
use infrastructure_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error};

/// 默认环境变量前缀
pub const ENV_PREFIX: &str = "ICICLE";

/// 宿主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// 扫描根，形如 `package:core`、`dir:./components`、`file:./app.toml`
    pub scan_roots: Vec<String>,
    pub logging: LoggingSettings,
    pub container: ContainerConfig,
}

/// 日志配置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 是否由宿主初始化日志
    pub enabled: bool,
    pub level: String,
    /// 是否输出 JSON
    pub json: bool,
    /// `EnvFilter` 指令，优先于 `level`
    pub filter: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            json: false,
            filter: None,
        }
    }
}

impl LoggingSettings {
    /// 转换为日志初始化配置
    pub fn to_config(&self) -> Result<LoggingConfig, ConfigError> {
        let level = tracing::Level::from_str(&self.level).map_err(|e| ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            message: e.to_string(),
        })?;

        let mut config = if self.json {
            LoggingConfig::production()
        } else {
            LoggingConfig::default()
        };
        config.level = level;
        config.json_format = self.json;
        config.filter = self.filter.clone();
        Ok(config)
    }
}

impl HostSettings {
    /// 使用默认前缀加载配置
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(file, ENV_PREFIX)
    }

    /// 使用指定前缀加载配置
    ///
    /// 给出的文件必须存在，环境变量覆盖文件中的同名项。
    pub fn load_with_prefix(file: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            debug!("加载宿主配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scan_roots"),
            )
            .build()
            .map_err(|e| {
                error!("宿主配置构建失败: {}", e);
                ConfigError::LoadFailed {
                    message: e.to_string(),
                }
            })?;

        settings.try_deserialize().map_err(|e| {
            error!("宿主配置绑定失败: {}", e);
            ConfigError::LoadFailed {
                message: e.to_string(),
            }
        })
    }

    /// 解析扫描根
    pub fn targets(&self) -> Result<Vec<ScanTarget>, ConfigError> {
        self.scan_roots
            .iter()
            .map(|root| ScanTarget::from_str(root))
            .collect()
    }
}
