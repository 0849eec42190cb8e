//! 容器宿主构建器

use crate::host::ContainerHost;
use crate::settings::HostSettings;
use di_abstractions::{ContainerConfig, Interceptor, ScanTarget};
use di_impl::{ContainerBuilder, InterceptorRegistry, ProviderCatalog};
use infrastructure_common::InfrastructureError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 容器宿主构建器
///
/// 使用建造者模式组装扫描目标、拦截器、容器配置和日志
pub struct ContainerHostBuilder {
    catalog: Arc<ProviderCatalog>,
    targets: Vec<ScanTarget>,
    interceptors: InterceptorRegistry,
    config: ContainerConfig,
    /// 是否启用日志初始化
    logging_enabled: bool,
    logging_config: LoggingConfig,
}

impl ContainerHostBuilder {
    pub fn new(catalog: impl Into<Arc<ProviderCatalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            targets: Vec::new(),
            interceptors: InterceptorRegistry::with_builtin(),
            config: ContainerConfig::default(),
            logging_enabled: false,
            logging_config: LoggingConfig::default(),
        }
    }

    /// 应用宿主配置
    ///
    /// 追加配置中的扫描根，替换容器配置，日志启用时一并配置日志。
    pub fn with_settings(mut self, settings: HostSettings) -> Result<Self, InfrastructureError> {
        let targets = settings.targets()?;
        info!("应用宿主配置: {} 个扫描根", targets.len());
        self.targets.extend(targets);
        self.config = settings.container;

        if settings.logging.enabled {
            let logging = settings.logging.to_config()?;
            self = self.with_logging(logging);
        }
        Ok(self)
    }

    /// 从配置文件和环境变量加载宿主配置
    pub fn load_settings<P: AsRef<Path>>(self, file: Option<P>) -> Result<Self, InfrastructureError> {
        let settings = HostSettings::load(file.as_ref().map(|path| path.as_ref()))?;
        self.with_settings(settings)
    }

    /// 添加扫描目标
    pub fn scan(mut self, target: ScanTarget) -> Self {
        debug!("添加扫描目标: {}", target);
        self.targets.push(target);
        self
    }

    pub fn scan_all(mut self, targets: impl IntoIterator<Item = ScanTarget>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// 注册拦截器
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        info!("注册拦截器: {}", interceptor.name());
        self.interceptors.register(interceptor);
        self
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建并启动容器宿主
    ///
    /// 首次构建失败视为致命错误，不会产生宿主。
    pub async fn build(self) -> Result<ContainerHost, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        info!("开始构建容器宿主: {} 个扫描目标", self.targets.len());
        let builder = ContainerBuilder::new(self.catalog)
            .scan_all(self.targets)
            .with_interceptors(self.interceptors)
            .with_config(self.config);

        ContainerHost::start(builder).await
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// `EnvFilter` 指令，设置后替代 `level`
    pub filter: Option<String>,
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 生效的过滤指令
    pub fn directive(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| self.level.as_str().to_lowercase())
    }

    /// 初始化全局日志订阅者
    ///
    /// `RUST_LOG` 存在时优先生效。
    pub fn init(&self) -> Result<(), InfrastructureError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directive()))
            .map_err(|e| InfrastructureError::BootstrapFailed {
                message: format!("日志过滤指令无效: {}", e),
            })?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_presets() {
        let development = LoggingConfig::development();
        assert_eq!(development.directive(), "debug");
        assert!(!development.json_format);

        let production = LoggingConfig {
            filter: Some("di_impl=trace,info".to_string()),
            ..LoggingConfig::production()
        };
        assert_eq!(production.directive(), "di_impl=trace,info");
        assert!(production.json_format);
    }

    #[test]
    fn test_settings_extend_targets() {
        let settings = HostSettings {
            scan_roots: vec!["package:core".to_string()],
            ..Default::default()
        };
        let builder = ContainerHostBuilder::new(ProviderCatalog::new())
            .scan(ScanTarget::package("web"))
            .with_settings(settings)
            .unwrap();

        assert_eq!(
            builder.targets,
            vec![ScanTarget::package("web"), ScanTarget::package("core")]
        );
        assert!(!builder.logging_enabled);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = HostSettings {
            scan_roots: vec!["core".to_string()],
            ..Default::default()
        };
        let result = ContainerHostBuilder::new(ProviderCatalog::new()).with_settings(settings);
        assert!(matches!(result, Err(InfrastructureError::ConfigError { .. })));
    }
}
