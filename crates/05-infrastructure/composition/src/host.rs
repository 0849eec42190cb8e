//! 容器宿主
//!
//! 持有当前发布的注册表，负责重建与销毁。

use chrono::{DateTime, Utc};
use di_impl::{ContainerBuilder, Registry};
use infrastructure_common::InfrastructureError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 容器宿主
///
/// 查找方通过 [`ContainerHost::registry`] 取得当前注册表的共享引用。
/// 重建失败时保留原注册表继续服务。
pub struct ContainerHost {
    builder: ContainerBuilder,
    current: RwLock<Option<Arc<Registry>>>,
    /// 串行化构建
    build_lock: Mutex<()>,
    status: RwLock<HostStatus>,
    metrics: RwLock<HostMetrics>,
}

impl ContainerHost {
    /// 执行首次构建并进入运行状态
    pub(crate) async fn start(builder: ContainerBuilder) -> Result<Self, InfrastructureError> {
        let registry = builder.build().await.map_err(|e| {
            error!("容器首次构建失败: {}", e);
            e
        })?;

        let metrics = HostMetrics {
            started_at: Some(Utc::now()),
            builds: 1,
            last_build_id: Some(registry.build_id()),
            components: registry.len(),
            ..Default::default()
        };
        info!(
            "容器宿主已启动: 构建标识 {}, {} 个组件",
            registry.build_id(),
            registry.len()
        );

        Ok(Self {
            builder,
            current: RwLock::new(Some(registry)),
            build_lock: Mutex::new(()),
            status: RwLock::new(HostStatus::Running),
            metrics: RwLock::new(metrics),
        })
    }

    /// 当前发布的注册表
    pub fn registry(&self) -> Result<Arc<Registry>, InfrastructureError> {
        self.current
            .read()
            .clone()
            .ok_or_else(|| InfrastructureError::NotRunning {
                state: self.status().to_string(),
            })
    }

    /// 重新扫描并构建容器
    ///
    /// 成功时先发布新注册表，再销毁旧注册表：旧注册表停止接受查找，
    /// 单例按实例化的逆序执行销毁钩子。失败时保留旧注册表并记录错误。
    pub async fn reload(&self) -> Result<Arc<Registry>, InfrastructureError> {
        let _guard = self.build_lock.lock().await;
        self.ensure_running()?;
        info!("重新构建容器");

        match self.builder.build().await {
            Ok(registry) => {
                let previous = self.current.write().replace(registry.clone());

                {
                    let mut metrics = self.metrics.write();
                    metrics.builds += 1;
                    metrics.reloads += 1;
                    metrics.last_build_id = Some(registry.build_id());
                    metrics.components = registry.len();
                    metrics.last_error = None;
                }

                if let Some(previous) = previous {
                    info!("销毁被替换的注册表: 构建标识 {}", previous.build_id());
                    previous.shutdown();
                }

                info!("容器重建完成: 构建标识 {}", registry.build_id());
                Ok(registry)
            }
            Err(e) => {
                warn!("容器重建失败，继续使用原注册表: {}", e);
                let mut metrics = self.metrics.write();
                metrics.failed_reloads += 1;
                metrics.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// 停止宿主并销毁当前注册表，重复调用无效果
    pub async fn stop(&self) -> Result<(), InfrastructureError> {
        let _guard = self.build_lock.lock().await;
        if self.status() == HostStatus::Stopped {
            return Ok(());
        }

        info!("停止容器宿主");
        *self.status.write() = HostStatus::Stopping;

        let registry = self.current.write().take();
        if let Some(registry) = registry {
            registry.shutdown();
        }

        *self.status.write() = HostStatus::Stopped;
        self.metrics.write().stopped_at = Some(Utc::now());
        info!("容器宿主已停止");
        Ok(())
    }

    pub fn status(&self) -> HostStatus {
        *self.status.read()
    }

    /// 统计信息快照
    pub fn metrics(&self) -> HostMetrics {
        self.metrics.read().clone()
    }

    pub fn builder(&self) -> &ContainerBuilder {
        &self.builder
    }

    fn ensure_running(&self) -> Result<(), InfrastructureError> {
        match self.status() {
            HostStatus::Running => Ok(()),
            state => Err(InfrastructureError::NotRunning {
                state: state.to_string(),
            }),
        }
    }
}

impl fmt::Debug for ContainerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHost")
            .field("status", &self.status())
            .field("metrics", &self.metrics())
            .finish()
    }
}

/// 宿主运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostStatus {
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// 宿主统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMetrics {
    /// 启动时间
    pub started_at: Option<DateTime<Utc>>,
    /// 停止时间
    pub stopped_at: Option<DateTime<Utc>>,
    /// 成功构建次数，含首次构建
    pub builds: u64,
    /// 成功重建次数
    pub reloads: u64,
    pub failed_reloads: u64,
    /// 当前注册表的构建标识
    pub last_build_id: Option<Uuid>,
    /// 最近一次重建失败的原因，成功重建后清除
    pub last_error: Option<String>,
    /// 当前注册表中的组件数量
    pub components: usize,
}
