//! # 组件容器演示程序
//!
//! 从组件清单目录构建容器，打印实例化计划并演示查找、增强与重建。

mod components;

use anyhow::{Context, Result};
use clap::Parser;
use components::{Greeter, RequestScope};
use di_abstractions::ScanTarget;
use di_impl::MetricsInterceptor;
use infrastructure_composition::{banner, ContainerHostBuilder, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "container-demo")]
#[command(about = "Icicle 组件容器演示")]
struct Args {
    /// 组件清单目录
    #[arg(short = 'd', long, default_value = "demos/container-demo/components")]
    components: PathBuf,

    /// 宿主配置文件（TOML/JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 扫描代码中注册的演示包，而不是清单目录
    #[arg(long)]
    package: bool,

    /// 问候对象
    #[arg(short, long, default_value = "Icicle")]
    name: String,

    /// 日志过滤指令
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 日志
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    println!("{}", banner());

    let mut logging = if args.json {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    logging.filter = Some(args.log_level.clone());

    let metrics = Arc::new(MetricsInterceptor::new());
    let mut builder = ContainerHostBuilder::new(components::catalog()?)
        .load_settings(args.config.as_ref())?
        .with_interceptor(metrics.clone())
        .with_logging(logging);
    builder = if args.package {
        builder.scan(ScanTarget::package(components::PACKAGE))
    } else {
        builder.scan(ScanTarget::directory(&args.components))
    };

    let host = builder.build().await.context("容器构建失败")?;
    let registry = host.registry()?;

    println!("\n实例化计划:");
    for (position, key) in registry.plan().iter().enumerate() {
        if let Some(descriptor) = registry.descriptor(key.as_str()) {
            println!(
                "  {:>2}. {} ({}, {}) <- {}",
                position + 1,
                key,
                descriptor.lifecycle(),
                descriptor.origin(),
                descriptor
                    .dependencies()
                    .iter()
                    .map(|dependency| dependency.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    let stats = registry.stats();
    println!(
        "\n构建 {}: {} 个组件, {} 个单例, {} 个按需, {} 个增强, 耗时 {}ms",
        stats.build_id,
        stats.descriptors,
        stats.singletons,
        stats.per_request,
        stats.augmented,
        stats.build_duration_ms
    );

    if registry.contains("greeter") {
        let greeter = registry.lookup_as::<dyn Greeter>("greeter")?;
        println!("\n{}", greeter.greet(&args.name)?);
        println!("{}", greeter.greet("world")?);
    }

    for greeter in registry.lookup_by_capability::<dyn Greeter>() {
        info!("能力查找命中: {}", greeter?.greet("capability")?);
    }

    if registry.contains("request") {
        let first = registry.lookup("request")?.downcast::<RequestScope>();
        let second = registry.lookup("request")?.downcast::<RequestScope>();
        if let (Some(first), Some(second)) = (first, second) {
            println!("\n请求作用域: {} / {}", first.id.0, second.id.0);
            println!(
                "共享问候服务: {}",
                Arc::ptr_eq(&first.greeter, &second.greeter)
            );
        }
    }

    println!("\n调用统计:");
    for (operation, stats) in metrics.snapshot() {
        println!(
            "  {}: {} 次调用, {} 次失败, 平均 {:?}",
            operation,
            stats.calls,
            stats.failures,
            stats.average_elapsed()
        );
    }

    let reloaded = host.reload().await?;
    println!("\n重建完成: {} -> {}", registry.build_id(), reloaded.build_id());

    host.stop().await?;
    info!("演示结束");
    Ok(())
}
