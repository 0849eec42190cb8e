//! 描述符扫描器
//!
//! 把扫描目标转换为组件描述符：`package:` 目标直接读取提供者目录，
//! 目录与文件目标读取组件清单。文件系统目标并发读取，结果按组件键合并排序。

use crate::catalog::ProviderCatalog;
use crate::manifest::{ComponentManifest, ManifestEntry, ManifestFormat};
use async_trait::async_trait;
use di_abstractions::{ComponentProvider, ComponentScanner, ScanOptions, ScanTarget};
use futures::future::try_join_all;
use infrastructure_common::{ComponentDescriptor, ComponentKey, Origin, ScanError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 描述符扫描器
#[derive(Debug, Clone)]
pub struct DescriptorScanner {
    catalog: Arc<ProviderCatalog>,
    options: ScanOptions,
}

impl DescriptorScanner {
    pub fn new(catalog: Arc<ProviderCatalog>, options: ScanOptions) -> Self {
        Self { catalog, options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    async fn scan_target(&self, target: &ScanTarget) -> Result<Vec<ComponentDescriptor>, ScanError> {
        debug!("扫描目标: {}", target);
        match target {
            ScanTarget::Package(package) => self.scan_package(package),
            ScanTarget::Directory(root) => {
                let files = self.collect_manifests(root).await?;
                let batches = try_join_all(files.iter().map(|file| self.scan_file(file))).await?;
                Ok(batches.into_iter().flatten().collect())
            }
            ScanTarget::File(path) => self.scan_file(path).await,
        }
    }

    fn scan_package(&self, package: &str) -> Result<Vec<ComponentDescriptor>, ScanError> {
        let providers = self
            .catalog
            .package(package)
            .ok_or_else(|| ScanError::UnknownPackage {
                package: package.to_string(),
            })?;

        providers
            .iter()
            .map(|provider| {
                describe(
                    provider.as_ref(),
                    None,
                    Origin::Package {
                        name: package.to_string(),
                    },
                )
            })
            .collect()
    }

    /// 收集目录下的清单文件，按路径排序
    async fn collect_manifests(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut pending = vec![root.to_path_buf()];
        let mut manifests = Vec::new();

        while let Some(dir) = pending.pop() {
            let unreadable = |source| ScanError::UnreadableRoot {
                root: dir.clone(),
                source,
            };
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(unreadable)?;

            while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(unreadable)?;
                if file_type.is_dir() {
                    if self.options.recursive {
                        pending.push(path);
                    }
                } else if self.is_manifest(&path) {
                    manifests.push(path);
                }
            }
        }

        manifests.sort();
        Ok(manifests)
    }

    fn is_manifest(&self, path: &Path) -> bool {
        let accepted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.options.accepts_extension(ext));
        accepted && ManifestFormat::from_path(path).is_some()
    }

    async fn scan_file(&self, path: &Path) -> Result<Vec<ComponentDescriptor>, ScanError> {
        let format = ManifestFormat::from_path(path).ok_or_else(|| ScanError::MalformedManifest {
            path: path.to_path_buf(),
            message: "不支持的清单格式".to_string(),
        })?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScanError::UnreadableRoot {
                root: path.to_path_buf(),
                source,
            })?;
        let manifest = ComponentManifest::parse(&content, format, path)?;

        let mut descriptors = Vec::with_capacity(manifest.components.len());
        for (index, entry) in manifest.components.iter().enumerate() {
            let origin = Origin::Manifest {
                path: path.to_path_buf(),
                entry: index,
            };
            if !entry.enabled {
                debug!("跳过已禁用的清单条目: {}", origin);
                continue;
            }

            let provider = self.catalog.provider(&entry.provider).ok_or_else(|| {
                ScanError::UnresolvedProvider {
                    key: entry
                        .key
                        .clone()
                        .unwrap_or_else(|| ComponentKey::new(entry.provider.as_str())),
                    provider: entry.provider.clone(),
                    origin: origin.to_string(),
                }
            })?;
            descriptors.push(describe(provider.as_ref(), Some(entry), origin)?);
        }
        Ok(descriptors)
    }
}

/// 由提供者与可选的清单条目生成描述符
fn describe(
    provider: &dyn ComponentProvider,
    entry: Option<&ManifestEntry>,
    origin: Origin,
) -> Result<ComponentDescriptor, ScanError> {
    let invalid = |message: String| ScanError::InvalidDeclaration {
        origin: origin.to_string(),
        message,
    };

    let key = entry
        .and_then(|entry| entry.key.clone())
        .unwrap_or_else(|| provider.default_key().clone());
    if key.is_empty() {
        return Err(invalid(format!("提供者 {} 的组件键为空", provider.name())));
    }

    let mut descriptor = ComponentDescriptor::new(key, provider.name(), origin.clone())
        .with_lifecycle(provider.lifecycle());
    let mut augmentation = provider.augmentation().cloned();

    if let Some(entry) = entry {
        for (slot, target) in &entry.bind {
            if !provider.dependencies().contains(slot) {
                return Err(invalid(format!(
                    "提供者 {} 没有依赖槽 {}",
                    provider.name(),
                    slot
                )));
            }
            descriptor = descriptor.with_binding(slot.clone(), target.clone());
        }
        if let Some(lifecycle) = entry.lifecycle {
            descriptor = descriptor.with_lifecycle(lifecycle);
        }
        if entry.augment.is_some() {
            augmentation = entry.augment.clone();
        }
        descriptor = descriptor.with_properties(entry.properties.clone());
    }

    for slot in provider.dependencies() {
        let dependency = descriptor.resolve_slot(slot);
        descriptor = descriptor.with_dependency(dependency);
    }
    if let Some(entry) = entry {
        for dependency in &entry.depends_on {
            descriptor = descriptor.with_dependency(dependency);
        }
    }
    if let Some(augmentation) = augmentation {
        descriptor = descriptor.with_augmentation(augmentation);
    }

    Ok(descriptor)
}

/// 合并扫描结果：按组件键排序，键重复时报错
fn merge(batches: Vec<Vec<ComponentDescriptor>>) -> Result<Vec<ComponentDescriptor>, ScanError> {
    let mut descriptors: Vec<ComponentDescriptor> = batches.into_iter().flatten().collect();
    descriptors.sort_by(|a, b| a.key().cmp(b.key()));

    if let Some(pair) = descriptors.windows(2).find(|pair| pair[0].key() == pair[1].key()) {
        return Err(ScanError::DuplicateKey {
            key: pair[0].key().clone(),
            first: pair[0].origin().to_string(),
            second: pair[1].origin().to_string(),
        });
    }
    Ok(descriptors)
}

#[async_trait]
impl ComponentScanner for DescriptorScanner {
    async fn scan(&self, targets: &[ScanTarget]) -> Result<Vec<ComponentDescriptor>, ScanError> {
        let targets: BTreeSet<&ScanTarget> = targets.iter().collect();
        info!("开始扫描 {} 个目标", targets.len());

        let batches = if self.options.parallel {
            try_join_all(targets.iter().map(|target| self.scan_target(target))).await?
        } else {
            let mut batches = Vec::with_capacity(targets.len());
            for target in &targets {
                batches.push(self.scan_target(target).await?);
            }
            batches
        };

        let descriptors = merge(batches)?;
        info!("扫描完成，发现 {} 个组件描述符", descriptors.len());
        Ok(descriptors)
    }

    fn name(&self) -> &str {
        "descriptor-scanner"
    }

    fn supports(&self, target: &ScanTarget) -> bool {
        match target {
            ScanTarget::Package(package) => self.catalog.package(package).is_some(),
            ScanTarget::Directory(_) => true,
            ScanTarget::File(path) => ManifestFormat::from_path(path).is_some(),
        }
    }
}
