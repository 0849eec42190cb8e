//! 组件清单
//!
//! 清单文件以 TOML 或 JSON 声明组件，每个条目引用一个已注册的提供者：
//!
//! ```toml
//! [[component]]
//! key = "greeter"
//! provider = "GreeterService"
//! lifecycle = "singleton"
//!
//! [component.bind]
//! clock = "utc_clock"
//!
//! [component.augment]
//! interceptors = ["logging"]
//! operations = ["greet"]
//! ```

use infrastructure_common::{AugmentationSpec, ComponentKey, Lifecycle, PropertyEnvironment, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 组件清单文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentManifest {
    #[serde(rename = "component", default)]
    pub components: Vec<ManifestEntry>,
}

/// 清单中的一个组件条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// 组件键，缺省时使用提供者的默认键
    #[serde(default)]
    pub key: Option<ComponentKey>,
    /// 提供者名称
    pub provider: String,
    /// 额外的依赖键
    #[serde(default)]
    pub depends_on: Vec<ComponentKey>,
    /// 依赖槽重绑定
    #[serde(default)]
    pub bind: BTreeMap<String, ComponentKey>,
    /// 覆盖提供者的生命周期
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,
    /// 覆盖提供者的增强需求
    #[serde(default)]
    pub augment: Option<AugmentationSpec>,
    /// 组件级属性
    #[serde(default)]
    pub properties: PropertyEnvironment,
    /// 为 false 时条目被忽略
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// 清单格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    /// 根据文件扩展名判断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl ComponentManifest {
    /// 解析清单内容
    pub fn parse(content: &str, format: ManifestFormat, path: &Path) -> Result<Self, ScanError> {
        let malformed = |message: String| ScanError::MalformedManifest {
            path: path.to_path_buf(),
            message,
        };

        match format {
            ManifestFormat::Toml => toml::from_str(content).map_err(|e| malformed(e.to_string())),
            ManifestFormat::Json => {
                serde_json::from_str(content).map_err(|e| malformed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_manifest() {
        let content = r#"
            [[component]]
            key = "greeter"
            provider = "GreeterService"
            lifecycle = "per-request"

            [component.bind]
            clock = "utc_clock"

            [component.augment]
            interceptors = ["logging", "metrics"]
            operations = ["greet"]

            [component.properties]
            prefix = "Hello"

            [[component]]
            provider = "UtcClock"
            enabled = false
        "#;

        let manifest =
            ComponentManifest::parse(content, ManifestFormat::Toml, Path::new("core.toml")).unwrap();
        assert_eq!(manifest.components.len(), 2);

        let greeter = &manifest.components[0];
        assert_eq!(greeter.key.as_ref().map(ComponentKey::as_str), Some("greeter"));
        assert_eq!(greeter.lifecycle, Some(Lifecycle::PerRequest));
        assert_eq!(greeter.bind["clock"].as_str(), "utc_clock");
        let augment = greeter.augment.as_ref().unwrap();
        assert_eq!(augment.interceptors, vec!["logging", "metrics"]);
        assert!(greeter.properties.contains("prefix"));
        assert!(greeter.enabled);

        assert!(manifest.components[1].key.is_none());
        assert!(!manifest.components[1].enabled);
    }

    #[test]
    fn test_parse_json_manifest() {
        let content = r#"{ "component": [ { "provider": "UtcClock", "depends_on": ["zone"] } ] }"#;
        let manifest =
            ComponentManifest::parse(content, ManifestFormat::Json, Path::new("core.json")).unwrap();
        assert_eq!(manifest.components[0].depends_on, vec![ComponentKey::from("zone")]);
    }

    #[test]
    fn test_unknown_field_is_malformed() {
        let content = "[[component]]\nprovider = \"UtcClock\"\nscope = \"request\"\n";
        let err = ComponentManifest::parse(content, ManifestFormat::Toml, Path::new("bad.toml"))
            .unwrap_err();
        assert!(matches!(err, ScanError::MalformedManifest { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ManifestFormat::from_path(Path::new("a/b.TOML")), Some(ManifestFormat::Toml));
        assert_eq!(ManifestFormat::from_path(Path::new("a/b.yaml")), None);
        assert_eq!(ManifestFormat::from_path(Path::new("README")), None);
    }
}
