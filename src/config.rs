//! Workspace configuration support.
//!
//! This module handles parsing `bicepconfig.json` from the workspace root
//! into the typed configuration the completion engine consumes: module
//! aliases for the `br` and `ts` schemes, the active cloud profile handed
//! to registry discovery, and the completion settings.
//!
//! A missing or unreadable file yields the default configuration (no
//! user aliases, discovery off, `AzureCloud` profile) — never an error.
//! Merging several configuration files is deliberately not handled here;
//! the caller hands the engine one effective configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// File name probed at the workspace root, as in the original toolchain.
pub const CONFIG_FILE_NAME: &str = "bicepconfig.json";

/// Effective configuration for one completion request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BicepConfig {
    pub module_aliases: ModuleAliases,
    pub cloud: CloudConfig,
    pub completions: CompletionSettings,
}

/// User-defined aliases, keyed by name within each scheme.
///
/// `BTreeMap` keeps enumeration order independent of JSON key order, so a
/// given configuration always produces the same candidate order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModuleAliases {
    pub br: BTreeMap<String, RegistryAlias>,
    pub ts: BTreeMap<String, TemplateSpecAlias>,
}

/// A `br` alias: a registry host plus an optional module path prefix that
/// narrows which repositories the alias addresses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryAlias {
    pub registry: String,
    pub module_path: Option<String>,
}

/// A `ts` alias: a template spec location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpecAlias {
    pub subscription: String,
    pub resource_group: String,
}

/// Cloud context forwarded to the registry discovery source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudConfig {
    pub current_profile: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            current_profile: "AzureCloud".to_string(),
        }
    }
}

/// Settings gating optional completion behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionSettings {
    /// When `true`, registry completions additionally enumerate every
    /// container registry the discovery source can see for the active
    /// cloud profile. Off by default: the lookup is a network round trip.
    pub get_all_azure_container_registries: bool,
}

impl BicepConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load `bicepconfig.json` from the workspace root.
    ///
    /// Returns the default configuration when the file doesn't exist or
    /// can't be parsed; a parse failure is logged but never propagated.
    pub fn load(workspace_root: &Path) -> Self {
        let path = workspace_root.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return BicepConfig::default(),
        };

        match Self::from_json(&content) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring unparsable bicepconfig.json");
                BicepConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_aliases() {
        let config = BicepConfig::from_json(
            r#"{
                "moduleAliases": {
                    "br": {
                        "test1": {
                            "registry": "testacr1.azurecr.io",
                            "modulePath": "bicep/modules"
                        },
                        "test2": {
                            "registry": "testacr2.azurecr.io"
                        }
                    },
                    "ts": {
                        "mySpecRG": {
                            "subscription": "00000000-0000-0000-0000-000000000000",
                            "resourceGroup": "test-rg"
                        }
                    }
                }
            }"#,
        )
        .expect("config should parse");

        let test1 = &config.module_aliases.br["test1"];
        assert_eq!(test1.registry, "testacr1.azurecr.io");
        assert_eq!(test1.module_path.as_deref(), Some("bicep/modules"));
        assert_eq!(config.module_aliases.br["test2"].module_path, None);

        let spec = &config.module_aliases.ts["mySpecRG"];
        assert_eq!(spec.resource_group, "test-rg");
    }

    #[test]
    fn test_defaults() {
        let config = BicepConfig::from_json("{}").expect("empty object should parse");
        assert!(config.module_aliases.br.is_empty());
        assert!(config.module_aliases.ts.is_empty());
        assert_eq!(config.cloud.current_profile, "AzureCloud");
        assert!(!config.completions.get_all_azure_container_registries);
    }

    #[test]
    fn test_completion_settings() {
        let config = BicepConfig::from_json(
            r#"{"completions": {"getAllAzureContainerRegistries": true}}"#,
        )
        .expect("config should parse");
        assert!(config.completions.get_all_azure_container_registries);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        assert_eq!(BicepConfig::load(dir.path()), BicepConfig::default());
    }

    #[test]
    fn test_load_unparsable_file_is_default() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json")
            .expect("failed to write config");
        assert_eq!(BicepConfig::load(dir.path()), BicepConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"moduleAliases": {"br": {"own": {"registry": "own.azurecr.io"}}}}"#,
        )
        .expect("failed to write config");

        let config = BicepConfig::load(dir.path());
        assert_eq!(config.module_aliases.br["own"].registry, "own.azurecr.io");
    }
}
