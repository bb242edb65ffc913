//! On-disk schema of `apphost.yaml` manifests.
//!
//! Enum-valued fields (presets, endpoint ports, publish targets) are
//! written as single-key maps such as `port: { env: PORT }`, the only
//! shape JSON can express, rather than YAML tags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::{Endpoint, EnvironmentPreset, PublishTarget, ResourceKind};

/// Root node of a manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Resource declarations, in declaration order.
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
}

/// One resource entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    /// Resource name.
    pub name: String,
    /// Kind and source configuration, tagged by `kind`.
    #[serde(flatten)]
    pub kind: ResourceKind,
    /// Environment presets.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub presets: Vec<EnvironmentPreset>,
    /// Literal environment bindings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Exposed endpoints.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub endpoints: Vec<Endpoint>,
    /// Resources whose connection information is injected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Resources that must be ready first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wait_for: Vec<String>,
    /// Deployment packaging.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub publish: Option<PublishTarget>,
}
