//! Declarative `apphost.yaml` manifests.
//!
//! A manifest lists resources by name and refers to other resources by
//! name. Loading it runs the same validation as
//! [`CompositionBuilder::build`](crate::builder::CompositionBuilder::build),
//! so one pass reports every structural problem in the file. JSON is
//! accepted as well, being a subset of YAML.

pub mod schema;

use std::path::Path;

use apphost_common::error::{AppHostError, Result};
use apphost_common::types::ResourceName;

use self::schema::{ManifestFile, ResourceDecl};
use crate::descriptor::CompositionDescriptor;
use crate::resource::{EdgeMode, Resource};
use crate::validator::{Draft, DraftEdge};

/// Parses and validates a manifest from its source text.
///
/// # Errors
///
/// Returns [`AppHostError::Yaml`] if the text is malformed, or
/// [`AppHostError::Validation`] listing every structural problem.
pub fn parse_manifest(input: &str) -> Result<CompositionDescriptor> {
    tracing::info!("parsing manifest");
    let file: ManifestFile = serde_yaml::from_str(input)?;
    CompositionDescriptor::from_draft(into_draft(file))
}

/// Reads, parses, and validates a manifest file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to parse or validate.
pub fn load_manifest(path: &Path) -> Result<CompositionDescriptor> {
    tracing::info!(path = %path.display(), "loading manifest");
    let content = std::fs::read_to_string(path).map_err(|e| AppHostError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_manifest(&content)
}

/// Converts the on-disk schema into a draft, setting aside malformed names.
#[must_use]
pub fn into_draft(file: ManifestFile) -> Draft {
    let mut draft = Draft::default();
    for decl in file.resources {
        let ResourceDecl {
            name,
            kind,
            presets,
            env,
            endpoints,
            references,
            wait_for,
            publish,
        } = decl;

        for provider in references {
            draft.edges.push(DraftEdge {
                consumer: name.clone(),
                provider,
                mode: EdgeMode::REFERENCE,
            });
        }
        for provider in wait_for {
            draft.edges.push(DraftEdge {
                consumer: name.clone(),
                provider,
                mode: EdgeMode::WAIT_FOR,
            });
        }

        match ResourceName::new(name.clone()) {
            Ok(resource_name) => {
                let mut resource = Resource::new(resource_name, kind);
                resource.presets = presets;
                resource.env = env;
                resource.endpoints = endpoints.into_iter().map(|e| e.normalized()).collect();
                resource.publish = publish;
                draft.resources.push(resource);
            }
            Err(_) => draft.rejected_names.push(name),
        }
    }
    draft
}

/// Converts a descriptor back into the on-disk schema.
#[must_use]
pub fn to_manifest(descriptor: &CompositionDescriptor) -> ManifestFile {
    let resources = descriptor
        .resources()
        .iter()
        .map(|resource| {
            let name = resource.name.as_str();
            ResourceDecl {
                name: name.to_string(),
                kind: resource.kind.clone(),
                presets: resource.presets.clone(),
                env: resource.env.clone(),
                endpoints: resource.endpoints.clone(),
                references: descriptor
                    .references_of(name)
                    .into_iter()
                    .map(ToString::to_string)
                    .collect(),
                wait_for: descriptor
                    .waits_of(name)
                    .into_iter()
                    .map(ToString::to_string)
                    .collect(),
                publish: resource.publish.clone(),
            }
        })
        .collect();
    ManifestFile { resources }
}

/// Renders a descriptor as manifest YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_yaml(descriptor: &CompositionDescriptor) -> Result<String> {
    Ok(serde_yaml::to_string(&to_manifest(descriptor))?)
}
