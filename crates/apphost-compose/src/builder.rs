//! Builder API for assembling a composition descriptor.
//!
//! A [`CompositionBuilder`] is an ordinary owned value: create one, declare
//! resources and edges through the [`ResourceHandle`]s it hands out, then
//! call [`CompositionBuilder::build`]. Each call either applies fully or
//! fails and leaves the builder untouched.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use apphost_common::constants;
use apphost_common::error::{AppHostError, Result};
use apphost_common::types::{PortSource, Protocol, ResourceName};

use crate::descriptor::CompositionDescriptor;
use crate::graph::WaitGraph;
use crate::resource::{
    DependencyEdge, EdgeMode, Endpoint, EnvironmentPreset, PublishTarget, Resource, ResourceKind,
};
use crate::validator::{Draft, DraftEdge};

static NEXT_BUILDER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque reference to a resource declared on a specific builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    builder: u64,
    index: usize,
}

/// Accumulates resource and edge declarations.
#[derive(Debug)]
pub struct CompositionBuilder {
    id: u64,
    resources: Vec<Resource>,
    names: HashMap<String, usize>,
    edges: Vec<DependencyEdge>,
    pairs: HashMap<(usize, usize), usize>,
    waits: WaitGraph,
}

impl CompositionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_BUILDER_ID.fetch_add(1, Ordering::Relaxed),
            resources: Vec::new(),
            names: HashMap::new(),
            edges: Vec::new(),
            pairs: HashMap::new(),
            waits: WaitGraph::new(),
        }
    }

    /// Declares a resource.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::InvalidName`] if the name is empty or malformed,
    /// or [`AppHostError::DuplicateName`] if it is already taken.
    pub fn add_resource(&mut self, name: &str, kind: ResourceKind) -> Result<ResourceHandle> {
        let name = ResourceName::new(name)?;
        let key = name.key();
        if self.names.contains_key(&key) {
            return Err(AppHostError::DuplicateName {
                name: name.to_string(),
            });
        }

        tracing::debug!(resource = %name, kind = kind.label(), "adding resource");
        let index = self.resources.len();
        let _ = self.waits.add_resource(name.as_str());
        let _ = self.names.insert(key, index);
        self.resources.push(Resource::new(name, kind));
        Ok(ResourceHandle {
            builder: self.id,
            index,
        })
    }

    /// Declares a Python script resource.
    ///
    /// # Errors
    ///
    /// See [`add_resource`](Self::add_resource).
    pub fn add_python_app(
        &mut self,
        name: &str,
        working_dir: impl Into<PathBuf>,
        entry_script: &str,
    ) -> Result<ResourceHandle> {
        self.add_resource(name, ResourceKind::python(working_dir, entry_script))
    }

    /// Declares a Vite frontend run with `npm run dev`, listening on `$PORT`.
    ///
    /// # Errors
    ///
    /// See [`add_resource`](Self::add_resource).
    pub fn add_vite_app(
        &mut self,
        name: &str,
        working_dir: impl Into<PathBuf>,
    ) -> Result<ResourceHandle> {
        let handle = self.add_resource(
            name,
            ResourceKind::node(working_dir, constants::VITE_DEV_SCRIPT),
        )?;
        self.with_endpoint(handle, Endpoint::http_from_env(constants::PORT_ENV))?;
        Ok(handle)
    }

    /// Declares a Redis cache service.
    ///
    /// # Errors
    ///
    /// See [`add_resource`](Self::add_resource).
    pub fn add_redis(&mut self, name: &str) -> Result<ResourceHandle> {
        let kind = ResourceKind::Service {
            image: constants::REDIS_IMAGE.to_string(),
            tag: Some(constants::REDIS_TAG.to_string()),
            scheme: Some("redis".to_string()),
        };
        let handle = self.add_resource(name, kind)?;
        self.with_endpoint(
            handle,
            Endpoint::new(Protocol::Tcp, PortSource::Fixed(constants::REDIS_PORT)),
        )?;
        Ok(handle)
    }

    /// Attaches an environment preset, replacing one for the same runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle or
    /// [`AppHostError::IncompatiblePreset`] if the preset does not suit the kind.
    pub fn with_environment_preset(
        &mut self,
        handle: ResourceHandle,
        preset: EnvironmentPreset,
    ) -> Result<()> {
        let resource = self.resource_mut(handle)?;
        if !preset.applies_to(&resource.kind) {
            return Err(AppHostError::IncompatiblePreset {
                resource: resource.name.to_string(),
                preset: preset.to_string(),
                kind: resource.kind.label().to_string(),
            });
        }
        resource.presets.retain(|p| !p.replaces(&preset));
        resource.presets.push(preset);
        Ok(())
    }

    /// Declares how a resource can be reached.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle or
    /// [`AppHostError::DuplicateEndpoint`] if the endpoint name is taken, or
    /// [`AppHostError::SharedPortVariable`] if another endpoint already reads
    /// its port from the same variable.
    pub fn with_endpoint(&mut self, handle: ResourceHandle, endpoint: Endpoint) -> Result<()> {
        let endpoint = endpoint.normalized();
        let resource = self.resource_mut(handle)?;
        if resource.endpoint(&endpoint.name).is_some() {
            return Err(AppHostError::DuplicateEndpoint {
                resource: resource.name.to_string(),
                endpoint: endpoint.name,
            });
        }
        if let PortSource::Env(variable) = &endpoint.port {
            if resource.endpoints.iter().any(|e| e.port == endpoint.port) {
                return Err(AppHostError::SharedPortVariable {
                    resource: resource.name.to_string(),
                    variable: variable.clone(),
                });
            }
        }
        resource.endpoints.push(endpoint);
        Ok(())
    }

    /// Marks every HTTP(S) endpoint of the resource as externally reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle.
    pub fn with_external_http_endpoints(&mut self, handle: ResourceHandle) -> Result<()> {
        let resource = self.resource_mut(handle)?;
        for endpoint in &mut resource.endpoints {
            if endpoint.protocol.is_http() {
                endpoint.external = true;
            }
        }
        Ok(())
    }

    /// Binds a literal environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle.
    pub fn with_env(
        &mut self,
        handle: ResourceHandle,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let resource = self.resource_mut(handle)?;
        let _ = resource.env.insert(key.into(), value.into());
        Ok(())
    }

    /// Injects the provider's connection information into the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle or
    /// [`AppHostError::SelfDependency`] if both handles are the same.
    pub fn with_reference(
        &mut self,
        consumer: ResourceHandle,
        provider: ResourceHandle,
    ) -> Result<()> {
        let (consumer, provider) = self.resolve_pair(consumer, provider)?;
        self.merge_edge(consumer, provider, EdgeMode::REFERENCE);
        Ok(())
    }

    /// Delays the consumer until the provider is ready.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle,
    /// [`AppHostError::SelfDependency`] if both handles are the same, or
    /// [`AppHostError::CyclicDependency`] if the edge would close a cycle.
    pub fn wait_for(&mut self, consumer: ResourceHandle, provider: ResourceHandle) -> Result<()> {
        let (consumer, provider) = self.resolve_pair(consumer, provider)?;
        let consumer_node = petgraph::graph::NodeIndex::new(consumer);
        let provider_node = petgraph::graph::NodeIndex::new(provider);
        if let Some(path) = self.waits.find_wait_chain(consumer_node, provider_node) {
            return Err(AppHostError::CyclicDependency {
                consumer: self.resources[consumer].name.to_string(),
                provider: self.resources[provider].name.to_string(),
                path,
            });
        }
        self.waits.add_wait(consumer_node, provider_node);
        self.merge_edge(consumer, provider, EdgeMode::WAIT_FOR);
        Ok(())
    }

    /// Attaches a deployment packaging spec.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle or
    /// [`AppHostError::DuplicatePublishTarget`] if one is already attached.
    pub fn with_publish_target(
        &mut self,
        handle: ResourceHandle,
        target: PublishTarget,
    ) -> Result<()> {
        let resource = self.resource_mut(handle)?;
        if resource.publish.is_some() {
            return Err(AppHostError::DuplicatePublishTarget {
                name: resource.name.to_string(),
            });
        }
        resource.publish = Some(target);
        Ok(())
    }

    /// Returns the resource behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::UnknownResource`] for a foreign handle.
    pub fn resource(&self, handle: ResourceHandle) -> Result<&Resource> {
        let index = self.index_of(handle)?;
        Ok(&self.resources[index])
    }

    /// Number of declared resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if nothing has been declared yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of declared dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Validates every invariant and freezes the composition.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::Validation`] listing every violation found.
    pub fn build(self) -> Result<CompositionDescriptor> {
        tracing::info!(
            resources = self.resources.len(),
            edges = self.edges.len(),
            "building composition"
        );
        let edges = self
            .edges
            .into_iter()
            .map(|e| DraftEdge {
                consumer: e.consumer.into(),
                provider: e.provider.into(),
                mode: e.mode,
            })
            .collect();
        CompositionDescriptor::from_draft(Draft {
            resources: self.resources,
            edges,
            rejected_names: Vec::new(),
        })
    }

    fn index_of(&self, handle: ResourceHandle) -> Result<usize> {
        if handle.builder != self.id || handle.index >= self.resources.len() {
            return Err(AppHostError::UnknownResource {
                id: format!("handle #{} was not issued by this builder", handle.index),
            });
        }
        Ok(handle.index)
    }

    fn resource_mut(&mut self, handle: ResourceHandle) -> Result<&mut Resource> {
        let index = self.index_of(handle)?;
        Ok(&mut self.resources[index])
    }

    fn resolve_pair(
        &self,
        consumer: ResourceHandle,
        provider: ResourceHandle,
    ) -> Result<(usize, usize)> {
        let consumer = self.index_of(consumer)?;
        let provider = self.index_of(provider)?;
        if consumer == provider {
            return Err(AppHostError::SelfDependency {
                name: self.resources[consumer].name.to_string(),
            });
        }
        Ok((consumer, provider))
    }

    fn merge_edge(&mut self, consumer: usize, provider: usize, mode: EdgeMode) {
        if let Some(&slot) = self.pairs.get(&(consumer, provider)) {
            self.edges[slot].mode = self.edges[slot].mode.union(mode);
            return;
        }
        tracing::debug!(
            consumer = %self.resources[consumer].name,
            provider = %self.resources[provider].name,
            reference = mode.reference,
            wait_for = mode.wait_for,
            "adding dependency edge"
        );
        let _ = self.pairs.insert((consumer, provider), self.edges.len());
        self.edges.push(DependencyEdge {
            consumer: self.resources[consumer].name.clone(),
            provider: self.resources[provider].name.clone(),
            mode,
        });
    }
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
