//! The immutable, validated composition handed to an orchestrator.

use std::collections::HashMap;

use apphost_common::error::{AppHostError, Result};
use apphost_common::types::ResourceName;
use serde::Serialize;

use crate::graph::WaitGraph;
use crate::resource::{DependencyEdge, Resource};
use crate::validator::{self, Draft};

/// A validated graph of resources and the edges between them.
///
/// Once built it cannot be modified; every accessor borrows.
#[derive(Debug, Clone, Serialize)]
pub struct CompositionDescriptor {
    resources: Vec<Resource>,
    edges: Vec<DependencyEdge>,
    start_order: Vec<ResourceName>,
}

impl CompositionDescriptor {
    /// Validates a draft and freezes it into a descriptor.
    ///
    /// Edges declared more than once for the same pair are merged.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::Validation`] listing every violation found.
    pub fn from_draft(draft: Draft) -> Result<Self> {
        let violations = validator::validate(&draft);
        if !violations.is_empty() {
            tracing::warn!(count = violations.len(), "composition failed validation");
            return Err(AppHostError::Validation { violations });
        }

        let Draft {
            resources,
            edges: draft_edges,
            ..
        } = draft;

        let mut graph = WaitGraph::new();
        let mut lookup = HashMap::new();
        for (idx, resource) in resources.iter().enumerate() {
            let node = graph.add_resource(resource.name.as_str());
            let _ = lookup.insert(resource.name.key(), (idx, node));
        }

        let mut edges: Vec<DependencyEdge> = Vec::new();
        let mut pairs: HashMap<(usize, usize), usize> = HashMap::new();
        for edge in draft_edges {
            let (Some(&(consumer, consumer_node)), Some(&(provider, provider_node))) = (
                lookup.get(&edge.consumer.to_ascii_lowercase()),
                lookup.get(&edge.provider.to_ascii_lowercase()),
            ) else {
                return Err(AppHostError::UnknownResource {
                    id: format!("{} -> {}", edge.consumer, edge.provider),
                });
            };
            if edge.mode.wait_for {
                graph.add_wait(consumer_node, provider_node);
            }
            if let Some(&slot) = pairs.get(&(consumer, provider)) {
                edges[slot].mode = edges[slot].mode.union(edge.mode);
            } else {
                let _ = pairs.insert((consumer, provider), edges.len());
                edges.push(DependencyEdge {
                    consumer: resources[consumer].name.clone(),
                    provider: resources[provider].name.clone(),
                    mode: edge.mode,
                });
            }
        }

        let order = graph.resolve_order()?;
        let start_order = order
            .iter()
            .filter_map(|name| lookup.get(&name.to_ascii_lowercase()))
            .map(|&(idx, _)| resources[idx].name.clone())
            .collect();

        tracing::info!(
            resources = resources.len(),
            edges = edges.len(),
            "composition descriptor built"
        );
        Ok(Self {
            resources,
            edges,
            start_order,
        })
    }

    /// Resources in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Looks up a resource by name (case-insensitive).
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.name.as_str().eq_ignore_ascii_case(name))
    }

    /// All dependency edges in declaration order.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Resources `name` holds a reference edge to.
    #[must_use]
    pub fn references_of(&self, name: &str) -> Vec<&ResourceName> {
        self.providers(name, |e| e.mode.reference)
    }

    /// Resources `name` waits for.
    #[must_use]
    pub fn waits_of(&self, name: &str) -> Vec<&ResourceName> {
        self.providers(name, |e| e.mode.wait_for)
    }

    fn providers(&self, name: &str, keep: impl Fn(&DependencyEdge) -> bool) -> Vec<&ResourceName> {
        self.edges
            .iter()
            .filter(|e| e.consumer.as_str().eq_ignore_ascii_case(name) && keep(e))
            .map(|e| &e.provider)
            .collect()
    }

    /// Start order honouring every wait-for edge.
    ///
    /// Resources with no edge between them carry no ordering guarantee
    /// beyond declaration order being used as a tie-break.
    #[must_use]
    pub fn start_order(&self) -> &[ResourceName] {
        &self.start_order
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if the descriptor declares no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Serializes the descriptor as a pretty-printed JSON publish manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use apphost_common::error::Violation;

    use super::*;
    use crate::resource::{EdgeMode, ResourceKind};
    use crate::validator::DraftEdge;

    fn resource(name: &str) -> Resource {
        Resource::new(
            ResourceName::new(name).expect("valid name"),
            ResourceKind::python(".", "app.py"),
        )
    }

    fn edge(consumer: &str, provider: &str, mode: EdgeMode) -> DraftEdge {
        DraftEdge {
            consumer: consumer.into(),
            provider: provider.into(),
            mode,
        }
    }

    #[test]
    fn empty_draft_builds_empty_descriptor() {
        let descriptor = CompositionDescriptor::from_draft(Draft::default()).expect("build");
        assert!(descriptor.is_empty());
        assert!(descriptor.start_order().is_empty());
    }

    #[test]
    fn repeated_edges_merge_modes() {
        let draft = Draft {
            resources: vec![resource("apiservice"), resource("frontend")],
            edges: vec![
                edge("frontend", "apiservice", EdgeMode::REFERENCE),
                edge("frontend", "apiservice", EdgeMode::WAIT_FOR),
            ],
            rejected_names: Vec::new(),
        };
        let descriptor = CompositionDescriptor::from_draft(draft).expect("build");
        assert_eq!(descriptor.edges().len(), 1);
        let mode = descriptor.edges()[0].mode;
        assert!(mode.reference && mode.wait_for);
        assert_eq!(descriptor.references_of("frontend").len(), 1);
        assert_eq!(descriptor.waits_of("frontend").len(), 1);
        assert!(descriptor.waits_of("apiservice").is_empty());
    }

    #[test]
    fn start_order_follows_waits() {
        let draft = Draft {
            resources: vec![resource("frontend"), resource("apiservice"), resource("cache")],
            edges: vec![
                edge("frontend", "apiservice", EdgeMode::WAIT_FOR),
                edge("apiservice", "cache", EdgeMode::WAIT_FOR),
            ],
            rejected_names: Vec::new(),
        };
        let descriptor = CompositionDescriptor::from_draft(draft).expect("build");
        let order: Vec<&str> = descriptor.start_order().iter().map(ResourceName::as_str).collect();
        assert_eq!(order, vec!["cache", "apiservice", "frontend"]);
    }

    #[test]
    fn invalid_draft_reports_violations() {
        let draft = Draft {
            resources: vec![resource("a"), resource("b")],
            edges: vec![
                edge("a", "b", EdgeMode::WAIT_FOR),
                edge("b", "a", EdgeMode::WAIT_FOR),
            ],
            rejected_names: Vec::new(),
        };
        let err = CompositionDescriptor::from_draft(draft).unwrap_err();
        let AppHostError::Validation { violations } = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(
            violations,
            vec![Violation::Cycle {
                members: vec!["a".into(), "b".into()],
            }]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let draft = Draft {
            resources: vec![resource("ApiService")],
            ..Draft::default()
        };
        let descriptor = CompositionDescriptor::from_draft(draft).expect("build");
        assert!(descriptor.resource("apiservice").is_some());
        assert!(descriptor.resource("missing").is_none());
    }

    #[test]
    fn json_manifest_contains_resources_and_edges() {
        let draft = Draft {
            resources: vec![resource("apiservice"), resource("frontend")],
            edges: vec![edge("frontend", "apiservice", EdgeMode::REFERENCE)],
            rejected_names: Vec::new(),
        };
        let descriptor = CompositionDescriptor::from_draft(draft).expect("build");
        let json = descriptor.to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["resources"][0]["name"], "apiservice");
        assert_eq!(value["resources"][0]["kind"], "script");
        assert_eq!(value["edges"][0]["mode"]["reference"], true);
        assert_eq!(value["start_order"][1], "frontend");
    }
}
