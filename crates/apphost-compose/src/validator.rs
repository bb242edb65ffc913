//! Static analysis of a composition before it becomes a descriptor.
//!
//! Unlike the builder, which rejects a bad call on the spot, the validator
//! walks the whole draft and reports every problem it finds.

use std::collections::{HashMap, HashSet};

use apphost_common::error::Violation;
use apphost_common::types::{PortSource, check_name};

use crate::graph::WaitGraph;
use crate::resource::{EdgeMode, Resource};

/// An edge declared by name, not yet checked against the resource table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEdge {
    /// Depending resource name.
    pub consumer: String,
    /// Depended-upon resource name.
    pub provider: String,
    /// Reference and/or wait-for.
    pub mode: EdgeMode,
}

/// Everything declared for a composition, before validation.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    /// Resources whose names passed the naming rules.
    pub resources: Vec<Resource>,
    /// Declared edges.
    pub edges: Vec<DraftEdge>,
    /// Names that failed the naming rules. Edges touching them are not reported again.
    pub rejected_names: Vec<String>,
}

/// Validates a draft composition.
///
/// # Checks performed
///
/// 1. Every resource name is well formed.
/// 2. No two resources share a name (case-insensitive).
/// 3. Endpoint names and port variables are unique per resource and no
///    fixed port is claimed twice.
/// 4. Presets match the resource runtime; environment keys are usable.
/// 5. Every edge joins two distinct declared resources.
/// 6. Wait-for edges are acyclic.
///
/// Returns every violation found, in the order above.
#[must_use]
pub fn validate(draft: &Draft) -> Vec<Violation> {
    tracing::debug!(
        resources = draft.resources.len(),
        edges = draft.edges.len(),
        "validating composition"
    );
    let mut violations = Vec::new();
    check_names(draft, &mut violations);
    check_duplicate_resources(draft, &mut violations);
    check_endpoints(draft, &mut violations);
    check_resource_settings(draft, &mut violations);
    check_edges(draft, &mut violations);
    check_cycles(draft, &mut violations);
    violations
}

fn check_names(draft: &Draft, violations: &mut Vec<Violation>) {
    for name in &draft.rejected_names {
        let reason = check_name(name).err().unwrap_or("name is not allowed");
        violations.push(Violation::InvalidName {
            name: name.clone(),
            reason,
        });
    }
}

fn check_duplicate_resources(draft: &Draft, violations: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for resource in &draft.resources {
        if !seen.insert(resource.name.key()) {
            violations.push(Violation::DuplicateName {
                name: resource.name.to_string(),
            });
        }
    }
}

fn check_endpoints(draft: &Draft, violations: &mut Vec<Violation>) {
    let mut claimed: HashMap<u16, String> = HashMap::new();
    for resource in &draft.resources {
        let mut names = HashSet::new();
        let mut variables: HashMap<&str, &str> = HashMap::new();
        for endpoint in &resource.endpoints {
            if !names.insert(endpoint.name.as_str()) {
                violations.push(Violation::DuplicateEndpoint {
                    resource: resource.name.to_string(),
                    endpoint: endpoint.name.clone(),
                });
            }
            if let PortSource::Env(variable) = &endpoint.port {
                if let Some(first) = variables.get(variable.as_str()) {
                    violations.push(Violation::SharedPortVariable {
                        resource: resource.name.to_string(),
                        variable: variable.clone(),
                        first: (*first).to_string(),
                        second: endpoint.name.clone(),
                    });
                } else {
                    let _ = variables.insert(variable.as_str(), endpoint.name.as_str());
                }
            }
            if let Some(port) = endpoint.port.fixed() {
                let claimant = format!("{}/{}", resource.name, endpoint.name);
                if let Some(first) = claimed.get(&port) {
                    violations.push(Violation::PortConflict {
                        port,
                        first: first.clone(),
                        second: claimant,
                    });
                } else {
                    let _ = claimed.insert(port, claimant);
                }
            }
        }
    }
}

fn check_resource_settings(draft: &Draft, violations: &mut Vec<Violation>) {
    for resource in &draft.resources {
        for preset in &resource.presets {
            if !preset.applies_to(&resource.kind) {
                violations.push(Violation::IncompatiblePreset {
                    resource: resource.name.to_string(),
                    preset: preset.to_string(),
                    kind: resource.kind.label().to_string(),
                });
            }
        }
        for key in resource.env.keys() {
            if !is_valid_env_key(key) {
                violations.push(Violation::InvalidEnvKey {
                    resource: resource.name.to_string(),
                    key: key.clone(),
                });
            }
        }
    }
}

/// Environment keys must be non-empty and free of `=` and NUL.
#[must_use]
pub fn is_valid_env_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0'])
}

fn check_edges(draft: &Draft, violations: &mut Vec<Violation>) {
    let declared: HashSet<String> = draft.resources.iter().map(|r| r.name.key()).collect();
    let rejected: HashSet<String> = draft
        .rejected_names
        .iter()
        .map(|n| n.to_ascii_lowercase())
        .collect();

    for edge in &draft.edges {
        let consumer = edge.consumer.to_ascii_lowercase();
        let provider = edge.provider.to_ascii_lowercase();
        if consumer == provider {
            violations.push(Violation::SelfEdge {
                name: edge.consumer.clone(),
            });
            continue;
        }
        let mode = if edge.mode.wait_for {
            "waits for"
        } else {
            "references"
        };
        for (name, key) in [(&edge.consumer, &consumer), (&edge.provider, &provider)] {
            if !declared.contains(key) && !rejected.contains(key) {
                violations.push(Violation::DanglingEdge {
                    consumer: edge.consumer.clone(),
                    target: name.clone(),
                    mode,
                });
            }
        }
    }
}

fn check_cycles(draft: &Draft, violations: &mut Vec<Violation>) {
    let mut graph = WaitGraph::new();
    let mut nodes = HashMap::new();
    for resource in &draft.resources {
        let key = resource.name.key();
        if !nodes.contains_key(&key) {
            let idx = graph.add_resource(resource.name.as_str());
            let _ = nodes.insert(key, idx);
        }
    }
    for edge in draft.edges.iter().filter(|e| e.mode.wait_for) {
        let consumer = nodes.get(&edge.consumer.to_ascii_lowercase());
        let provider = nodes.get(&edge.provider.to_ascii_lowercase());
        if let (Some(&consumer), Some(&provider)) = (consumer, provider) {
            if consumer != provider {
                graph.add_wait(consumer, provider);
            }
        }
    }
    violations.extend(
        graph
            .cycles()
            .into_iter()
            .map(|members| Violation::Cycle { members }),
    );
}
