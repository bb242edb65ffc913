//! Unified error types for the apphost workspace.
//!
//! Builder operations fail fast with a single variant. Whole-composition
//! validation collects every [`Violation`] it finds into
//! [`AppHostError::Validation`].

use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum AppHostError {
    /// A resource name is empty or malformed.
    #[error("invalid resource name \"{name}\": {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which naming rule was broken.
        reason: &'static str,
    },

    /// A resource with the same name already exists.
    #[error("duplicate resource name: \"{name}\"")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// A handle or name does not belong to this composition.
    #[error("unknown resource: {id}")]
    UnknownResource {
        /// Description of the unknown handle or name.
        id: String,
    },

    /// A resource was declared as depending on itself.
    #[error("resource \"{name}\" cannot depend on itself")]
    SelfDependency {
        /// The resource name.
        name: String,
    },

    /// A wait-for edge would close a cycle.
    #[error(
        "cyclic dependency: \"{consumer}\" cannot wait for \"{provider}\" because {}",
        describe_path(.path)
    )]
    CyclicDependency {
        /// Resource that would wait.
        consumer: String,
        /// Resource it would wait for.
        provider: String,
        /// Existing wait chain from `provider` back to `consumer`.
        path: Vec<String>,
    },

    /// A second publish target was attached to a resource.
    #[error("resource \"{name}\" already has a publish target")]
    DuplicatePublishTarget {
        /// The resource name.
        name: String,
    },

    /// An endpoint with the same name already exists on the resource.
    #[error("resource \"{resource}\" already declares endpoint \"{endpoint}\"")]
    DuplicateEndpoint {
        /// The resource name.
        resource: String,
        /// The conflicting endpoint name.
        endpoint: String,
    },

    /// Another endpoint of the resource already reads its port from the variable.
    #[error("resource \"{resource}\" already reads endpoint port from ${variable}")]
    SharedPortVariable {
        /// The resource name.
        resource: String,
        /// The environment variable.
        variable: String,
    },

    /// An environment preset does not suit the resource kind.
    #[error("preset {preset} cannot be applied to resource \"{resource}\" ({kind})")]
    IncompatiblePreset {
        /// The resource name.
        resource: String,
        /// The rejected preset.
        preset: String,
        /// The resource kind.
        kind: String,
    },

    /// Whole-composition validation failed.
    #[error("invalid composition, {} violation(s):{}", .violations.len(), describe_violations(.violations))]
    Validation {
        /// Every violation found.
        violations: Vec<Violation>,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML manifest parsing failed.
    #[error("manifest parse error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

/// A single structural problem found while validating a composition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A resource name is malformed.
    #[error("invalid resource name \"{name}\": {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which naming rule was broken.
        reason: &'static str,
    },

    /// Two resources share a name.
    #[error("duplicate resource name \"{name}\"")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// An edge points at a resource that is not declared.
    #[error("\"{consumer}\" {mode} unknown resource \"{target}\"")]
    DanglingEdge {
        /// Consuming resource.
        consumer: String,
        /// Missing resource.
        target: String,
        /// `references` or `waits for`.
        mode: &'static str,
    },

    /// An edge points back at its own source.
    #[error("\"{name}\" depends on itself")]
    SelfEdge {
        /// The resource name.
        name: String,
    },

    /// A set of resources wait for each other.
    #[error("wait-for cycle between {}", .members.join(", "))]
    Cycle {
        /// Resources forming the cycle.
        members: Vec<String>,
    },

    /// An endpoint name is repeated on one resource.
    #[error("\"{resource}\" declares endpoint \"{endpoint}\" more than once")]
    DuplicateEndpoint {
        /// The resource name.
        resource: String,
        /// The repeated endpoint name.
        endpoint: String,
    },

    /// Two endpoints of one resource read their port from the same variable.
    #[error("\"{resource}\" endpoints {first} and {second} both read their port from ${variable}")]
    SharedPortVariable {
        /// The resource name.
        resource: String,
        /// The environment variable.
        variable: String,
        /// Endpoint that declared the variable first.
        first: String,
        /// Endpoint that declared it again.
        second: String,
    },

    /// Two endpoints claim the same fixed port.
    #[error("port {port} is claimed by both {first} and {second}")]
    PortConflict {
        /// The contested port.
        port: u16,
        /// First claimant (`resource/endpoint`).
        first: String,
        /// Second claimant (`resource/endpoint`).
        second: String,
    },

    /// A preset does not suit the resource kind.
    #[error("preset {preset} does not apply to \"{resource}\" ({kind})")]
    IncompatiblePreset {
        /// The resource name.
        resource: String,
        /// The rejected preset.
        preset: String,
        /// The resource kind.
        kind: String,
    },

    /// An environment variable key is unusable.
    #[error("\"{resource}\" has invalid environment variable \"{key}\"")]
    InvalidEnvKey {
        /// The resource name.
        resource: String,
        /// The rejected key.
        key: String,
    },
}

fn describe_path(path: &[String]) -> String {
    if path.is_empty() {
        return "it would wait for itself".to_string();
    }
    format!("the wait chain {} already exists", path.join(" -> "))
}

fn describe_violations(violations: &[Violation]) -> String {
    let mut out = String::new();
    for violation in violations {
        let _ = write!(out, "\n  - {violation}");
    }
    out
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AppHostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_lists_every_violation() {
        let err = AppHostError::Validation {
            violations: vec![
                Violation::DuplicateName { name: "api".into() },
                Violation::SelfEdge { name: "web".into() },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 violation(s)"), "got: {msg}");
        assert!(msg.contains("duplicate resource name \"api\""), "got: {msg}");
        assert!(msg.contains("\"web\" depends on itself"), "got: {msg}");
    }

    #[test]
    fn cyclic_dependency_names_existing_chain() {
        let err = AppHostError::CyclicDependency {
            consumer: "cache".into(),
            provider: "frontend".into(),
            path: vec!["frontend".into(), "apiservice".into(), "cache".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("frontend -> apiservice -> cache"), "got: {msg}");
    }

    #[test]
    fn cycle_violation_joins_members() {
        let v = Violation::Cycle {
            members: vec!["a".into(), "b".into()],
        };
        assert_eq!(v.to_string(), "wait-for cycle between a, b");
    }

    #[test]
    fn shared_port_variable_names_both_endpoints() {
        let v = Violation::SharedPortVariable {
            resource: "apiservice".into(),
            variable: "PORT".into(),
            first: "http".into(),
            second: "admin".into(),
        };
        assert_eq!(
            v.to_string(),
            "\"apiservice\" endpoints http and admin both read their port from $PORT"
        );
    }
}
