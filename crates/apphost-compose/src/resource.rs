//! Resource declarations: what runs, how it is reached, and how it ships.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use apphost_common::constants;
use apphost_common::types::{PortSource, Protocol, ResourceName};
use serde::{Deserialize, Serialize};

/// Interpreter family of a script-backed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptRuntime {
    /// A Python entry script.
    Python,
    /// A Node package script (`npm run <entry>`).
    Node,
}

/// What a resource is, together with where its code or image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceKind {
    /// A process launched from an entry point in a working directory.
    Script {
        /// Interpreter family.
        runtime: ScriptRuntime,
        /// Directory the process runs in.
        working_dir: PathBuf,
        /// Entry script (Python) or package script name (Node).
        entry_point: String,
    },
    /// An off-the-shelf service run from a container image.
    Service {
        /// Image repository.
        image: String,
        /// Image tag.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
        /// URI scheme consumers use to connect (e.g. `redis`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scheme: Option<String>,
    },
    /// A directory of prebuilt static files.
    Assets {
        /// Root directory of the bundle.
        root: PathBuf,
    },
}

impl ResourceKind {
    /// A Python script run from `working_dir`.
    pub fn python(working_dir: impl Into<PathBuf>, entry_point: impl Into<String>) -> Self {
        Self::Script {
            runtime: ScriptRuntime::Python,
            working_dir: working_dir.into(),
            entry_point: entry_point.into(),
        }
    }

    /// A Node package script run from `working_dir`.
    pub fn node(working_dir: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self::Script {
            runtime: ScriptRuntime::Node,
            working_dir: working_dir.into(),
            entry_point: script.into(),
        }
    }

    /// A managed service backed by a container image.
    pub fn service(image: impl Into<String>, tag: Option<&str>) -> Self {
        Self::Service {
            image: image.into(),
            tag: tag.map(Into::into),
            scheme: None,
        }
    }

    /// Short human-readable description of the kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Script {
                runtime: ScriptRuntime::Python,
                ..
            } => "python script",
            Self::Script {
                runtime: ScriptRuntime::Node,
                ..
            } => "node script",
            Self::Service { .. } => "managed service",
            Self::Assets { .. } => "static assets",
        }
    }

    /// Directory the resource's files live in, if it has one.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        match self {
            Self::Script { working_dir, .. } => Some(working_dir),
            Self::Assets { root } => Some(root),
            Self::Service { .. } => None,
        }
    }

    /// Returns the script runtime for script-backed resources.
    #[must_use]
    pub const fn runtime(&self) -> Option<ScriptRuntime> {
        match self {
            Self::Script { runtime, .. } => Some(*runtime),
            _ => None,
        }
    }
}

/// A named environment template applied before a resource launches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentPreset {
    /// Run the script inside a `uv`-managed isolated environment.
    Uv,
    /// Run the script with the interpreter of an existing virtual environment.
    Virtualenv {
        /// Path of the virtual environment, relative to the working directory.
        path: PathBuf,
    },
    /// Install Node packages before launching.
    NpmInstall,
}

impl EnvironmentPreset {
    /// Runtime this preset prepares.
    #[must_use]
    pub const fn runtime(&self) -> ScriptRuntime {
        match self {
            Self::Uv | Self::Virtualenv { .. } => ScriptRuntime::Python,
            Self::NpmInstall => ScriptRuntime::Node,
        }
    }

    /// Returns `true` if the preset can be applied to `kind`.
    #[must_use]
    pub fn applies_to(&self, kind: &ResourceKind) -> bool {
        kind.runtime() == Some(self.runtime())
    }

    /// Presets for the same runtime replace one another.
    #[must_use]
    pub fn replaces(&self, other: &Self) -> bool {
        self.runtime() == other.runtime()
    }
}

impl fmt::Display for EnvironmentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uv => write!(f, "uv"),
            Self::Virtualenv { path } => write!(f, "virtualenv({})", path.display()),
            Self::NpmInstall => write!(f, "npm-install"),
        }
    }
}

/// How a resource can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint name, unique per resource. Defaults to the protocol scheme.
    #[serde(default)]
    pub name: String,
    /// Wire protocol.
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    /// Where the port number comes from.
    pub port: PortSource,
    /// Whether the endpoint is reachable from outside the composition.
    #[serde(default)]
    pub external: bool,
}

const fn default_protocol() -> Protocol {
    Protocol::Http
}

impl Endpoint {
    /// An endpoint named after its protocol.
    #[must_use]
    pub fn new(protocol: Protocol, port: PortSource) -> Self {
        Self {
            name: protocol.scheme().to_string(),
            protocol,
            port,
            external: false,
        }
    }

    /// An HTTP endpoint whose port is handed over in `var` at launch.
    pub fn http_from_env(var: impl Into<String>) -> Self {
        Self::new(Protocol::Http, PortSource::Env(var.into()))
    }

    /// Overrides the endpoint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the endpoint as externally reachable.
    #[must_use]
    pub const fn external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Fills in the default name when none was given.
    pub(crate) fn normalized(mut self) -> Self {
        if self.name.is_empty() {
            self.name = self.protocol.scheme().to_string();
        }
        self
    }
}

/// Alternate packaging of a resource for deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishTarget {
    /// Built from a Dockerfile.
    Dockerfile {
        /// Build context, relative to the resource's working directory.
        context: PathBuf,
        /// Build file inside the context.
        #[serde(default = "default_dockerfile")]
        file: PathBuf,
    },
    /// Shipped as an existing image.
    Image {
        /// Full image reference.
        reference: String,
    },
}

fn default_dockerfile() -> PathBuf {
    PathBuf::from(constants::DOCKERFILE)
}

impl PublishTarget {
    /// A Dockerfile publish target using the default build file name.
    pub fn dockerfile(context: impl Into<PathBuf>) -> Self {
        Self::Dockerfile {
            context: context.into(),
            file: default_dockerfile(),
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dockerfile { context, file } => {
                write!(f, "dockerfile {}", context.join(file).display())
            }
            Self::Image { reference } => write!(f, "image {reference}"),
        }
    }
}

/// A declared unit of compute or service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Unique name.
    pub name: ResourceName,
    /// Kind and source configuration.
    #[serde(flatten)]
    pub kind: ResourceKind,
    /// Environment presets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<EnvironmentPreset>,
    /// Literal environment bindings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Exposed endpoints.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    /// Deployment packaging, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishTarget>,
}

impl Resource {
    /// Creates a resource with no presets, bindings, or endpoints.
    #[must_use]
    pub fn new(name: ResourceName, kind: ResourceKind) -> Self {
        Self {
            name,
            kind,
            presets: Vec::new(),
            env: BTreeMap::new(),
            endpoints: Vec::new(),
            publish: None,
        }
    }

    /// Looks up an endpoint by name.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Returns the preset for `runtime`, if one is attached.
    #[must_use]
    pub fn preset_for(&self, runtime: ScriptRuntime) -> Option<&EnvironmentPreset> {
        self.presets.iter().find(|p| p.runtime() == runtime)
    }
}

/// How a consumer depends on a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EdgeMode {
    /// Connection information is injected into the consumer.
    pub reference: bool,
    /// The consumer starts only once the provider is ready.
    pub wait_for: bool,
}

impl EdgeMode {
    /// Reference-only mode.
    pub const REFERENCE: Self = Self {
        reference: true,
        wait_for: false,
    };

    /// Wait-for-only mode.
    pub const WAIT_FOR: Self = Self {
        reference: false,
        wait_for: true,
    };

    /// Combines two modes.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            reference: self.reference || other.reference,
            wait_for: self.wait_for || other.wait_for,
        }
    }
}

/// Directed relation from a consuming resource to the resource it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    /// Depending resource.
    pub consumer: ResourceName,
    /// Depended-upon resource.
    pub provider: ResourceName,
    /// Reference and/or wait-for.
    pub mode: EdgeMode,
}
