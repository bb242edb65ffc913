//! Launch plan resolution: ports, commands, and environment injection.
//!
//! Turns a descriptor into what an orchestrator needs to start each
//! resource. For each reference edge the consumer receives:
//! - `<PROVIDER>_HOST`, `<PROVIDER>_PORT`, and `<PROVIDER>_URI` for the
//!   provider's first endpoint.
//! - `services__<provider>__<endpoint>__0` with the URL of every endpoint.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use apphost_common::config::HostConfig;
use apphost_common::error::{AppHostError, Result};
use apphost_common::types::{PortSource, Protocol, ResourceName};
use serde::Serialize;

use crate::descriptor::CompositionDescriptor;
use crate::resource::{EnvironmentPreset, Resource, ResourceKind, ScriptRuntime};

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    /// Program to run.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
}

impl CommandLine {
    fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|&a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// An endpoint with its port decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundEndpoint {
    /// Endpoint name.
    pub name: String,
    /// Wire protocol.
    pub protocol: Protocol,
    /// Port the resource listens on.
    pub port: u16,
    /// Whether the endpoint is reachable from outside the composition.
    pub external: bool,
    /// URL consumers use.
    pub url: String,
}

/// Everything needed to start one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    /// Resource name.
    pub name: ResourceName,
    /// Steps run before launch (e.g. package installation).
    pub setup: Vec<CommandLine>,
    /// Launch command; `None` for resources without a process.
    pub command: Option<CommandLine>,
    /// Working directory of the process.
    pub working_dir: Option<PathBuf>,
    /// Full environment handed to the process.
    pub env: BTreeMap<String, String>,
    /// Endpoints with resolved ports.
    pub endpoints: Vec<BoundEndpoint>,
    /// Resources that must be ready first.
    pub waits_for: Vec<ResourceName>,
}

/// Hands out ports to environment-driven endpoints, skipping reserved ones.
#[derive(Debug)]
struct PortAllocator {
    next: u16,
    reserved: HashSet<u16>,
}

impl PortAllocator {
    fn new(start: u16, reserved: HashSet<u16>) -> Self {
        Self {
            next: start,
            reserved,
        }
    }

    fn allocate(&mut self) -> Result<u16> {
        loop {
            let candidate = self.next;
            if candidate == 0 {
                return Err(AppHostError::Config {
                    message: "dynamic port range exhausted".into(),
                });
            }
            self.next = candidate.wrapping_add(1);
            if self.reserved.insert(candidate) {
                return Ok(candidate);
            }
        }
    }
}

/// Resolves the launch plan for every resource, in start order.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the dynamic
/// port range runs out.
pub fn resolve_plan(
    descriptor: &CompositionDescriptor,
    config: &HostConfig,
) -> Result<Vec<LaunchSpec>> {
    config.validate()?;
    tracing::info!(resources = descriptor.len(), "resolving launch plan");

    let bound = bind_endpoints(descriptor, config)?;
    let empty = Vec::new();

    let mut plan = Vec::with_capacity(descriptor.len());
    for name in descriptor.start_order() {
        let Some(resource) = descriptor.resource(name.as_str()) else {
            continue;
        };
        let endpoints = bound.get(&name.key()).unwrap_or(&empty);

        let mut env = BTreeMap::new();
        for (endpoint, bound_endpoint) in resource.endpoints.iter().zip(endpoints) {
            if let PortSource::Env(var) = &endpoint.port {
                let _ = env.insert(var.clone(), bound_endpoint.port.to_string());
            }
        }
        for provider in descriptor.references_of(name.as_str()) {
            let provider_endpoints = bound.get(&provider.key()).unwrap_or(&empty);
            inject_reference(&mut env, provider, provider_endpoints, &config.host);
        }
        env.extend(resource.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let (setup, command) = launch_commands(resource, endpoints, &env, config);
        tracing::debug!(resource = %name, env = env.len(), "resolved launch spec");
        plan.push(LaunchSpec {
            name: name.clone(),
            setup,
            command,
            working_dir: resource.kind.working_dir().map(PathBuf::from),
            env,
            endpoints: endpoints.clone(),
            waits_for: descriptor
                .waits_of(name.as_str())
                .into_iter()
                .cloned()
                .collect(),
        });
    }
    Ok(plan)
}

fn bind_endpoints(
    descriptor: &CompositionDescriptor,
    config: &HostConfig,
) -> Result<HashMap<String, Vec<BoundEndpoint>>> {
    let reserved = descriptor
        .resources()
        .iter()
        .flat_map(|r| r.endpoints.iter())
        .filter_map(|e| e.port.fixed())
        .collect();
    let mut ports = PortAllocator::new(config.dynamic_port_start, reserved);

    let mut bound = HashMap::new();
    for resource in descriptor.resources() {
        let mut endpoints = Vec::with_capacity(resource.endpoints.len());
        for endpoint in &resource.endpoints {
            let port = match &endpoint.port {
                PortSource::Fixed(port) => *port,
                PortSource::Env(_) => ports.allocate()?,
            };
            let scheme = match &resource.kind {
                ResourceKind::Service {
                    scheme: Some(scheme),
                    ..
                } => scheme.as_str(),
                _ => endpoint.protocol.scheme(),
            };
            endpoints.push(BoundEndpoint {
                name: endpoint.name.clone(),
                protocol: endpoint.protocol,
                port,
                external: endpoint.external,
                url: format!("{scheme}://{}:{port}", config.host),
            });
        }
        let _ = bound.insert(resource.name.key(), endpoints);
    }
    Ok(bound)
}

fn inject_reference(
    env: &mut BTreeMap<String, String>,
    provider: &ResourceName,
    endpoints: &[BoundEndpoint],
    host: &str,
) {
    let Some(primary) = endpoints.first() else {
        return;
    };
    let prefix = provider.env_prefix();
    let _ = env.insert(format!("{prefix}_HOST"), host.to_string());
    let _ = env.insert(format!("{prefix}_PORT"), primary.port.to_string());
    let _ = env.insert(format!("{prefix}_URI"), primary.url.clone());
    for endpoint in endpoints {
        let _ = env.insert(
            format!("services__{provider}__{}__0", endpoint.name),
            endpoint.url.clone(),
        );
    }
}

fn launch_commands(
    resource: &Resource,
    endpoints: &[BoundEndpoint],
    env: &BTreeMap<String, String>,
    config: &HostConfig,
) -> (Vec<CommandLine>, Option<CommandLine>) {
    match &resource.kind {
        ResourceKind::Script {
            runtime: ScriptRuntime::Python,
            entry_point,
            ..
        } => {
            let command = match resource.preset_for(ScriptRuntime::Python) {
                Some(EnvironmentPreset::Uv) => {
                    CommandLine::new(&config.uv, &["run", entry_point.as_str()])
                }
                Some(EnvironmentPreset::Virtualenv { path }) => {
                    let python = path.join("bin").join("python");
                    CommandLine::new(python.to_string_lossy(), &[entry_point.as_str()])
                }
                _ => CommandLine::new(&config.python, &[entry_point.as_str()]),
            };
            (Vec::new(), Some(command))
        }
        ResourceKind::Script {
            runtime: ScriptRuntime::Node,
            entry_point,
            ..
        } => {
            let setup = if resource.preset_for(ScriptRuntime::Node).is_some() {
                vec![CommandLine::new(&config.npm, &["install"])]
            } else {
                Vec::new()
            };
            let command = CommandLine::new(&config.npm, &["run", entry_point.as_str()]);
            (setup, Some(command))
        }
        ResourceKind::Service { image, tag, .. } => {
            let mut args = vec![
                "run".to_string(),
                "--rm".to_string(),
                "--name".to_string(),
                resource.name.to_string(),
            ];
            for endpoint in endpoints {
                args.push("-p".to_string());
                args.push(format!("{0}:{0}", endpoint.port));
            }
            for (key, value) in env {
                args.push("-e".to_string());
                args.push(format!("{key}={value}"));
            }
            args.push(tag.as_ref().map_or_else(|| image.clone(), |t| format!("{image}:{t}")));
            let command = CommandLine {
                program: config.container_runtime.clone(),
                args,
            };
            (Vec::new(), Some(command))
        }
        ResourceKind::Assets { .. } => (Vec::new(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CompositionBuilder;
    use crate::resource::{Endpoint, EnvironmentPreset};

    fn starter() -> CompositionDescriptor {
        let mut builder = CompositionBuilder::new();
        let cache = builder.add_redis("cache").expect("cache");
        let api = builder
            .add_python_app("apiservice", "./api_service", "app.py")
            .expect("api");
        builder
            .with_environment_preset(api, EnvironmentPreset::Uv)
            .expect("uv");
        builder
            .with_endpoint(api, Endpoint::http_from_env("PORT"))
            .expect("endpoint");
        builder.with_reference(api, cache).expect("reference");
        let web = builder.add_vite_app("frontend", "./frontend").expect("web");
        builder
            .with_environment_preset(web, EnvironmentPreset::NpmInstall)
            .expect("npm");
        builder.with_reference(web, api).expect("reference");
        builder.wait_for(web, api).expect("wait");
        builder.build().expect("build")
    }

    fn spec<'a>(plan: &'a [LaunchSpec], name: &str) -> &'a LaunchSpec {
        plan.iter().find(|s| s.name.as_str() == name).expect(name)
    }

    #[test]
    fn env_ports_are_allocated_and_injected() {
        let plan = resolve_plan(&starter(), &HostConfig::default()).expect("plan");
        let api = spec(&plan, "apiservice");
        assert_eq!(api.env.get("PORT").map(String::as_str), Some("5000"));
        assert_eq!(api.endpoints[0].url, "http://localhost:5000");

        let web = spec(&plan, "frontend");
        assert_eq!(web.env.get("PORT").map(String::as_str), Some("5001"));
    }

    #[test]
    fn references_inject_connection_variables() {
        let plan = resolve_plan(&starter(), &HostConfig::default()).expect("plan");
        let api = spec(&plan, "apiservice");
        assert_eq!(
            api.env.get("CACHE_URI").map(String::as_str),
            Some("redis://localhost:6379")
        );
        assert_eq!(api.env.get("CACHE_HOST").map(String::as_str), Some("localhost"));
        assert_eq!(api.env.get("CACHE_PORT").map(String::as_str), Some("6379"));
        assert_eq!(
            api.env.get("services__cache__tcp__0").map(String::as_str),
            Some("redis://localhost:6379")
        );

        let web = spec(&plan, "frontend");
        assert_eq!(
            web.env.get("services__apiservice__http__0").map(String::as_str),
            Some("http://localhost:5000")
        );
        assert!(!web.env.contains_key("CACHE_URI"));
    }

    #[test]
    fn commands_follow_presets() {
        let plan = resolve_plan(&starter(), &HostConfig::default()).expect("plan");
        let api = spec(&plan, "apiservice");
        assert_eq!(api.command.as_ref().expect("cmd").to_string(), "uv run app.py");
        assert_eq!(api.working_dir, Some(PathBuf::from("./api_service")));

        let web = spec(&plan, "frontend");
        assert_eq!(web.setup.len(), 1);
        assert_eq!(web.setup[0].to_string(), "npm install");
        assert_eq!(web.command.as_ref().expect("cmd").to_string(), "npm run dev");
        assert_eq!(web.waits_for.len(), 1);

        let cache = spec(&plan, "cache");
        let cmd = cache.command.as_ref().expect("cmd").to_string();
        assert!(cmd.starts_with("docker run --rm --name cache -p 6379:6379"), "got: {cmd}");
        assert!(cmd.ends_with("docker.io/library/redis:8.2"), "got: {cmd}");
    }

    #[test]
    fn plan_follows_start_order() {
        let plan = resolve_plan(&starter(), &HostConfig::default()).expect("plan");
        let names: Vec<&str> = plan.iter().map(|s| s.name.as_str()).collect();
        let pos = |n: &str| names.iter().position(|x| *x == n).expect(n);
        assert!(pos("apiservice") < pos("frontend"));
    }

    #[test]
    fn python_without_preset_uses_configured_interpreter() {
        let mut builder = CompositionBuilder::new();
        let _ = builder
            .add_python_app("apiservice", "./api_service", "app.py")
            .expect("api");
        let descriptor = builder.build().expect("build");
        let config = HostConfig {
            python: "python3.13".into(),
            ..HostConfig::default()
        };
        let plan = resolve_plan(&descriptor, &config).expect("plan");
        assert_eq!(
            plan[0].command.as_ref().expect("cmd").to_string(),
            "python3.13 app.py"
        );
        assert!(plan[0].endpoints.is_empty());
    }

    #[test]
    fn virtualenv_uses_its_interpreter() {
        let mut builder = CompositionBuilder::new();
        let api = builder
            .add_python_app("apiservice", "./api_service", "app.py")
            .expect("api");
        builder
            .with_environment_preset(
                api,
                EnvironmentPreset::Virtualenv {
                    path: PathBuf::from(".venv"),
                },
            )
            .expect("venv");
        let plan = resolve_plan(&builder.build().expect("build"), &HostConfig::default())
            .expect("plan");
        assert_eq!(
            plan[0].command.as_ref().expect("cmd").to_string(),
            ".venv/bin/python app.py"
        );
    }

    #[test]
    fn allocator_skips_fixed_ports() {
        let mut builder = CompositionBuilder::new();
        let api = builder
            .add_python_app("apiservice", "./api_service", "app.py")
            .expect("api");
        builder
            .with_endpoint(
                api,
                Endpoint::new(Protocol::Http, PortSource::Fixed(5000)).named("metrics"),
            )
            .expect("fixed");
        builder
            .with_endpoint(api, Endpoint::http_from_env("PORT"))
            .expect("env");
        let plan = resolve_plan(&builder.build().expect("build"), &HostConfig::default())
            .expect("plan");
        assert_eq!(plan[0].env.get("PORT").map(String::as_str), Some("5001"));
    }

    #[test]
    fn literal_env_overrides_injected_values() {
        let mut builder = CompositionBuilder::new();
        let api = builder
            .add_python_app("apiservice", "./api_service", "app.py")
            .expect("api");
        builder
            .with_endpoint(api, Endpoint::http_from_env("PORT"))
            .expect("env");
        builder.with_env(api, "PORT", "8111").expect("literal");
        let plan = resolve_plan(&builder.build().expect("build"), &HostConfig::default())
            .expect("plan");
        assert_eq!(plan[0].env.get("PORT").map(String::as_str), Some("8111"));
    }

    #[test]
    fn exhausted_port_range_fails() {
        let mut allocator = PortAllocator::new(u16::MAX, HashSet::new());
        assert_eq!(allocator.allocate().expect("last port"), u16::MAX);
        assert!(allocator.allocate().is_err());
    }
}
