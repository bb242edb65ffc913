//! Built-in starter compositions.
//!
//! Each template is one revision of the starter app host: a Python app on
//! its own, the API as a plain script with a publish target, and the full
//! stack with a cache behind the API and a Vite frontend in front of it.

use std::fmt;
use std::str::FromStr;

use apphost_common::constants;
use apphost_common::error::{AppHostError, Result};

use crate::builder::CompositionBuilder;
use crate::descriptor::CompositionDescriptor;
use crate::resource::{Endpoint, EnvironmentPreset, PublishTarget, ResourceKind};

/// A starter composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// `apiservice` only, in a `uv` environment, reachable from outside.
    PythonApp,
    /// `apiservice` declared as a generic script, published from a Dockerfile.
    PythonScript,
    /// `cache`, `apiservice`, and a `frontend` that waits for the API.
    Starter,
}

impl Template {
    /// All templates, in order of growing size.
    pub const ALL: [Self; 3] = [Self::PythonApp, Self::PythonScript, Self::Starter];

    /// Name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PythonApp => "python-app",
            Self::PythonScript => "python-script",
            Self::Starter => "starter",
        }
    }

    /// Builds the template's descriptor.
    ///
    /// # Errors
    ///
    /// Propagates builder errors; the built-in templates are expected to be valid.
    pub fn build(self) -> Result<CompositionDescriptor> {
        tracing::debug!(template = self.name(), "building template");
        let mut builder = CompositionBuilder::new();

        let cache = match self {
            Self::Starter => Some(builder.add_redis("cache")?),
            Self::PythonApp | Self::PythonScript => None,
        };

        let api = match self {
            Self::PythonApp => builder.add_python_app("apiservice", "./api_service", "app.py")?,
            Self::PythonScript | Self::Starter => builder.add_resource(
                "apiservice",
                ResourceKind::python("./api_service", "app.py"),
            )?,
        };
        builder.with_environment_preset(api, EnvironmentPreset::Uv)?;
        if let Some(cache) = cache {
            builder.with_reference(api, cache)?;
        }
        builder.with_endpoint(api, Endpoint::http_from_env(constants::PORT_ENV))?;
        builder.with_external_http_endpoints(api)?;
        if self != Self::PythonApp {
            builder.with_publish_target(api, PublishTarget::dockerfile("."))?;
        }

        if self == Self::Starter {
            let frontend = builder.add_vite_app("frontend", "./frontend")?;
            builder.with_environment_preset(frontend, EnvironmentPreset::NpmInstall)?;
            builder.with_reference(frontend, api)?;
            builder.wait_for(frontend, api)?;
        }

        builder.build()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = AppHostError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| AppHostError::Config {
                message: format!(
                    "unknown template \"{s}\" (expected one of: {})",
                    Self::ALL.map(Self::name).join(", ")
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_builds() {
        for template in Template::ALL {
            let descriptor = template.build().expect(template.name());
            assert!(descriptor.resource("apiservice").is_some());
        }
    }

    #[test]
    fn python_app_is_a_single_resource() {
        let descriptor = Template::PythonApp.build().expect("build");
        assert_eq!(descriptor.len(), 1);
        assert!(descriptor.edges().is_empty());
        let api = descriptor.resource("apiservice").expect("api");
        assert!(api.endpoint("http").expect("http").external);
        assert!(api.publish.is_none());
    }

    #[test]
    fn python_script_is_published_without_dependencies() {
        let descriptor = Template::PythonScript.build().expect("build");
        assert_eq!(descriptor.len(), 1);
        assert!(descriptor.edges().is_empty());
        let api = descriptor.resource("apiservice").expect("api");
        assert_eq!(api.kind, ResourceKind::python("./api_service", "app.py"));
        assert_eq!(api.presets, vec![EnvironmentPreset::Uv]);
        assert!(api.endpoint("http").expect("http").external);
        assert_eq!(api.publish, Some(PublishTarget::dockerfile(".")));
    }

    #[test]
    fn starter_orders_api_before_frontend() {
        let descriptor = Template::Starter.build().expect("build");
        assert_eq!(descriptor.len(), 3);
        let order: Vec<&str> = descriptor.start_order().iter().map(|n| n.as_str()).collect();
        let pos = |n: &str| order.iter().position(|x| *x == n).expect(n);
        assert!(pos("apiservice") < pos("frontend"));
        assert_eq!(descriptor.references_of("apiservice")[0].as_str(), "cache");
    }

    #[test]
    fn template_names_parse() {
        for template in Template::ALL {
            assert_eq!(template.name().parse::<Template>().expect("parse"), template);
        }
        let err = "aspire".parse::<Template>().unwrap_err();
        assert!(err.to_string().contains("python-app, python-script, starter"));
    }
}
