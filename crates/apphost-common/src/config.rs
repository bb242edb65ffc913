//! Host configuration used when resolving launch plans.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{AppHostError, Result};

/// Settings the plan resolver applies to every resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host name written into resolved endpoint URLs.
    pub host: String,
    /// First port handed out to environment-driven endpoints.
    pub dynamic_port_start: u16,
    /// Interpreter for Python scripts without a package environment.
    pub python: String,
    /// `uv` binary used by the `uv` preset.
    pub uv: String,
    /// Node package manager binary.
    pub npm: String,
    /// Container CLI used to launch managed services.
    pub container_runtime: String,
}

impl HostConfig {
    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::Config`] if a binary name is empty or the
    /// dynamic port range starts at zero.
    pub fn validate(&self) -> Result<()> {
        if self.dynamic_port_start == 0 {
            return Err(AppHostError::Config {
                message: "dynamic_port_start must be greater than zero".into(),
            });
        }
        for (field, value) in [
            ("host", &self.host),
            ("python", &self.python),
            ("uv", &self.uv),
            ("npm", &self.npm),
            ("container_runtime", &self.container_runtime),
        ] {
            if value.trim().is_empty() {
                return Err(AppHostError::Config {
                    message: format!("{field} must not be empty"),
                });
            }
        }
        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            dynamic_port_start: constants::DEFAULT_DYNAMIC_PORT_START,
            python: constants::DEFAULT_PYTHON.to_string(),
            uv: constants::UV_BIN.to_string(),
            npm: constants::NPM_BIN.to_string(),
            container_runtime: constants::CONTAINER_BIN.to_string(),
        }
    }
}
