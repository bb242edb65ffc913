//! Domain primitive types used across the apphost workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_RESOURCE_NAME_LEN;
use crate::error::{AppHostError, Result};

/// Validated name of a resource within a composition.
///
/// Names are ASCII letters, digits, and hyphens, start with a letter,
/// never end with a hyphen, never contain `--`, and are at most
/// [`MAX_RESOURCE_NAME_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    /// Creates a resource name, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`AppHostError::InvalidName`] if the name is malformed.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        match check_name(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(AppHostError::InvalidName { name, reason }),
        }
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key used for uniqueness checks. Names compare case-insensitively.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Name turned into an environment variable prefix (`api-service` → `API_SERVICE`).
    #[must_use]
    pub fn env_prefix(&self) -> String {
        self.0.to_ascii_uppercase().replace('-', "_")
    }
}

/// Checks the shape of a resource name, returning the reason it is rejected.
///
/// # Errors
///
/// Returns a static description of the first rule the name breaks.
pub fn check_name(name: &str) -> std::result::Result<(), &'static str> {
    let Some(first) = name.chars().next() else {
        return Err("name must not be empty");
    };
    if name.len() > MAX_RESOURCE_NAME_LEN {
        return Err("name must be at most 64 characters");
    }
    if !first.is_ascii_alphabetic() {
        return Err("name must start with an ASCII letter");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("name may only contain ASCII letters, digits, and hyphens");
    }
    if name.ends_with('-') {
        return Err("name must not end with a hyphen");
    }
    if name.contains("--") {
        return Err("name must not contain consecutive hyphens");
    }
    Ok(())
}

impl TryFrom<String> for ResourceName {
    type Error = AppHostError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire protocol spoken on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
    /// Raw TCP.
    Tcp,
}

impl Protocol {
    /// URI scheme for this protocol.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Tcp => "tcp",
        }
    }

    /// Returns `true` for HTTP and HTTPS.
    #[must_use]
    pub const fn is_http(self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Where an endpoint's port number comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSource {
    /// A port fixed at declaration time.
    Fixed(u16),
    /// A port chosen at launch and handed to the process through this variable.
    Env(String),
}

impl PortSource {
    /// Returns the fixed port, if any.
    #[must_use]
    pub const fn fixed(&self) -> Option<u16> {
        match self {
            Self::Fixed(port) => Some(*port),
            Self::Env(_) => None,
        }
    }
}

impl fmt::Display for PortSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(port) => write!(f, "{port}"),
            Self::Env(var) => write!(f, "${var}"),
        }
    }
}
