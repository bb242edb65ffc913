//! System-wide constants and defaults.

/// Binary name for the CLI.
pub const BIN_NAME: &str = "apphost";

/// Default composition manifest looked up by the CLI.
pub const DEFAULT_MANIFEST_FILE: &str = "apphost.yaml";

/// Default output path for `apphost publish`.
pub const DEFAULT_PUBLISH_FILE: &str = "apphost-manifest.json";

/// Maximum length of a resource name.
pub const MAX_RESOURCE_NAME_LEN: usize = 64;

/// Environment variable conventionally used to hand a listening port to a child process.
pub const PORT_ENV: &str = "PORT";

/// First port handed out to environment-driven endpoints.
pub const DEFAULT_DYNAMIC_PORT_START: u16 = 5000;

/// Host name written into resolved endpoint URLs.
pub const DEFAULT_HOST: &str = "localhost";

/// Default Python interpreter for script resources without a package environment.
pub const DEFAULT_PYTHON: &str = "python3";

/// Package/environment manager binary used by the `uv` preset.
pub const UV_BIN: &str = "uv";

/// Node package manager binary.
pub const NPM_BIN: &str = "npm";

/// Container CLI used to launch managed services.
pub const CONTAINER_BIN: &str = "docker";

/// Container image used for the cache service.
pub const REDIS_IMAGE: &str = "docker.io/library/redis";

/// Tag of [`REDIS_IMAGE`].
pub const REDIS_TAG: &str = "8.2";

/// Port the cache service listens on.
pub const REDIS_PORT: u16 = 6379;

/// Script name run by Vite frontends.
pub const VITE_DEV_SCRIPT: &str = "dev";

/// Default build file name for Dockerfile publish targets.
pub const DOCKERFILE: &str = "Dockerfile";

/// Path of the forecast endpoint served by the backend resource.
pub const FORECAST_PATH: &str = "/api/weatherforecast";

/// Default base URL of the backend when run outside an orchestrator.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8111";
