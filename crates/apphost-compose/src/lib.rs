//! # apphost-compose
//!
//! Composition descriptors for distributed application starters.
//!
//! Handles:
//! - **Resource**: Resource kinds, presets, endpoints, and publish targets.
//! - **Builder**: Handle-based API that accumulates declarations.
//! - **Graph**: Wait-for DAG and deterministic start ordering.
//! - **Validator**: Whole-composition checks that report every violation.
//! - **Descriptor**: The immutable result handed to an orchestrator.
//! - **Resolver**: Port binding, launch commands, and reference wiring.
//! - **Manifest**: `apphost.yaml` loading and rendering.
//! - **Templates**: Built-in starter compositions.
//!
//! # Example
//!
//! ```rust
//! use apphost_compose::builder::CompositionBuilder;
//! use apphost_compose::resource::Endpoint;
//!
//! let mut builder = CompositionBuilder::new();
//! let api = builder.add_python_app("apiservice", "./api_service", "app.py")?;
//! builder.with_endpoint(api, Endpoint::http_from_env("PORT").external())?;
//! let frontend = builder.add_vite_app("frontend", "./frontend")?;
//! builder.with_reference(frontend, api)?;
//! builder.wait_for(frontend, api)?;
//!
//! let descriptor = builder.build()?;
//! assert_eq!(descriptor.start_order()[0].as_str(), "apiservice");
//! # Ok::<(), apphost_common::error::AppHostError>(())
//! ```

pub mod builder;
pub mod descriptor;
pub mod graph;
pub mod manifest;
pub mod resolver;
pub mod resource;
pub mod templates;
pub mod validator;
