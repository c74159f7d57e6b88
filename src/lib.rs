//! NeuroLaunch - bootstrapper for a containerized Ollama model server
//!
//! Before the downstream server starts, this crate makes sure the local
//! model-serving container is present, on the latest image, running,
//! answering requests, and stocked with the required models. It then hands
//! the process over to the downstream binary.
//!
//! # Modules
//!
//! - `config` - Container, readiness, model, and launch settings
//! - `runtime` - Container runtime trait and the docker-compatible CLI backend
//! - `capability` - GPU detection
//! - `container` - Create / update / start reconciliation of the managed container
//! - `readiness` - Fixed-interval readiness polling
//! - `models` - Model presence check and fetching inside the container
//! - `handoff` - Downstream command construction and exec
//! - `bootstrap` - Orchestrator running all of the above in order
//! - `tracing` - Structured logging with optional OTLP export
//!
//! # Quick Start
//!
//! ```ignore
//! use neurolaunch::{BootstrapConfig, Bootstrapper, CliRuntime};
//!
//! let config = BootstrapConfig::from_env()?;
//! let runtime = CliRuntime::new(&config.container.runtime);
//! let bootstrapper = Bootstrapper::new(&runtime, &config, neurolaunch::capability::gpu_present());
//! let (_report, plan) = bootstrapper.run(std::env::args_os().skip(1), None).await?;
//! plan.exec()?;
//! ```
//!
//! # Known limitations
//!
//! Concurrent runs against the same container name are not supported and can
//! interleave create/remove calls. Failed recreations are not rolled back.

pub mod bootstrap;
pub mod capability;
pub mod config;
pub mod container;
pub mod error;
pub mod handoff;
pub mod models;
pub mod output;
pub mod readiness;
pub mod runtime;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use bootstrap::{BootstrapReport, Bootstrapper};
pub use config::BootstrapConfig;
pub use error::BootstrapError;
pub use handoff::LaunchPlan;
pub use runtime::{AccelMode, CliRuntime, ContainerRuntime};
