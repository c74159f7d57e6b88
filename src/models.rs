//! Model reconciliation inside the managed container
//!
//! The service's own CLI is used through `exec`: one `ollama list` to see what
//! is present, then one `ollama pull <name>` per missing model. A required
//! model matches a present one when their base names (tag stripped) are equal,
//! ignoring case, so `"llama3.2:3b"` is satisfied by `"llama3.2:latest"`.

use tracing::{debug, info};

use crate::container::RunningContainer;
use crate::error::BootstrapError;
use crate::output;
use crate::runtime::ContainerRuntime;

const LIST_COMMAND: &[&str] = &["ollama", "list"];
const PULL_COMMAND: &[&str] = &["ollama", "pull"];

/// One row of the model listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    /// Name without tag (e.g., "llama3.2" or "registry.local:5000/team/coder")
    pub name: String,
    /// Tag after the final ':' if any (e.g., "3b")
    pub tag: Option<String>,
}

impl ModelEntry {
    /// Split a model reference into name and tag
    ///
    /// A ':' before the last '/' belongs to a registry host, not a tag.
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let name_start = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
        match reference[name_start..].rfind(':') {
            Some(i) => {
                let split = name_start + i;
                Self {
                    name: reference[..split].to_string(),
                    tag: Some(reference[split + 1..].to_string()).filter(|t| !t.is_empty()),
                }
            }
            None => Self {
                name: reference.to_string(),
                tag: None,
            },
        }
    }

    /// Whether this entry satisfies a requirement, ignoring tags and case
    pub fn satisfies(&self, required: &ModelEntry) -> bool {
        self.name.eq_ignore_ascii_case(&required.name)
    }
}

/// Parse `ollama list` output into entries, skipping the header row
pub fn parse_listing(listing: &str) -> Vec<ModelEntry> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|first| !first.eq_ignore_ascii_case("NAME"))
        .map(ModelEntry::parse)
        .collect()
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReport {
    /// Required models that were already present
    pub present: Vec<String>,
    /// Required models that had to be fetched
    pub fetched: Vec<String>,
}

/// Ensure every required model exists inside the running container
///
/// Models are fetched in the given order and the first failed fetch stops
/// the pass. When everything is present only the listing is queried.
pub fn ensure_models<R: ContainerRuntime + ?Sized>(
    runtime: &R,
    container: &RunningContainer,
    required: &[String],
) -> Result<ModelReport, BootstrapError> {
    let mut report = ModelReport::default();
    if required.is_empty() {
        return Ok(report);
    }

    let listing = runtime
        .exec(&container.name, LIST_COMMAND)
        .map_err(|e| BootstrapError::Runtime(e.to_string()))?;
    let available = parse_listing(&listing);
    debug!(count = available.len(), "Models present in container");

    for model in required {
        let wanted = ModelEntry::parse(model);
        if available.iter().any(|entry| entry.satisfies(&wanted)) {
            debug!(model = %model, "Model present");
            report.present.push(model.clone());
            continue;
        }

        info!(model = %model, container = %container.name, "Fetching missing model");
        output::info(format!("Downloading model {} ...", model));

        let pull: Vec<&str> = PULL_COMMAND
            .iter()
            .copied()
            .chain(std::iter::once(model.as_str()))
            .collect();
        runtime
            .exec_streaming(&container.name, &pull)
            .map_err(|e| BootstrapError::Resource {
                model: model.clone(),
                detail: e.to_string(),
            })?;

        output::success(format!("Model {} ready", model));
        report.fetched.push(model.clone());
    }

    Ok(report)
}
