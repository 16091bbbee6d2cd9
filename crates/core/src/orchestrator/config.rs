//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Directory for transcoded-but-not-yet-published files.
    #[serde(default = "default_outgoing_dir")]
    pub outgoing_dir: PathBuf,

    /// How many terminal task records to keep for the status surface.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_outgoing_dir() -> PathBuf {
    PathBuf::from("work/outgoing")
}

fn default_history_limit() -> usize {
    50
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            outgoing_dir: default_outgoing_dir(),
            history_limit: default_history_limit(),
        }
    }
}
