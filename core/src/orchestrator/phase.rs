//! Benchmark lifecycle phases

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a [`Benchmark`](super::Benchmark)
///
/// Phases only move forward. A benchmark holds `Validated` right after it is
/// built; after a run it holds either `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Built and validated, nothing touched yet
    Validated,
    /// Every engine cleared
    Cleared,
    /// Corpus generated
    Generated,
    /// Every chunk sent to every engine
    Ingested,
    /// Every engine reports the full document count
    IndexSynced,
    /// Query load running
    Querying,
    /// Run completed
    Done,
    /// Run aborted by a fatal error or an interrupt
    Failed,
}

impl Phase {
    /// Whether a benchmark in this phase may start a run
    pub fn can_run(&self) -> bool {
        matches!(self, Phase::Validated)
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Validated => write!(f, "validate"),
            Phase::Cleared => write!(f, "clear"),
            Phase::Generated => write!(f, "generate"),
            Phase::Ingested => write!(f, "ingest"),
            Phase::IndexSynced => write!(f, "index sync"),
            Phase::Querying => write!(f, "query"),
            Phase::Done => write!(f, "done"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}
