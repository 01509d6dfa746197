use serde::Deserialize;

/// Identifier of a node, unique within one graph.
pub type NodeId = String;

/// Identifier of a run, unique within one run store.
pub type RunId = String;

/// What the status observer does when a single poll fails at the transport
/// level (as opposed to the run itself reaching `Failed`).
///
/// - `Retry`: report the error and keep polling with the current backoff
///   (default behaviour).
/// - `Stop`: report the error and stop observing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportErrorPolicy {
    Retry,
    Stop,
}

impl Default for TransportErrorPolicy {
    fn default() -> Self {
        TransportErrorPolicy::Retry
    }
}
