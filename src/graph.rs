// src/graph.rs
// =============================================================================
// The connection map: which character links to which.
//
// Workers record an entry when (and only when) they expand a character page,
// so each key appears at most once per run - the same claim that guarantees
// single expansion guarantees single recording.
//
// The map is exported as pretty JSON at the end of the run. A BTreeMap keeps
// the output deterministic, which makes diffs between runs meaningful.
// =============================================================================

use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

// Thread-safe adjacency map of canonical character names.
pub struct ConnectionMap {
    edges: Mutex<BTreeMap<String, Vec<String>>>,
}

impl ConnectionMap {
    pub fn new() -> Self {
        Self {
            edges: Mutex::new(BTreeMap::new()),
        }
    }

    // Records the outgoing neighbors of an expanded character page.
    pub fn record(&self, from: &str, neighbors: Vec<String>) {
        self.edges
            .lock()
            .expect("connection map mutex poisoned")
            .insert(from.to_string(), neighbors);
    }

    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.edges
            .lock()
            .expect("connection map mutex poisoned")
            .clone()
    }
}

// Writes the connection map as pretty JSON, the format the visualizer reads.
pub fn export_connections(
    path: &Path,
    connections: &BTreeMap<String, Vec<String>>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(connections)
        .context("cannot serialize connection map")?;
    std::fs::write(path, json)
        .with_context(|| format!("cannot write connection map to {}", path.display()))
}
