//! The incremental-update availability graph.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::version::FactorioVersion;

/// One incremental update edge: a patch that transforms an install from
/// exactly `from` to exactly `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UpdateStep {
    pub from: FactorioVersion,
    pub to: FactorioVersion,
}

impl UpdateStep {
    pub fn new(from: FactorioVersion, to: FactorioVersion) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// The set of update edges published for the headless package.
///
/// Built from the updater API's available-versions payload; entries that
/// only mark the current stable version carry no edge and are skipped.
#[derive(Debug, Default)]
pub struct UpdateGraph {
    edges: HashMap<FactorioVersion, Vec<FactorioVersion>>,
}

/// One entry of the updater API payload. Besides `{from, to}` edges the
/// array contains `{"stable": version}` markers, so both fields are
/// optional at parse time.
#[derive(Debug, Deserialize)]
pub(crate) struct AvailableUpdateEntry {
    pub from: Option<FactorioVersion>,
    pub to: Option<FactorioVersion>,
}

impl UpdateGraph {
    /// Build the graph from parsed API entries, skipping non-edge markers.
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = AvailableUpdateEntry>) -> Self {
        let mut edges: HashMap<FactorioVersion, Vec<FactorioVersion>> = HashMap::new();
        for entry in entries {
            if let (Some(from), Some(to)) = (entry.from, entry.to) {
                edges.entry(from).or_default().push(to);
            }
        }
        Self { edges }
    }

    /// Build a graph directly from edges. Test seams and fixtures use this.
    pub fn from_edges(edges: impl IntoIterator<Item = (FactorioVersion, FactorioVersion)>) -> Self {
        let mut map: HashMap<FactorioVersion, Vec<FactorioVersion>> = HashMap::new();
        for (from, to) in edges {
            map.entry(from).or_default().push(to);
        }
        Self { edges: map }
    }

    /// Find the patch chain from `from` to exactly `to`.
    ///
    /// Greedy largest-hop walk: at each frontier version, take a direct edge
    /// to `to` when one exists, otherwise hop to the greatest reachable
    /// intermediate. This mirrors how the upstream updater publishes
    /// available pairs — it is not a shortest-path search and the tie-break
    /// must stay as-is.
    ///
    /// Returns `None` when any frontier has no outgoing edge (or the
    /// greatest edge fails to make forward progress, which would otherwise
    /// walk forever on a malformed graph). Returns an empty chain iff
    /// `from == to`.
    pub fn path(&self, from: FactorioVersion, to: FactorioVersion) -> Option<Vec<UpdateStep>> {
        let mut path = Vec::new();
        let mut frontier = from;

        while frontier != to {
            let candidates = self.edges.get(&frontier)?;
            let best = if candidates.contains(&to) {
                to
            } else {
                *candidates.iter().max()?
            };

            if best <= frontier {
                return None;
            }

            path.push(UpdateStep::new(frontier, best));
            frontier = best;
        }

        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> FactorioVersion {
        s.parse().unwrap()
    }

    fn sample_graph() -> UpdateGraph {
        UpdateGraph::from_edges([
            (v("1.1.100"), v("1.1.101")),
            (v("1.1.101"), v("1.1.102")),
            (v("1.1.101"), v("1.1.104")),
            (v("1.1.102"), v("1.1.103")),
            (v("1.1.104"), v("1.1.105")),
        ])
    }

    #[test]
    fn test_path_is_empty_iff_from_equals_to() {
        let graph = sample_graph();
        assert_eq!(graph.path(v("1.1.100"), v("1.1.100")), Some(vec![]));
        assert_ne!(graph.path(v("1.1.100"), v("1.1.101")), Some(vec![]));
    }

    #[test]
    fn test_path_chains_from_to() {
        let graph = sample_graph();
        let path = graph.path(v("1.1.100"), v("1.1.105")).unwrap();

        assert_eq!(path.first().unwrap().from, v("1.1.100"));
        assert_eq!(path.last().unwrap().to, v("1.1.105"));
        for pair in path.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn test_greedy_prefers_largest_hop() {
        let graph = sample_graph();
        // From 1.1.101 both 1.1.102 and 1.1.104 are reachable; the walk to
        // 1.1.105 must take 1.1.104, not the smaller intermediate.
        let path = graph.path(v("1.1.100"), v("1.1.105")).unwrap();
        assert_eq!(
            path,
            vec![
                UpdateStep::new(v("1.1.100"), v("1.1.101")),
                UpdateStep::new(v("1.1.101"), v("1.1.104")),
                UpdateStep::new(v("1.1.104"), v("1.1.105")),
            ]
        );
    }

    #[test]
    fn test_direct_hop_preferred_over_larger_intermediate() {
        // A direct edge to the target wins even when a greater intermediate
        // exists.
        let graph = UpdateGraph::from_edges([
            (v("1.1.100"), v("1.1.102")),
            (v("1.1.100"), v("1.1.105")),
        ]);
        let path = graph.path(v("1.1.100"), v("1.1.102")).unwrap();
        assert_eq!(path, vec![UpdateStep::new(v("1.1.100"), v("1.1.102"))]);
    }

    #[test]
    fn test_unreachable_is_none_never_partial() {
        let graph = sample_graph();
        // 1.1.103 has no outgoing edges, so anything past it is unreachable.
        assert_eq!(graph.path(v("1.1.102"), v("1.1.105")), None);
        // Entirely unknown frontier.
        assert_eq!(graph.path(v("0.17.79"), v("1.1.105")), None);
    }

    #[test]
    fn test_backward_edge_does_not_loop() {
        let graph = UpdateGraph::from_edges([(v("1.1.100"), v("1.1.99"))]);
        assert_eq!(graph.path(v("1.1.100"), v("1.1.105")), None);
    }

    #[test]
    fn test_stable_markers_are_skipped() {
        let entries: Vec<AvailableUpdateEntry> = serde_json::from_str(
            r#"[
                {"from": "1.1.100", "to": "1.1.101"},
                {"stable": "1.1.101"}
            ]"#,
        )
        .unwrap();
        let graph = UpdateGraph::from_entries(entries);
        assert_eq!(
            graph.path(v("1.1.100"), v("1.1.101")),
            Some(vec![UpdateStep::new(v("1.1.100"), v("1.1.101"))])
        );
    }
}
