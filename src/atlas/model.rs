use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use eframe::egui::{Color32, Vec2};

/// Structured composite key for a node: the owning cluster plus the id local
/// to that cluster. Keeps cross-cluster references exact instead of relying
/// on string prefixing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub cluster: usize,
    pub local: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cluster, self.local)
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    pub details: String,
    pub full_content: String,
    pub size: f32,
    pub color: Color32,
    pub pos: Vec2,
    pub parent: Option<NodeId>,
    pub level: u32,
    pub is_parent: bool,
}

#[derive(Clone, Debug)]
pub struct ClusterInfo {
    pub name: String,
    pub slug: String,
    pub description: String,
}

/// One circle per cluster in the high-level view.
#[derive(Clone, Debug)]
pub struct SummaryNode {
    pub cluster: usize,
    pub text: String,
    pub details: String,
    pub color: Color32,
    pub pos: Vec2,
    pub size: f32,
}

/// A named ordered tour through one cluster's nodes.
#[derive(Clone, Debug)]
pub struct LearnPath {
    pub id: String,
    pub name: String,
    pub cluster: usize,
    pub stops: Vec<NodeId>,
}

pub struct Atlas {
    pub clusters: Vec<ClusterInfo>,
    pub summaries: Vec<SummaryNode>,
    pub nodes: Vec<Node>,
    pub paths: Vec<LearnPath>,
    pub hierarchical: Vec<(NodeId, NodeId)>,
    pub connections: Vec<(NodeId, NodeId)>,
    pub(super) index: HashMap<NodeId, usize>,
    pub(super) cluster_ranges: Vec<Range<usize>>,
}

impl Atlas {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.hierarchical.len() + self.connections.len()
    }

    pub fn cluster_nodes(&self, cluster: usize) -> &[Node] {
        self.cluster_ranges
            .get(cluster)
            .map(|range| &self.nodes[range.clone()])
            .unwrap_or(&[])
    }

    /// Direct children of a node, in the order the source tree declared them.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.cluster_nodes(id.cluster)
            .iter()
            .filter(|node| node.parent == Some(id))
            .map(|node| node.id)
            .collect()
    }

    /// Symmetric connection partners of a node, in stored edge order.
    pub fn connections_of(&self, id: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter_map(|&(a, b)| {
                if a == id {
                    Some(b)
                } else if b == id {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn paths_for(&self, cluster: usize) -> impl Iterator<Item = (usize, &LearnPath)> {
        self.paths
            .iter()
            .enumerate()
            .filter(move |(_, path)| path.cluster == cluster)
    }

    /// The path whose first stop is the given node, if any.
    pub fn path_starting_at(&self, id: NodeId) -> Option<usize> {
        self.paths
            .iter()
            .position(|path| path.stops.first() == Some(&id))
    }
}
