mod model;
mod parse;
mod source;

pub use model::{Atlas, ClusterInfo, LearnPath, Node, NodeId, SummaryNode};
pub use parse::{ClusterDoc, CoordDoc, DotDoc, resolve_coord};
pub use source::{AtlasSource, load_atlas};

#[cfg(test)]
pub(crate) use parse::parse_cluster_docs;
#[cfg(test)]
pub(crate) use source::build_atlas;
