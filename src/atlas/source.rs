use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;
use std::fs;

use anyhow::{Context, Result};
use eframe::egui::{Color32, vec2};
use log::{info, warn};

use crate::atlas::model::{Atlas, ClusterInfo, LearnPath, Node, NodeId, SummaryNode};
use crate::atlas::parse::{ClusterDoc, LinesDoc, parse_cluster_docs};
use crate::layout::{GeneratedLayout, LayoutOptions, generate};

/// Everything `load_atlas` needs, captured from the CLI so a reload can rerun
/// with identical inputs.
#[derive(Clone, Debug)]
pub struct AtlasSource {
    pub data_path: Option<String>,
    /// Slug of a subject to open directly on startup.
    pub subject: Option<String>,
    pub seed: u64,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

const BUNDLED_CLUSTERS: &str = include_str!("../../assets/clusters.json");

const SUMMARY_NODE_SIZE: f32 = 8.0;
const SUMMARY_RING_SPREAD: f32 = 0.3;

/// Loads the cluster dataset and builds the atlas. A user-supplied file that
/// cannot be read or parsed degrades to the bundled dataset with a warning;
/// only a broken bundled dataset is a hard error.
pub fn load_atlas(source: &AtlasSource) -> Result<Atlas> {
    let docs = match &source.data_path {
        Some(path) => match read_cluster_file(path) {
            Ok(docs) => docs,
            Err(err) => {
                warn!("failed to load {path}: {err:#}; using the bundled dataset");
                bundled_docs()?
            }
        },
        None => bundled_docs()?,
    };

    let atlas = build_atlas(docs, source);
    info!(
        "atlas ready: {} clusters, {} nodes, {} edges",
        atlas.clusters.len(),
        atlas.node_count(),
        atlas.edge_count()
    );
    Ok(atlas)
}

fn read_cluster_file(path: &str) -> Result<Vec<ClusterDoc>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    parse_cluster_docs(&raw).with_context(|| format!("parsing {path}"))
}

fn bundled_docs() -> Result<Vec<ClusterDoc>> {
    parse_cluster_docs(BUNDLED_CLUSTERS).context("parsing the bundled dataset")
}

pub(crate) fn build_atlas(docs: Vec<ClusterDoc>, source: &AtlasSource) -> Atlas {
    let cluster_count = docs.len();
    let mut atlas = Atlas {
        clusters: Vec::with_capacity(cluster_count),
        summaries: Vec::with_capacity(cluster_count),
        nodes: Vec::new(),
        paths: Vec::new(),
        hierarchical: Vec::new(),
        connections: Vec::new(),
        index: HashMap::new(),
        cluster_ranges: Vec::with_capacity(cluster_count),
    };

    for (cluster, doc) in docs.into_iter().enumerate() {
        let options = LayoutOptions {
            canvas_width: source.canvas_width,
            canvas_height: source.canvas_height,
            // Per-cluster seed keeps sibling clusters from sharing a layout.
            seed: source.seed.wrapping_add(cluster as u64),
            ..LayoutOptions::default()
        };

        let mut generated = generate(&doc.dots, &options);
        recenter(&mut generated);
        add_cluster(&mut atlas, cluster, &doc, generated);

        atlas.summaries.push(summary_node(
            cluster,
            cluster_count,
            &doc,
            source.canvas_width.min(source.canvas_height) * SUMMARY_RING_SPREAD,
        ));
        atlas.clusters.push(ClusterInfo {
            name: doc.name,
            slug: doc.slug,
            description: doc.description.unwrap_or_default(),
        });
    }

    atlas
}

/// Shifts a generated cluster so its bounding box is centered on the world
/// origin; the viewport's reset state then frames it without an offset.
fn recenter(generated: &mut GeneratedLayout) {
    let Some(first) = generated.nodes.first() else {
        return;
    };

    let mut min = first.pos;
    let mut max = first.pos;
    for node in &generated.nodes {
        min = min.min(node.pos);
        max = max.max(node.pos);
    }

    let shift = (min + max) * 0.5;
    for node in &mut generated.nodes {
        node.pos -= shift;
    }
}

fn add_cluster(atlas: &mut Atlas, cluster: usize, doc: &ClusterDoc, generated: GeneratedLayout) {
    let start = atlas.nodes.len();
    let mut known: HashSet<u32> = HashSet::with_capacity(generated.nodes.len());

    for placed in &generated.nodes {
        if !known.insert(placed.local) {
            warn!(
                "cluster {:?}: duplicate node id {}, keeping the first occurrence",
                doc.slug, placed.local
            );
            continue;
        }

        let id = NodeId {
            cluster,
            local: placed.local,
        };
        atlas.index.insert(id, atlas.nodes.len());
        atlas.nodes.push(Node {
            id,
            text: placed.text.clone(),
            details: placed.details.clone(),
            full_content: placed.full_content.clone(),
            size: placed.size,
            color: placed.color,
            pos: placed.pos,
            parent: placed.parent.map(|local| NodeId { cluster, local }),
            level: placed.level,
            is_parent: placed.is_parent,
        });
    }
    atlas.cluster_ranges.push(start..atlas.nodes.len());

    // A parent that never materialized (duplicate id path above) breaks the
    // forest shape; drop the orphan to root instead.
    for node in &mut atlas.nodes[start..] {
        if let Some(parent) = node.parent
            && !known.contains(&parent.local)
        {
            warn!("cluster {:?}: node {} has unknown parent {}, detaching", doc.slug, node.id, parent);
            node.parent = None;
            node.level = 0;
        }
    }

    let (hierarchical, connections) = match &doc.lines {
        Some(lines) => authored_edges(lines, &doc.slug),
        None => (generated.hierarchical, generated.connections),
    };
    append_edges(atlas, cluster, &doc.slug, &known, hierarchical, connections);

    for path in &doc.paths {
        let stops: Vec<NodeId> = path
            .dots
            .iter()
            .filter_map(|&local| {
                if known.contains(&local) {
                    Some(NodeId { cluster, local })
                } else {
                    warn!("path {:?}: skipping unknown stop {local}", path.id);
                    None
                }
            })
            .collect();

        if stops.is_empty() {
            warn!("path {:?}: no resolvable stops, dropping it", path.id);
            continue;
        }
        atlas.paths.push(LearnPath {
            id: path.id.clone(),
            name: path.name.clone(),
            cluster,
            stops,
        });
    }
}

/// Pre-authored edge lists are trusted over the generator's, after the same
/// normalization: self-loops out, connections deduplicated in ascending order.
fn authored_edges(lines: &LinesDoc, slug: &str) -> (Vec<(u32, u32)>, Vec<(u32, u32)>) {
    let hierarchical = lines
        .hierarchical
        .iter()
        .map(|line| (line.source, line.target))
        .collect();

    let mut connections: Vec<(u32, u32)> = Vec::with_capacity(lines.connections.len());
    for line in &lines.connections {
        if line.source == line.target {
            warn!("cluster {slug:?}: dropping self-loop connection on {}", line.source);
            continue;
        }
        let pair = if line.source < line.target {
            (line.source, line.target)
        } else {
            (line.target, line.source)
        };
        if !connections.contains(&pair) {
            connections.push(pair);
        }
    }

    (hierarchical, connections)
}

fn append_edges(
    atlas: &mut Atlas,
    cluster: usize,
    slug: &str,
    known: &HashSet<u32>,
    hierarchical: Vec<(u32, u32)>,
    connections: Vec<(u32, u32)>,
) {
    let mut lift = |pairs: Vec<(u32, u32)>, out_hierarchical: bool| {
        for (source, target) in pairs {
            if !known.contains(&source) || !known.contains(&target) {
                warn!("cluster {slug:?}: dropping edge {source}->{target} with unknown endpoint");
                continue;
            }
            let pair = (
                NodeId { cluster, local: source },
                NodeId { cluster, local: target },
            );
            if out_hierarchical {
                atlas.hierarchical.push(pair);
            } else {
                atlas.connections.push(pair);
            }
        }
    };

    lift(hierarchical, true);
    lift(connections, false);
}

fn summary_node(cluster: usize, count: usize, doc: &ClusterDoc, ring_radius: f32) -> SummaryNode {
    let angle = TAU * cluster as f32 / count.max(1) as f32;
    SummaryNode {
        cluster,
        text: doc.name.clone(),
        details: doc.description.clone().unwrap_or_default(),
        color: hsl_color(cluster as f32 * 360.0 / count.max(1) as f32, 0.7, 0.6),
        pos: vec2(angle.cos(), angle.sin()) * ring_radius,
        size: SUMMARY_NODE_SIZE,
    }
}

/// Evenly hue-spaced cluster colors; standard hsl-to-rgb conversion.
fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    Color32::from_rgb(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> AtlasSource {
        AtlasSource {
            data_path: None,
            subject: None,
            seed: 11,
            canvas_width: 1920.0,
            canvas_height: 1080.0,
        }
    }

    fn two_cluster_docs() -> Vec<ClusterDoc> {
        parse_cluster_docs(
            r#"[
                {
                    "name": "Graphs", "slug": "graphs", "description": "Graph theory",
                    "dots": [
                        {"id": 1, "text": "Graph", "size": 8, "children": [
                            {"id": 2, "text": "BFS", "connections": [3]},
                            {"id": 3, "text": "DFS"}
                        ]}
                    ],
                    "paths": [{"id": "traversal", "name": "Traversal", "dots": [2, 3, 99]}]
                },
                {
                    "name": "Sorting", "slug": "sorting",
                    "dots": [{"id": 1, "text": "Quicksort"}]
                }
            ]"#,
        )
        .expect("fixture parses")
    }

    #[test]
    fn bundled_dataset_parses() {
        let docs = bundled_docs().expect("bundled dataset is valid");
        assert!(!docs.is_empty());
        assert!(docs.iter().all(|doc| !doc.dots.is_empty()));
    }

    #[test]
    fn clusters_are_indexed_and_ranged() {
        let atlas = build_atlas(two_cluster_docs(), &test_source());

        assert_eq!(atlas.clusters.len(), 2);
        assert_eq!(atlas.summaries.len(), 2);
        assert_eq!(atlas.node_count(), 4);
        assert_eq!(atlas.cluster_nodes(0).len(), 3);
        assert_eq!(atlas.cluster_nodes(1).len(), 1);

        let bfs = NodeId { cluster: 0, local: 2 };
        assert_eq!(atlas.node(bfs).map(|node| node.text.as_str()), Some("BFS"));
        assert_eq!(atlas.node(NodeId { cluster: 1, local: 2 }).map(|n| &n.text), None);

        // Same local id in different clusters stays distinct.
        let graphs_root = atlas.node(NodeId { cluster: 0, local: 1 }).unwrap();
        let sorting_root = atlas.node(NodeId { cluster: 1, local: 1 }).unwrap();
        assert_eq!(graphs_root.text, "Graph");
        assert_eq!(sorting_root.text, "Quicksort");
    }

    #[test]
    fn edges_lift_to_composite_ids() {
        let atlas = build_atlas(two_cluster_docs(), &test_source());

        let root = NodeId { cluster: 0, local: 1 };
        assert_eq!(
            atlas.children_of(root),
            vec![NodeId { cluster: 0, local: 2 }, NodeId { cluster: 0, local: 3 }]
        );
        assert_eq!(
            atlas.connections_of(NodeId { cluster: 0, local: 2 }),
            vec![NodeId { cluster: 0, local: 3 }]
        );
        assert_eq!(atlas.hierarchical.len(), 2);
        assert_eq!(atlas.connections.len(), 1);
    }

    #[test]
    fn unknown_path_stops_are_skipped() {
        let atlas = build_atlas(two_cluster_docs(), &test_source());

        assert_eq!(atlas.paths.len(), 1);
        let path = &atlas.paths[0];
        assert_eq!(path.cluster, 0);
        assert_eq!(
            path.stops,
            vec![NodeId { cluster: 0, local: 2 }, NodeId { cluster: 0, local: 3 }]
        );
        assert_eq!(atlas.path_starting_at(NodeId { cluster: 0, local: 2 }), Some(0));
    }

    #[test]
    fn clusters_are_recentred_on_origin() {
        let docs = parse_cluster_docs(
            r#"[{"name": "Pinned", "slug": "pinned", "dots": [
                {"id": 1, "text": "a", "x": "centerX + 100", "y": "centerY + 100"},
                {"id": 2, "text": "b", "x": "centerX + 300", "y": "centerY + 100"}
            ]}]"#,
        )
        .expect("fixture parses");

        let atlas = build_atlas(docs, &test_source());
        let a = atlas.node(NodeId { cluster: 0, local: 1 }).unwrap();
        let b = atlas.node(NodeId { cluster: 0, local: 2 }).unwrap();
        assert_eq!(a.pos, vec2(-100.0, 0.0));
        assert_eq!(b.pos, vec2(100.0, 0.0));
    }

    #[test]
    fn authored_lines_replace_generated_edges() {
        let docs = parse_cluster_docs(
            r#"[{"name": "Lines", "slug": "lines",
                "dots": [
                    {"id": 1, "text": "a"}, {"id": 2, "text": "b"}, {"id": 3, "text": "c"}
                ],
                "lines": {
                    "hierarchical": [{"source": 1, "target": 2}],
                    "connections": [
                        {"source": 3, "target": 2},
                        {"source": 2, "target": 3},
                        {"source": 1, "target": 1},
                        {"source": 1, "target": 9}
                    ]
                }}]"#,
        )
        .expect("fixture parses");

        let atlas = build_atlas(docs, &test_source());
        assert_eq!(
            atlas.hierarchical,
            vec![(NodeId { cluster: 0, local: 1 }, NodeId { cluster: 0, local: 2 })]
        );
        // Normalized ascending, deduplicated, self-loop and unknown endpoint gone.
        assert_eq!(
            atlas.connections,
            vec![(NodeId { cluster: 0, local: 2 }, NodeId { cluster: 0, local: 3 })]
        );
    }

    #[test]
    fn summary_colors_are_hue_spaced() {
        let atlas = build_atlas(two_cluster_docs(), &test_source());
        assert_ne!(atlas.summaries[0].color, atlas.summaries[1].color);
        assert_eq!(atlas.summaries[0].text, "Graphs");
        assert!(atlas.summaries[0].pos != atlas.summaries[1].pos);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_color(0.0, 1.0, 0.5), Color32::from_rgb(255, 0, 0));
        assert_eq!(hsl_color(120.0, 1.0, 0.5), Color32::from_rgb(0, 255, 0));
        assert_eq!(hsl_color(240.0, 1.0, 0.5), Color32::from_rgb(0, 0, 255));
    }
}
