use std::f32::consts::{PI, TAU};

use eframe::egui::{Color32, Vec2, vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::atlas::{DotDoc, resolve_coord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutMode {
    Scattered,
    Circular,
}

#[derive(Clone, Debug)]
pub struct LayoutOptions {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub mode: LayoutMode,
    pub parent_spread: f32,
    pub child_spread: f32,
    pub jitter: f32,
    pub min_distance: f32,
    /// 0..1; higher values pull top-level mass toward the canvas center.
    pub center_weight: f32,
    pub seed: u64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            canvas_width: 1920.0,
            canvas_height: 1080.0,
            mode: LayoutMode::Scattered,
            parent_spread: 0.35,
            child_spread: 0.12,
            jitter: 15.0,
            min_distance: 80.0,
            center_weight: 0.2,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlacedNode {
    pub local: u32,
    pub text: String,
    pub details: String,
    pub full_content: String,
    pub size: f32,
    pub color: Color32,
    /// Center-origin world position.
    pub pos: Vec2,
    pub parent: Option<u32>,
    pub level: u32,
    pub is_parent: bool,
}

#[derive(Clone, Debug, Default)]
pub struct GeneratedLayout {
    pub nodes: Vec<PlacedNode>,
    pub hierarchical: Vec<(u32, u32)>,
    pub connections: Vec<(u32, u32)>,
}

const MAX_PLACEMENT_ATTEMPTS: usize = 50;
const CHILD_JITTER_FACTOR: f32 = 0.3;
const DEPTH_RADIUS_DECAY: f32 = 0.6;

/// Turns a nested dot tree into flat nodes with concrete world coordinates
/// plus hierarchical and connection edge lists. Dots that already carry
/// coordinates keep them; the rest are placed procedurally. Never fails:
/// unresolvable input degrades with a logged warning instead.
pub fn generate(dots: &[DotDoc], options: &LayoutOptions) -> GeneratedLayout {
    let mut rng = SmallRng::seed_from_u64(options.seed);
    let parent_radius = options.canvas_width.min(options.canvas_height) * options.parent_spread;
    let child_radius = parent_radius * options.child_spread;

    let mut out = GeneratedLayout::default();
    let mut placed_roots: Vec<Vec2> = Vec::new();

    for (index, dot) in dots.iter().enumerate() {
        let color = dot
            .color
            .map(|[r, g, b]| Color32::from_rgb(r, g, b))
            .unwrap_or_else(|| pastel_color(&mut rng));

        let pos = authored_position(dot, options).unwrap_or_else(|| {
            place_top_level(&mut rng, index, dots.len(), parent_radius, options, &placed_roots)
        });
        placed_roots.push(pos);

        push_node(&mut out.nodes, dot, pos, color, None, 0);
        place_children(&mut out.nodes, &mut rng, dot, pos, child_radius, color, 1, options);
    }

    collect_edges(dots, &mut out);
    out
}

fn push_node(
    nodes: &mut Vec<PlacedNode>,
    dot: &DotDoc,
    pos: Vec2,
    color: Color32,
    parent: Option<u32>,
    level: u32,
) {
    nodes.push(PlacedNode {
        local: dot.id,
        text: dot.text.clone(),
        details: dot.details.clone(),
        full_content: dot.full_content.clone(),
        size: dot.size,
        color,
        pos,
        parent,
        level,
        is_parent: !dot.children.is_empty(),
    });
}

/// Children go on a ring around their parent: even angles plus a per-level
/// rotation offset so successive generations do not line up radially. The
/// ring radius stretches with child size and shrinks with depth.
#[allow(clippy::too_many_arguments)]
fn place_children(
    nodes: &mut Vec<PlacedNode>,
    rng: &mut SmallRng,
    parent_doc: &DotDoc,
    parent_pos: Vec2,
    radius: f32,
    inherited_color: Color32,
    level: u32,
    options: &LayoutOptions,
) {
    let count = parent_doc.children.len();
    if count == 0 {
        return;
    }

    let angle_offset = (level as f32 * PI) / (count as f32 + 1.0);

    for (index, child) in parent_doc.children.iter().enumerate() {
        let pos = authored_position(child, options).unwrap_or_else(|| {
            let angle = TAU * index as f32 / count as f32 + angle_offset;
            let ring = radius * (1.0 + child.size / 10.0);
            let jitter = options.jitter * CHILD_JITTER_FACTOR;
            parent_pos
                + vec2(angle.cos(), angle.sin()) * ring
                + vec2(
                    (rng.r#gen::<f32>() - 0.5) * jitter,
                    (rng.r#gen::<f32>() - 0.5) * jitter,
                )
        });

        let color = child
            .color
            .map(|[r, g, b]| Color32::from_rgb(r, g, b))
            .unwrap_or(inherited_color);

        push_node(nodes, child, pos, color, Some(parent_doc.id), level);
        place_children(
            nodes,
            rng,
            child,
            pos,
            radius * DEPTH_RADIUS_DECAY,
            color,
            level + 1,
            options,
        );
    }
}

fn authored_position(dot: &DotDoc, options: &LayoutOptions) -> Option<Vec2> {
    match (&dot.x, &dot.y) {
        (Some(x), Some(y)) => Some(vec2(
            resolve_coord(x, options.canvas_width * 0.5),
            resolve_coord(y, options.canvas_height * 0.5),
        )),
        _ => None,
    }
}

fn place_top_level(
    rng: &mut SmallRng,
    index: usize,
    count: usize,
    parent_radius: f32,
    options: &LayoutOptions,
    placed: &[Vec2],
) -> Vec2 {
    let mut pos = Vec2::ZERO;

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        pos = match options.mode {
            LayoutMode::Circular => {
                let angle = TAU * index as f32 / count.max(1) as f32;
                let radius =
                    parent_radius * (1.0 - rng.r#gen::<f32>() * options.center_weight * 0.3);
                vec2(angle.cos(), angle.sin()) * radius
            }
            LayoutMode::Scattered => sample_center_biased(rng, parent_radius, options),
        };

        if !too_close(pos, placed, options.min_distance) {
            return pos;
        }
    }

    // Attempt budget exhausted: accept the last candidate rather than fail.
    pos
}

/// Uniform angle, radius biased toward the center by `rawDistance^(1+weight)`,
/// then jitter damped by distance from the center.
fn sample_center_biased(rng: &mut SmallRng, radius: f32, options: &LayoutOptions) -> Vec2 {
    let angle = rng.r#gen::<f32>() * TAU;
    let distance = rng.r#gen::<f32>().powf(1.0 + options.center_weight) * radius;
    let raw = vec2(angle.cos(), angle.sin()) * distance;

    vec2(
        jitter_damped(rng, raw.x, options.jitter, options.canvas_width * 0.5, options.center_weight),
        jitter_damped(rng, raw.y, options.jitter, options.canvas_height * 0.5, options.center_weight),
    )
}

fn jitter_damped(rng: &mut SmallRng, value: f32, range: f32, half_extent: f32, weight: f32) -> f32 {
    let raw = (rng.r#gen::<f32>() - 0.5) * range;
    let normalized = (value.abs() / half_extent).min(1.0);
    value + raw * (1.0 - normalized * weight)
}

fn too_close(pos: Vec2, placed: &[Vec2], min_distance: f32) -> bool {
    placed.iter().any(|&other| (pos - other).length() < min_distance)
}

fn pastel_color(rng: &mut SmallRng) -> Color32 {
    Color32::from_rgb(
        128 + rng.r#gen::<u8>() / 2,
        128 + rng.r#gen::<u8>() / 2,
        128 + rng.r#gen::<u8>() / 2,
    )
}

/// One pass over the tree: a hierarchical edge per parent-child relation and
/// a deduplicated connection edge per symmetric reference, kept once with
/// endpoints in ascending id order.
fn collect_edges(dots: &[DotDoc], out: &mut GeneratedLayout) {
    for dot in dots {
        for child in &dot.children {
            out.hierarchical.push((dot.id, child.id));
        }

        for &target in &dot.connections {
            if target == dot.id {
                continue;
            }

            let pair = if dot.id < target {
                (dot.id, target)
            } else {
                (target, dot.id)
            };
            if !out.connections.contains(&pair) {
                out.connections.push(pair);
            }
        }

        collect_edges(&dot.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn dot(id: u32, text: &str, children: Vec<DotDoc>, connections: Vec<u32>) -> DotDoc {
        DotDoc {
            id,
            size: 4.0,
            text: text.to_string(),
            details: String::new(),
            full_content: String::new(),
            color: None,
            x: None,
            y: None,
            children,
            connections,
        }
    }

    fn options(seed: u64) -> LayoutOptions {
        LayoutOptions {
            seed,
            ..LayoutOptions::default()
        }
    }

    #[test]
    fn worked_example_nodes_and_edges() {
        let tree = vec![dot(
            1,
            "Graph",
            vec![dot(2, "BFS", vec![], vec![3]), dot(3, "DFS", vec![], vec![2])],
            vec![],
        )];

        let generated = generate(&tree, &options(1));

        assert_eq!(generated.nodes.len(), 3);
        assert_eq!(generated.hierarchical, vec![(1, 2), (1, 3)]);
        assert_eq!(generated.connections, vec![(2, 3)]);

        let root = &generated.nodes[0];
        assert!(root.is_parent);
        assert_eq!(root.level, 0);
        assert_eq!(generated.nodes[1].parent, Some(1));
        assert_eq!(generated.nodes[2].parent, Some(1));
    }

    #[test]
    fn ids_unique_and_parents_resolve() {
        let tree = vec![
            dot(
                1,
                "Trees",
                vec![
                    dot(2, "BST", vec![dot(5, "AVL", vec![], vec![])], vec![]),
                    dot(3, "Heap", vec![], vec![]),
                ],
                vec![],
            ),
            dot(4, "Hashing", vec![], vec![]),
        ];

        let generated = generate(&tree, &options(3));
        let ids: HashSet<u32> = generated.nodes.iter().map(|node| node.local).collect();
        assert_eq!(ids.len(), generated.nodes.len());

        for node in &generated.nodes {
            if let Some(parent) = node.parent {
                assert!(ids.contains(&parent), "dangling parent {parent}");
                assert_ne!(parent, node.local);
            } else {
                assert_eq!(node.level, 0);
            }
        }

        let avl = generated.nodes.iter().find(|node| node.local == 5).unwrap();
        assert_eq!(avl.level, 2);
        assert_eq!(avl.parent, Some(2));
    }

    #[test]
    fn min_distance_between_top_level_nodes() {
        let tree: Vec<DotDoc> = (1..=4).map(|id| dot(id, "node", vec![], vec![])).collect();

        for seed in 0..10 {
            let mut opts = options(seed);
            opts.min_distance = 60.0;
            let generated = generate(&tree, &opts);
            let roots: Vec<Vec2> = generated
                .nodes
                .iter()
                .filter(|node| node.level == 0)
                .map(|node| node.pos)
                .collect();

            for i in 0..roots.len() {
                for j in (i + 1)..roots.len() {
                    let distance = (roots[i] - roots[j]).length();
                    assert!(
                        distance >= 60.0,
                        "seed {seed}: roots {i} and {j} are {distance} apart"
                    );
                }
            }
        }
    }

    #[test]
    fn identical_seed_reproduces_layout() {
        let tree = vec![
            dot(1, "a", vec![dot(2, "b", vec![], vec![])], vec![]),
            dot(3, "c", vec![], vec![]),
        ];

        let first = generate(&tree, &options(42));
        let second = generate(&tree, &options(42));
        for (a, b) in first.nodes.iter().zip(&second.nodes) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.color, b.color);
        }

        let third = generate(&tree, &options(43));
        let moved = first
            .nodes
            .iter()
            .zip(&third.nodes)
            .any(|(a, b)| a.pos != b.pos);
        assert!(moved, "different seeds should move at least one node");
    }

    #[test]
    fn circular_mode_stays_within_parent_radius() {
        let tree: Vec<DotDoc> = (1..=6).map(|id| dot(id, "node", vec![], vec![])).collect();
        let mut opts = options(5);
        opts.mode = LayoutMode::Circular;
        let parent_radius = opts.canvas_width.min(opts.canvas_height) * opts.parent_spread;

        let generated = generate(&tree, &opts);
        for node in &generated.nodes {
            assert!(node.pos.length() <= parent_radius + f32::EPSILON);
        }
    }

    #[test]
    fn children_inherit_top_level_color() {
        let tree = vec![dot(
            1,
            "root",
            vec![dot(2, "child", vec![dot(3, "grandchild", vec![], vec![])], vec![])],
            vec![],
        )];

        let generated = generate(&tree, &options(9));
        let root_color = generated.nodes[0].color;
        assert_eq!(generated.nodes[1].color, root_color);
        assert_eq!(generated.nodes[2].color, root_color);
        // Pastel channels sit in the bright half of the range.
        assert!(root_color.r() >= 128 && root_color.g() >= 128 && root_color.b() >= 128);
    }

    #[test]
    fn connection_dedup_keeps_ascending_order() {
        let tree = vec![
            dot(1, "a", vec![], vec![2, 3]),
            dot(2, "b", vec![], vec![1]),
            dot(3, "c", vec![], vec![1, 3]),
        ];

        let generated = generate(&tree, &options(2));
        assert_eq!(generated.connections, vec![(1, 2), (1, 3)]);
    }

    #[test]
    fn authored_coordinates_win_over_placement() {
        let mut tree = vec![dot(1, "pinned", vec![], vec![])];
        tree[0].x = Some(crate::atlas::CoordDoc::Expr("centerX + 100".to_string()));
        tree[0].y = Some(crate::atlas::CoordDoc::Number(540.0));

        let generated = generate(&tree, &options(0));
        assert_eq!(generated.nodes[0].pos, vec2(100.0, 0.0));
    }
}
