use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub struct ClusterDoc {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dots: Vec<DotDoc>,
    #[serde(default)]
    pub paths: Vec<PathDoc>,
    #[serde(default)]
    pub lines: Option<LinesDoc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DotDoc {
    pub id: u32,
    #[serde(default = "default_dot_size")]
    pub size: f32,
    pub text: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, rename = "fullContent")]
    pub full_content: String,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    #[serde(default)]
    pub x: Option<CoordDoc>,
    #[serde(default)]
    pub y: Option<CoordDoc>,
    #[serde(default)]
    pub children: Vec<DotDoc>,
    #[serde(default)]
    pub connections: Vec<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PathDoc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dots: Vec<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LinesDoc {
    #[serde(default)]
    pub hierarchical: Vec<LineDoc>,
    #[serde(default)]
    pub connections: Vec<LineDoc>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct LineDoc {
    pub source: u32,
    pub target: u32,
}

/// A coordinate as the backend ships it: either a literal canvas coordinate
/// or a symbolic expression such as `"centerX + 240"`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum CoordDoc {
    Number(f32),
    Expr(String),
}

fn default_dot_size() -> f32 {
    4.0
}

pub fn parse_cluster_docs(raw: &str) -> Result<Vec<ClusterDoc>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid cluster JSON")?;

    let entries = if let Some(array) = parsed.as_array() {
        array
    } else if let Some(subjects) = parsed.get("subjects").and_then(Value::as_array) {
        subjects
    } else {
        return Err(anyhow!(
            "expected a JSON array of clusters or an object with a subjects field"
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, value)| {
            ClusterDoc::deserialize(value)
                .with_context(|| format!("invalid cluster document at index {index}"))
        })
        .collect()
}

/// Resolves a wire coordinate to a center-origin world coordinate. Literal
/// values are absolute canvas positions; symbolic expressions are offsets
/// from the canvas center. A malformed expression degrades to the center
/// axis value instead of aborting the load.
pub fn resolve_coord(coord: &CoordDoc, center: f32) -> f32 {
    match coord {
        CoordDoc::Number(value) => value - center,
        CoordDoc::Expr(expr) => match parse_center_expr(expr) {
            Some(offset) => offset,
            None => {
                warn!("unresolvable coordinate expression {expr:?}; placing on the center axis");
                0.0
            }
        },
    }
}

fn parse_center_expr(expr: &str) -> Option<f32> {
    let rest = expr.trim();
    let rest = rest
        .strip_prefix("centerX")
        .or_else(|| rest.strip_prefix("centerY"))?;
    let rest = rest.trim();

    if rest.is_empty() {
        return Some(0.0);
    }

    let (sign, tail) = if let Some(tail) = rest.strip_prefix('+') {
        (1.0, tail)
    } else if let Some(tail) = rest.strip_prefix('-') {
        (-1.0, tail)
    } else {
        return None;
    };

    tail.trim().parse::<f32>().ok().map(|value| sign * value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(raw: &str) -> CoordDoc {
        CoordDoc::Expr(raw.to_string())
    }

    #[test]
    fn resolves_symbolic_offsets() {
        assert_eq!(resolve_coord(&expr("centerX + 42"), 960.0), 42.0);
        assert_eq!(resolve_coord(&expr("centerY - 10"), 540.0), -10.0);
        assert_eq!(resolve_coord(&expr("centerX"), 960.0), 0.0);
        assert_eq!(resolve_coord(&expr("  centerY +  3.5 "), 540.0), 3.5);
    }

    #[test]
    fn literal_coordinates_are_recentred() {
        assert_eq!(resolve_coord(&CoordDoc::Number(1000.0), 960.0), 40.0);
        assert_eq!(resolve_coord(&CoordDoc::Number(960.0), 960.0), 0.0);
    }

    #[test]
    fn malformed_expression_degrades_to_center() {
        assert_eq!(resolve_coord(&expr("centreX + 10"), 960.0), 0.0);
        assert_eq!(resolve_coord(&expr("centerX * 2"), 960.0), 0.0);
        assert_eq!(resolve_coord(&expr("centerX + abc"), 960.0), 0.0);
        assert_eq!(resolve_coord(&expr(""), 960.0), 0.0);
    }

    #[test]
    fn parses_cluster_array_and_subjects_object() {
        let raw = r#"[{"name": "Graphs", "slug": "graphs", "dots": [{"id": 1, "text": "BFS"}]}]"#;
        let docs = parse_cluster_docs(raw).expect("array form parses");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].dots[0].text, "BFS");
        assert_eq!(docs[0].dots[0].size, 4.0);

        let wrapped = r#"{"subjects": [{"name": "Graphs", "slug": "graphs"}]}"#;
        let docs = parse_cluster_docs(wrapped).expect("object form parses");
        assert_eq!(docs[0].slug, "graphs");
    }

    #[test]
    fn nested_dot_documents_deserialize() {
        let raw = r#"[{
            "name": "Graphs", "slug": "graphs",
            "dots": [{
                "id": 1, "text": "Graph", "size": 8,
                "x": "centerX + 10", "y": 540,
                "children": [{"id": 2, "text": "BFS", "connections": [3]}]
            }],
            "paths": [{"id": "intro", "name": "Intro", "dots": [1, 2]}]
        }]"#;
        let docs = parse_cluster_docs(raw).expect("nested form parses");
        let root = &docs[0].dots[0];
        assert!(matches!(root.x, Some(CoordDoc::Expr(_))));
        assert!(matches!(root.y, Some(CoordDoc::Number(_))));
        assert_eq!(root.children[0].connections, vec![3]);
        assert_eq!(docs[0].paths[0].dots, vec![1, 2]);
    }
}
