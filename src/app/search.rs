use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::atlas::{Atlas, NodeId};

/// Quiet period after the last keystroke before a query is issued.
const DEBOUNCE_SECS: f64 = 0.25;
const MAX_RESULTS: usize = 20;

#[derive(Clone, Debug)]
pub struct SearchEntry {
    pub id: NodeId,
    pub cluster_name: String,
    pub text: String,
    pub details: String,
}

#[derive(Clone, Debug)]
pub struct SearchHit {
    pub id: NodeId,
    pub cluster_name: String,
    pub text: String,
    pub score: i64,
}

/// Debounced fuzzy search over an immutable snapshot of the atlas. Queries
/// run on a background thread; every issued query carries a sequence number
/// and a response is kept only if it matches the latest issued one, so a
/// slow early query can never overwrite a fast later one.
pub struct SearchBox {
    pub input: String,
    pub results: Vec<SearchHit>,
    index: Arc<Vec<SearchEntry>>,
    tx: Sender<(u64, Vec<SearchHit>)>,
    rx: Receiver<(u64, Vec<SearchHit>)>,
    last_edit: Option<f64>,
    issued_seq: u64,
    in_flight: bool,
}

impl SearchBox {
    pub fn new(atlas: &Atlas) -> Self {
        let index = atlas
            .nodes
            .iter()
            .map(|node| SearchEntry {
                id: node.id,
                cluster_name: atlas
                    .clusters
                    .get(node.id.cluster)
                    .map(|cluster| cluster.name.clone())
                    .unwrap_or_default(),
                text: node.text.clone(),
                details: node.details.clone(),
            })
            .collect();

        let (tx, rx) = channel();
        Self {
            input: String::new(),
            results: Vec::new(),
            index: Arc::new(index),
            tx,
            rx,
            last_edit: None,
            issued_seq: 0,
            in_flight: false,
        }
    }

    /// Call whenever the text field changed; restarts the quiet period.
    pub fn edited(&mut self, now: f64) {
        self.last_edit = Some(now);
    }

    /// True while a repaint is needed to make progress (debounce timer or an
    /// outstanding query).
    pub fn busy(&self) -> bool {
        self.last_edit.is_some() || self.in_flight
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.results.clear();
        self.last_edit = None;
        // Invalidate whatever is still in flight.
        self.issued_seq += 1;
        self.in_flight = false;
    }

    /// Drives the debounce timer and drains finished queries. Runs once per
    /// frame.
    pub fn tick(&mut self, now: f64) {
        if let Some(edited_at) = self.last_edit
            && now - edited_at >= DEBOUNCE_SECS
        {
            self.last_edit = None;
            self.issue();
        }

        while let Ok((seq, hits)) = self.rx.try_recv() {
            if seq == self.issued_seq {
                self.results = hits;
                self.in_flight = false;
            }
        }
    }

    fn issue(&mut self) {
        self.issued_seq += 1;
        let query = self.input.trim().to_string();
        if query.is_empty() {
            self.results.clear();
            self.in_flight = false;
            return;
        }

        self.in_flight = true;
        let seq = self.issued_seq;
        let index = Arc::clone(&self.index);
        let tx = self.tx.clone();
        thread::spawn(move || {
            // The receiver being gone just means the app shut down.
            let _ = tx.send((seq, run_query(&index, &query)));
        });
    }
}

fn run_query(index: &[SearchEntry], query: &str) -> Vec<SearchHit> {
    let matcher = SkimMatcherV2::default();
    let mut hits: Vec<SearchHit> = index
        .iter()
        .filter_map(|entry| {
            let text_score = matcher.fuzzy_match(&entry.text, query);
            let details_score = matcher.fuzzy_match(&entry.details, query);
            let score = match (text_score, details_score) {
                (Some(a), Some(b)) => a.max(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => return None,
            };
            Some(SearchHit {
                id: entry.id,
                cluster_name: entry.cluster_name.clone(),
                text: entry.text.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(MAX_RESULTS);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasSource, build_atlas, parse_cluster_docs};

    fn atlas() -> Atlas {
        let docs = parse_cluster_docs(
            r#"[{"name": "Graphs", "slug": "graphs", "dots": [
                {"id": 1, "text": "Breadth-first search", "details": "queue-based traversal"},
                {"id": 2, "text": "Depth-first search", "details": "stack-based traversal"},
                {"id": 3, "text": "Dijkstra", "details": "shortest paths"}
            ]}]"#,
        )
        .expect("fixture parses");
        build_atlas(
            docs,
            &AtlasSource {
                data_path: None,
                subject: None,
                seed: 0,
                canvas_width: 1920.0,
                canvas_height: 1080.0,
            },
        )
    }

    #[test]
    fn query_matches_text_and_details() {
        let atlas = atlas();
        let search = SearchBox::new(&atlas);

        let hits = run_query(&search.index, "breadth");
        assert_eq!(hits.first().map(|hit| hit.text.as_str()), Some("Breadth-first search"));

        // "queue" only appears in the details.
        let hits = run_query(&search.index, "queue");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.local, 1);

        assert!(run_query(&search.index, "zzzzzz").is_empty());
    }

    #[test]
    fn stale_responses_are_discarded_by_sequence() {
        let atlas = atlas();
        let mut search = SearchBox::new(&atlas);
        search.issued_seq = 5;

        let stale = vec![SearchHit {
            id: NodeId { cluster: 0, local: 3 },
            cluster_name: "Graphs".into(),
            text: "Dijkstra".into(),
            score: 10,
        }];
        let current = vec![SearchHit {
            id: NodeId { cluster: 0, local: 1 },
            cluster_name: "Graphs".into(),
            text: "Breadth-first search".into(),
            score: 50,
        }];

        // A late answer to an older query arrives after the current one.
        search.tx.send((5, current)).unwrap();
        search.tx.send((3, stale)).unwrap();
        search.tick(100.0);

        assert_eq!(search.results.len(), 1);
        assert_eq!(search.results[0].id.local, 1);
    }

    #[test]
    fn debounce_waits_for_the_quiet_period() {
        let atlas = atlas();
        let mut search = SearchBox::new(&atlas);
        search.input = "dijkstra".into();
        search.edited(0.0);

        search.tick(0.1);
        assert!(search.busy());
        assert_eq!(search.issued_seq, 0);

        search.edited(0.2);
        search.tick(0.3);
        assert_eq!(search.issued_seq, 0);

        search.tick(0.5);
        assert_eq!(search.issued_seq, 1);

        // Worker threads are real; poll until the answer lands.
        for _ in 0..100 {
            search.tick(1.0);
            if !search.in_flight {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(search.results.len(), 1);
        assert_eq!(search.results[0].text, "Dijkstra");
    }

    #[test]
    fn clearing_invalidates_in_flight_queries() {
        let atlas = atlas();
        let mut search = SearchBox::new(&atlas);
        search.issued_seq = 2;
        search.in_flight = true;

        search.clear();
        search.tx
            .send((
                2,
                vec![SearchHit {
                    id: NodeId { cluster: 0, local: 1 },
                    cluster_name: "Graphs".into(),
                    text: "Breadth-first search".into(),
                    score: 1,
                }],
            ))
            .unwrap();
        search.tick(0.0);

        assert!(search.results.is_empty());
        assert!(!search.busy());
    }
}
