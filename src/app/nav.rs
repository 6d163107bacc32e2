use log::warn;

use crate::app::viewport::Viewport;
use crate::atlas::{Atlas, NodeId};

/// How long the "press Escape again to leave" prompt stays armed.
const EXIT_PROMPT_SECS: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    HighLevel,
    Cluster(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavEvent {
    ClickSummary(usize),
    ClickNode(NodeId),
    /// 0-based index into the selected node's children (keys 1-9).
    SelectChild(usize),
    /// 0-based index into the selected node's connections (keys q..i).
    SelectConnection(usize),
    SelectParent,
    StartPath(usize),
    AdvancePath,
    RetreatPath,
    OpenExpanded,
    Escape,
    JumpTo(NodeId),
}

#[derive(Clone, Copy, Debug)]
struct PendingJump {
    target: NodeId,
    processed: bool,
}

/// Navigation state: which level the user is looking at, what is selected,
/// and the overlays (active learning path, expanded content, cross-cluster
/// jump in flight). All transitions go through `handle`.
pub struct Navigator {
    pub state: ViewState,
    pub selected: Option<NodeId>,
    pub expanded: bool,
    pub active_path: Option<usize>,
    pub path_position: usize,
    pending: Option<PendingJump>,
    exit_prompt_until: Option<f64>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            state: ViewState::HighLevel,
            selected: None,
            expanded: false,
            active_path: None,
            path_position: 0,
            pending: None,
            exit_prompt_until: None,
        }
    }
}

impl Navigator {
    pub fn handle(&mut self, event: NavEvent, atlas: &Atlas, viewport: &mut Viewport, now: f64) {
        match (self.state, event) {
            (_, NavEvent::ClickSummary(cluster)) => self.enter_cluster(cluster, viewport),

            (ViewState::Cluster(cluster), NavEvent::ClickNode(id)) if id.cluster == cluster => {
                self.select(id, atlas, viewport);
            }

            (ViewState::Cluster(_), NavEvent::SelectChild(index)) => {
                if let Some(selected) = self.selected
                    && let Some(&child) = atlas.children_of(selected).get(index)
                {
                    self.select(child, atlas, viewport);
                }
            }

            (ViewState::Cluster(_), NavEvent::SelectConnection(index)) => {
                if let Some(selected) = self.selected
                    && let Some(&peer) = atlas.connections_of(selected).get(index)
                {
                    self.select(peer, atlas, viewport);
                }
            }

            (ViewState::Cluster(_), NavEvent::SelectParent) => {
                if let Some(parent) = self.selected.and_then(|id| atlas.node(id)?.parent) {
                    self.select(parent, atlas, viewport);
                }
            }

            (ViewState::Cluster(cluster), NavEvent::StartPath(path)) => {
                if atlas.paths.get(path).is_some_and(|p| p.cluster == cluster) {
                    self.active_path = Some(path);
                    self.path_position = 0;
                    if let Some(&first) = atlas.paths[path].stops.first() {
                        self.select(first, atlas, viewport);
                    }
                }
            }

            (ViewState::Cluster(_), NavEvent::AdvancePath) => {
                match self.active_path {
                    Some(path) => {
                        if let Some(&stop) =
                            atlas.paths[path].stops.get(self.path_position + 1)
                        {
                            self.path_position += 1;
                            self.select(stop, atlas, viewport);
                        }
                    }
                    // Arrow keys can also start the path whose first stop is
                    // the current selection.
                    None => {
                        if let Some(path) =
                            self.selected.and_then(|id| atlas.path_starting_at(id))
                        {
                            self.handle(NavEvent::StartPath(path), atlas, viewport, now);
                        }
                    }
                }
            }

            (ViewState::Cluster(_), NavEvent::RetreatPath) => {
                if let Some(path) = self.active_path
                    && self.path_position > 0
                {
                    self.path_position -= 1;
                    if let Some(&stop) = atlas.paths[path].stops.get(self.path_position) {
                        self.select(stop, atlas, viewport);
                    }
                }
            }

            (ViewState::Cluster(_), NavEvent::OpenExpanded) => {
                if self.selected.is_some() {
                    self.expanded = true;
                }
            }

            (_, NavEvent::JumpTo(id)) => self.jump_to(id, atlas, viewport),

            (ViewState::HighLevel, NavEvent::Escape) => viewport.reset(),

            (ViewState::Cluster(_), NavEvent::Escape) => self.escape_in_cluster(viewport, now),

            // Keyboard and node events in the high-level view, and clicks on
            // nodes that are not part of the visible cluster.
            _ => {}
        }
    }

    /// One Escape press peels one layer: expanded content, then the active
    /// path, then the selection, then (armed by a prompt) the cluster itself.
    fn escape_in_cluster(&mut self, viewport: &mut Viewport, now: f64) {
        if self.expanded {
            self.expanded = false;
        } else if self.active_path.is_some() {
            self.active_path = None;
            self.path_position = 0;
        } else if self.selected.is_some() {
            self.selected = None;
            viewport.reset();
        } else if self.exit_prompt_active(now) {
            self.state = ViewState::HighLevel;
            self.exit_prompt_until = None;
            viewport.reset();
        } else {
            self.exit_prompt_until = Some(now + EXIT_PROMPT_SECS);
        }
    }

    pub fn exit_prompt_active(&self, now: f64) -> bool {
        self.exit_prompt_until.is_some_and(|until| now < until)
    }

    fn enter_cluster(&mut self, cluster: usize, viewport: &mut Viewport) {
        self.state = ViewState::Cluster(cluster);
        self.selected = None;
        self.expanded = false;
        self.active_path = None;
        self.path_position = 0;
        self.exit_prompt_until = None;
        viewport.reset();
    }

    fn select(&mut self, id: NodeId, atlas: &Atlas, viewport: &mut Viewport) {
        let Some(node) = atlas.node(id) else {
            return;
        };
        self.selected = Some(id);
        self.expanded = false;

        // Clicking a stop of the active path keeps the path position in sync.
        if let Some(path) = self.active_path
            && let Some(position) = atlas.paths[path].stops.iter().position(|&stop| stop == id)
        {
            self.path_position = position;
        }

        viewport.focus(node.pos);
    }

    /// Search results and path panels can target any cluster. Same-cluster
    /// targets select immediately; otherwise the jump is parked in the single
    /// pending slot and the cluster transition fires, leaving the selection
    /// to `resolve_pending` once the new cluster is on screen.
    fn jump_to(&mut self, id: NodeId, atlas: &Atlas, viewport: &mut Viewport) {
        if self.state == ViewState::Cluster(id.cluster) {
            self.select(id, atlas, viewport);
            return;
        }

        self.pending = Some(PendingJump {
            target: id,
            processed: false,
        });
        self.enter_cluster(id.cluster, viewport);
    }

    /// Runs once per frame, before input handling, so the jump target is
    /// selected only after a frame of the destination cluster has been
    /// committed. The slot is cleared exactly once whether the target
    /// resolves or not.
    pub fn resolve_pending(&mut self, atlas: &Atlas, viewport: &mut Viewport) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        if pending.processed {
            self.pending = None;
            return;
        }
        pending.processed = true;
        let target = pending.target;

        if self.state == ViewState::Cluster(target.cluster) && atlas.node(target).is_some() {
            self.select(target, atlas, viewport);
        } else {
            warn!("dropping unresolvable jump target {target}");
        }
        self.pending = None;
    }
}
