use eframe::egui::{Pos2, Rect, Vec2};

pub const SCALE_MIN: f32 = 0.1;
pub const SCALE_MAX: f32 = 5.0;
const FACTOR_MIN: f32 = 0.9;
const FACTOR_MAX: f32 = 1.1;
const WHEEL_SENSITIVITY: f32 = 0.003;
/// A scroll burst ends after this much idle time; the next tick re-captures
/// the cursor as the zoom anchor.
const BURST_IDLE_SECS: f64 = 0.2;
pub const FOCUS_SCALE: f32 = 1.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelUnit {
    Pixel,
    Line,
    Page,
}

impl WheelUnit {
    fn multiplier(self) -> f32 {
        match self {
            WheelUnit::Pixel => 1.0,
            WheelUnit::Line => 10.0,
            WheelUnit::Page => 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ZoomAnchor {
    cursor: Pos2,
    last_tick: f64,
}

/// Owns the canvas transform. World coordinates are center-origin; the
/// screen mapping scales around the canvas center so a zero offset always
/// shows the world origin mid-canvas.
pub struct Viewport {
    pub scale: f32,
    pub offset: Vec2,
    drag_anchor: Option<Pos2>,
    zoom_anchor: Option<ZoomAnchor>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            drag_anchor: None,
            zoom_anchor: None,
        }
    }
}

/// Per-tick zoom factor for a wheel delta: `1 - delta * 0.003 * unit`,
/// clamped to [0.9, 1.1] so a wild delta can never blow past one smooth step.
pub fn wheel_factor(delta: f32, unit: WheelUnit) -> f32 {
    (1.0 - delta * WHEEL_SENSITIVITY * unit.multiplier()).clamp(FACTOR_MIN, FACTOR_MAX)
}

impl Viewport {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn world_to_screen(&self, world: Vec2, rect: Rect) -> Pos2 {
        rect.center() + (world + self.offset) * self.scale
    }

    pub fn screen_to_world(&self, screen: Pos2, rect: Rect) -> Vec2 {
        (screen - rect.center()) / self.scale - self.offset
    }

    pub fn begin_drag(&mut self, cursor: Pos2) {
        self.drag_anchor = Some(cursor - self.offset * self.scale);
    }

    pub fn drag_to(&mut self, cursor: Pos2) {
        if let Some(anchor) = self.drag_anchor {
            self.offset = (cursor - anchor) / self.scale;
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Applies one wheel tick. Zooming in anchors at the cursor position
    /// captured when the scroll burst started, so the point under the cursor
    /// stays put through the whole gesture. Zooming out anchors at the canvas
    /// center regardless of the cursor.
    pub fn wheel(&mut self, delta: f32, unit: WheelUnit, cursor: Pos2, rect: Rect, now: f64) {
        let anchor = self.burst_anchor(cursor, now);
        let factor = wheel_factor(delta, unit);
        let old_scale = self.scale;
        self.scale = (self.scale * factor).clamp(SCALE_MIN, SCALE_MAX);
        if self.scale == old_scale {
            return;
        }

        if factor > 1.0 {
            let lever = anchor - rect.center();
            self.offset += lever * (1.0 / self.scale - 1.0 / old_scale);
        }
    }

    fn burst_anchor(&mut self, cursor: Pos2, now: f64) -> Pos2 {
        match &mut self.zoom_anchor {
            Some(anchor) if now - anchor.last_tick <= BURST_IDLE_SECS => {
                anchor.last_tick = now;
                anchor.cursor
            }
            _ => {
                self.zoom_anchor = Some(ZoomAnchor {
                    cursor,
                    last_tick: now,
                });
                cursor
            }
        }
    }

    /// Centers a world point at a fixed comfortable scale.
    pub fn focus(&mut self, world: Vec2) {
        self.scale = FOCUS_SCALE;
        self.offset = -world;
        self.drag_anchor = None;
    }
}
