use eframe::egui::Pos2;

/// Labels are fully opaque inside this radius (at scale 1), then ramp to
/// invisible at `PROXIMITY_RADIUS`. Both scale with the viewport so the
/// world-space reach of the cursor halo stays constant.
const FADE_START_RADIUS: f32 = 200.0;
const PROXIMITY_RADIUS: f32 = 350.0;
const SUBTOPIC_LABEL_OPACITY: f32 = 0.95;
const PROXIMITY_MAX_OPACITY: f32 = 0.9;

/// 1 inside the fade-start radius, linear ramp to 0 at the proximity radius.
pub fn proximity_opacity(node_screen: Pos2, cursor: Pos2, scale: f32) -> f32 {
    let distance = (node_screen - cursor).length();
    let fade_start = FADE_START_RADIUS * scale;
    let fade_end = PROXIMITY_RADIUS * scale;

    if distance <= fade_start {
        1.0
    } else if distance >= fade_end {
        0.0
    } else {
        1.0 - (distance - fade_start) / (fade_end - fade_start)
    }
}

/// Final label opacity for a node, or `None` when no label should draw.
/// Direct children of the hovered node are pinned visible; the hovered node
/// itself gets a tooltip instead; everything hides while panning.
pub fn label_opacity(
    proximity: f32,
    is_subtopic_of_hovered: bool,
    any_hovered: bool,
    is_hovered: bool,
    dragging: bool,
) -> Option<f32> {
    if dragging || is_hovered {
        return None;
    }
    if is_subtopic_of_hovered {
        return Some(SUBTOPIC_LABEL_OPACITY);
    }
    if any_hovered {
        return None;
    }
    if proximity > 0.0 {
        Some(proximity * PROXIMITY_MAX_OPACITY)
    } else {
        None
    }
}
