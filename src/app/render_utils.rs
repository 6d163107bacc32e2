use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, opacity: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity.clamp(0.0, 1.0)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(10, 14, 39));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(48, 58, 96, 60));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// Screen diameter for a node, clamped so nodes neither vanish when zoomed
/// out nor swallow the canvas when zoomed in.
pub(super) fn node_diameter(size: f32, scale: f32) -> f32 {
    (size * 6.0 * scale).clamp(4.0, 120.0)
}

pub(super) fn edge_stroke(base_width: f32, scale: f32, color: Color32) -> Stroke {
    Stroke::new((base_width * scale).clamp(0.5, 8.0), color)
}

/// Dash and gap lengths for connection edges, scale-compensated the same way
/// as stroke widths.
pub(super) fn dash_lengths(scale: f32) -> (f32, f32) {
    ((8.0 * scale).clamp(4.0, 16.0), (4.0 * scale).clamp(2.0, 8.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    #[test]
    fn node_diameter_clamps_at_both_ends() {
        assert_eq!(node_diameter(4.0, 1.0), 24.0);
        assert_eq!(node_diameter(1.0, 0.1), 4.0);
        assert_eq!(node_diameter(10.0, 5.0), 120.0);
    }

    #[test]
    fn stroke_width_stays_readable_across_zoom() {
        assert_eq!(edge_stroke(1.5, 0.1, Color32::WHITE).width, 0.5);
        assert_eq!(edge_stroke(1.5, 1.0, Color32::WHITE).width, 1.5);
        assert_eq!(edge_stroke(1.5, 5.0, Color32::WHITE).width, 7.5);
        assert_eq!(edge_stroke(2.0, 5.0, Color32::WHITE).width, 8.0);
    }

    #[test]
    fn dash_lengths_clamp() {
        assert_eq!(dash_lengths(1.0), (8.0, 4.0));
        assert_eq!(dash_lengths(0.1), (4.0, 2.0));
        assert_eq!(dash_lengths(5.0), (16.0, 8.0));
    }

    #[test]
    fn offscreen_circles_and_edges_are_culled() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(50.0, 50.0), 5.0));
        assert!(circle_visible(rect, pos2(-3.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 5.0));

        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 2.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -10.0), 2.0));
    }
}
