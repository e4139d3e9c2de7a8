use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

/// Maps canvas coordinates to the screen. `origin` is the canvas point drawn
/// at the middle of `rect` when the view is not panned.
#[derive(Clone, Copy, Debug)]
pub(super) struct ViewTransform {
    pub(super) rect: Rect,
    pub(super) origin: Pos2,
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
}

impl ViewTransform {
    pub(super) fn world_to_screen(self, world: Pos2) -> Pos2 {
        self.rect.center() + self.pan + (world - self.origin) * self.zoom
    }

    pub(super) fn screen_to_world(self, screen: Pos2) -> Pos2 {
        self.origin + (screen - self.rect.center() - self.pan) / self.zoom
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + factor * 0.65)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, transform: ViewTransform) {
    let rect = transform.rect;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(21, 24, 30));

    let step = (48.0 * transform.zoom.clamp(0.5, 2.0)).max(16.0);
    let anchor = transform.world_to_screen(transform.origin);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(64, 72, 84, 60));

    let mut x = rect.left() + (anchor.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (anchor.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Triangle points for an arrowhead ending on the rim of a circle of
/// `target_radius` around `to`.
pub(super) fn arrow_head(from: Pos2, to: Pos2, target_radius: f32, size: f32) -> Option<[Pos2; 3]> {
    let delta = to - from;
    let length = delta.length();
    if length <= target_radius + size {
        return None;
    }
    let direction = delta / length;
    let tip = to - direction * target_radius;
    let base = tip - direction * size;
    let normal = direction.rot90() * (size * 0.5);
    Some([tip, base + normal, base - normal])
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn transform_round_trips_through_pan_and_zoom() {
        let transform = ViewTransform {
            rect: Rect::from_min_size(pos2(100.0, 50.0), vec2(800.0, 600.0)),
            origin: pos2(400.0, 300.0),
            pan: vec2(25.0, -10.0),
            zoom: 1.5,
        };

        assert_eq!(transform.world_to_screen(pos2(400.0, 300.0)), pos2(525.0, 340.0));
        let world = pos2(130.0, 470.0);
        let back = transform.screen_to_world(transform.world_to_screen(world));
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn arrow_head_sits_on_the_target_rim() {
        let [tip, left, right] = arrow_head(pos2(0.0, 0.0), pos2(100.0, 0.0), 10.0, 6.0).unwrap();
        assert_eq!(tip, pos2(90.0, 0.0));
        assert_eq!(left.x, 84.0);
        assert_eq!(right.x, 84.0);
        assert!(arrow_head(pos2(0.0, 0.0), pos2(5.0, 0.0), 10.0, 6.0).is_none());
    }
}
