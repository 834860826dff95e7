use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

const GRID_STEP: f32 = 56.0;

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));
    let mut x = rect.left() + GRID_STEP;
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += GRID_STEP;
    }

    let mut y = rect.top() + GRID_STEP;
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += GRID_STEP;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Canvas coordinates start at the top-left corner of the graph panel.
pub(super) fn canvas_to_screen(rect: Rect, canvas: Vec2) -> Pos2 {
    rect.min + canvas
}

pub(super) fn screen_to_canvas(rect: Rect, screen: Pos2) -> Vec2 {
    screen - rect.min
}
