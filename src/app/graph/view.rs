use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui};

use network_explorer::render::LabelPlacement;

use super::super::ViewModel;
use super::super::render_utils::{canvas_to_screen, circle_visible, draw_background};

const LABEL_COLOR: Color32 = Color32::from_rgb(222, 226, 232);
const CLUSTER_LABEL_ALPHA: u8 = 150;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        self.handle_graph_resize(rect);
        self.handle_graph_pointer(ui, rect, &response);

        if self.context.is_running() {
            self.context.tick();
            ui.ctx().request_repaint();
        }

        let bindings = self.context.bindings();

        for link in bindings.links() {
            painter.line_segment(
                [
                    canvas_to_screen(rect, link.from),
                    canvas_to_screen(rect, link.to),
                ],
                Stroke::new(link.width, link.color),
            );
        }

        if self.context.clustering() && self.context.focus().name().is_none() {
            for label in bindings.cluster_labels() {
                let [r, g, b, _] = label.color.to_array();
                painter.text(
                    canvas_to_screen(rect, label.position),
                    Align2::CENTER_CENTER,
                    label.text.as_str(),
                    FontId::proportional(18.0),
                    Color32::from_rgba_unmultiplied(r, g, b, CLUSTER_LABEL_ALPHA),
                );
            }
        }

        for node in bindings.nodes() {
            let center = canvas_to_screen(rect, node.position);
            if !circle_visible(rect, center, node.radius) {
                continue;
            }
            painter.circle_filled(center, node.radius, node.fill);
            if let Some((width, color)) = node.stroke {
                painter.circle_stroke(center, node.radius + width * 0.5, Stroke::new(width, color));
            }
        }

        for node in bindings.nodes() {
            let Some(anchor) = node.label_anchor() else {
                continue;
            };
            let align = match node.label {
                Some(LabelPlacement::Beside) => Align2::LEFT_CENTER,
                _ => Align2::CENTER_BOTTOM,
            };
            painter.text(
                canvas_to_screen(rect, anchor),
                align,
                node.name.as_str(),
                FontId::proportional(if node.emphasis.is_focused() { 14.0 } else { 11.0 }),
                LABEL_COLOR,
            );
        }
    }
}
