use eframe::egui::{self, Rect, Ui};
use tracing::{trace, warn};

use network_explorer::interaction::{HostEvent, InteractionEvent};

use super::super::ViewModel;
use super::super::render_utils::screen_to_canvas;

impl ViewModel {
    /// Sends one event through the controller and applies its host notifications.
    pub(in crate::app) fn dispatch(&mut self, event: InteractionEvent) {
        match self.controller.dispatch(&mut self.context, event) {
            Ok(events) => {
                for event in events {
                    self.apply_host_event(event);
                }
            }
            Err(error) => warn!(%error, "interaction rejected"),
        }
    }

    fn apply_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::SelectedPersonChanged(info) => {
                if info.is_none() {
                    self.search.clear();
                }
                self.info = info;
            }
            HostEvent::MouseOver(name) => trace!(%name, "mouse over"),
            HostEvent::MouseOut => trace!("mouse out"),
            HostEvent::Click(name) => trace!(%name, "clicked"),
        }
    }

    pub(in crate::app) fn handle_graph_resize(&mut self, rect: Rect) {
        let size = rect.size();
        if size.x < 1.0 || size.y < 1.0 {
            return;
        }
        self.dispatch(InteractionEvent::Resize {
            width: size.x,
            height: size.y,
        });
    }

    /// Translates pointer state over the graph into hover, click and drag events.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer) || self.context.is_dragging())
            .map(|pointer| screen_to_canvas(rect, pointer));
        let hit = pointer.and_then(|point| {
            self.context
                .bindings()
                .hit_test(point)
                .map(|primitive| primitive.name.clone())
        });

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(name) = &hit
        {
            self.dispatch(InteractionEvent::DragStart(name.clone()));
        }
        if self.context.is_dragging() {
            if let Some(point) = pointer {
                self.dispatch(InteractionEvent::DragMove(point));
            }
            if response.drag_stopped() {
                self.dispatch(InteractionEvent::DragEnd);
            }
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
            return;
        }

        let hovered = self.controller.hovered().map(str::to_owned);
        match (&hit, hovered.as_deref()) {
            (Some(name), hovered) if hovered != Some(name.as_str()) => {
                self.dispatch(InteractionEvent::Hover(name.clone()));
            }
            (None, Some(_)) => self.dispatch(InteractionEvent::Unhover),
            _ => {}
        }

        if let Some(name) = hit {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            if response.clicked_by(egui::PointerButton::Primary) {
                self.dispatch(InteractionEvent::Click(name));
            }
        }
    }
}
