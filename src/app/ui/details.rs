use eframe::egui::{self, RichText, Ui};

use network_explorer::interaction::InteractionEvent;
use network_explorer::util::format_count;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selected Person");
        ui.add_space(6.0);

        let Some(info) = self.info.clone() else {
            ui.label("Click a person in the network or search for a name.");
            return;
        };

        ui.label(RichText::new(info.name.as_str()).strong());
        ui.add_space(6.0);
        ui.label(format!("Affiliation: {}", info.affiliation));
        if let Some(cluster) = &info.cluster
            && cluster != &info.affiliation
        {
            ui.label(format!("Group: {cluster}"));
        }
        ui.label(format!(
            "Documents: {}",
            format_count(info.documents.max(0.0).round() as u64)
        ));
        ui.label(format!("Correspondents: {}", info.correspondents));

        ui.separator();
        ui.label(RichText::new("Strongest correspondents").strong());
        if info.strongest.is_empty() {
            ui.label("No recorded correspondence.");
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("strongest_correspondents")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (name, weight) in &info.strongest {
                    let label = format!("{name}  ({})", format_count(weight.max(0.0).round() as u64));
                    if ui.link(label).on_hover_text("Focus this person").clicked() {
                        clicked = Some(name.clone());
                    }
                }
            });

        if let Some(name) = clicked {
            self.search = name.clone();
            self.dispatch(InteractionEvent::Search(name));
        }

        ui.add_space(8.0);
        if ui.button("Clear selection").clicked() {
            self.search.clear();
            self.dispatch(InteractionEvent::ClearSearch);
        }
    }
}
