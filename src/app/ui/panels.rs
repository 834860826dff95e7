use std::path::PathBuf;

use eframe::egui::{self, Align, Context, Key, Layout, Ui};

use network_explorer::context::SimulationContext;
use network_explorer::focus::Threshold;
use network_explorer::interaction::{InteractionController, InteractionEvent};
use network_explorer::search::suggest_names;

use super::super::{AppRequest, ViewModel, dataset_label};

const SUGGESTION_ROWS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn new(context: SimulationContext, dataset_label: String) -> Self {
        Self {
            clustering: context.clustering(),
            threshold: context.threshold(),
            context,
            controller: InteractionController::new(),
            dataset_label,
            search: String::new(),
            info: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        datasets: &[PathBuf],
        active: usize,
        request: &mut AppRequest,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("network-explorer");
                    ui.separator();
                    self.draw_dataset_picker(ui, datasets, active, request);
                    ui.label(format!("people: {}", self.context.model().node_count()));
                    ui.label(format!("links: {}", self.context.model().link_count()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status = if self.context.is_running() {
                            format!("settling (alpha {:.3})", self.context.simulation().alpha())
                        } else {
                            "settled".to_owned()
                        };
                        ui.label(status);
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn draw_dataset_picker(
        &self,
        ui: &mut Ui,
        datasets: &[PathBuf],
        active: usize,
        request: &mut AppRequest,
    ) {
        if datasets.len() < 2 {
            ui.label(self.dataset_label.as_str());
            return;
        }

        let mut selected = active;
        egui::ComboBox::from_id_salt("dataset")
            .selected_text(self.dataset_label.as_str())
            .show_ui(ui, |ui| {
                for (index, path) in datasets.iter().enumerate() {
                    ui.selectable_value(&mut selected, index, dataset_label(path))
                        .on_hover_text(path.display().to_string());
                }
            });
        if selected != active {
            request.switch_dataset = Some(selected);
        }
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search")
            .on_hover_text("Press Enter to select a person by exact name, ignoring case.");
        let mut search_submitted = false;
        ui.horizontal(|ui| {
            let response = ui.text_edit_singleline(&mut self.search);
            if response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                search_submitted = true;
            }
            if ui.button("Clear").clicked() {
                self.search.clear();
                self.dispatch(InteractionEvent::ClearSearch);
            }
        });
        if search_submitted {
            self.dispatch(InteractionEvent::Search(self.search.clone()));
        }

        let suggestions = suggest_names(self.context.model(), &self.search, SUGGESTION_ROWS)
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let exact = self.context.find_name(&self.search);
        if !suggestions.is_empty() && exact.is_none() {
            egui::ScrollArea::vertical()
                .id_salt("search_suggestions")
                .max_height(220.0)
                .show(ui, |ui| {
                    for name in suggestions {
                        if ui.link(name.as_str()).clicked() {
                            self.search = name.clone();
                            self.dispatch(InteractionEvent::Search(name));
                        }
                    }
                });
        }

        ui.separator();
        if ui
            .checkbox(&mut self.clustering, "Cluster by affiliation")
            .on_hover_text("Pull each affiliation toward its own region of the canvas.")
            .changed()
        {
            self.dispatch(InteractionEvent::ToggleClustering);
            self.clustering = self.context.clustering();
        }

        ui.separator();
        ui.label("While someone is focused, show");
        ui.horizontal_wrapped(|ui| {
            for threshold in [Threshold::CenterOnly, Threshold::Neighbors, Threshold::Everything] {
                ui.selectable_value(&mut self.threshold, threshold, threshold.label());
            }
        });
        self.context.set_threshold(self.threshold);

        if self.context.model().clusters().is_empty() {
            return;
        }
        ui.separator();
        ui.label("Affiliations");
        egui::ScrollArea::vertical()
            .id_salt("cluster_legend")
            .show(ui, |ui| {
                for cluster in self.context.model().clusters() {
                    ui.horizontal(|ui| {
                        let (rect, _) = ui.allocate_exact_size(
                            egui::vec2(12.0, 12.0),
                            egui::Sense::hover(),
                        );
                        ui.painter().circle_filled(rect.center(), 5.0, cluster.color);
                        ui.label(format!("{} ({})", cluster.name, cluster.members.len()));
                    });
                }
            });
    }
}
